//! Persistence boundary for members and workspaces.
//!
//! Uniqueness (one member per email, one self-service workspace per manager)
//! is enforced here, at the store, so concurrent first-time logins converge on
//! a single row. Callers catch [`StoreError::Conflict`] and re-read.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
pub use r#trait::{MemberStore, StoreError, WorkspaceStore};

//! `gatehouse-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod member;
pub mod value_object;
pub mod workspace;

pub use error::{DomainError, DomainResult};
pub use id::{IdGenerator, MemberId, SequentialIdGenerator, UuidV7Generator, WorkspaceId};
pub use member::{MemberRole, TeamMember};
pub use value_object::Email;
pub use workspace::{Workspace, WorkspaceMember, WorkspaceRole};

//! Infrastructure layer: stores, identity provider client, resolution pipeline.

pub mod identity;
pub mod pipeline;
pub mod provider;
pub mod provisioning;
pub mod store;

pub use identity::IdentityResolver;
pub use pipeline::{Authenticator, ResolutionStage};
pub use provider::{GoogleTokenVerifier, ProviderError, StaticTokenVerifier, TokenVerifier};
pub use provisioning::WorkspaceProvisioner;
pub use store::{InMemoryStore, MemberStore, PgStore, StoreError, WorkspaceStore};

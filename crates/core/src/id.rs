//! Strongly-typed identifiers and the id generation capability.

use core::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a team member (internal identity record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(Uuid);

/// Identifier of a workspace (multi-tenant boundary).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(MemberId, "MemberId");
impl_uuid_newtype!(WorkspaceId, "WorkspaceId");

/// Source of fresh, collision-resistant identifiers.
///
/// Injected wherever records are created so tests can produce deterministic ids.
pub trait IdGenerator: Send + Sync {
    fn next_uuid(&self) -> Uuid;

    fn next_member_id(&self) -> MemberId {
        MemberId(self.next_uuid())
    }

    fn next_workspace_id(&self) -> WorkspaceId {
        WorkspaceId(self.next_uuid())
    }
}

/// Production generator: UUIDv7 (time-ordered, random tail).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_uuid(&self) -> Uuid {
        Uuid::now_v7()
    }
}

/// Deterministic generator yielding `00000000-0000-0000-0000-000000000001`, `...02`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_uuid(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_generator_is_deterministic() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.next_uuid(), Uuid::from_u128(1));
        assert_eq!(ids.next_member_id(), MemberId::from_uuid(Uuid::from_u128(2)));
        assert_eq!(
            ids.next_workspace_id().to_string(),
            "00000000-0000-0000-0000-000000000003"
        );
    }

    #[test]
    fn v7_generator_yields_distinct_ids() {
        let ids = UuidV7Generator;
        assert_ne!(ids.next_uuid(), ids.next_uuid());
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<WorkspaceId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.starts_with("WorkspaceId")));
    }
}

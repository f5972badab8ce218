//! Identity types for Helix entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behaviour for strongly-typed entity identifiers.
pub trait EntityIdType: Copy + Eq + Ord + fmt::Display {
    /// Wrap an existing UUID.
    fn new(uuid: Uuid) -> Self;
}

/// Defines a UUIDv7-backed identifier newtype.
///
/// UUIDv7 embeds a Unix timestamp, so identifiers sort by creation time.
macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh timestamp-sortable identifier.
            pub fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// The nil identifier. Never assigned to a stored entity.
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }
        }

        impl EntityIdType for $name {
            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a registered agent genome.
    GenomeId
);
define_entity_id!(
    /// Identifier of a single execution attempt.
    RunId
);
define_entity_id!(
    /// Identifier of a workflow definition.
    WorkflowId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_sortable() {
        let a = GenomeId::now_v7();
        let b = GenomeId::now_v7();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_id_roundtrips_through_display() {
        let id = RunId::now_v7();
        let parsed: RunId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = WorkflowId::nil();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        assert!("agent_writer_42".parse::<GenomeId>().is_err());
    }
}

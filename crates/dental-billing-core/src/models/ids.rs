//! Record identifiers.
//!
//! Ids are opaque strings on the wire so that backups written by older
//! builds (e.g. `p1`, `proc_1720600000000`) import unchanged. Newly minted ids
//! come from random UUIDs and cannot collide under rapid successive creation.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh, collision-resistant id.
            pub fn mint() -> Self {
                Self(format!("{}{}", $prefix, uuid::Uuid::new_v4().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

record_id!(
    /// Identity of a patient, unique across the collection.
    PatientId,
    "p_"
);

record_id!(
    /// Identity of a procedure, unique within its patient.
    ProcedureId,
    "proc_"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_minted_ids_are_prefixed() {
        assert!(PatientId::mint().as_str().starts_with("p_"));
        assert!(ProcedureId::mint().as_str().starts_with("proc_"));
        // prefix + 32 hex chars
        assert_eq!(PatientId::mint().as_str().len(), 34);
    }

    #[test]
    fn test_rapid_minting_never_collides() {
        let ids: HashSet<_> = (0..10_000).map(|_| ProcedureId::mint()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = PatientId::from("p1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
        let back: PatientId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(back, id);
    }
}

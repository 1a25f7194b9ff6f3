//! Strongly typed identifiers.
//!
//! Local records are keyed by UUIDs. Chronos hands out opaque string keys
//! (journal ids, publication ids, user ids) which must never be blank.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for external string keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdValidationError {
    /// The key was empty or whitespace only.
    #[error("{kind} must not be empty")]
    Empty {
        /// Human-readable identifier kind.
        kind: &'static str,
    },
    /// The key carried leading or trailing whitespace.
    #[error("{kind} must not contain surrounding whitespace")]
    Padded {
        /// Human-readable identifier kind.
        kind: &'static str,
    },
}

macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

macro_rules! define_external_key {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the key.
            pub fn new(value: impl Into<String>) -> Result<Self, IdValidationError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(IdValidationError::Empty { kind: $kind });
                }
                if value.trim() != value {
                    return Err(IdValidationError::Padded { kind: $kind });
                }
                Ok(Self(value))
            }

            /// Borrow the raw key.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

define_uuid_id!(
    /// Local preprint identifier.
    PreprintId
);
define_uuid_id!(
    /// Local user identifier.
    UserId
);
define_uuid_id!(
    /// Local file node identifier.
    FileId
);
define_uuid_id!(
    /// Local submission record identifier.
    SubmissionId
);

define_external_key!(
    /// Chronos journal key, the natural key of the journal catalogue.
    JournalId,
    "journal id"
);
define_external_key!(
    /// Chronos publication (manuscript) key.
    PublicationId,
    "publication id"
);
define_external_key!(
    /// Chronos user key mirrored onto local users.
    ChronosUserId,
    "chronos user id"
);

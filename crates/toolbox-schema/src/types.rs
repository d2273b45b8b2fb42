//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Name of a toolbox container, as known to the container engine.
    ContainerName
);

string_newtype!(
    /// Fully qualified image reference, e.g. `registry.fedoraproject.org/fedora-toolbox:40`.
    ImageRef
);

string_newtype!(
    /// Normalized operating system release token, e.g. `40` or `9.4`.
    Release
);

impl ImageRef {
    /// Tag part of the reference, if any. A registry port is not a tag.
    pub fn tag(&self) -> Option<&str> {
        let last = self.0.rsplit('/').next().unwrap_or(&self.0);
        last.split_once(':').map(|(_, tag)| tag)
    }

    /// Last path component of the repository, without tag.
    pub fn basename(&self) -> &str {
        let last = self.0.rsplit('/').next().unwrap_or(&self.0);
        last.split_once(':').map_or(last, |(repo, _)| repo)
    }
}

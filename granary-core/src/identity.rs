// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque string identifiers for principals, fields, weighings and tokens.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Identifier of an authenticated principal (owner or grantee).
    PrincipalId
);

opaque_id!(
    /// Identifier of a field document within its owner's collection.
    FieldId
);

opaque_id!(
    /// Identifier of a weighing document within a field's sub-collection.
    WeighingId
);

opaque_id!(
    /// Random identifier of a share token, the value embedded in share URLs.
    TokenId
);

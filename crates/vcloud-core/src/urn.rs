//! Strongly-typed entity URNs.
//!
//! Entity ids look like `urn:vcloud:org:a93c9db9-7471-3192-8d09-a8f7eeda85f9`. Each
//! resource kind gets its own wrapper so an org id can never be passed where a VDC id
//! is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

const URN_PREFIX: &str = "urn:vcloud:";

/// Split a URN into its kind segment and UUID.
///
/// # Errors
///
/// Returns [`Error::InvalidUrn`] if the input is not `urn:vcloud:<kind>:<uuid>`.
pub fn parse_urn(input: &str) -> Result<(&str, Uuid)> {
    let rest = input
        .strip_prefix(URN_PREFIX)
        .ok_or_else(|| Error::InvalidUrn(input.to_string()))?;
    let (kind, id) = rest
        .split_once(':')
        .ok_or_else(|| Error::InvalidUrn(input.to_string()))?;
    let uuid = Uuid::parse_str(id).map_err(|_| Error::InvalidUrn(input.to_string()))?;
    Ok((kind, uuid))
}

/// Macro to generate strongly-typed URN wrapper types.
macro_rules! urn_type {
    ($name:ident, $kind:literal, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid);

        impl $name {
            /// URN kind segment for this type.
            pub const KIND: &'static str = $kind;

            /// Creates a new URN wrapper from a [`Uuid`].
            #[must_use]
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parses a URN from a string.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not a URN of this kind.
            pub fn parse_str(input: &str) -> Result<Self> {
                match parse_urn(input)? {
                    (kind, uuid) if kind == $kind => Ok(Self(uuid)),
                    _ => Err(Error::InvalidUrn(input.to_string())),
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_str(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::parse_str(&value)
            }
        }

        impl From<$name> for String {
            fn from(urn: $name) -> Self {
                urn.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}:{}", URN_PREFIX, $kind, self.0)
            }
        }
    };
}

urn_type!(OrgUrn, "org", "Organization URN");
urn_type!(VdcUrn, "vdc", "Virtual datacenter URN");
urn_type!(NetworkUrn, "network", "Network URN");
urn_type!(GatewayUrn, "gateway", "Edge gateway URN");
urn_type!(VAppUrn, "vapp", "vApp URN");
urn_type!(TaskUrn, "task", "Task URN");

//! Fixed-size 32-byte values used throughout the protocol.
//!
//! Every newtype here is hex encoded in human readable formats (JSON, TOML), accepting an
//! optional `0x` prefix on input.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::errors::ParseBufError;

/// Length of every buffer type in this module.
pub const BUF32_LEN: usize = 32;

macro_rules! impl_buf32 {
    ($name:ident) => {
        impl $name {
            /// The all-zero value.
            pub const ZERO: Self = Self([0u8; BUF32_LEN]);

            /// Wraps raw bytes.
            pub const fn new(bytes: [u8; BUF32_LEN]) -> Self {
                Self(bytes)
            }

            /// Returns the underlying bytes.
            pub const fn as_bytes(&self) -> &[u8; BUF32_LEN] {
                &self.0
            }

            /// Returns `true` if every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl From<[u8; BUF32_LEN]> for $name {
            fn from(bytes: [u8; BUF32_LEN]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; BUF32_LEN] {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = ParseBufError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                let array: [u8; BUF32_LEN] = bytes
                    .try_into()
                    .map_err(|_| ParseBufError::InvalidLength(bytes.len()))?;
                Ok(Self(array))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseBufError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s)?;
                Self::try_from(bytes.as_slice())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

/// A 32-byte ledger identity: issuers, administrators, program (emitter) addresses and mirror
/// targets all share this representation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; BUF32_LEN]);
impl_buf32!(Address);

/// `SHA-256` of a content identifier string; the primary key of issuance and mirrored records.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentIdHash([u8; BUF32_LEN]);
impl_buf32!(ContentIdHash);

impl ContentIdHash {
    /// Hashes a content identifier (e.g. a CID such as `"QmAAA"`).
    pub fn from_identifier(identifier: &str) -> Self {
        Self(Sha256::digest(identifier.as_bytes()).into())
    }
}

/// Caller-supplied digest of the credential content.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; BUF32_LEN]);
impl_buf32!(ContentHash);

/// Digest identifying an attested message for replay protection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AttestationDigest([u8; BUF32_LEN]);
impl_buf32!(AttestationDigest);

impl AttestationDigest {
    /// Computes `SHA-256(SHA-256(body))`.
    pub fn of_body(body: &[u8]) -> Self {
        let inner = Sha256::digest(body);
        Self(Sha256::digest(inner).into())
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// Prefix of every `spec_version` tag.
pub const PROTOCOL_PREFIX: &str = "nalt-protocol/";

/// A protocol version such as `1.1.0`.
///
/// Ordering is numeric by major, minor, patch. Parsing accepts both the bare
/// form (`1.2.0`) and the document tag form (`nalt-protocol/1.2.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl SpecVersion {
    pub const V1_0_0: SpecVersion = SpecVersion::new(1, 0, 0);
    pub const V1_1_0: SpecVersion = SpecVersion::new(1, 1, 0);
    pub const V1_1_1: SpecVersion = SpecVersion::new(1, 1, 1);
    pub const V1_2_0: SpecVersion = SpecVersion::new(1, 2, 0);

    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a bare or tagged version string.
    pub fn parse(input: &str) -> Result<Self> {
        let bare = input.strip_prefix(PROTOCOL_PREFIX).unwrap_or(input);
        let mut parts = bare.split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CoreError::InvalidVersion(input.to_string()));
        };

        let number = |part: &str| -> Result<u16> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CoreError::InvalidVersion(input.to_string()));
            }
            part.parse::<u16>()
                .map_err(|_| CoreError::InvalidVersion(input.to_string()))
        };

        Ok(Self::new(number(major)?, number(minor)?, number(patch)?))
    }

    /// The `spec_version` value a document of this version carries.
    pub fn tag(&self) -> String {
        format!("{PROTOCOL_PREFIX}{self}")
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SpecVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SpecVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

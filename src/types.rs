//! Core types used throughout partition routing.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Size of a record key digest in bytes.
pub const DIGEST_SIZE: usize = 20;

/// Maximum namespace length in characters.
pub const MAX_NAMESPACE_LEN: usize = 31;

/// Digest of a record key. Computed by the caller, consumed as-is here.
pub type Digest = [u8; DIGEST_SIZE];

/// Index of a partition within a namespace. The index is the id.
pub type PartitionId = u32;

/// Strong-consistency epoch of a partition assignment.
pub type Regime = u32;

/// A validated namespace name.
///
/// Case-sensitive, 1 to 31 printable ASCII characters. Space is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(SmolStr);

impl Namespace {
    /// Validate and wrap a namespace name.
    pub fn new(name: &str) -> Result<Self> {
        let valid = !name.is_empty()
            && name.len() <= MAX_NAMESPACE_LEN
            && name.bytes().all(|b| b.is_ascii_graphic() || b == b' ');

        if !valid {
            return Err(Error::InvalidNamespace(name.to_string()));
        }
        Ok(Self(SmolStr::new(name)))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Namespace {
    fn eq(&self, other: &str) -> bool {
        self.0.as_str() == other
    }
}

impl TryFrom<String> for Namespace {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl TryFrom<&str> for Namespace {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_validation() {
        assert!(Namespace::new("test").is_ok());
        assert!(Namespace::new(&"a".repeat(MAX_NAMESPACE_LEN)).is_ok());

        assert!(Namespace::new("").is_err());
        assert!(Namespace::new(&"a".repeat(MAX_NAMESPACE_LEN + 1)).is_err());
        assert!(Namespace::new("has space").is_ok());
        assert!(Namespace::new("tab\t").is_err());
        assert!(Namespace::new("new\nline").is_err());
        assert!(Namespace::new("caf\u{e9}").is_err());
    }

    #[test]
    fn test_namespace_case_sensitive() {
        let lower = Namespace::new("test").unwrap();
        let upper = Namespace::new("TEST").unwrap();
        assert_ne!(lower, upper);
        assert!(lower == *"test");
        assert_eq!(upper.as_str(), "TEST");
    }

    #[test]
    fn test_namespace_serde() {
        let ns = Namespace::new("bar").unwrap();
        let json = serde_json::to_string(&ns).unwrap();
        assert_eq!(json, "\"bar\"");

        let back: Namespace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ns);

        assert!(serde_json::from_str::<Namespace>("\"\"").is_err());
    }
}

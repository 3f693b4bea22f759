//! Validated hex identifiers for blobs and artifact trees.

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A lower-case hex digest naming a blob or an artifact tree.
///
/// Always exactly 40 (SHA-1) or 64 (SHA-256) characters from `0-9a-f`.
/// Ordering is plain string ordering.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Parse and validate identifier text.
    ///
    /// No normalization is applied: upper-case digits and any whitespace,
    /// including leading or trailing, are rejected.
    pub fn parse(text: &str) -> Result<Self> {
        if HashAlgorithm::from_hex_len(text.len()).is_none() {
            return Err(Error::invalid_identifier(format!(
                "Expected {} or {} hex characters, got {}",
                HashAlgorithm::Sha1.hex_len(),
                HashAlgorithm::Sha256.hex_len(),
                text.len()
            )));
        }

        if let Some((offset, c)) = text
            .char_indices()
            .find(|(_, c)| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(Error::invalid_identifier(format!(
                "Invalid character {:?} at offset {}",
                c, offset
            )));
        }

        Ok(Identifier(text.to_string()))
    }

    /// Wrap a raw digest produced by one of the supported algorithms.
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Identifier(hex::encode(digest))
    }

    /// The hex text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The algorithm implied by the identifier's length.
    pub fn algorithm(&self) -> HashAlgorithm {
        if self.0.len() == HashAlgorithm::Sha1.hex_len() {
            HashAlgorithm::Sha1
        } else {
            HashAlgorithm::Sha256
        }
    }

    /// Get the first 2 hex characters (for directory sharding).
    pub fn prefix(&self) -> &str {
        &self.0[..2]
    }

    /// Get the remaining hex characters (for filename).
    pub fn suffix(&self) -> &str {
        &self.0[2..]
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Content digests identifying stored PNGs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MD5 content digest of a stored PNG, as 32 lowercase hex characters.
///
/// Construction validates the text form; a `Digest` in hand is always
/// well-formed. Ordering is the lexicographic order of the hex text, which
/// is what diff-id canonicalization relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Length of the hex text form.
    pub const LEN: usize = 32;

    /// Validate and wrap a digest string.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(Error::invalid_digest(s))
        }
    }

    /// Digest of raw content bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(hex::encode(md5::compute(data).0))
    }

    /// The hex text form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid(s: &str) -> bool {
    s.len() == Digest::LEN
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.0
    }
}

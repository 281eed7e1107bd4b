//! Canonical identifiers for unordered digest pairs

use crate::digest::Digest;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical identifier for an unordered pair of digests.
///
/// The text form is `<left>-<right>` with `left <= right`, so
/// `DiffId::new(a, b)` and `DiffId::new(b, a)` produce the same id and the
/// same key can serve both lookup directions. Self-pairs are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiffId {
    left: Digest,
    right: Digest,
}

impl DiffId {
    /// Length of the text form: two digests and a dash.
    pub const LEN: usize = 2 * Digest::LEN + 1;

    /// Build the canonical id for the pair `{a, b}`.
    ///
    /// Symmetric in its arguments. Fails when `a == b`; self-diffs are
    /// meaningless and are never stored.
    pub fn new(a: &Digest, b: &Digest) -> Result<Self> {
        if a == b {
            return Err(Error::self_comparison(a.as_str()));
        }
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self {
            left: left.clone(),
            right: right.clone(),
        })
    }

    /// The lexicographically smaller digest.
    pub fn left(&self) -> &Digest {
        &self.left
    }

    /// The lexicographically larger digest.
    pub fn right(&self) -> &Digest {
        &self.right
    }

    /// The two digests in canonical (sorted) order.
    pub fn split(self) -> (Digest, Digest) {
        (self.left, self.right)
    }

    /// Whether either half of the pair is `digest`.
    pub fn contains(&self, digest: &Digest) -> bool {
        self.left == *digest || self.right == *digest
    }
}

impl fmt::Display for DiffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.left, self.right)
    }
}

impl FromStr for DiffId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != Self::LEN {
            return Err(Error::invalid_diff_id(s));
        }
        let (left, right) = s
            .split_once('-')
            .ok_or_else(|| Error::invalid_diff_id(s))?;
        let left = Digest::new(left).map_err(|_| Error::invalid_diff_id(s))?;
        let right = Digest::new(right).map_err(|_| Error::invalid_diff_id(s))?;
        if left == right {
            return Err(Error::self_comparison(left.as_str()));
        }
        if left > right {
            // Not canonical; the halves were stored swapped.
            return Err(Error::invalid_diff_id(s));
        }
        Ok(Self { left, right })
    }
}

impl TryFrom<String> for DiffId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DiffId> for String {
    fn from(id: DiffId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn digest(s: &str) -> Digest {
        Digest::new(s).unwrap()
    }

    #[test]
    fn test_symmetric() {
        let a = digest("0123456789abcdef0123456789abcdef");
        let b = digest("fedcba9876543210fedcba9876543210");
        assert_eq!(DiffId::new(&a, &b).unwrap(), DiffId::new(&b, &a).unwrap());
    }

    #[test]
    fn test_split_is_sorted() {
        let a = digest("fedcba9876543210fedcba9876543210");
        let b = digest("0123456789abcdef0123456789abcdef");
        let (left, right) = DiffId::new(&a, &b).unwrap().split();
        assert_eq!(left, b);
        assert_eq!(right, a);
    }

    #[test]
    fn test_rejects_self_pair() {
        let a = digest("0123456789abcdef0123456789abcdef");
        assert_eq!(
            DiffId::new(&a, &a),
            Err(Error::self_comparison(a.as_str()))
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let a = digest("0123456789abcdef0123456789abcdef");
        let b = digest("fedcba9876543210fedcba9876543210");
        let id = DiffId::new(&a, &b).unwrap();
        let parsed: DiffId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<DiffId>().is_err());
        assert!("abc-def".parse::<DiffId>().is_err());
        // Right length, wrong separator position.
        assert!(
            "0123456789abcdef0123456789abcdeff-edcba9876543210fedcba987654321"
                .parse::<DiffId>()
                .is_err()
        );
        // Non-canonical ordering.
        assert!(
            "fedcba9876543210fedcba9876543210-0123456789abcdef0123456789abcdef"
                .parse::<DiffId>()
                .is_err()
        );
        // Self pair.
        assert!(
            "0123456789abcdef0123456789abcdef-0123456789abcdef0123456789abcdef"
                .parse::<DiffId>()
                .is_err()
        );
    }

    #[test]
    fn test_contains() {
        let a = digest("0123456789abcdef0123456789abcdef");
        let b = digest("fedcba9876543210fedcba9876543210");
        let c = digest("00000000000000000000000000000000");
        let id = DiffId::new(&a, &b).unwrap();
        assert!(id.contains(&a));
        assert!(id.contains(&b));
        assert!(!id.contains(&c));
    }

    fn arb_digest() -> impl Strategy<Value = Digest> {
        proptest::array::uniform16(any::<u8>()).prop_map(|raw| {
            Digest::new(hex::encode(raw)).unwrap()
        })
    }

    proptest! {
        #[test]
        fn prop_symmetry(a in arb_digest(), b in arb_digest()) {
            prop_assume!(a != b);
            prop_assert_eq!(DiffId::new(&a, &b).unwrap(), DiffId::new(&b, &a).unwrap());
        }

        #[test]
        fn prop_split_returns_the_pair(a in arb_digest(), b in arb_digest()) {
            prop_assume!(a != b);
            let (left, right) = DiffId::new(&a, &b).unwrap().split();
            let mut expected = [a, b];
            expected.sort();
            prop_assert_eq!([left, right], expected);
        }

        #[test]
        fn prop_text_form_parses_back(a in arb_digest(), b in arb_digest()) {
            prop_assume!(a != b);
            let id = DiffId::new(&a, &b).unwrap();
            let text = id.to_string();
            prop_assert_eq!(text.len(), DiffId::LEN);
            prop_assert_eq!(text.parse::<DiffId>().unwrap(), id);
        }
    }
}

//! Key signature — order- and case-independent form of a key combination.
//!
//! `["Control", "K"]`, `["k", "CONTROL"]` and `["control", "k"]` all
//! normalize to the same signature, `control,k`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::HotkeyError;

/// Canonical representation of a set of key identifiers.
///
/// Keys are lower-cased, sorted and deduplicated. Two combinations are
/// equivalent iff their signatures compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct KeySignature(Vec<String>);

impl KeySignature {
    /// Normalize a sequence of key identifiers.
    ///
    /// Identifiers are taken verbatim apart from lower-casing, so `" "`
    /// is the space key. Fails with [`HotkeyError::InvalidInput`] only if
    /// the sequence is empty.
    ///
    /// Ordering is by code point of the lower-cased form, not locale
    /// collation; display order can differ from a collated listing.
    pub fn normalize<I, S>(keys: I) -> Result<Self, HotkeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_lowercase()).collect();
        if out.is_empty() {
            return Err(HotkeyError::InvalidInput(
                "expected at least one key identifier".into(),
            ));
        }
        out.sort_unstable();
        out.dedup();
        Ok(Self(out))
    }

    /// Normalize, returning `None` instead of an error.
    ///
    /// Used on the matching path where an empty key set is simply
    /// "nothing held".
    pub(crate) fn try_normalize<I, S>(keys: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::normalize(keys).ok()
    }

    /// The normalized key identifiers, in canonical order.
    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Number of distinct keys in the combination.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a signature holds at least one key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for KeySignature {
    type Error = HotkeyError;

    fn try_from(keys: Vec<String>) -> Result<Self, Self::Error> {
        Self::normalize(keys)
    }
}

impl From<KeySignature> for Vec<String> {
    fn from(signature: KeySignature) -> Self {
        signature.0
    }
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_and_case_insensitive() {
        let a = KeySignature::normalize(["A", "b"]).unwrap();
        let b = KeySignature::normalize(["B", "a"]).unwrap();
        let c = KeySignature::normalize(["a", "b"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.keys(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn idempotent() {
        let once = KeySignature::normalize(["Shift", "Control", "K"]).unwrap();
        let twice = KeySignature::normalize(once.keys()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn display_is_comma_joined() {
        let sig = KeySignature::normalize(["K", "Control"]).unwrap();
        assert_eq!(sig.to_string(), "control,k");
    }

    #[test]
    fn duplicate_keys_collapse() {
        let sig = KeySignature::normalize(["a", "A", "b"]).unwrap();
        assert_eq!(sig.len(), 2);
        assert_eq!(sig.to_string(), "a,b");
    }

    #[test]
    fn single_key() {
        let sig = KeySignature::normalize(["Escape"]).unwrap();
        assert_eq!(sig.to_string(), "escape");
        assert!(!sig.is_empty());
    }

    #[test]
    fn empty_sequence_is_invalid() {
        let err = KeySignature::normalize(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, HotkeyError::InvalidInput(_)));
    }

    #[test]
    fn whitespace_keys_are_distinct_identifiers() {
        let space = KeySignature::normalize([" "]).unwrap();
        assert_eq!(space.keys(), &[" ".to_string()]);

        // No trimming: " a" and "a" are different keys.
        let padded = KeySignature::normalize([" A", "b"]).unwrap();
        let plain = KeySignature::normalize(["a", "b"]).unwrap();
        assert_ne!(padded, plain);
        assert_eq!(padded.keys(), &[" a".to_string(), "b".to_string()]);
    }

    #[test]
    fn deserialize_normalizes() {
        let bytes = rmp_serde::to_vec(&vec!["K", "Control", "k"]).unwrap();
        let sig: KeySignature = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(sig, KeySignature::normalize(["control", "k"]).unwrap());

        let empty = rmp_serde::to_vec(&Vec::<String>::new()).unwrap();
        assert!(rmp_serde::from_slice::<KeySignature>(&empty).is_err());
    }

    #[test]
    fn serializes_as_key_list() {
        let sig = KeySignature::normalize(["B", "a"]).unwrap();
        let bytes = rmp_serde::to_vec(&sig).unwrap();
        let keys: Vec<String> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn try_normalize_empty_is_none() {
        assert!(KeySignature::try_normalize(Vec::<&str>::new()).is_none());
        assert!(KeySignature::try_normalize(["x"]).is_some());
    }
}

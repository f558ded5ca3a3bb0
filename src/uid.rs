//! `UniqueIdentifier`: hash-consed identity for variables and constants.
//!
//! An identifier is either a name (used for register/variable leaves) or a
//! numeric value (used for constant leaves). Both carry a precomputed
//! 64-bit hash so that expression hashing never has to re-hash the
//! underlying string or integer.

use core::cmp::Ordering;
use core::fmt;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Either a textual name or a numeric literal, immutable once constructed.
#[derive(Debug, Clone, Eq)]
pub struct UniqueIdentifier {
    value: UidValue,
    hash: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UidValue {
    Name(String),
    Number(i128),
}

impl UniqueIdentifier {
    /// Constructs a named identifier. Panics in debug builds if `name` is
    /// empty (a programming error per the invariant in spec §3, never
    /// checked in release).
    pub fn name<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "UniqueIdentifier name must not be empty");
        let hash = hash_of(&UidValue::Name(name.clone()));
        Self {
            value: UidValue::Name(name),
            hash,
        }
    }

    /// Constructs a numeric identifier.
    pub fn number(value: i128) -> Self {
        let hash = hash_of(&UidValue::Number(value));
        Self {
            value: UidValue::Number(value),
            hash,
        }
    }

    /// Returns whether this identifier is a numeric literal.
    pub fn is_numeric(&self) -> bool {
        matches!(self.value, UidValue::Number(_))
    }

    /// Returns whether this identifier is a textual name.
    pub fn is_string(&self) -> bool {
        matches!(self.value, UidValue::Name(_))
    }

    /// Returns the precomputed 64-bit hash.
    pub fn hash64(&self) -> u64 {
        self.hash
    }

    /// Returns the name, if this is a named identifier.
    pub fn as_name(&self) -> Option<&str> {
        match &self.value {
            UidValue::Name(s) => Some(s.as_str()),
            UidValue::Number(_) => None,
        }
    }

    /// Returns the numeric value, if this is a numeric identifier.
    pub fn as_number(&self) -> Option<i128> {
        match &self.value {
            UidValue::Number(n) => Some(*n),
            UidValue::Name(_) => None,
        }
    }

    /// Total order: hash first, then lexical representation, so that ties
    /// on the (extremely unlikely) hash collision still resolve
    /// deterministically.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.hash
            .cmp(&other.hash)
            .then_with(|| self.to_string().cmp(&other.to_string()))
    }
}

impl PartialEq for UniqueIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.value == other.value
    }
}

impl Hash for UniqueIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for UniqueIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for UniqueIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for UniqueIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            UidValue::Name(s) => write!(f, "{}", s),
            UidValue::Number(n) => write!(f, "{}", n),
        }
    }
}

fn hash_of(value: &UidValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_number_are_exclusive() {
        let a = UniqueIdentifier::name("reg_0_64");
        assert!(a.is_string());
        assert!(!a.is_numeric());

        let b = UniqueIdentifier::number(42);
        assert!(b.is_numeric());
        assert!(!b.is_string());
    }

    #[test]
    fn equality_is_by_hash_and_value() {
        let a = UniqueIdentifier::name("x");
        let b = UniqueIdentifier::name("x");
        let c = UniqueIdentifier::name("y");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.hash64(), b.hash64());
    }

    #[test]
    fn ordering_is_total() {
        let mut ids = vec![
            UniqueIdentifier::name("zzz"),
            UniqueIdentifier::number(1),
            UniqueIdentifier::name("aaa"),
            UniqueIdentifier::number(-5),
        ];
        ids.sort();
        // Whatever the order is, repeating the sort must be a fixed point.
        let mut twice = ids.clone();
        twice.sort();
        assert_eq!(ids, twice);
    }

    #[test]
    fn display_round_trips_lexical_form() {
        assert_eq!(UniqueIdentifier::name("reg_1_32").to_string(), "reg_1_32");
        assert_eq!(UniqueIdentifier::number(-7).to_string(), "-7");
    }
}

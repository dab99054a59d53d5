//! String comparison policies shared by every configuration entity.
//!
//! # Responsibilities
//! - Decide equality of configuration strings under a named policy
//! - Produce hashes consistent with that equality
//! - Order strings consistently with that equality (for stable output)
//!
//! # Design Decisions
//! - Policy is an explicit value attached at the comparison site, so
//!   destinations, clusters and routes share one implementation
//! - Ignore-case folds each char with the Unicode lowercase mapping; hashing
//!   feeds exactly the folded char stream, so equal values hash equally
//! - `None` is never equal to `Some`, and hashes as a fixed sentinel

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

const NONE_SENTINEL: u8 = 0;
const SOME_SENTINEL: u8 = 1;
// Terminates a folded string so ("ab", "c") and ("a", "bc") hash apart.
const END_OF_STRING: u32 = u32::MAX;

/// How two configuration strings are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringComparison {
    /// Exact, case-sensitive comparison.
    Ordinal,
    /// Case-insensitive comparison over lowercase-folded chars.
    OrdinalIgnoreCase,
}

impl StringComparison {
    pub fn equals(self, a: &str, b: &str) -> bool {
        match self {
            StringComparison::Ordinal => a == b,
            StringComparison::OrdinalIgnoreCase => {
                // Fast path for identical bytes, including the common all-lowercase case.
                a == b || fold(a).eq(fold(b))
            }
        }
    }

    pub fn equals_opt(self, a: Option<&str>, b: Option<&str>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.equals(a, b),
            _ => false,
        }
    }

    /// Element-wise comparison of two ordered sequences.
    pub fn equals_seq<S: AsRef<str>>(self, a: &[S], b: &[S]) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|(x, y)| self.equals(x.as_ref(), y.as_ref()))
    }

    pub fn equals_opt_seq<S: AsRef<str>>(self, a: Option<&[S]>, b: Option<&[S]>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.equals_seq(a, b),
            _ => false,
        }
    }

    pub fn hash<H: Hasher>(self, value: &str, state: &mut H) {
        match self {
            StringComparison::Ordinal => value.hash(state),
            StringComparison::OrdinalIgnoreCase => {
                for c in fold(value) {
                    state.write_u32(c as u32);
                }
                state.write_u32(END_OF_STRING);
            }
        }
    }

    pub fn hash_opt<H: Hasher>(self, value: Option<&str>, state: &mut H) {
        match value {
            None => state.write_u8(NONE_SENTINEL),
            Some(value) => {
                state.write_u8(SOME_SENTINEL);
                self.hash(value, state);
            }
        }
    }

    pub fn hash_seq<S: AsRef<str>, H: Hasher>(self, values: &[S], state: &mut H) {
        state.write_usize(values.len());
        for value in values {
            self.hash(value.as_ref(), state);
        }
    }

    pub fn hash_opt_seq<S: AsRef<str>, H: Hasher>(self, values: Option<&[S]>, state: &mut H) {
        match values {
            None => state.write_u8(NONE_SENTINEL),
            Some(values) => {
                state.write_u8(SOME_SENTINEL);
                self.hash_seq(values, state);
            }
        }
    }

    /// Total order consistent with [`StringComparison::equals`].
    pub fn cmp(self, a: &str, b: &str) -> Ordering {
        match self {
            StringComparison::Ordinal => a.cmp(b),
            StringComparison::OrdinalIgnoreCase => fold(a).cmp(fold(b)),
        }
    }
}

fn fold(value: &str) -> impl Iterator<Item = char> + '_ {
    value.chars().flat_map(char::to_lowercase)
}

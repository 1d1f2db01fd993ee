//! Index options.

use skipdb_codec::{Collation, Value};
use std::borrow::Cow;

/// Options of one index: uniqueness plus the collation its keys are
/// normalized with.
///
/// Keys are always stored normalized. Every comparison value handed to an
/// index must be normalized with the same options first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexOptions {
    /// Whether the index rejects a second node with an equal key.
    pub unique: bool,
    /// Normalization applied to keys and comparison values.
    pub collation: Collation,
}

impl Default for IndexOptions {
    /// Non-unique, case-insensitive, whitespace-trimmed, empty strings as null.
    fn default() -> Self {
        Self {
            unique: false,
            collation: Collation {
                ignore_case: true,
                trim_whitespace: true,
                empty_string_to_null: true,
            },
        }
    }
}

impl IndexOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that compare values exactly as stored.
    #[must_use]
    pub const fn binary() -> Self {
        Self {
            unique: false,
            collation: Collation::binary(),
        }
    }

    /// Makes this a unique index.
    #[must_use]
    pub const fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    /// Sets case folding.
    #[must_use]
    pub const fn ignore_case(mut self, value: bool) -> Self {
        self.collation = self.collation.ignore_case(value);
        self
    }

    /// Sets whitespace trimming.
    #[must_use]
    pub const fn trim_whitespace(mut self, value: bool) -> Self {
        self.collation = self.collation.trim_whitespace(value);
        self
    }

    /// Sets empty-string-to-null conversion.
    #[must_use]
    pub const fn empty_string_to_null(mut self, value: bool) -> Self {
        self.collation = self.collation.empty_string_to_null(value);
        self
    }

    /// Normalizes `value` under these options.
    pub fn normalize<'v>(&self, value: &'v Value) -> Cow<'v, Value> {
        value.normalize(&self.collation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_fold_text() {
        let options = IndexOptions::default();
        assert!(!options.unique);
        assert_eq!(
            options.normalize(&Value::from("  Lisbon ")).into_owned(),
            Value::from("lisbon")
        );
        assert_eq!(options.normalize(&Value::from("")).into_owned(), Value::Null);
    }

    #[test]
    fn binary_options_keep_text() {
        let options = IndexOptions::binary().unique(true);
        assert!(options.unique);
        assert_eq!(
            options.normalize(&Value::from(" A ")).into_owned(),
            Value::from(" A ")
        );
    }
}

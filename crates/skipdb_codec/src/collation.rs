//! Value normalization applied before index comparisons.

use crate::value::Value;
use std::borrow::Cow;

/// Normalization rules applied to values before they are ordered.
///
/// Only text values are affected. Applying the same collation twice yields the
/// same value as applying it once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Collation {
    /// Lower-case text before comparing.
    pub ignore_case: bool,
    /// Strip leading and trailing whitespace.
    pub trim_whitespace: bool,
    /// Treat an empty string (after trimming) as null.
    pub empty_string_to_null: bool,
}

impl Collation {
    /// A collation that leaves every value untouched.
    #[must_use]
    pub const fn binary() -> Self {
        Self {
            ignore_case: false,
            trim_whitespace: false,
            empty_string_to_null: false,
        }
    }

    /// Sets case folding.
    #[must_use]
    pub const fn ignore_case(mut self, value: bool) -> Self {
        self.ignore_case = value;
        self
    }

    /// Sets whitespace trimming.
    #[must_use]
    pub const fn trim_whitespace(mut self, value: bool) -> Self {
        self.trim_whitespace = value;
        self
    }

    /// Sets empty-string-to-null conversion.
    #[must_use]
    pub const fn empty_string_to_null(mut self, value: bool) -> Self {
        self.empty_string_to_null = value;
        self
    }

    /// Returns true if this collation never changes a value.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        !self.ignore_case && !self.trim_whitespace && !self.empty_string_to_null
    }
}

impl Value {
    /// Normalizes this value under `collation`.
    ///
    /// Borrows when nothing changes.
    pub fn normalize(&self, collation: &Collation) -> Cow<'_, Value> {
        let Value::Text(text) = self else {
            return Cow::Borrowed(self);
        };
        if collation.is_binary() {
            return Cow::Borrowed(self);
        }

        let trimmed = if collation.trim_whitespace {
            text.trim()
        } else {
            text.as_str()
        };

        if collation.empty_string_to_null && trimmed.is_empty() {
            return Cow::Owned(Value::Null);
        }

        if collation.ignore_case {
            let folded = trimmed.to_lowercase();
            if folded == *text {
                return Cow::Borrowed(self);
            }
            return Cow::Owned(Value::Text(folded));
        }

        if trimmed.len() == text.len() {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(Value::Text(trimmed.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_collation_borrows() {
        let v = Value::from("  Mixed ");
        assert!(matches!(v.normalize(&Collation::binary()), Cow::Borrowed(_)));
    }

    #[test]
    fn ignore_case_folds_text() {
        let c = Collation::binary().ignore_case(true);
        assert_eq!(Value::from("HeLLo").normalize(&c).into_owned(), Value::from("hello"));
        assert!(matches!(Value::from("hello").normalize(&c), Cow::Borrowed(_)));
    }

    #[test]
    fn trim_and_empty_to_null() {
        let c = Collation::binary()
            .trim_whitespace(true)
            .empty_string_to_null(true);
        assert_eq!(Value::from("  x ").normalize(&c).into_owned(), Value::from("x"));
        assert_eq!(Value::from("   ").normalize(&c).into_owned(), Value::Null);
        assert_eq!(Value::from("").normalize(&c).into_owned(), Value::Null);
    }

    #[test]
    fn non_text_is_untouched() {
        let c = Collation::binary().ignore_case(true).trim_whitespace(true);
        let v = Value::Integer(5);
        assert!(matches!(v.normalize(&c), Cow::Borrowed(_)));
    }

    #[test]
    fn normalization_is_idempotent() {
        let c = Collation::binary()
            .ignore_case(true)
            .trim_whitespace(true)
            .empty_string_to_null(true);
        for raw in [" A b ", "ABC", "", "  ", "déjà VU"] {
            let once = Value::from(raw).normalize(&c).into_owned();
            let twice = once.normalize(&c).into_owned();
            assert_eq!(once, twice, "collation not idempotent for {raw:?}");
        }
    }
}

//! Form field value objects

use chrono::NaiveDate;

/// Type-safe field values, one variant per field kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Option<f64>),
    Currency(u64),
    Date(Option<NaiveDate>),
    Select(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    /// Text content (empty for non-text variants).
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) | FieldValue::Select(s) => s,
            _ => "",
        }
    }

    /// Currency amount (0 for non-currency variants).
    pub fn as_currency(&self) -> u64 {
        match self {
            FieldValue::Currency(v) => *v,
            _ => 0,
        }
    }

    /// Date value, if this is a date field holding one.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => *d,
            _ => None,
        }
    }

    /// Numeric view of the value for validation and computation.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => *n,
            FieldValue::Currency(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) | FieldValue::Select(s) => s.is_empty(),
            FieldValue::Number(n) => n.is_none(),
            FieldValue::Currency(_) => false,
            FieldValue::Date(d) => d.is_none(),
        }
    }
}

/// Strip every non-digit character and parse the remainder as an integer.
/// Empty (or all-invalid) input maps to zero. Overflowing input saturates.
pub fn digits_to_amount(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_empty_text() {
        assert_eq!(FieldValue::default(), FieldValue::Text(String::new()));
    }

    #[test]
    fn test_as_text_across_variants() {
        assert_eq!(FieldValue::Text("hi".into()).as_text(), "hi");
        assert_eq!(FieldValue::Select("USD".into()).as_text(), "USD");
        assert_eq!(FieldValue::Currency(5).as_text(), "");
        assert_eq!(FieldValue::Date(None).as_text(), "");
    }

    #[test]
    fn test_as_number_covers_currency() {
        assert_eq!(FieldValue::Currency(50000).as_number(), Some(50000.0));
        assert_eq!(FieldValue::Number(Some(1.5)).as_number(), Some(1.5));
        assert_eq!(FieldValue::Text("7".into()).as_number(), None);
    }

    mod digit_stripping {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_strips_non_digits() {
            assert_eq!(digits_to_amount("50,000"), 50000);
            assert_eq!(digits_to_amount("$1 234"), 1234);
            assert_eq!(digits_to_amount("abc12x3"), 123);
        }

        #[test]
        fn test_empty_input_is_zero() {
            assert_eq!(digits_to_amount(""), 0);
            assert_eq!(digits_to_amount("abc"), 0);
        }

        #[test]
        fn test_overflow_saturates() {
            assert_eq!(digits_to_amount("99999999999999999999999"), u64::MAX);
        }
    }
}

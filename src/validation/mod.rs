//! Declarative validation engine
//!
//! Per-field checks are driven by the schema's declared constraints; the
//! cross-field rules in the registry run afterwards and never overwrite a
//! per-field error.

mod rules;

pub use rules::*;

use crate::schema::{FieldConfig, FormSchema};
use crate::state::FieldValue;
use chrono::Local;
use regex::Regex;
use std::collections::HashMap;

/// Outcome of validating a whole record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// `(field path, human-readable message)` pairs; empty means success.
    pub errors: Vec<(String, String)>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_str())
    }
}

/// Validate one field against its declared constraints.
pub fn validate_field(config: &FieldConfig, value: &FieldValue) -> Option<String> {
    let label = config.label();
    if config.is_required() && value.is_empty() {
        return Some(format!("{label} is required"));
    }

    match config {
        FieldConfig::Text { constraints, .. } => {
            let text = value.as_text().trim();
            if text.is_empty() {
                return None;
            }
            // Limits are in characters, not UTF-8 bytes.
            let length = text.chars().count();
            if let Some(min) = constraints.min_length {
                if length < min {
                    return Some(format!("{label} must be at least {min} characters"));
                }
            }
            if let Some(max) = constraints.max_length {
                if length > max {
                    return Some(format!("{label} must be at most {max} characters"));
                }
            }
            if let Some(pattern) = &constraints.pattern {
                match Regex::new(pattern) {
                    Ok(re) => {
                        if !re.is_match(text) {
                            return Some(format!("{label} contains invalid characters"));
                        }
                    }
                    Err(err) => {
                        tracing::warn!(field = %config.name(), %err, "invalid pattern constraint");
                    }
                }
            }
            None
        }
        FieldConfig::Textarea { constraints, .. } => {
            let text = value.as_text();
            if let Some(max) = constraints.max_length {
                if text.chars().count() > max {
                    return Some(format!("{label} must be at most {max} characters"));
                }
            }
            None
        }
        FieldConfig::Number { constraints, .. } | FieldConfig::Currency { constraints, .. } => {
            let Some(number) = value.as_number() else {
                return None;
            };
            if !number.is_finite() {
                return Some(format!("{label} must be a number"));
            }
            if let Some(min) = constraints.min {
                if number < min {
                    return Some(format!("{label} must be at least {min}"));
                }
            }
            if let Some(max) = constraints.max {
                if number > max {
                    return Some(format!("{label} must be at most {max}"));
                }
            }
            None
        }
        FieldConfig::Date { constraints, .. } => {
            let Some(date) = value.as_date() else {
                return None;
            };
            let today = Local::now().date_naive();
            if constraints.disable_future && date > today {
                return Some(format!("{label} cannot be in the future"));
            }
            if constraints.disable_past && date < today {
                return Some(format!("{label} cannot be in the past"));
            }
            if let Some(min) = constraints.min_date {
                if date < min {
                    return Some(format!("{label} must be on or after {min}"));
                }
            }
            if let Some(max) = constraints.max_date {
                if date > max {
                    return Some(format!("{label} must be on or before {max}"));
                }
            }
            None
        }
        FieldConfig::Select { options, .. } => {
            let selected = value.as_text();
            if !selected.is_empty() && !options.iter().any(|o| o.value == selected) {
                return Some(format!("{label} has an unsupported option"));
            }
            None
        }
        FieldConfig::Unknown { .. } => None,
    }
}

/// Validate the whole form: per-field constraints first, then the
/// cross-field rule registry. Cross-field failures attach to a single
/// field path and never replace an existing per-field error.
pub fn validate_form(
    schema: &FormSchema,
    values: &HashMap<String, FieldValue>,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    for config in schema.fields() {
        if config.is_unknown() {
            continue;
        }
        let Some(value) = values.get(config.name()) else {
            continue;
        };
        if let Some(message) = validate_field(config, value) {
            result.errors.push((config.name().to_string(), message));
        }
    }

    for rule in record_rules() {
        if let Some((field, message)) = rule(values) {
            if result.error_for(&field).is_none() {
                result.errors.push((field, message));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{load_schema, DEFAULT_SCHEMA_JSON};
    use crate::state::FormInstance;
    use chrono::{Days, NaiveDate};
    use pretty_assertions::assert_eq;

    fn schema() -> FormSchema {
        load_schema(DEFAULT_SCHEMA_JSON, Some("en-US")).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn valid_values(schema: &FormSchema) -> HashMap<String, FieldValue> {
        let mut instance = FormInstance::from_schema(schema);
        instance
            .values
            .insert("employerName".into(), FieldValue::Text("Acme Corp".into()));
        instance
            .values
            .insert("annualGrossIncome".into(), FieldValue::Currency(50000));
        instance.values.insert(
            "employmentStartDate".into(),
            FieldValue::Date(Some(date(2020, 3, 1))),
        );
        instance.values.insert(
            "employmentEndDate".into(),
            FieldValue::Date(Some(date(2023, 3, 1))),
        );
        instance.values
    }

    #[test]
    fn test_valid_record_passes() {
        let schema = schema();
        let values = valid_values(&schema);
        let result = validate_form(&schema, &values);
        assert!(result.is_ok(), "unexpected errors: {:?}", result.errors);
    }

    #[test]
    fn test_missing_required_fields() {
        let schema = schema();
        let instance = FormInstance::from_schema(&schema);
        let result = validate_form(&schema, &instance.values);
        assert!(result.error_for("employerName").is_some());
        assert!(result.error_for("employmentStartDate").is_some());
        // Optional fields stay clean.
        assert!(result.error_for("notes").is_none());
        assert!(result.error_for("employmentEndDate").is_none());
    }

    #[test]
    fn test_employer_name_pattern_rejects_markup() {
        let schema = schema();
        let mut values = valid_values(&schema);
        values.insert(
            "employerName".into(),
            FieldValue::Text("<script>alert(1)</script>".into()),
        );
        let result = validate_form(&schema, &values);
        assert!(result.error_for("employerName").is_some());
    }

    #[test]
    fn test_notes_length_counted_in_chars_not_bytes() {
        // 300 two-byte characters: under the 500-character cap even though
        // the byte length is 600.
        let schema = schema();
        let mut values = valid_values(&schema);
        values.insert("notes".into(), FieldValue::Text("é".repeat(300)));
        let result = validate_form(&schema, &values);
        assert!(result.error_for("notes").is_none());

        values.insert("notes".into(), FieldValue::Text("é".repeat(501)));
        let result = validate_form(&schema, &values);
        assert!(result.error_for("notes").is_some());
    }

    #[test]
    fn test_employer_name_over_100_chars_rejected() {
        let schema = schema();
        let mut values = valid_values(&schema);
        values.insert("employerName".into(), FieldValue::Text("a".repeat(101)));
        let result = validate_form(&schema, &values);
        assert!(result.error_for("employerName").is_some());
    }

    #[test]
    fn test_future_start_date_rejected() {
        let schema = schema();
        let mut values = valid_values(&schema);
        let future = Local::now().date_naive() + Days::new(10);
        values.insert("employmentStartDate".into(), FieldValue::Date(Some(future)));
        values.insert("employmentEndDate".into(), FieldValue::Date(None));
        let result = validate_form(&schema, &values);
        assert!(result.error_for("employmentStartDate").is_some());
    }

    #[test]
    fn test_end_on_start_day_rejected_cross_field() {
        let schema = schema();
        let mut values = valid_values(&schema);
        values.insert(
            "employmentEndDate".into(),
            FieldValue::Date(Some(date(2020, 3, 1))),
        );
        let result = validate_form(&schema, &values);
        assert_eq!(
            result.error_for("employmentEndDate"),
            Some("End date must be after the start date")
        );
    }

    #[test]
    fn test_income_zero_rejected_by_form_rules() {
        let schema = schema();
        let mut values = valid_values(&schema);
        values.insert("annualGrossIncome".into(), FieldValue::Currency(0));
        let result = validate_form(&schema, &values);
        assert!(result.error_for("annualGrossIncome").is_some());
    }

    #[test]
    fn test_income_over_billion_rejected() {
        let schema = schema();
        let mut values = valid_values(&schema);
        values.insert(
            "annualGrossIncome".into(),
            FieldValue::Currency(1_000_000_001),
        );
        let result = validate_form(&schema, &values);
        assert!(result.error_for("annualGrossIncome").is_some());
    }

    #[test]
    fn test_notes_over_500_chars_rejected() {
        let schema = schema();
        let mut values = valid_values(&schema);
        values.insert("notes".into(), FieldValue::Text("n".repeat(501)));
        let result = validate_form(&schema, &values);
        assert!(result.error_for("notes").is_some());

        values.insert("notes".into(), FieldValue::Text("n".repeat(500)));
        let result = validate_form(&schema, &values);
        assert!(result.error_for("notes").is_none());
    }

    #[test]
    fn test_cross_field_error_does_not_mask_per_field_error() {
        let schema = schema();
        let mut values = valid_values(&schema);
        // Unsupported option triggers the per-field select check; the
        // currency-code rule must not overwrite it.
        values.insert("currency".into(), FieldValue::Select("zz".into()));
        let result = validate_form(&schema, &values);
        let messages: Vec<&str> = result
            .errors
            .iter()
            .filter(|(f, _)| f == "currency")
            .map(|(_, m)| m.as_str())
            .collect();
        assert_eq!(messages.len(), 1);
    }
}

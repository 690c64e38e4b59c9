//! Standalone validators and the cross-field rule registry
//!
//! The standalone functions mirror the form-level constraints but are used
//! outside the form flow (export preflight, ad-hoc checks). Their bounds
//! differ from the form-level income rule at the lower edge; both call
//! sites keep their own semantics.

use crate::state::FieldValue;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const EMPLOYER_NAME_MAX: usize = 100;
pub const INCOME_MAX: f64 = 1_000_000_000.0;
pub const NOTES_MAX: usize = 500;

fn employer_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9\s\-.,&'()]+$").expect("employer name pattern is valid")
    })
}

/// Validate an employer name outside the form flow.
///
/// Trimmed length must be in [1, 100] and the value must match the
/// allowed-character pattern (no angle brackets or other markup-significant
/// characters).
pub fn validate_employer_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Employer name is required".into());
    }
    if trimmed.chars().count() > EMPLOYER_NAME_MAX {
        return Err(format!(
            "Employer name must be at most {EMPLOYER_NAME_MAX} characters"
        ));
    }
    if !employer_name_pattern().is_match(trimmed) {
        return Err("Employer name contains invalid characters".into());
    }
    Ok(())
}

/// Standalone income range check: accepts [0, 1_000_000_000] inclusive.
///
/// Note the zero bound: the form-level rule requires a strictly positive
/// income, this one admits zero.
pub fn income_within_limits(income: f64) -> bool {
    income.is_finite() && (0.0..=INCOME_MAX).contains(&income)
}

/// A cross-record rule: inspects the whole value map and attaches at most
/// one error to a single field path.
pub type RecordRule = fn(&HashMap<String, FieldValue>) -> Option<(String, String)>;

/// Rules applied after per-field checks, in order.
pub fn record_rules() -> &'static [RecordRule] {
    &[currency_code_rule, income_bounds_rule, end_after_start_rule]
}

/// Currency code must be exactly three ASCII uppercase letters.
fn currency_code_rule(values: &HashMap<String, FieldValue>) -> Option<(String, String)> {
    let code = values.get("currency")?.as_text();
    let valid = code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase());
    if valid {
        None
    } else {
        Some((
            "currency".into(),
            "Currency must be a three-letter uppercase code".into(),
        ))
    }
}

/// Form-level income bounds: strictly positive, at least 1, at most 1e9.
fn income_bounds_rule(values: &HashMap<String, FieldValue>) -> Option<(String, String)> {
    let income = values.get("annualGrossIncome")?.as_number()?;
    if !income.is_finite() || income <= 0.0 {
        return Some((
            "annualGrossIncome".into(),
            "Annual income must be greater than zero".into(),
        ));
    }
    if income < 1.0 {
        return Some((
            "annualGrossIncome".into(),
            "Annual income must be at least 1".into(),
        ));
    }
    if income > INCOME_MAX {
        return Some((
            "annualGrossIncome".into(),
            "Annual income must be at most 1,000,000,000".into(),
        ));
    }
    None
}

/// End date, when present, must be strictly after the start date. The
/// error attaches to the end-date field even though the rule spans two.
fn end_after_start_rule(values: &HashMap<String, FieldValue>) -> Option<(String, String)> {
    let start = values.get("employmentStartDate")?.as_date()?;
    let end = values.get("employmentEndDate")?.as_date()?;
    if end > start {
        None
    } else {
        Some((
            "employmentEndDate".into(),
            "End date must be after the start date".into(),
        ))
    }
}

//! Per-instance form state
//!
//! A `FormInstance` is created from the schema on mount, mutated by user
//! input and the validation engine, and discarded wholesale on reset.
//! Values are keyed by field name; ordering of edits is last-write-wins
//! per field.

use super::field_value::{digits_to_amount, FieldValue};
use crate::schema::{FieldConfig, FormSchema};
use chrono::{Local, NaiveDate};
use std::collections::{HashMap, HashSet};

/// Outcome of committing a date field's text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCommit {
    Accepted,
    Cleared,
    Invalid(String),
    OutOfRange(String),
}

#[derive(Debug, Clone, Default)]
pub struct FormInstance {
    /// Current value per field name.
    pub values: HashMap<String, FieldValue>,
    /// Current validation error per field name, absent when valid.
    pub errors: HashMap<String, String>,
    /// Submission in progress.
    pub submitting: bool,
    /// In-progress text for date and number fields (the picker bridge).
    pub edit_buffers: HashMap<String, String>,
    /// Fields that have failed validation at least once; these follow
    /// `reValidateMode` instead of `mode`.
    pub failed_once: HashSet<String>,
    /// Focusable field names in declaration order.
    field_order: Vec<String>,
    /// Index into `field_order`; `field_order.len()` is the actions row.
    active_index: usize,
    /// Selected button on the actions row.
    pub selected_action: usize,
}

impl FormInstance {
    /// Build a fresh instance with schema-derived defaults.
    pub fn from_schema(schema: &FormSchema) -> Self {
        let mut values = HashMap::new();
        let mut field_order = Vec::new();
        let mut active_index = 0;

        for field in schema.fields() {
            let default = match field {
                FieldConfig::Text { .. } | FieldConfig::Textarea { .. } => {
                    FieldValue::Text(String::new())
                }
                FieldConfig::Number { .. } => FieldValue::Number(None),
                FieldConfig::Currency { .. } => FieldValue::Currency(0),
                FieldConfig::Date { .. } => FieldValue::Date(None),
                FieldConfig::Select { options, default_value, .. } => {
                    // Seed from config before first paint.
                    let seed = default_value
                        .clone()
                        .or_else(|| options.first().map(|o| o.value.clone()))
                        .unwrap_or_default();
                    FieldValue::Select(seed)
                }
                FieldConfig::Unknown { .. } => continue,
            };
            values.insert(field.name().to_string(), default);

            let focusable = field
                .common()
                .map(|c| !c.disabled && !c.read_only)
                .unwrap_or(false);
            if focusable {
                if field.common().map(|c| c.auto_focus).unwrap_or(false) {
                    active_index = field_order.len();
                }
                field_order.push(field.name().to_string());
            }
        }

        Self {
            values,
            errors: HashMap::new(),
            submitting: false,
            edit_buffers: HashMap::new(),
            failed_once: HashSet::new(),
            field_order,
            active_index,
            selected_action: 0,
        }
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn set_error(&mut self, name: &str, message: String) {
        self.failed_once.insert(name.to_string());
        self.errors.insert(name.to_string(), message);
    }

    pub fn clear_error(&mut self, name: &str) {
        self.errors.remove(name);
    }

    pub fn has_failed_once(&self, name: &str) -> bool {
        self.failed_once.contains(name)
    }

    // --- focus -----------------------------------------------------------

    /// Name of the focused field, or None when the actions row is active.
    pub fn active_field(&self) -> Option<&str> {
        self.field_order.get(self.active_index).map(String::as_str)
    }

    pub fn is_field_active(&self, name: &str) -> bool {
        self.active_field() == Some(name)
    }

    pub fn is_actions_row_active(&self) -> bool {
        self.active_index == self.field_order.len()
    }

    /// Advance focus, wrapping through the actions row. Returns the name
    /// of the field that lost focus, for blur handling.
    pub fn next_field(&mut self) -> Option<String> {
        let blurred = self.active_field().map(str::to_string);
        self.active_index = (self.active_index + 1) % (self.field_order.len() + 1);
        blurred
    }

    pub fn prev_field(&mut self) -> Option<String> {
        let blurred = self.active_field().map(str::to_string);
        if self.active_index == 0 {
            self.active_index = self.field_order.len();
        } else {
            self.active_index -= 1;
        }
        blurred
    }

    pub fn next_action(&mut self, action_count: usize) {
        if action_count > 0 {
            self.selected_action = (self.selected_action + 1) % action_count;
        }
    }

    pub fn prev_action(&mut self, action_count: usize) {
        if action_count > 0 {
            if self.selected_action == 0 {
                self.selected_action = action_count - 1;
            } else {
                self.selected_action -= 1;
            }
        }
    }

    // --- editing ---------------------------------------------------------

    /// Apply a typed character to the focused field. Returns the field
    /// name when the model value changed.
    pub fn push_char(&mut self, config: &FieldConfig, c: char) -> Option<String> {
        let name = config.name().to_string();
        match config {
            FieldConfig::Text { .. } | FieldConfig::Textarea { .. } => {
                if let Some(FieldValue::Text(s)) = self.values.get_mut(&name) {
                    if c == '\n' && matches!(config, FieldConfig::Text { .. }) {
                        return None;
                    }
                    s.push(c);
                    return Some(name);
                }
                None
            }
            FieldConfig::Currency { .. } => {
                // Strip non-digits before they ever reach form state.
                let current = self
                    .values
                    .get(&name)
                    .map(FieldValue::as_currency)
                    .unwrap_or(0);
                let raw = format!("{current}{c}");
                let next = digits_to_amount(&raw);
                self.values.insert(name.clone(), FieldValue::Currency(next));
                (next != current).then_some(name)
            }
            FieldConfig::Number { .. } => {
                if c.is_ascii_digit() || c == '.' || c == '-' {
                    let buffer = self.edit_buffers.entry(name.clone()).or_default();
                    buffer.push(c);
                    let parsed = buffer.parse::<f64>().ok();
                    self.values.insert(name.clone(), FieldValue::Number(parsed));
                    return Some(name);
                }
                None
            }
            FieldConfig::Date { .. } => {
                if c.is_ascii_digit() || c == '-' {
                    let buffer = self.edit_buffers.entry(name.clone()).or_default();
                    if buffer.len() < 10 {
                        buffer.push(c);
                        return Some(name);
                    }
                }
                None
            }
            FieldConfig::Select { .. } => {
                // Space cycles forward through the fixed option list.
                if c == ' ' {
                    return self.cycle_option(config, 1);
                }
                None
            }
            FieldConfig::Unknown { .. } => None,
        }
    }

    /// Remove the last character from the focused field.
    pub fn pop_char(&mut self, config: &FieldConfig) -> Option<String> {
        let name = config.name().to_string();
        match config {
            FieldConfig::Text { .. } | FieldConfig::Textarea { .. } => {
                if let Some(FieldValue::Text(s)) = self.values.get_mut(&name) {
                    s.pop().map(|_| name)
                } else {
                    None
                }
            }
            FieldConfig::Currency { .. } => {
                let current = self
                    .values
                    .get(&name)
                    .map(FieldValue::as_currency)
                    .unwrap_or(0);
                let next = current / 10;
                self.values.insert(name.clone(), FieldValue::Currency(next));
                (next != current).then_some(name)
            }
            FieldConfig::Number { .. } | FieldConfig::Date { .. } => {
                let buffer = self.edit_buffers.entry(name.clone()).or_default();
                buffer.pop().map(|_| name)
            }
            FieldConfig::Select { .. } | FieldConfig::Unknown { .. } => None,
        }
    }

    /// Cycle a select field through its fixed option list.
    pub fn cycle_option(&mut self, config: &FieldConfig, step: isize) -> Option<String> {
        let FieldConfig::Select { common, options, .. } = config else {
            return None;
        };
        if options.is_empty() {
            return None;
        }
        let current = self
            .values
            .get(&common.name)
            .map(|v| v.as_text().to_string())
            .unwrap_or_default();
        let len = options.len() as isize;
        let idx = options
            .iter()
            .position(|o| o.value == current)
            .map(|i| i as isize)
            .unwrap_or(0);
        let next = (idx + step).rem_euclid(len) as usize;
        self.values.insert(
            common.name.clone(),
            FieldValue::Select(options[next].value.clone()),
        );
        Some(common.name.clone())
    }

    /// Bridge the date text buffer into a stored `NaiveDate`, enforcing
    /// min/max and future/past exclusion at the bridge rather than only in
    /// post-hoc validation. Called on blur of a date field.
    pub fn commit_date(&mut self, config: &FieldConfig) -> DateCommit {
        let FieldConfig::Date { common, constraints } = config else {
            return DateCommit::Invalid("not a date field".into());
        };
        let name = common.name.clone();
        let buffer = self.edit_buffers.get(&name).cloned().unwrap_or_default();

        if buffer.is_empty() {
            self.values.insert(name, FieldValue::Date(None));
            return DateCommit::Cleared;
        }

        let Ok(date) = NaiveDate::parse_from_str(&buffer, "%Y-%m-%d") else {
            return DateCommit::Invalid(format!("'{buffer}' is not a valid date (YYYY-MM-DD)"));
        };

        let today = Local::now().date_naive();
        if constraints.disable_future && date > today {
            return DateCommit::OutOfRange(format!("{} cannot be in the future", common.label));
        }
        if constraints.disable_past && date < today {
            return DateCommit::OutOfRange(format!("{} cannot be in the past", common.label));
        }
        if let Some(min) = constraints.min_date {
            if date < min {
                return DateCommit::OutOfRange(format!("{} must be on or after {min}", common.label));
            }
        }
        if let Some(max) = constraints.max_date {
            if date > max {
                return DateCommit::OutOfRange(format!("{} must be on or before {max}", common.label));
            }
        }

        self.values.insert(name, FieldValue::Date(Some(date)));
        DateCommit::Accepted
    }

    /// Raw text shown while a date or number field is being edited.
    pub fn edit_buffer(&self, name: &str) -> &str {
        self.edit_buffers
            .get(name)
            .map(String::as_str)
            .unwrap_or("")
    }
}

//! Application state and core logic

use crate::config::TuiConfig;
use crate::currency;
use crate::export::{build_export_record, export_record};
use crate::income::{calculate_total_income, Debouncer};
use crate::platform;
use crate::sanitize::sanitize;
use crate::schema::{
    load_schema, load_schema_file, ActionType, FieldConfig, FormSchema, DEFAULT_SCHEMA_JSON,
};
use crate::state::{DateCommit, FormInstance};
use crate::validation::validate_form;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use rust_decimal::Decimal;
use std::time::Duration;

/// Fields observed by the derived total-income computation.
const WATCHED_FIELDS: [&str; 4] = [
    "currency",
    "annualGrossIncome",
    "employmentStartDate",
    "employmentEndDate",
];

/// Quiet window before the derived total recomputes.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Main application struct
pub struct App {
    /// User configuration
    pub config: TuiConfig,
    /// The loaded form schema, immutable after startup
    pub schema: FormSchema,
    /// State of the active form instance
    pub instance: FormInstance,
    /// Debounce timer gating the derived total
    pub debouncer: Debouncer,
    /// Last computed total income
    pub total: Decimal,
    /// Success feedback shown in the status bar
    pub status_message: Option<String>,
    /// Failure feedback shown in the status bar
    pub error_message: Option<String>,
}

impl App {
    /// Create a new App instance from configuration.
    pub fn new(config: TuiConfig) -> Result<Self> {
        let locale = config
            .locale
            .clone()
            .or_else(currency::system_locale);

        let schema = match &config.schema_path {
            Some(path) => load_schema_file(path, locale.as_deref())?,
            None => load_schema(DEFAULT_SCHEMA_JSON, locale.as_deref())?,
        };

        let instance = FormInstance::from_schema(&schema);
        Ok(Self {
            config,
            schema,
            instance,
            debouncer: Debouncer::new(DEBOUNCE_WINDOW),
            total: Decimal::ZERO,
            status_message: None,
            error_message: None,
        })
    }

    /// Handle a key event.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Shortcuts work from anywhere in the form.
        if key.modifiers.contains(platform::SHORTCUT_MODIFIER) {
            match key.code {
                KeyCode::Char('s') => {
                    self.submit();
                    return Ok(());
                }
                KeyCode::Char('r') => {
                    self.reset();
                    return Ok(());
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                let blurred = self.instance.next_field();
                if let Some(name) = blurred {
                    self.on_blur(&name);
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                let blurred = self.instance.prev_field();
                if let Some(name) = blurred {
                    self.on_blur(&name);
                }
            }
            KeyCode::Enter => {
                if self.instance.is_actions_row_active() {
                    self.activate_selected_action();
                } else if self.active_is_textarea() {
                    self.type_char('\n');
                } else {
                    let blurred = self.instance.next_field();
                    if let Some(name) = blurred {
                        self.on_blur(&name);
                    }
                }
            }
            KeyCode::Left => {
                if self.instance.is_actions_row_active() {
                    self.instance.prev_action(self.action_count());
                } else {
                    self.cycle_active_select(-1);
                }
            }
            KeyCode::Right => {
                if self.instance.is_actions_row_active() {
                    self.instance.next_action(self.action_count());
                } else {
                    self.cycle_active_select(1);
                }
            }
            KeyCode::Backspace => {
                if let Some(config) = self.active_config() {
                    if let Some(changed) = self.instance.pop_char(&config) {
                        self.on_change(&changed);
                    }
                }
            }
            KeyCode::Char(c) => {
                if !self.instance.is_actions_row_active() {
                    self.type_char(c);
                }
            }
            KeyCode::Esc => {
                self.status_message = None;
                self.error_message = None;
            }
            _ => {}
        }
        Ok(())
    }

    /// The debounce window elapsed: recompute the derived total.
    pub fn on_debounce_fire(&mut self) {
        let income = self
            .instance
            .value("annualGrossIncome")
            .and_then(|v| v.as_number())
            .unwrap_or(0.0);
        let start = self
            .instance
            .value("employmentStartDate")
            .and_then(|v| v.as_date());
        let end = self
            .instance
            .value("employmentEndDate")
            .and_then(|v| v.as_date());
        self.total = calculate_total_income(income, start, end);
        tracing::debug!(total = %self.total, "recomputed derived total");
    }

    /// Validate and export the current record.
    pub fn submit(&mut self) {
        self.status_message = None;
        self.error_message = None;
        self.instance.submitting = true;

        // Bring any in-progress date text into the model first.
        let bridge_ok = self.commit_all_dates();

        let result = validate_form(&self.schema, &self.instance.values);
        if !bridge_ok || !result.is_ok() {
            for (field, message) in result.errors {
                self.instance.set_error(&field, message);
            }
            self.error_message =
                Some("Please fix the highlighted fields before exporting".to_string());
            self.instance.submitting = false;
            return;
        }
        self.instance.errors.clear();

        let record = build_export_record(&self.instance.values);
        match sanitize(&record) {
            Ok(snapshot) => match export_record(&snapshot, &self.config.export_dir()) {
                Ok(path) => {
                    self.status_message = Some(format!("Exported to {}", path.display()));
                }
                Err(err) => {
                    self.error_message = Some(err.user_message().to_string());
                }
            },
            Err(err) => {
                tracing::error!(error = %err, "sanitization rejected the record");
                self.error_message =
                    Some("Could not prepare the record for export. Nothing was written.".into());
            }
        }

        self.instance.submitting = false;
    }

    /// Discard the form instance and start fresh. Cancels any pending
    /// derived-total timer so a stale fire cannot land in the new instance.
    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.instance = FormInstance::from_schema(&self.schema);
        self.total = Decimal::ZERO;
        self.error_message = None;
        self.status_message = Some("Form reset".to_string());
    }

    // --- internals -------------------------------------------------------

    fn action_count(&self) -> usize {
        self.schema
            .actions
            .iter()
            .filter(|a| a.action_type != ActionType::Unknown)
            .count()
    }

    fn active_config(&self) -> Option<FieldConfig> {
        let name = self.instance.active_field()?;
        self.schema.field(name).cloned()
    }

    fn active_is_textarea(&self) -> bool {
        matches!(self.active_config(), Some(FieldConfig::Textarea { .. }))
    }

    fn type_char(&mut self, c: char) {
        if let Some(config) = self.active_config() {
            if let Some(changed) = self.instance.push_char(&config, c) {
                self.on_change(&changed);
            }
        }
    }

    fn cycle_active_select(&mut self, step: isize) {
        if let Some(config) = self.active_config() {
            if let Some(changed) = self.instance.cycle_option(&config, step) {
                self.on_change(&changed);
            }
        }
    }

    fn activate_selected_action(&mut self) {
        let actions: Vec<_> = self
            .schema
            .actions
            .iter()
            .filter(|a| a.action_type != ActionType::Unknown)
            .map(|a| a.action_type)
            .collect();
        match actions.get(self.instance.selected_action) {
            Some(ActionType::Submit) => self.submit(),
            Some(ActionType::Reset) => self.reset(),
            Some(ActionType::Button) => {}
            _ => {}
        }
    }

    /// A watched field's model value changed.
    fn on_change(&mut self, name: &str) {
        if WATCHED_FIELDS.contains(&name) {
            self.debouncer.touch();
        }
        if self.validation_runs(name, true) {
            self.apply_validation_for(name);
        }
    }

    /// Focus left a field.
    fn on_blur(&mut self, name: &str) {
        if let Some(config @ FieldConfig::Date { .. }) = self.schema.field(name).cloned().as_ref() {
            match self.instance.commit_date(config) {
                DateCommit::Accepted | DateCommit::Cleared => {
                    self.instance.clear_error(name);
                    if WATCHED_FIELDS.contains(&name) {
                        self.debouncer.touch();
                    }
                }
                DateCommit::Invalid(message) | DateCommit::OutOfRange(message) => {
                    // Bridge enforcement: the out-of-range value never
                    // reached form state; surface why.
                    self.instance.set_error(name, message);
                    return;
                }
            }
        }
        if self.validation_runs(name, false) {
            self.apply_validation_for(name);
        }
    }

    fn validation_runs(&self, name: &str, on_change: bool) -> bool {
        let mode = if self.instance.has_failed_once(name) {
            self.schema.re_validate_mode()
        } else {
            self.schema.validation_mode()
        };
        if on_change {
            mode.runs_on_change()
        } else {
            mode.runs_on_blur()
        }
    }

    /// Re-run the whole-form validation and update one field's error slot.
    fn apply_validation_for(&mut self, name: &str) {
        let result = validate_form(&self.schema, &self.instance.values);
        match result.error_for(name) {
            Some(message) => self.instance.set_error(name, message.to_string()),
            None => self.instance.clear_error(name),
        }
    }

    /// Commit every date field's buffer; false when any bridge rejects.
    fn commit_all_dates(&mut self) -> bool {
        let date_configs: Vec<FieldConfig> = self
            .schema
            .fields()
            .filter(|f| matches!(f, FieldConfig::Date { .. }))
            .cloned()
            .collect();

        let mut all_ok = true;
        for config in &date_configs {
            match self.instance.commit_date(config) {
                DateCommit::Accepted | DateCommit::Cleared => {}
                DateCommit::Invalid(message) | DateCommit::OutOfRange(message) => {
                    self.instance.set_error(config.name(), message);
                    all_ok = false;
                }
            }
        }
        all_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Local};
    use crossterm::event::{KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "employment-form-app-test-{tag}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn test_app(tag: &str) -> App {
        let config = TuiConfig {
            schema_path: None,
            locale: Some("en-US".to_string()),
            export_dir: Some(temp_dir(tag)),
        };
        App::new(config).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn tab(app: &mut App) {
        app.handle_key(key(KeyCode::Tab)).unwrap();
    }

    /// Focus order in the default schema: employerName, currency,
    /// annualGrossIncome, employmentStartDate, employmentEndDate, notes.
    fn fill_valid_form(app: &mut App) {
        type_str(app, "Acme Corp");
        tab(app); // currency keeps its seeded default
        tab(app);
        type_str(app, "50000");
        tab(app);
        type_str(app, "2020-03-01");
        tab(app);
        type_str(app, "2023-03-01");
        tab(app);
        type_str(app, "solid employer");
        tab(app); // onto actions row
    }

    #[tokio::test]
    async fn test_new_with_missing_schema_file_errors() {
        // Startup failures must come back as a plain Err so the caller can
        // report them before any terminal setup happens.
        let config = TuiConfig {
            schema_path: Some(PathBuf::from("/nonexistent/schema.json")),
            locale: None,
            export_dir: None,
        };
        assert!(App::new(config).is_err());
    }

    #[tokio::test]
    async fn test_on_blur_validates_required_field() {
        let mut app = test_app("blur");
        // Leave employerName empty and move away: onBlur mode flags it.
        tab(&mut app);
        assert!(app.instance.error("employerName").is_some());
    }

    #[tokio::test]
    async fn test_on_change_does_not_validate_before_first_failure() {
        let mut app = test_app("mode");
        // Default mode is onBlur; typing alone must not produce errors.
        type_str(&mut app, "<bad>");
        assert!(app.instance.error("employerName").is_none());
    }

    #[tokio::test]
    async fn test_failed_field_revalidates_on_change() {
        let mut app = test_app("revalidate");
        tab(&mut app); // blur empty employerName -> error
        app.handle_key(key(KeyCode::BackTab)).unwrap(); // back onto it
        assert!(app.instance.error("employerName").is_some());
        // reValidateMode is onChange: the first valid keystroke clears it.
        type_str(&mut app, "A");
        assert!(app.instance.error("employerName").is_none());
    }

    #[tokio::test]
    async fn test_future_start_date_error_surfaces_on_blur() {
        let mut app = test_app("future");
        tab(&mut app);
        tab(&mut app);
        tab(&mut app); // onto employmentStartDate
        let future = (Local::now().date_naive() + Days::new(7))
            .format("%Y-%m-%d")
            .to_string();
        type_str(&mut app, &future);
        tab(&mut app);
        assert!(app.instance.error("employmentStartDate").is_some());
    }

    #[tokio::test]
    async fn test_submit_with_invalid_form_reports_and_blocks() {
        let mut app = test_app("invalid-submit");
        app.submit();
        assert!(app.error_message.is_some());
        assert!(app.status_message.is_none());
        assert!(app.instance.error("employerName").is_some());
        assert!(!app.instance.submitting);
    }

    #[tokio::test]
    async fn test_submit_happy_path_exports_sanitized_record() {
        let mut app = test_app("happy");
        fill_valid_form(&mut app);

        // Make the employer name carry characters that need escaping.
        app.instance.values.insert(
            "employerName".into(),
            crate::state::FieldValue::Text("Smith & Sons".into()),
        );

        app.submit();
        assert_eq!(app.error_message, None);
        let status = app.status_message.clone().unwrap();
        assert!(status.starts_with("Exported to"), "got: {status}");

        let dir = app.config.export_dir();
        let entry = fs::read_dir(&dir).unwrap().next().unwrap().unwrap();
        let written = fs::read_to_string(entry.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["employerName"], "Smith &amp; Sons");
        assert_eq!(parsed["annualGrossIncome"], 50000);
        assert_eq!(parsed["employmentStartDate"], "2020-03-01");
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_income_schedules_debounced_recompute() {
        let mut app = test_app("debounce");
        tab(&mut app);
        tab(&mut app); // onto annualGrossIncome
        type_str(&mut app, "50000");
        assert!(!app.debouncer.try_fire(), "no fire inside the window");

        tokio::time::sleep(Duration::from_millis(510)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(app.debouncer.try_fire());
    }

    #[tokio::test]
    async fn test_recompute_total_for_exact_year() {
        let mut app = test_app("total");
        fill_valid_form(&mut app);
        app.on_debounce_fire();
        assert_eq!(app.total, dec!(150000.00));
    }

    #[tokio::test]
    async fn test_reset_discards_instance_and_total() {
        let mut app = test_app("reset");
        fill_valid_form(&mut app);
        app.on_debounce_fire();
        assert!(app.total > Decimal::ZERO);

        app.reset();
        assert_eq!(app.total, Decimal::ZERO);
        assert_eq!(
            app.instance.value("employerName").unwrap().as_text(),
            ""
        );
        assert!(!app.debouncer.try_fire(), "stale fire suppressed after reset");
    }

    #[tokio::test]
    async fn test_select_cycles_with_arrow_keys() {
        let mut app = test_app("select");
        tab(&mut app); // onto currency
        let before = app.instance.value("currency").unwrap().as_text().to_string();
        app.handle_key(key(KeyCode::Right)).unwrap();
        let after = app.instance.value("currency").unwrap().as_text().to_string();
        assert_ne!(before, after);
        app.handle_key(key(KeyCode::Left)).unwrap();
        let back = app.instance.value("currency").unwrap().as_text().to_string();
        assert_eq!(before, back);
    }

    #[tokio::test]
    async fn test_actions_row_enter_triggers_submit() {
        let mut app = test_app("actions");
        fill_valid_form(&mut app);
        assert!(app.instance.is_actions_row_active());
        // Move to the submit action (reset is declared first).
        app.handle_key(key(KeyCode::Right)).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.status_message.is_some() || app.error_message.is_some());
        let _ = fs::remove_dir_all(app.config.export_dir());
    }
}

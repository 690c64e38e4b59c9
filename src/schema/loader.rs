//! Schema document loading and post-load fixups

use super::model::{FieldConfig, FormSchema};
use crate::currency;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// The schema document compiled into the binary, used when no override
/// path is configured.
pub const DEFAULT_SCHEMA_JSON: &str = include_str!("../../assets/employment_form.json");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),
    #[error("duplicate field name in schema: {0}")]
    DuplicateField(String),
}

/// Parse a schema document and apply post-load fixups.
///
/// Field names must be unique across the whole schema (form state is keyed
/// by name). Unrecognized field types have already been demoted to
/// `Unknown` carriers by deserialization; they are logged here once.
///
/// The currency select's default value is overwritten by the runtime
/// locale-derived default when one is available; the schema literal is the
/// fallback.
pub fn load_schema(json: &str, locale: Option<&str>) -> Result<FormSchema, SchemaError> {
    let mut schema: FormSchema = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    for field in schema.fields() {
        if let FieldConfig::Unknown { name, raw_type } = field {
            tracing::warn!(field = %name, field_type = %raw_type, "skipping unrecognized field type");
            continue;
        }
        if !seen.insert(field.name().to_string()) {
            return Err(SchemaError::DuplicateField(field.name().to_string()));
        }
    }

    inject_currency_default(&mut schema, locale);
    Ok(schema)
}

/// Load a schema from a file path instead of the embedded document.
pub fn load_schema_file(path: &Path, locale: Option<&str>) -> Result<FormSchema, SchemaError> {
    let json = std::fs::read_to_string(path)?;
    load_schema(&json, locale)
}

fn inject_currency_default(schema: &mut FormSchema, locale: Option<&str>) {
    let runtime_default = locale
        .map(str::to_string)
        .or_else(currency::system_locale)
        .map(|l| currency::default_currency_for_locale(&l).to_string());

    let Some(runtime_default) = runtime_default else {
        return;
    };

    for section in &mut schema.sections {
        for group in &mut section.groups {
            for field in &mut group.fields {
                if let FieldConfig::Select { common, default_value, .. } = field {
                    if common.name == "currency" {
                        *default_value = Some(runtime_default);
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::ValidationMode;
    use pretty_assertions::assert_eq;

    fn currency_default(schema: &FormSchema) -> Option<String> {
        schema.fields().find_map(|f| match f {
            FieldConfig::Select { common, default_value, .. } if common.name == "currency" => {
                default_value.clone()
            }
            _ => None,
        })
    }

    #[test]
    fn test_default_schema_parses() {
        let schema = load_schema(DEFAULT_SCHEMA_JSON, Some("en-US")).unwrap();
        assert_eq!(schema.id, "employment-form");
        assert_eq!(schema.fields().count(), 6);
        assert_eq!(schema.actions.len(), 2);
        assert_eq!(schema.validation_mode(), ValidationMode::OnBlur);
        assert_eq!(schema.re_validate_mode(), ValidationMode::OnChange);
    }

    #[test]
    fn test_field_names_are_unique_in_default_schema() {
        let schema = load_schema(DEFAULT_SCHEMA_JSON, Some("en-US")).unwrap();
        let names: Vec<&str> = schema.fields().map(|f| f.name()).collect();
        let mut deduped = names.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
    }

    #[test]
    fn test_duplicate_field_name_is_rejected() {
        let json = r#"{
            "id": "dup",
            "sections": [{
                "id": "s",
                "groups": [{"fields": [
                    {"type": "text", "name": "a", "label": "A"},
                    {"type": "text", "name": "a", "label": "A again"}
                ]}]
            }],
            "actions": []
        }"#;
        let err = load_schema(json, Some("en-US")).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(name) if name == "a"));
    }

    #[test]
    fn test_unknown_field_type_survives_load() {
        let json = r#"{
            "id": "mixed",
            "sections": [{
                "id": "s",
                "groups": [{"fields": [
                    {"type": "slider", "name": "volume", "label": "Volume"},
                    {"type": "text", "name": "ok", "label": "Ok"}
                ]}]
            }],
            "actions": []
        }"#;
        let schema = load_schema(json, Some("en-US")).unwrap();
        assert_eq!(schema.fields().count(), 2);
        assert!(schema.field("volume").unwrap().is_unknown());
        assert!(!schema.field("ok").unwrap().is_unknown());
    }

    #[test]
    fn test_runtime_currency_default_wins_over_schema_literal() {
        let schema = load_schema(DEFAULT_SCHEMA_JSON, Some("en-GB")).unwrap();
        assert_eq!(currency_default(&schema).as_deref(), Some("GBP"));
    }

    #[test]
    fn test_unmatched_locale_injects_usd_fallback() {
        let schema = load_schema(DEFAULT_SCHEMA_JSON, Some("zz-ZZ")).unwrap();
        assert_eq!(currency_default(&schema).as_deref(), Some("USD"));
    }

    #[test]
    fn test_malformed_document_is_a_parse_error() {
        let err = load_schema("{not json", Some("en-US")).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }
}

//! Declarative form schema model
//!
//! A schema document describes sections of grouped fields plus the action
//! row. `FieldConfig` is a tagged union over the field type: the shape of
//! the extra attributes is fully determined by the tag, and an unrecognized
//! tag is carried as `Unknown` so rendering can skip it without failing
//! the whole form.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub sections: Vec<FormSection>,
    #[serde(default)]
    pub actions: Vec<FormAction>,
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
    #[serde(default)]
    pub validation: Option<ValidationConfig>,
}

impl FormSchema {
    /// All fields across sections and groups, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.sections
            .iter()
            .flat_map(|s| s.groups.iter())
            .flat_map(|g| g.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields().find(|f| f.name() == name)
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.validation
            .as_ref()
            .map(|v| v.mode)
            .unwrap_or(ValidationMode::OnBlur)
    }

    pub fn re_validate_mode(&self) -> ValidationMode {
        self.validation
            .as_ref()
            .map(|v| v.re_validate_mode)
            .unwrap_or(ValidationMode::OnChange)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSection {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub groups: Vec<FieldGroup>,
}

/// Presentation-only grouping of fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGroup {
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub direction: Option<GroupDirection>,
    #[serde(default)]
    pub spacing: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    #[serde(default)]
    pub max_width: Option<u16>,
    #[serde(default)]
    pub padding: Option<u16>,
    #[serde(default)]
    pub spacing: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    #[serde(default = "default_re_validate_mode")]
    pub re_validate_mode: ValidationMode,
}

fn default_re_validate_mode() -> ValidationMode {
    ValidationMode::OnChange
}

/// When (re)validation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    OnChange,
    OnBlur,
    OnSubmit,
    All,
}

impl ValidationMode {
    pub fn runs_on_change(self) -> bool {
        matches!(self, ValidationMode::OnChange | ValidationMode::All)
    }

    pub fn runs_on_blur(self) -> bool {
        matches!(self, ValidationMode::OnBlur | ValidationMode::All)
    }
}

/// Attributes shared by every field variant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldCommon {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub placeholder: Option<String>,
    pub disabled: bool,
    pub read_only: bool,
    pub auto_focus: bool,
    pub aria_label: Option<String>,
    pub grid_span: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextConstraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateConstraints {
    pub min_date: Option<chrono::NaiveDate>,
    pub max_date: Option<chrono::NaiveDate>,
    pub disable_future: bool,
    pub disable_past: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextareaConstraints {
    pub rows: Option<u16>,
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// One declared input, tagged by its `type`.
#[derive(Debug, Clone)]
pub enum FieldConfig {
    Text {
        common: FieldCommon,
        constraints: TextConstraints,
    },
    Number {
        common: FieldCommon,
        constraints: NumberConstraints,
    },
    Currency {
        common: FieldCommon,
        constraints: NumberConstraints,
    },
    Date {
        common: FieldCommon,
        constraints: DateConstraints,
    },
    Textarea {
        common: FieldCommon,
        constraints: TextareaConstraints,
    },
    Select {
        common: FieldCommon,
        options: Vec<SelectOption>,
        default_value: Option<String>,
    },
    /// Carrier for an unrecognized `type` tag: rendering skips it with a
    /// warning, the rest of the form continues.
    Unknown { name: String, raw_type: String },
}

impl FieldConfig {
    pub fn name(&self) -> &str {
        match self {
            FieldConfig::Text { common, .. }
            | FieldConfig::Number { common, .. }
            | FieldConfig::Currency { common, .. }
            | FieldConfig::Date { common, .. }
            | FieldConfig::Textarea { common, .. }
            | FieldConfig::Select { common, .. } => &common.name,
            FieldConfig::Unknown { name, .. } => name,
        }
    }

    pub fn common(&self) -> Option<&FieldCommon> {
        match self {
            FieldConfig::Text { common, .. }
            | FieldConfig::Number { common, .. }
            | FieldConfig::Currency { common, .. }
            | FieldConfig::Date { common, .. }
            | FieldConfig::Textarea { common, .. }
            | FieldConfig::Select { common, .. } => Some(common),
            FieldConfig::Unknown { .. } => None,
        }
    }

    pub fn label(&self) -> &str {
        self.common().map(|c| c.label.as_str()).unwrap_or("")
    }

    pub fn is_required(&self) -> bool {
        self.common().map(|c| c.required).unwrap_or(false)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FieldConfig::Unknown { .. })
    }
}

impl<'de> Deserialize<'de> for FieldConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let tag = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::missing_field("type"))?
            .to_string();

        let parse_common = |raw: &Value| -> Result<FieldCommon, D::Error> {
            serde_json::from_value(raw.clone()).map_err(D::Error::custom)
        };

        match tag.as_str() {
            "text" => Ok(FieldConfig::Text {
                common: parse_common(&raw)?,
                constraints: serde_json::from_value(raw).map_err(D::Error::custom)?,
            }),
            "number" => Ok(FieldConfig::Number {
                common: parse_common(&raw)?,
                constraints: serde_json::from_value(raw).map_err(D::Error::custom)?,
            }),
            "currency" => Ok(FieldConfig::Currency {
                common: parse_common(&raw)?,
                constraints: serde_json::from_value(raw).map_err(D::Error::custom)?,
            }),
            "date" => Ok(FieldConfig::Date {
                common: parse_common(&raw)?,
                constraints: serde_json::from_value(raw).map_err(D::Error::custom)?,
            }),
            "textarea" => Ok(FieldConfig::Textarea {
                common: parse_common(&raw)?,
                constraints: serde_json::from_value(raw).map_err(D::Error::custom)?,
            }),
            "select" => {
                let options = raw
                    .get("options")
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(D::Error::custom)?
                    .unwrap_or_default();
                let default_value = raw
                    .get("defaultValue")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(FieldConfig::Select {
                    common: parse_common(&raw)?,
                    options,
                    default_value,
                })
            }
            other => Ok(FieldConfig::Unknown {
                name: raw
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                raw_type: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAction {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Submit,
    Reset,
    Button,
    /// Unknown action types render nothing.
    #[serde(other)]
    Unknown,
}

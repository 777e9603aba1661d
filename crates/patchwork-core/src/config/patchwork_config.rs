//! Configuration types for patchwork

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::PatchworkError;

/// Root configuration document
///
/// ```toml
/// [rules]
/// RCS1031 = "warn"
/// RCS0063 = "off"
///
/// [options]
/// blank_line_between_switch_sections = "omit_after_block"
///
/// [formatter]
/// indentStyle = "spaces"
/// indentSize = 4
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatchworkConfig {
    /// JSON schema reference, ignored by the loader
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Severity overrides keyed by diagnostic id
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Severity per diagnostic id: off, info, warn or error")]
    pub rules: Option<BTreeMap<String, RuleSeverity>>,

    /// Style options read by individual rules
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Rule style options, e.g. blank_line_between_switch_sections")]
    pub options: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<FormatterConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixes: Option<FixConfiguration>,
}

/// Rule severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Disable the rule
    Off,
    Info,
    Warn,
    Error,
}

/// Indent style for the formatter pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    #[default]
    Spaces,
    Tabs,
}

/// Formatter configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatterConfiguration {
    #[schemars(description = "Indentation style: 'spaces' or 'tabs'")]
    pub indent_style: Option<IndentStyle>,

    #[schemars(description = "Columns per indentation level")]
    pub indent_size: Option<usize>,
}

impl FormatterConfiguration {
    pub fn indent_style(&self) -> IndentStyle {
        self.indent_style.unwrap_or_default()
    }

    pub fn indent_size(&self) -> usize {
        self.indent_size.filter(|size| *size > 0).unwrap_or(4)
    }
}

impl Default for FormatterConfiguration {
    fn default() -> Self {
        Self {
            indent_style: Some(IndentStyle::Spaces),
            indent_size: Some(4),
        }
    }
}

/// Fix application settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixConfiguration {
    /// Reject fixes whose result has more syntax errors than their input
    #[schemars(description = "Reject fixes that introduce syntax errors")]
    pub validate_syntax: Option<bool>,
}

impl FixConfiguration {
    pub fn validate_syntax(&self) -> bool {
        self.validate_syntax.unwrap_or(true)
    }
}

impl Default for FixConfiguration {
    fn default() -> Self {
        Self {
            validate_syntax: Some(true),
        }
    }
}

impl PatchworkConfig {
    /// Load configuration from a file, picking the format from its extension
    ///
    /// `.toml` is TOML, `.yaml`/`.yml` is YAML, `.json`/`.jsonc` is JSON with
    /// comments and trailing commas.
    pub fn load(path: &Path) -> Result<Self, PatchworkError> {
        let content = fs::read_to_string(path).map_err(|e| PatchworkError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        let parsed = match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") | Some("jsonc") => json5::from_str(&content).map_err(|e| e.to_string()),
            _ => Err(
                "unsupported file extension (expected .toml, .json, .jsonc, .yaml or .yml)"
                    .to_string(),
            ),
        };

        parsed.map_err(|message| {
            PatchworkError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                message
            ))
        })
    }

    pub fn formatter_config(&self) -> FormatterConfiguration {
        self.formatter.clone().unwrap_or_default()
    }

    pub fn fix_config(&self) -> FixConfiguration {
        self.fixes.clone().unwrap_or_default()
    }

    pub fn rule_severity(&self, id: &str) -> Option<RuleSeverity> {
        self.rules.as_ref()?.get(id).copied()
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.as_ref()?.get(key).map(String::as_str)
    }

    /// JSON schema of the configuration document
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(PatchworkConfig);
        let mut value = schema.to_value();
        value["title"] = serde_json::json!("patchwork configuration");
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_severity_serialization() {
        let json = serde_json::to_string(&RuleSeverity::Warn).unwrap();
        assert_eq!(json, r#""warn""#);
        let parsed: RuleSeverity = serde_json::from_str(r#""off""#).unwrap();
        assert_eq!(parsed, RuleSeverity::Off);
    }

    #[test]
    fn test_defaults() {
        let config = PatchworkConfig::default();
        assert_eq!(config.formatter_config().indent_size(), 4);
        assert_eq!(config.formatter_config().indent_style(), IndentStyle::Spaces);
        assert!(config.fix_config().validate_syntax());
        assert_eq!(config.rule_severity("RCS1031"), None);
        assert_eq!(config.option("missing"), None);
    }

    #[test]
    fn test_zero_indent_size_falls_back() {
        let formatter = FormatterConfiguration {
            indent_style: None,
            indent_size: Some(0),
        };
        assert_eq!(formatter.indent_size(), 4);
    }

    #[test]
    fn test_camel_case_fields() {
        let config: PatchworkConfig = serde_json::from_str(
            r#"{ "formatter": { "indentStyle": "tabs", "indentSize": 2 }, "fixes": { "validateSyntax": false } }"#,
        )
        .unwrap();
        assert_eq!(config.formatter_config().indent_style(), IndentStyle::Tabs);
        assert_eq!(config.formatter_config().indent_size(), 2);
        assert!(!config.fix_config().validate_syntax());
    }

    #[test]
    fn test_json_schema_lists_sections() {
        let schema = PatchworkConfig::json_schema();
        let properties = &schema["properties"];
        for key in ["rules", "options", "formatter", "fixes"] {
            assert!(properties.get(key).is_some(), "missing {key}");
        }
    }
}

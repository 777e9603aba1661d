//! Read-only view of configuration handed to rules

use std::str::FromStr;
use std::sync::Arc;

use super::patchwork_config::{FixConfiguration, FormatterConfiguration, PatchworkConfig};
use crate::diagnostics::{DiagnosticDescriptor, Severity};
use crate::semantic::ReferenceCatalog;

/// Options for one analysis or fix run
///
/// Cheap to clone; every clone shares the same configuration and reference
/// catalog.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    config: Arc<PatchworkConfig>,
    catalog: Arc<ReferenceCatalog>,
}

impl AnalyzerOptions {
    pub fn new(config: PatchworkConfig) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::default(),
        }
    }

    /// Replace the referenced library semantic models are built against
    pub fn with_catalog(mut self, catalog: ReferenceCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn config(&self) -> &PatchworkConfig {
        &self.config
    }

    pub fn catalog(&self) -> Arc<ReferenceCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Effective severity of a rule, `None` when it is switched off
    ///
    /// An explicit entry under `rules` wins; otherwise the descriptor's
    /// defaults apply.
    pub fn rule_severity(&self, descriptor: &DiagnosticDescriptor) -> Option<Severity> {
        match self.config.rule_severity(descriptor.id) {
            Some(severity) => Severity::from_rule_severity(severity),
            None if descriptor.enabled_by_default => Some(descriptor.default_severity),
            None => None,
        }
    }

    pub fn is_enabled(&self, descriptor: &DiagnosticDescriptor) -> bool {
        self.rule_severity(descriptor).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.option(key)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse an option, falling back to `default` when it is absent or does
    /// not parse
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.get(key) else {
            return default;
        };
        match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparsable value {raw:?} for option '{key}'");
                default
            }
        }
    }

    pub fn formatter(&self) -> FormatterConfiguration {
        self.config.formatter_config()
    }

    pub fn fixes(&self) -> FixConfiguration {
        self.config.fix_config()
    }
}

impl From<PatchworkConfig> for AnalyzerOptions {
    fn from(config: PatchworkConfig) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSeverity;
    use std::collections::BTreeMap;

    const ON: DiagnosticDescriptor =
        DiagnosticDescriptor::new("RCS0001", "On", "On", "Style", Severity::Info);
    const OFF: DiagnosticDescriptor =
        DiagnosticDescriptor::new("RCS0002", "Off", "Off", "Style", Severity::Info)
            .disabled_by_default();

    fn options(rules: &[(&str, RuleSeverity)], values: &[(&str, &str)]) -> AnalyzerOptions {
        AnalyzerOptions::new(PatchworkConfig {
            rules: Some(
                rules
                    .iter()
                    .map(|(id, severity)| (id.to_string(), *severity))
                    .collect(),
            ),
            options: Some(
                values
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        })
    }

    #[test]
    fn test_descriptor_defaults_apply_without_entry() {
        let options = AnalyzerOptions::default();
        assert_eq!(options.rule_severity(&ON), Some(Severity::Info));
        assert!(!options.is_enabled(&OFF));
    }

    #[test]
    fn test_configuration_overrides_defaults() {
        let options = options(
            &[("RCS0001", RuleSeverity::Off), ("RCS0002", RuleSeverity::Error)],
            &[],
        );
        assert!(!options.is_enabled(&ON));
        assert_eq!(options.rule_severity(&OFF), Some(Severity::Error));
    }

    #[test]
    fn test_option_accessors() {
        let options = options(&[], &[("mode", "omit"), ("width", "wide")]);
        assert_eq!(options.get("mode"), Some("omit"));
        assert_eq!(options.get_or("missing", "include"), "include");
        assert_eq!(options.parse_or("width", 80u32), 80);
        assert_eq!(options.parse_or("missing", true), true);
    }

    #[test]
    fn test_catalog_is_shared_by_clones() {
        let options = AnalyzerOptions::default().with_catalog(ReferenceCatalog::legacy());
        let clone = options.clone();
        assert!(Arc::ptr_eq(&options.catalog(), &clone.catalog()));
        assert!(!clone
            .catalog()
            .has_static_method("ArgumentNullException", "ThrowIfNull", 1));
    }
}

//! Configuration system for patchwork
//!
//! - TOML, JSON/JSONC and YAML configuration files
//! - Auto-discovery by walking up directories
//! - Strong typing with serde and JSON Schema generation via schemars
//!
//! ## Configuration Files
//!
//! Searched for in each directory, first match wins:
//! `.patchworkrc.toml`, `.patchworkrc.json`, `patchwork.jsonc`,
//! `patchwork.json`, `patchwork.yaml`.
//!
//! ## Example Configuration
//!
//! ```jsonc
//! {
//!   "rules": {
//!     "RCS1031": "warn",
//!     "RCS0063": "off"
//!   },
//!   "options": {
//!     // include | omit | omit_after_block
//!     "blank_line_between_switch_sections": "omit_after_block"
//!   },
//!   "formatter": { "indentStyle": "spaces", "indentSize": 4 },
//!   "fixes": { "validateSyntax": true }
//! }
//! ```
//!
//! Rules never see the document itself; they read it through
//! [`AnalyzerOptions`].

mod loader;
mod options;
mod patchwork_config;

pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
pub use options::AnalyzerOptions;
pub use patchwork_config::{
    FixConfiguration, FormatterConfiguration, IndentStyle, PatchworkConfig, RuleSeverity,
};

//! Built-in rules

use std::sync::Arc;

use once_cell::sync::Lazy;
use patchwork_core::{RegistryBuilder, Result, RuleRegistry};

pub mod argument_null_check;
pub mod blank_line_between_switch_sections;
pub mod boolean_comparison;
pub mod duplicate_enum_value;
pub mod generate_enum_member;
pub mod redundant_constructor;
pub mod switch_section_braces;
pub mod unnecessary_blank_line;

#[cfg(test)]
mod testing;

type RegisterFn = fn(&mut RegistryBuilder) -> Result<()>;

/// Registration table, in the order descriptors are listed
const RULES: &[RegisterFn] = &[
    switch_section_braces::register,
    redundant_constructor::register,
    argument_null_check::register,
    duplicate_enum_value::register,
    boolean_comparison::register,
    blank_line_between_switch_sections::register,
    unnecessary_blank_line::register,
    generate_enum_member::register,
];

static REGISTRY: Lazy<Arc<RuleRegistry>> = Lazy::new(|| match builtin_rules() {
    Ok(registry) => Arc::new(registry),
    Err(err) => {
        // Broken table; serve an empty registry
        tracing::error!("Failed to register built-in rules: {}", err);
        Arc::new(RuleRegistry::empty())
    }
});

/// The shared registry of built-in rules, built on first use
pub fn registry() -> Arc<RuleRegistry> {
    Arc::clone(&REGISTRY)
}

/// Build a fresh registry holding every built-in rule
pub fn builtin_rules() -> Result<RuleRegistry> {
    let mut builder = RuleRegistry::builder();
    for register in RULES {
        register(&mut builder)?;
    }
    builder.build()
}

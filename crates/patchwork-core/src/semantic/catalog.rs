//! Referenced types that are not declared in the document

use serde::{Deserialize, Serialize};

/// A method of a referenced type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMethod {
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    /// Parameter type names
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub return_type: Option<String>,
}

/// A referenced type and the members rules ask about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceType {
    pub namespace: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_reference_type: bool,
    #[serde(default)]
    pub methods: Vec<ReferenceMethod>,
}

fn default_true() -> bool {
    true
}

impl ReferenceType {
    pub fn class(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            is_reference_type: true,
            methods: Vec::new(),
        }
    }

    pub fn value_type(namespace: &str, name: &str) -> Self {
        Self {
            is_reference_type: false,
            ..Self::class(namespace, name)
        }
    }

    pub fn with_static_method(mut self, name: &str, parameters: &[&str]) -> Self {
        self.methods.push(ReferenceMethod {
            name: name.to_string(),
            is_static: true,
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            return_type: Some("void".to_string()),
        });
        self
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn method(&self, name: &str) -> Option<&ReferenceMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// The set of referenced types visible to a document
///
/// The default catalog models a modern base class library. Tests that need an
/// older target build their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    types: Vec<ReferenceType>,
}

impl ReferenceCatalog {
    pub fn empty() -> Self {
        Self { types: Vec::new() }
    }

    pub fn with_type(mut self, ty: ReferenceType) -> Self {
        self.types.retain(|t| t.full_name() != ty.full_name());
        self.types.push(ty);
        self
    }

    pub fn types(&self) -> &[ReferenceType] {
        &self.types
    }

    /// Look a type up by simple or namespace-qualified name
    pub fn lookup(&self, name: &str) -> Option<&ReferenceType> {
        self.types
            .iter()
            .find(|t| t.name == name || t.full_name() == name)
    }

    /// Whether `type_name` has a static method `method` taking `arity`
    /// parameters
    pub fn has_static_method(&self, type_name: &str, method: &str, arity: usize) -> bool {
        self.lookup(type_name).is_some_and(|ty| {
            ty.methods
                .iter()
                .any(|m| m.is_static && m.name == method && m.parameters.len() == arity)
        })
    }

    /// The base library without `ArgumentNullException.ThrowIfNull`
    pub fn legacy() -> Self {
        Self::default().with_type(ReferenceType::class("System", "ArgumentNullException"))
    }
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::empty()
            .with_type(ReferenceType::class("System", "Object"))
            .with_type(ReferenceType::class("System", "String"))
            .with_type(ReferenceType::class("System", "Exception"))
            .with_type(ReferenceType::class("System", "ArgumentException"))
            .with_type(
                ReferenceType::class("System", "ArgumentNullException")
                    .with_static_method("ThrowIfNull", &["object"]),
            )
            .with_type(ReferenceType::class("System", "InvalidOperationException"))
            .with_type(ReferenceType::class("System", "IDisposable"))
            .with_type(ReferenceType::value_type("System", "Guid"))
            .with_type(ReferenceType::value_type("System", "DateTime"))
            .with_type(ReferenceType::value_type("System", "TimeSpan"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_has_throw_if_null() {
        let catalog = ReferenceCatalog::default();
        assert!(catalog.has_static_method("ArgumentNullException", "ThrowIfNull", 1));
        assert!(catalog.has_static_method("System.ArgumentNullException", "ThrowIfNull", 1));
        assert!(!catalog.has_static_method("ArgumentNullException", "ThrowIfNull", 2));
    }

    #[test]
    fn test_legacy_catalog_lacks_throw_if_null() {
        let catalog = ReferenceCatalog::legacy();
        assert!(catalog.lookup("ArgumentNullException").is_some());
        assert!(!catalog.has_static_method("ArgumentNullException", "ThrowIfNull", 1));
    }

    #[test]
    fn test_catalog_deserializes_from_json() {
        let catalog: ReferenceCatalog = serde_json::from_str(
            r#"{ "types": [ { "namespace": "System", "name": "Guid", "is_reference_type": false } ] }"#,
        )
        .unwrap();
        let guid = catalog.lookup("System.Guid").expect("type");
        assert!(!guid.is_reference_type);
        assert!(guid.methods.is_empty());
    }
}

//! Transform Registry - Look up transforms by name
//!
//! Built once at startup from the built-in schemas and read-only afterwards.
//! Names are matched case-insensitively; legacy names resolve through aliases.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::transform::definitions::builtin;
use crate::transform::pipeline::{SchemaTransform, Transform};

/// Listing entry for a registered transform
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformInfo {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
}

/// Registry mapping names to transforms
#[derive(Clone, Default)]
pub struct TransformRegistry {
    /// Canonical lowercase name -> transform
    transforms: BTreeMap<String, Arc<dyn Transform>>,
    /// Lowercase alias -> canonical lowercase name
    aliases: HashMap<String, String>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in transform
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for schema in builtin() {
            let name = schema.name;
            let aliases = schema.aliases;
            registry.register(Arc::new(SchemaTransform::new(schema)));
            for alias in aliases {
                registry.alias(alias, name);
            }
        }
        registry
    }

    /// Register a transform under its own name, replacing any previous one
    pub fn register(&mut self, transform: Arc<dyn Transform>) {
        self.transforms.insert(key(transform.name()), transform);
    }

    /// Make `alias` resolve to the transform registered as `name`
    pub fn alias(&mut self, alias: &str, name: &str) {
        self.aliases.insert(key(alias), key(name));
    }

    /// Get a transform by name or alias
    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        let wanted = key(name);
        let canonical = self.aliases.get(&wanted).unwrap_or(&wanted);
        self.transforms.get(canonical).cloned()
    }

    /// Check if a name resolves to a transform
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Canonical names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.transforms.values().map(|t| t.name()).collect()
    }

    /// All transforms with their aliases
    pub fn list(&self) -> Vec<TransformInfo> {
        self.transforms
            .iter()
            .map(|(canonical, transform)| {
                let mut aliases: Vec<String> = self
                    .aliases
                    .iter()
                    .filter(|(_, target)| *target == canonical)
                    .map(|(alias, _)| alias.clone())
                    .collect();
                aliases.sort();
                TransformInfo {
                    name: transform.name().to_string(),
                    description: transform.description().to_string(),
                    aliases,
                }
            })
            .collect()
    }

    /// Iterate over registered transforms
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Transform>> {
        self.transforms.values()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registered() {
        let registry = TransformRegistry::with_builtin();

        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.names(),
            vec!["conexiones", "metrics_new_scheme", "programadas", "rq", "topes"]
        );
    }

    #[test]
    fn test_lookup_case_insensitive_and_aliases() {
        let registry = TransformRegistry::with_builtin();

        assert_eq!(registry.get("TOPES").unwrap().name(), "topes");
        assert_eq!(registry.get(" rq ").unwrap().name(), "rq");
        assert_eq!(
            registry.get("limpieza_datos_metrics_New_Escheme").unwrap().name(),
            "metrics_new_scheme"
        );
        assert_eq!(registry.get("limpieza_datos_RQ").unwrap().name(), "rq");
        assert!(registry.get("limpieza_datos_nomina").is_none());
        assert!(!registry.contains(""));
    }

    #[test]
    fn test_list_includes_aliases() {
        let registry = TransformRegistry::with_builtin();
        let list = registry.list();
        let topes = list.iter().find(|t| t.name == "topes").unwrap();

        assert_eq!(topes.aliases, vec!["limpieza_datos_topes"]);
        assert!(!topes.description.is_empty());
    }

    #[test]
    fn test_empty_registry() {
        let registry = TransformRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("rq").is_none());
    }
}

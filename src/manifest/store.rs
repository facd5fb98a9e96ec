//! JSON-backed manifest store
//!
//! Reads the `variables` object of a manifest file. Values may reference
//! other variables as `$(name)`; references are expanded on lookup.

use super::ManifestStore;
use crate::error::ManifestError;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Matches a `$(name)` variable reference
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\(([^)]+)\)").unwrap());

/// Snapshot of manifest variables loaded from a JSON file
#[derive(Debug, Clone, Default)]
pub struct JsonManifestStore {
    /// Source file, if loaded from disk
    path: Option<PathBuf>,
    /// Raw (unexpanded) variable values
    variables: BTreeMap<String, String>,
}

impl JsonManifestStore {
    /// Load a manifest file from disk
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))?;
        let mut store = Self::parse(&content, path)?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Parse manifest content; `path` is only used for error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let root: Value = serde_json::from_str(content)
            .map_err(|e| ManifestError::json_parse_error(path, e.to_string()))?;

        let Some(section) = root.get("variables") else {
            return Err(ManifestError::json_parse_error(
                path,
                "missing 'variables' object",
            ));
        };
        let Some(section) = section.as_object() else {
            return Err(ManifestError::json_parse_error(
                path,
                "'variables' is not an object",
            ));
        };

        let mut variables = BTreeMap::new();
        for (name, value) in section {
            let value = match value {
                Value::String(s) => s.clone(),
                other => {
                    return Err(ManifestError::invalid_variable(
                        name,
                        format!("expected a string, found {}", other),
                    ))
                }
            };
            variables.insert(name.clone(), value);
        }

        Ok(Self {
            path: None,
            variables,
        })
    }

    /// Build a store directly from name/value pairs
    pub fn from_variables<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            path: None,
            variables: variables
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the file this store was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the raw value of a variable without expanding references
    pub fn raw_value(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Returns all variable names
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    fn expand(&self, name: &str, stack: &mut Vec<String>) -> Result<String, ManifestError> {
        if stack.iter().any(|n| n == name) {
            return Err(ManifestError::circular_reference(name));
        }
        let raw = self
            .variables
            .get(name)
            .ok_or_else(|| ManifestError::missing_variable(name))?;

        if !raw.contains("$(") {
            return Ok(raw.clone());
        }

        stack.push(name.to_string());
        let mut expanded = String::with_capacity(raw.len());
        let mut last = 0;
        for caps in REFERENCE_RE.captures_iter(raw) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            expanded.push_str(&raw[last..whole.start()]);
            expanded.push_str(&self.expand(&caps[1], stack)?);
            last = whole.end();
        }
        expanded.push_str(&raw[last..]);
        stack.pop();

        Ok(expanded)
    }
}

impl ManifestStore for JsonManifestStore {
    fn get_variable_value(&self, name: &str) -> Result<String, ManifestError> {
        self.expand(name, &mut Vec::new())
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn is_reference(&self, name: &str) -> bool {
        self.variables
            .get(name)
            .is_some_and(|raw| REFERENCE_RE.is_match(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
  "readme": "README.md",
  "variables": {
    "base-url|public": "mcr.microsoft.com",
    "runtime|9.0|build-version": "9.0.0",
    "runtime|9.0|product-version": "$(runtime|9.0|build-version)",
    "chisel|9.0|version": "v1.0.0",
    "chisel|9.0|url": "https://example.com/chisel/$(chisel|9.0|version)/chisel.tar.gz"
  },
  "repos": []
}"#;

    fn store() -> JsonManifestStore {
        JsonManifestStore::parse(MANIFEST, Path::new("manifest.versions.json")).unwrap()
    }

    #[test]
    fn test_get_plain_value() {
        assert_eq!(
            store()
                .get_variable_value("runtime|9.0|build-version")
                .unwrap(),
            "9.0.0"
        );
    }

    #[test]
    fn test_get_expanded_value() {
        let store = store();
        assert_eq!(
            store
                .get_variable_value("runtime|9.0|product-version")
                .unwrap(),
            "9.0.0"
        );
        assert_eq!(
            store.get_variable_value("chisel|9.0|url").unwrap(),
            "https://example.com/chisel/v1.0.0/chisel.tar.gz"
        );
        assert_eq!(
            store.raw_value("runtime|9.0|product-version"),
            Some("$(runtime|9.0|build-version)")
        );
    }

    #[test]
    fn test_missing_variable() {
        let err = store().get_variable_value("sdk|9.0|build-version").unwrap_err();
        assert!(matches!(err, ManifestError::MissingVariable { ref name } if name == "sdk|9.0|build-version"));
    }

    #[test]
    fn test_missing_reference_target() {
        let store = JsonManifestStore::from_variables([("a", "$(b)")]);
        let err = store.get_variable_value("a").unwrap_err();
        assert!(matches!(err, ManifestError::MissingVariable { ref name } if name == "b"));
    }

    #[test]
    fn test_circular_reference() {
        let store = JsonManifestStore::from_variables([("a", "$(b)"), ("b", "x-$(a)")]);
        let err = store.get_variable_value("a").unwrap_err();
        assert!(matches!(err, ManifestError::CircularReference { .. }));
    }

    #[test]
    fn test_has_variable() {
        let store = store();
        assert!(store.has_variable("chisel|9.0|version"));
        assert!(!store.has_variable("chisel|8.0|version"));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = JsonManifestStore::parse("{ not json", Path::new("m.json")).unwrap_err();
        assert!(matches!(err, ManifestError::JsonParseError { .. }));
    }

    #[test]
    fn test_parse_missing_variables_section() {
        let err = JsonManifestStore::parse(r#"{"repos": []}"#, Path::new("m.json")).unwrap_err();
        assert!(format!("{}", err).contains("missing 'variables'"));
    }

    #[test]
    fn test_parse_non_string_variable() {
        let err =
            JsonManifestStore::parse(r#"{"variables": {"x": 1}}"#, Path::new("m.json")).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidVariable { .. }));
    }

    #[test]
    fn test_is_reference() {
        let store = store();
        assert!(store.is_reference("runtime|9.0|product-version"));
        assert!(store.is_reference("chisel|9.0|url"));
        assert!(!store.is_reference("runtime|9.0|build-version"));
        assert!(!store.is_reference("missing"));
    }

    #[test]
    fn test_load_not_found() {
        let err = JsonManifestStore::load(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.versions.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let store = JsonManifestStore::load(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.variable_names().count(), 5);
    }
}

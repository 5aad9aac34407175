//! Engine configuration
//!
//! [`MigrationConfig`] can be built in code with the `with_*` methods or
//! loaded from a TOML or YAML file:
//!
//! ```toml
//! enabled = true
//! revert_symbols_on_overlay_failure = false
//! max_staged_edits = 4096
//!
//! [rules]
//! controller_compatible = "snps,dwc3"
//! ```

use crate::migrator::MigrationRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    /// Master switch; a disabled engine never touches the tree
    pub enabled: bool,

    /// Also revert the symbol table when the overlay fails
    pub revert_symbols_on_overlay_failure: bool,

    /// Staged-edit cap per change set (`None` = unlimited)
    pub max_staged_edits: Option<usize>,

    /// Property and node selection rules
    pub rules: MigrationRules,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            revert_symbols_on_overlay_failure: false,
            max_staged_edits: None,
            rules: MigrationRules::default(),
        }
    }
}

impl MigrationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With master switch
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// With symbol revert on overlay failure
    #[inline]
    #[must_use]
    pub fn with_revert_symbols_on_overlay_failure(mut self, revert: bool) -> Self {
        self.revert_symbols_on_overlay_failure = revert;
        self
    }

    /// With staged-edit cap
    #[inline]
    #[must_use]
    pub fn with_max_staged_edits(mut self, limit: usize) -> Self {
        self.max_staged_edits = Some(limit);
        self
    }

    /// With migration rules
    #[inline]
    #[must_use]
    pub fn with_rules(mut self, rules: MigrationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns error on invalid TOML or unknown fields
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse YAML
    ///
    /// # Errors
    /// Returns error on invalid YAML or unknown fields
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(ConfigError::Yaml)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, has another extension or
    /// does not parse
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid YAML
    #[error("invalid YAML: {0}")]
    Yaml(#[source] serde_yaml::Error),

    /// Extension not recognised
    #[error("unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MigrationConfig::new();
        assert!(config.enabled);
        assert!(!config.revert_symbols_on_overlay_failure);
        assert_eq!(config.max_staged_edits, None);
        assert_eq!(config.rules.controller_compatible, "snps,dwc3");
    }

    #[test]
    fn builders() {
        let config = MigrationConfig::new()
            .with_enabled(false)
            .with_revert_symbols_on_overlay_failure(true)
            .with_max_staged_edits(16);
        assert!(!config.enabled);
        assert!(config.revert_symbols_on_overlay_failure);
        assert_eq!(config.max_staged_edits, Some(16));
    }

    #[test]
    fn toml_partial_override() {
        let config = MigrationConfig::from_toml_str(
            r#"
enabled = false

[rules]
promoted_properties = ["dr_mode"]
"#,
        )
        .unwrap();
        assert!(!config.enabled);
        assert_eq!(config.rules.promoted_properties, ["dr_mode"]);
        assert_eq!(config.rules.promoted_prefixes, ["snps,"]);
        assert_eq!(config.rules.ports_node, "ports");
    }

    #[test]
    fn yaml_input() {
        let config =
            MigrationConfig::from_yaml_str("revert_symbols_on_overlay_failure: true\nmax_staged_edits: 64\n")
                .unwrap();
        assert!(config.revert_symbols_on_overlay_failure);
        assert_eq!(config.max_staged_edits, Some(64));
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(matches!(
            MigrationConfig::from_toml_str("enable = true"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("engine.toml");
        std::fs::write(&toml_path, "max_staged_edits = 8\n").unwrap();
        assert_eq!(MigrationConfig::load(&toml_path).unwrap().max_staged_edits, Some(8));

        let ini_path = dir.path().join("engine.ini");
        std::fs::write(&ini_path, "").unwrap();
        assert!(matches!(
            MigrationConfig::load(&ini_path),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            MigrationConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}

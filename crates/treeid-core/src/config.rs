//! Resolver configuration
//!
//! Every field has a default so partial TOML documents load cleanly.
//!
//! ```
//! use treeid_core::config::ResolverConfig;
//!
//! let config = ResolverConfig::from_toml_str(
//!     r#"
//!     max_depth = 64
//!
//!     [keep_alive]
//!     components = ["KeepAlive"]
//!     max_entries = 10
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.max_depth, 64);
//! ```

use crate::errors::{ResolveError, Result};
use serde::{Deserialize, Serialize};

/// Default nesting limit for a single tree
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Highest accepted `max_depth`; the pass recurses once per level
pub const MAX_DEPTH_CEILING: usize = 1024;

/// Top-level resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Trees nesting deeper than this are refused
    pub max_depth: usize,
    pub keep_alive: KeepAliveConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            keep_alive: KeepAliveConfig::default(),
        }
    }
}

/// Which lineages retain deactivated branches, and how many
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeepAliveConfig {
    /// Component blueprint names whose child lists retain
    pub components: Vec<String>,
    /// Cache bound per lineage; absent means unbounded
    pub max_entries: Option<usize>,
    /// When non-empty, only branches of these kinds are cached
    pub include: Vec<String>,
    /// Branches of these kinds are never cached
    pub exclude: Vec<String>,
}

impl ResolverConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the document does not parse or fails
    /// validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ResolverConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `max_depth` is zero or above
    /// [`MAX_DEPTH_CEILING`], or a component name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ResolveError::InvalidConfig {
                reason: "max_depth must be at least 1".to_string(),
            });
        }
        if self.max_depth > MAX_DEPTH_CEILING {
            return Err(ResolveError::InvalidConfig {
                reason: format!(
                    "max_depth {} exceeds the ceiling of {}",
                    self.max_depth, MAX_DEPTH_CEILING
                ),
            });
        }
        if self
            .keep_alive
            .components
            .iter()
            .any(|name| name.trim().is_empty())
        {
            return Err(ResolveError::InvalidConfig {
                reason: "keep_alive.components cannot contain blank names".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.keep_alive.components.is_empty());
        assert!(config.keep_alive.max_entries.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ResolverConfig::from_toml_str("").unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_keep_alive_section() {
        let config = ResolverConfig::from_toml_str(
            r#"
            [keep_alive]
            components = ["KeepAlive", "TabHost"]
            max_entries = 3
            exclude = ["Settings"]
            "#,
        )
        .unwrap();
        assert_eq!(config.keep_alive.components, vec!["KeepAlive", "TabHost"]);
        assert_eq!(config.keep_alive.max_entries, Some(3));
        assert_eq!(config.keep_alive.exclude, vec!["Settings"]);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = ResolverConfig::from_toml_str("max_depth = 0").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConfig { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ResolverConfig::from_toml_str("max_dept = 3").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConfig { .. }));
    }

    #[test]
    fn test_blank_component_rejected() {
        let err = ResolverConfig::from_toml_str("[keep_alive]\ncomponents = [\" \"]").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConfig { .. }));
    }
}

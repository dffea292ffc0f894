//! Configuration for the reconciliation engine.

use horizon_structure_core::{DeliveryMode, TreeFormatOptions};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings of a [`ReconciliationEngine`](crate::ReconciliationEngine).
///
/// Can be built in code or loaded from TOML:
///
/// ```
/// use horizon_structure::EngineConfig;
/// use horizon_structure_core::DeliveryMode;
///
/// let config = EngineConfig::from_toml_str(r#"
///     delivery = "synchronous"
///     dependencies_group_name = "Libraries"
/// "#).unwrap();
/// assert_eq!(config.delivery, DeliveryMode::Synchronous);
/// assert!(config.content_root_path_suffix);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How change deltas reach the owning thread.
    pub delivery: DeliveryMode,
    /// Display name of each module's dependency group node.
    pub dependencies_group_name: String,
    /// Append the root path to content-root names in multi-root modules.
    pub content_root_path_suffix: bool,
    /// Trace the whole tree after every rebuild.
    pub dump_tree_after_rebuild: bool,
    /// Formatting of the tree dump.
    pub tree_format: TreeFormatOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryMode::Queued,
            dependencies_group_name: "Dependencies".to_string(),
            content_root_path_suffix: true,
            dump_tree_after_rebuild: false,
            tree_format: TreeFormatOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Set the delivery mode.
    pub fn delivery(mut self, mode: DeliveryMode) -> Self {
        self.delivery = mode;
        self
    }

    /// Apply deltas inline instead of queueing them.
    pub fn synchronous(self) -> Self {
        self.delivery(DeliveryMode::Synchronous)
    }

    /// Set the display name of dependency group nodes.
    pub fn dependencies_group_name(mut self, name: impl Into<String>) -> Self {
        self.dependencies_group_name = name.into();
        self
    }

    /// Enable or disable path suffixes on content-root names.
    pub fn content_root_path_suffix(mut self, enabled: bool) -> Self {
        self.content_root_path_suffix = enabled;
        self
    }

    /// Enable a trace-level tree dump after each rebuild.
    pub fn dump_tree_after_rebuild(mut self, options: TreeFormatOptions) -> Self {
        self.dump_tree_after_rebuild = true;
        self.tree_format = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use horizon_structure_core::TreeStyle;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.delivery, DeliveryMode::Queued);
        assert_eq!(config.dependencies_group_name, "Dependencies");
        assert!(config.content_root_path_suffix);
        assert!(!config.dump_tree_after_rebuild);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .synchronous()
            .dependencies_group_name("Libraries")
            .content_root_path_suffix(false)
            .dump_tree_after_rebuild(TreeFormatOptions::minimal());
        assert_eq!(config.delivery, DeliveryMode::Synchronous);
        assert_eq!(config.dependencies_group_name, "Libraries");
        assert!(!config.content_root_path_suffix);
        assert!(config.dump_tree_after_rebuild);
        assert!(!config.tree_format.show_ids);
    }

    #[test]
    fn test_from_toml_nested_format() {
        let config = EngineConfig::from_toml_str(
            r#"
            dump_tree_after_rebuild = true

            [tree_format]
            style = "ascii"
            show_states = false
            "#,
        )
        .unwrap();
        assert!(config.dump_tree_after_rebuild);
        assert_eq!(config.tree_format.style, TreeStyle::Ascii);
        assert!(!config.tree_format.show_states);
        assert_eq!(config.delivery, DeliveryMode::Queued);
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        let err = EngineConfig::from_toml_str("delivery = \"sometimes\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

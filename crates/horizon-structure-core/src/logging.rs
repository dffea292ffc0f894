//! Logging and debugging facilities for Horizon Structure.
//!
//! This module provides:
//! - Target names for filtering `tracing` output by subsystem
//! - [`PerfSpan`] for timing operations
//! - [`TreeStyle`] / [`TreeFormatOptions`] used by the tree debug renderer
//!
//! # Tracing Integration
//!
//! Horizon Structure uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_structure::engine=debug")
//!     .init();
//! ```

use serde::{Deserialize, Serialize};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Reconciliation engine target.
    pub const ENGINE: &str = "horizon_structure::engine";
    /// Tree mutation target.
    pub const TREE: &str = "horizon_structure::tree";
    /// Filter pass target.
    pub const FILTER: &str = "horizon_structure::filter";
    /// Owning-thread dispatch target.
    pub const DISPATCH: &str = "horizon_structure_core::dispatch";
    /// Signal emission target.
    pub const SIGNAL: &str = "horizon_structure_core::signal";
    /// Performance spans.
    pub const PERF: &str = "horizon_structure::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line-per-node representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node ids.
    pub show_ids: bool,
    /// Whether to show each node's visual state.
    pub show_states: bool,
    /// Whether to show the number of active conflict markers.
    pub show_markers: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_states: true,
            show_markers: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            show_markers: true,
            ..Default::default()
        }
    }

    /// Options for minimal output: names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_states: false,
            show_markers: false,
            ..Default::default()
        }
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for tracking the duration of operations such as a full rebuild.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_option_presets() {
        let detailed = TreeFormatOptions::detailed();
        assert!(detailed.show_ids);
        assert!(detailed.show_markers);

        let minimal = TreeFormatOptions::minimal();
        assert!(!minimal.show_ids);
        assert!(!minimal.show_states);
        assert_eq!(minimal.indent_size, 2);
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}

//! Human-readable rendering of a structure tree.

use std::fmt;

use horizon_structure_core::{TreeFormatOptions, TreeStyle};

use crate::node::{NodeId, NodeState};
use crate::tree::StructureTree;

/// Debug utility for visualizing structure trees.
///
/// ```
/// use horizon_structure::StructureTreeDebug;
/// use horizon_structure_core::TreeFormatOptions;
///
/// let debug = StructureTreeDebug::with_options(TreeFormatOptions::minimal());
/// # let _ = debug;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StructureTreeDebug {
    options: TreeFormatOptions,
}

impl StructureTreeDebug {
    /// Create a debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TreeFormatOptions {
        &self.options
    }

    /// Format the whole tree.
    pub fn format(&self, tree: &StructureTree) -> String {
        self.display(tree, tree.root()).to_string()
    }

    /// Format the subtree rooted at `node`.
    pub fn format_subtree(&self, tree: &StructureTree, node: NodeId) -> String {
        self.display(tree, Some(node)).to_string()
    }

    fn display<'a>(&'a self, tree: &'a StructureTree, start: Option<NodeId>) -> DisplayTree<'a> {
        DisplayTree {
            debug: self,
            tree,
            start,
        }
    }

    fn write_subtree(
        &self,
        f: &mut fmt::Formatter<'_>,
        tree: &StructureTree,
        id: NodeId,
        depth: usize,
        is_last: bool,
    ) -> fmt::Result {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }
        let Some(node) = tree.node(id) else {
            return Ok(());
        };

        f.write_str(&self.build_prefix(depth, is_last))?;
        f.write_str(node.display_name())?;
        if self.options.show_ids {
            write!(f, " [{:?}]", id)?;
        }
        if self.options.show_states && node.state() != NodeState::NoChange {
            write!(f, " ({})", state_label(node.state()))?;
        }
        if self.options.show_markers && !node.conflict_markers().is_empty() {
            write!(f, " <{} markers>", node.conflict_markers().len())?;
        }
        f.write_str("\n")?;

        let children = node.children();
        for (i, &child) in children.iter().enumerate() {
            self.write_subtree(f, tree, child, depth + 1, i + 1 == children.len())?;
        }
        Ok(())
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

fn state_label(state: NodeState) -> &'static str {
    match state {
        NodeState::NoChange => "no change",
        NodeState::Conflict => "conflict",
        NodeState::NativeLocal => "native only",
        NodeState::ExternalLocal => "external only",
        NodeState::Outdated => "outdated",
    }
}

struct DisplayTree<'a> {
    debug: &'a StructureTreeDebug,
    tree: &'a StructureTree,
    start: Option<NodeId>,
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(id) if self.tree.contains(id) => {
                self.debug.write_subtree(f, self.tree, id, 0, true)
            }
            _ => writeln!(f, "(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::identity::{EntityId, ModuleId, Owner, ProjectId};
    use crate::node::NodeDescriptor;
    use crate::ordering::NodeOrdering;
    use crate::testing::InMemoryNativeModel;

    fn sample() -> StructureTree {
        let mut tree = StructureTree::new(NodeOrdering::new(Arc::new(InMemoryNativeModel::new("p"))));
        let root = tree.reset(
            EntityId::Project(ProjectId {
                owner: Owner::Native,
                name: "p".into(),
            }),
            NodeDescriptor::new("p"),
        );
        let a = tree
            .add_child(
                root,
                EntityId::from(ModuleId::new(Owner::Native, "a")),
                NodeDescriptor::new("a"),
            )
            .unwrap();
        tree.add_child(
            a,
            EntityId::from(ModuleId::new(Owner::Native, "x")),
            NodeDescriptor::new("x").with_state(NodeState::NativeLocal),
        );
        tree.add_child(
            root,
            EntityId::from(ModuleId::new(Owner::Native, "b")),
            NodeDescriptor::new("b"),
        );
        tree
    }

    #[test]
    fn test_ascii_rendering() {
        let debug = StructureTreeDebug::with_options(TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..Default::default()
        });
        assert_eq!(
            debug.format(&sample()),
            "p\n+-- a\n|  `-- x (native only)\n`-- b\n"
        );
    }

    #[test]
    fn test_max_depth_and_minimal() {
        let debug = StructureTreeDebug::with_options(TreeFormatOptions {
            style: TreeStyle::Compact,
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        });
        assert_eq!(debug.format(&sample()), "p\n- a\n- b\n");
    }

    #[test]
    fn test_subtree_starts_at_depth_zero() {
        let tree = sample();
        let root = tree.root().unwrap();
        let a = tree.children(root)[0];
        let debug = StructureTreeDebug::with_options(TreeFormatOptions::minimal());
        assert_eq!(debug.format_subtree(&tree, a), "a\n\u{2514}\u{2500}\u{2500} x\n");
    }

    #[test]
    fn test_empty_tree() {
        let tree = StructureTree::new(NodeOrdering::new(Arc::new(InMemoryNativeModel::new("p"))));
        assert_eq!(StructureTreeDebug::new().format(&tree), "(empty)\n");
    }
}

//! Visibility filtering.
//!
//! A node is visible if any registered filter accepts it, or unconditionally
//! when no filter is registered. Hidden nodes are removed from the tree
//! unless one of their descendants is visible, in which case the whole
//! ancestor chain of that descendant is kept.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use horizon_structure_core::logging::targets;
use slotmap::new_key_type;

use crate::node::{NodeId, NodeState, StructureNode};
use crate::tree::{RemovedNode, StructureTree};

new_key_type! {
    /// Handle of a registered filter.
    pub struct FilterId;
}

/// Type alias for a filter predicate.
///
/// Returns `true` if the node should stay visible.
pub type FilterFn = Arc<dyn Fn(&StructureNode) -> bool + Send + Sync>;

/// A visibility predicate over tree nodes.
pub trait NodeFilter: Send + Sync {
    fn accepts(&self, node: &StructureNode) -> bool;
}

/// Accepts nodes whose visual state is in a fixed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFilter {
    states: Vec<NodeState>,
}

impl StateFilter {
    pub fn new(states: impl IntoIterator<Item = NodeState>) -> Self {
        Self {
            states: states.into_iter().collect(),
        }
    }

    /// Accepts every node that differs between the two models.
    pub fn changed() -> Self {
        Self::new([
            NodeState::Conflict,
            NodeState::NativeLocal,
            NodeState::ExternalLocal,
            NodeState::Outdated,
        ])
    }
}

impl NodeFilter for StateFilter {
    fn accepts(&self, node: &StructureNode) -> bool {
        self.states.contains(&node.state())
    }
}

/// A filter backed by a closure.
#[derive(Clone)]
pub struct FnFilter {
    predicate: FilterFn,
}

impl FnFilter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&StructureNode) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }
}

impl NodeFilter for FnFilter {
    fn accepts(&self, node: &StructureNode) -> bool {
        (self.predicate)(node)
    }
}

impl fmt::Debug for FnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter").finish_non_exhaustive()
    }
}

/// Applies a set of filters to a tree.
pub struct FilterEngine;

impl FilterEngine {
    /// Whether `node` passes the given filters.
    pub fn is_visible<'a, I>(node: &StructureNode, filters: I) -> bool
    where
        I: IntoIterator<Item = &'a Arc<dyn NodeFilter>>,
    {
        let mut filters = filters.into_iter().peekable();
        filters.peek().is_none() || filters.any(|filter| filter.accepts(node))
    }

    /// Remove every node that no filter accepts and that has no accepted
    /// descendant. The root is never removed.
    ///
    /// Removal goes deepest-first. Returns the removed nodes in removal order.
    #[tracing::instrument(skip_all, target = "horizon_structure::filter", fields(filters = filters.len()))]
    pub fn apply(tree: &mut StructureTree, filters: &[Arc<dyn NodeFilter>]) -> Vec<RemovedNode> {
        if filters.is_empty() {
            return Vec::new();
        }
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let mut accepted = Vec::new();
        let mut candidates = HashSet::new();
        for (id, node) in tree.iter() {
            if Self::is_visible(node, filters) {
                accepted.push(id);
            } else if id != root {
                candidates.insert(id);
            }
        }

        // Keep the ancestor chain of every accepted node.
        for id in accepted {
            let mut current = tree.parent(id);
            while let Some(ancestor) = current {
                if !candidates.remove(&ancestor) {
                    break;
                }
                current = tree.parent(ancestor);
            }
        }

        let mut doomed: Vec<(usize, NodeId)> = candidates
            .into_iter()
            .map(|id| (tree.depth(id), id))
            .collect();
        doomed.sort_by(|a, b| b.0.cmp(&a.0));

        let removed: Vec<RemovedNode> = doomed
            .into_iter()
            .filter_map(|(_, id)| tree.remove_from_parent(id))
            .collect();
        tracing::debug!(target: targets::FILTER, removed = removed.len(), "filters applied");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{EntityId, ModuleId, Owner, ProjectId};
    use crate::node::NodeDescriptor;
    use crate::ordering::NodeOrdering;
    use crate::testing::InMemoryNativeModel;

    fn module(name: &str) -> EntityId {
        EntityId::from(ModuleId::new(Owner::Native, name))
    }

    /// root
    ///   a (native local)
    ///     a1
    ///     a2 (conflict)
    ///   b
    ///     b1
    fn sample_tree() -> (StructureTree, [NodeId; 6]) {
        let native = Arc::new(InMemoryNativeModel::new("p"));
        let mut tree = StructureTree::new(NodeOrdering::new(native));
        let root = tree.reset(
            EntityId::Project(ProjectId {
                owner: Owner::Native,
                name: "p".into(),
            }),
            NodeDescriptor::new("p"),
        );
        let a = tree
            .add_child(root, module("a"), NodeDescriptor::new("a").with_state(NodeState::NativeLocal))
            .unwrap();
        let a1 = tree.add_child(a, module("a1"), NodeDescriptor::new("a1")).unwrap();
        let a2 = tree
            .add_child(a, module("a2"), NodeDescriptor::new("a2").with_state(NodeState::Conflict))
            .unwrap();
        let b = tree.add_child(root, module("b"), NodeDescriptor::new("b")).unwrap();
        let b1 = tree.add_child(b, module("b1"), NodeDescriptor::new("b1")).unwrap();
        (tree, [root, a, a1, a2, b, b1])
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        let (mut tree, _) = sample_tree();
        assert!(FilterEngine::apply(&mut tree, &[]).is_empty());
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_accepted_leaf_keeps_ancestors() {
        let (mut tree, [root, a, a1, a2, b, b1]) = sample_tree();
        let filters: Vec<Arc<dyn NodeFilter>> =
            vec![Arc::new(StateFilter::new([NodeState::Conflict]))];

        let removed = FilterEngine::apply(&mut tree, &filters);
        assert!(tree.contains(root));
        assert!(tree.contains(a));
        assert!(tree.contains(a2));
        assert!(!tree.contains(a1));
        assert!(!tree.contains(b));
        assert!(!tree.contains(b1));

        // Leaf-first: b1 goes before its parent b.
        let order: Vec<_> = removed.iter().map(|r| r.display_name.as_str()).collect();
        let b1_at = order.iter().position(|n| *n == "b1").unwrap();
        let b_at = order.iter().position(|n| *n == "b").unwrap();
        assert!(b1_at < b_at);
    }

    #[test]
    fn test_filters_are_disjunctive() {
        let (mut tree, [_, a, a1, a2, b, b1]) = sample_tree();
        let filters: Vec<Arc<dyn NodeFilter>> = vec![
            Arc::new(StateFilter::new([NodeState::NativeLocal])),
            Arc::new(FnFilter::new(|node| node.display_name() == "b1")),
        ];
        FilterEngine::apply(&mut tree, &filters);
        assert!(tree.contains(a));
        assert!(tree.contains(b));
        assert!(tree.contains(b1));
        assert!(!tree.contains(a1));
        assert!(!tree.contains(a2));
    }

    #[test]
    fn test_nothing_accepted_leaves_root() {
        let (mut tree, [root, ..]) = sample_tree();
        let filters: Vec<Arc<dyn NodeFilter>> = vec![Arc::new(FnFilter::new(|_| false))];
        FilterEngine::apply(&mut tree, &filters);
        assert_eq!(tree.len(), 1);
        assert!(tree.contains(root));
    }
}

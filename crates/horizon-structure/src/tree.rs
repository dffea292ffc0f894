//! The structure tree.
//!
//! [`StructureTree`] stores nodes in an arena keyed by [`NodeId`]. Each node
//! lists its children in display order and keeps a back reference to its
//! parent. Children are always kept sorted by the tree's [`NodeOrdering`].
//!
//! Every structural or visual mutation is reported through [`TreeSignals`]
//! exactly once, so a view can mirror the tree incrementally:
//!
//! - `node_inserted(parent, index)`
//! - `nodes_removed(parent, index, removed)`
//! - `node_changed(node)`
//! - `children_reordered(parent, permutation)`
//! - `tree_reset()`
//!
//! A move inside one parent is reported as a single `children_reordered`;
//! the underlying remove and insert are not reported separately.

use std::cmp::Ordering;

use horizon_structure_core::Signal;
use horizon_structure_core::logging::targets;
use slotmap::SlotMap;

use crate::change::Change;
use crate::identity::{EntityId, EntityKind};
use crate::node::{NodeDescriptor, NodeId, NodeState, StructureNode};
use crate::ordering::NodeOrdering;

/// Summary of a node that has been removed from the tree.
///
/// Sent with `nodes_removed`; the node's handle is no longer valid when the
/// signal fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedNode {
    pub id: NodeId,
    pub identity: EntityId,
    pub display_name: String,
}

/// Change notifications of a [`StructureTree`].
pub struct TreeSignals {
    /// A node was inserted.
    /// Args: (parent, index of the new child)
    pub node_inserted: Signal<(NodeId, usize)>,

    /// A node and its subtree were removed.
    /// Args: (former parent, former index, removed node)
    pub nodes_removed: Signal<(NodeId, usize, RemovedNode)>,

    /// A node's display name, tooltip, state or markers changed.
    pub node_changed: Signal<NodeId>,

    /// Children of a node were permuted.
    /// Args: (parent, permutation) where `permutation[new_index] == old_index`
    pub children_reordered: Signal<(NodeId, Vec<usize>)>,

    /// The whole tree was replaced.
    pub tree_reset: Signal<()>,
}

impl TreeSignals {
    pub fn new() -> Self {
        Self {
            node_inserted: Signal::new(),
            nodes_removed: Signal::new(),
            node_changed: Signal::new(),
            children_reordered: Signal::new(),
            tree_reset: Signal::new(),
        }
    }

    /// Block insert and remove notifications, returning the previous states.
    fn suppress_structural(&self) -> (bool, bool) {
        (
            self.node_inserted.set_blocked(true),
            self.nodes_removed.set_blocked(true),
        )
    }

    fn restore_structural(&self, previous: (bool, bool)) {
        self.node_inserted.set_blocked(previous.0);
        self.nodes_removed.set_blocked(previous.1);
    }
}

impl Default for TreeSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena-backed tree of [`StructureNode`]s.
pub struct StructureTree {
    nodes: SlotMap<NodeId, StructureNode>,
    root: Option<NodeId>,
    ordering: NodeOrdering,
    signals: TreeSignals,
}

impl StructureTree {
    /// Create an empty tree. Call [`reset`](Self::reset) to install a root.
    pub fn new(ordering: NodeOrdering) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            ordering,
            signals: TreeSignals::new(),
        }
    }

    pub fn signals(&self) -> &TreeSignals {
        &self.signals
    }

    pub fn ordering(&self) -> &NodeOrdering {
        &self.ordering
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&StructureNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of a node in display order. Empty for unknown handles.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Number of ancestors of a node.
    pub fn depth(&self, id: NodeId) -> usize {
        self.path_to_root(id).len().saturating_sub(1)
    }

    /// The node followed by each of its ancestors, ending at the root.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.contains(id).then_some(id);
        while let Some(node) = current {
            path.push(node);
            current = self.parent(node);
        }
        path
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = Vec::new();
        if self.contains(id) {
            stack.push(id);
        }
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    /// Pre-order traversal of the whole tree.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &StructureNode)> + '_ {
        self.root
            .map(|root| self.descendants(root))
            .unwrap_or_default()
            .into_iter()
            .filter_map(move |id| self.nodes.get(id).map(|node| (id, node)))
    }

    /// Direct child whose identity names the same entity, regardless of owner.
    pub fn find_child(&self, parent: NodeId, identity: &EntityId) -> Option<NodeId> {
        self.children(parent).iter().copied().find(|&child| {
            self.nodes
                .get(child)
                .is_some_and(|node| node.identity.same_entity(identity))
        })
    }

    /// Direct children of the given kind, in display order.
    pub fn children_of_kind(&self, parent: NodeId, kind: EntityKind) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&child| self.nodes.get(child).is_some_and(|node| node.kind() == kind))
            .collect()
    }

    /// Drop every node and install a fresh root.
    pub fn reset(&mut self, identity: EntityId, descriptor: NodeDescriptor) -> NodeId {
        self.nodes.clear();
        let root = self.nodes.insert(StructureNode::new(identity, descriptor));
        self.root = Some(root);
        tracing::debug!(target: targets::TREE, "tree reset");
        self.signals.tree_reset.emit(());
        root
    }

    /// Drop every node, leaving the tree without a root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.signals.tree_reset.emit(());
    }

    /// Create a node that is not attached anywhere yet.
    ///
    /// Attach it with [`insert_sorted`](Self::insert_sorted).
    pub fn create_detached(&mut self, identity: EntityId, descriptor: NodeDescriptor) -> NodeId {
        self.nodes.insert(StructureNode::new(identity, descriptor))
    }

    /// Create a node and insert it under `parent` at its sorted position.
    ///
    /// Returns `None` if `parent` is not in the tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        identity: EntityId,
        descriptor: NodeDescriptor,
    ) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let child = self.create_detached(identity, descriptor);
        self.insert_sorted(parent, child);
        Some(child)
    }

    /// Insert a detached node as a child of `parent`.
    ///
    /// The child lands at the first position where it compares less than or
    /// equal to the existing sibling, so equal elements insert before their
    /// peers. Returns the index, or `None` if either handle is invalid.
    pub fn insert_sorted(&mut self, parent: NodeId, child: NodeId) -> Option<usize> {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return None;
        }
        debug_assert!(
            self.parent(child).is_none(),
            "insert_sorted called on an attached node"
        );
        debug_assert!(
            {
                let identity = &self.nodes[child].identity;
                !self
                    .children(parent)
                    .iter()
                    .any(|&sibling| self.nodes[sibling].identity == *identity)
            },
            "duplicate identity under one parent"
        );

        let index = self.sorted_position(parent, child, None);
        self.link(parent, index, child);
        Some(index)
    }

    /// Remove a node and its subtree from its parent.
    ///
    /// Nodes without a parent (the root, detached nodes) are left untouched.
    pub fn remove_from_parent(&mut self, node: NodeId) -> Option<RemovedNode> {
        let (parent, index) = self.unlink(node)?;
        let removed = self.nodes.get(node).map(|n| RemovedNode {
            id: node,
            identity: n.identity.clone(),
            display_name: n.descriptor.display_name.clone(),
        })?;
        for id in self.descendants(node) {
            self.nodes.remove(id);
        }
        tracing::trace!(
            target: targets::TREE,
            node = %removed.identity,
            index,
            "node removed"
        );
        self.signals
            .nodes_removed
            .emit((parent, index, removed.clone()));
        Some(removed)
    }

    /// Move a child to where the ordering now places it.
    ///
    /// Call after anything that affects the ordering changed. Emits one
    /// `children_reordered` when the child moved; returns whether it did.
    pub fn correct_position_if_needed(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        let old_order = self.children(parent).to_vec();
        let Some(current) = old_order.iter().position(|&c| c == child) else {
            return false;
        };
        let desired = self.sorted_position(parent, child, Some(child));
        if desired == current {
            return false;
        }

        let previous = self.signals.suppress_structural();
        self.unlink(child);
        self.link(parent, desired, child);
        self.signals.restore_structural(previous);

        tracing::trace!(target: targets::TREE, from = current, to = desired, "node repositioned");
        self.emit_reordered(parent, &old_order);
        true
    }

    /// Re-sort all children of `parent`.
    ///
    /// The sort is stable, so equal children keep their relative order.
    /// Emits `children_reordered` only if the order actually changed.
    pub fn sort_children(&mut self, parent: NodeId) -> bool {
        let Some(node) = self.nodes.get(parent) else {
            return false;
        };
        let old_order = node.children.clone();
        let mut new_order = old_order.clone();
        new_order.sort_by(|&a, &b| self.compare(a, b));
        if new_order == old_order {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = new_order;
        }
        self.emit_reordered(parent, &old_order);
        true
    }

    /// Set a node's visual state and move it if its position depends on it.
    pub fn set_state(&mut self, node: NodeId, state: NodeState) -> bool {
        let Some(n) = self.nodes.get_mut(node) else {
            return false;
        };
        if n.descriptor.state == state {
            return false;
        }
        n.descriptor.state = state;
        self.signals.node_changed.emit(node);
        self.correct_position_if_needed(node);
        true
    }

    /// Set state and tooltip together, emitting a single `node_changed`.
    ///
    /// Returns whether either of them changed.
    pub fn set_state_and_tooltip(
        &mut self,
        node: NodeId,
        state: NodeState,
        tooltip: Option<String>,
    ) -> bool {
        let Some(n) = self.nodes.get_mut(node) else {
            return false;
        };
        if n.descriptor.state == state && n.descriptor.tooltip == tooltip {
            return false;
        }
        let state_changed = n.descriptor.state != state;
        n.descriptor.state = state;
        n.descriptor.tooltip = tooltip;
        self.signals.node_changed.emit(node);
        if state_changed {
            self.correct_position_if_needed(node);
        }
        true
    }

    pub fn set_display_name(&mut self, node: NodeId, name: impl Into<String>) -> bool {
        let name = name.into();
        let Some(n) = self.nodes.get_mut(node) else {
            return false;
        };
        if n.descriptor.display_name == name {
            return false;
        }
        n.descriptor.display_name = name;
        self.signals.node_changed.emit(node);
        self.correct_position_if_needed(node);
        true
    }

    pub fn set_tooltip(&mut self, node: NodeId, tooltip: Option<String>) -> bool {
        let Some(n) = self.nodes.get_mut(node) else {
            return false;
        };
        if n.descriptor.tooltip == tooltip {
            return false;
        }
        n.descriptor.tooltip = tooltip;
        self.signals.node_changed.emit(node);
        true
    }

    /// Record one more divergence against a node.
    ///
    /// A node in [`NodeState::NoChange`] switches to [`NodeState::Conflict`];
    /// local-only and outdated nodes keep their state. Returns whether the
    /// state changed.
    pub fn add_conflict_marker(&mut self, node: NodeId, marker: Change) -> bool {
        let Some(n) = self.nodes.get_mut(node) else {
            return false;
        };
        n.markers.push(marker);
        let state_changed = n.descriptor.state.accepts_conflict();
        if state_changed {
            n.descriptor.state = NodeState::Conflict;
        }
        self.signals.node_changed.emit(node);
        if state_changed {
            self.correct_position_if_needed(node);
        }
        state_changed
    }

    /// Retract one occurrence of a divergence from a node.
    ///
    /// Removing the last marker reverts [`NodeState::Conflict`] to
    /// [`NodeState::NoChange`]. Unknown markers are ignored. Returns whether
    /// the state changed.
    pub fn remove_conflict_marker(&mut self, node: NodeId, marker: &Change) -> bool {
        let Some(n) = self.nodes.get_mut(node) else {
            return false;
        };
        let Some(position) = n.markers.iter().position(|m| m == marker) else {
            return false;
        };
        n.markers.remove(position);
        let state_changed = n.markers.is_empty() && n.descriptor.state == NodeState::Conflict;
        if state_changed {
            n.descriptor.state = NodeState::NoChange;
        }
        self.signals.node_changed.emit(node);
        if state_changed {
            self.correct_position_if_needed(node);
        }
        state_changed
    }

    fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        match (self.nodes.get(a), self.nodes.get(b)) {
            (Some(a), Some(b)) => self.ordering.compare(a, b),
            _ => Ordering::Equal,
        }
    }

    /// First index among `parent`'s children (ignoring `skip`) where `child`
    /// compares less than or equal to the sibling.
    fn sorted_position(&self, parent: NodeId, child: NodeId, skip: Option<NodeId>) -> usize {
        let siblings: Vec<NodeId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|&sibling| Some(sibling) != skip)
            .collect();
        siblings
            .iter()
            .position(|&sibling| self.compare(child, sibling) != Ordering::Greater)
            .unwrap_or(siblings.len())
    }

    fn link(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
            if let Some(c) = self.nodes.get_mut(child) {
                c.parent = Some(parent);
            }
            self.signals.node_inserted.emit((parent, index));
        }
    }

    /// Detach a node from its parent without freeing it.
    fn unlink(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(child)?;
        let p = self.nodes.get_mut(parent)?;
        let index = p.children.iter().position(|&c| c == child)?;
        p.children.remove(index);
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
        Some((parent, index))
    }

    fn emit_reordered(&self, parent: NodeId, old_order: &[NodeId]) {
        let permutation: Vec<usize> = self
            .children(parent)
            .iter()
            .filter_map(|child| old_order.iter().position(|old| old == child))
            .collect();
        self.signals
            .children_reordered
            .emit((parent, permutation));
    }
}

impl std::fmt::Debug for StructureTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureTree")
            .field("root", &self.root)
            .field("len", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::change::{DependencyId, DependencyScope, PropertyChange};
    use crate::identity::{LibraryDependencyId, ModuleId, Owner, ProjectId};
    use crate::testing::InMemoryNativeModel;

    fn tree_with_root(native: Arc<InMemoryNativeModel>) -> (StructureTree, NodeId) {
        let mut tree = StructureTree::new(NodeOrdering::new(native));
        let root = tree.reset(
            EntityId::Project(ProjectId {
                owner: Owner::Native,
                name: "p".into(),
            }),
            NodeDescriptor::new("p"),
        );
        (tree, root)
    }

    fn module(name: &str) -> EntityId {
        EntityId::from(ModuleId::new(Owner::Native, name))
    }

    fn names(tree: &StructureTree, parent: NodeId) -> Vec<String> {
        tree.children(parent)
            .iter()
            .map(|&id| tree.node(id).unwrap().display_name().to_string())
            .collect()
    }

    fn scope_marker(library: &str) -> Change {
        Change::DependencyScope(PropertyChange::new(
            DependencyId::Library(LibraryDependencyId::new(Owner::Native, "m", library)),
            DependencyScope::Compile,
            DependencyScope::Test,
        ))
    }

    #[test]
    fn test_insert_sorted_keeps_order() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        for name in ["c", "a", "b"] {
            tree.add_child(root, module(name), NodeDescriptor::new(name));
        }
        assert_eq!(names(&tree, root), vec!["a", "b", "c"]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_insert_emits_index() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        tree.signals()
            .node_inserted
            .connect(move |&(_, index)| sink.lock().push(index));

        tree.add_child(root, module("b"), NodeDescriptor::new("b"));
        tree.add_child(root, module("a"), NodeDescriptor::new("a"));
        tree.add_child(root, module("c"), NodeDescriptor::new("c"));
        assert_eq!(*events.lock(), vec![0, 0, 2]);
    }

    #[test]
    fn test_remove_frees_subtree() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        let a = tree.add_child(root, module("a"), NodeDescriptor::new("a")).unwrap();
        let inner = tree.add_child(a, module("x"), NodeDescriptor::new("x")).unwrap();

        let removed = tree.remove_from_parent(a).unwrap();
        assert_eq!(removed.display_name, "a");
        assert!(!tree.contains(a));
        assert!(!tree.contains(inner));
        assert!(tree.children(root).is_empty());

        // The root has no parent: no-op.
        assert!(tree.remove_from_parent(root).is_none());
        assert!(tree.contains(root));
    }

    #[test]
    fn test_external_local_state_moves_node_to_top() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        tree.add_child(root, module("a"), NodeDescriptor::new("a"));
        let z = tree.add_child(root, module("z"), NodeDescriptor::new("z")).unwrap();

        let reorders = Arc::new(Mutex::new(Vec::new()));
        let inserts = Arc::new(Mutex::new(0));
        let sink = reorders.clone();
        tree.signals()
            .children_reordered
            .connect(move |(_, perm)| sink.lock().push(perm.clone()));
        let count = inserts.clone();
        tree.signals().node_inserted.connect(move |_| *count.lock() += 1);

        assert!(tree.set_state(z, NodeState::ExternalLocal));
        assert_eq!(names(&tree, root), vec!["z", "a"]);
        assert_eq!(*reorders.lock(), vec![vec![1, 0]]);
        assert_eq!(*inserts.lock(), 0);
        assert!(!tree.signals().node_inserted.is_blocked());

        // Already correct: nothing to do.
        assert!(!tree.correct_position_if_needed(z));
    }

    #[test]
    fn test_sort_children_is_idempotent() {
        let native = Arc::new(InMemoryNativeModel::new("p"));
        native.add_module("m");
        native.add_library_dependency("m", "a");
        native.add_library_dependency("m", "b");
        let (mut tree, root) = tree_with_root(native.clone());
        for lib in ["a", "b"] {
            tree.add_child(
                root,
                EntityId::from(LibraryDependencyId::new(Owner::Native, "m", lib)),
                NodeDescriptor::new(lib),
            );
        }
        assert_eq!(names(&tree, root), vec!["a", "b"]);

        let reorders = Arc::new(Mutex::new(0));
        let count = reorders.clone();
        tree.signals()
            .children_reordered
            .connect(move |_| *count.lock() += 1);

        assert!(!tree.sort_children(root));
        native.move_order_entry("m", "b", 0);
        assert!(tree.sort_children(root));
        assert_eq!(names(&tree, root), vec!["b", "a"]);
        assert!(!tree.sort_children(root));
        assert_eq!(*reorders.lock(), 1);
    }

    #[test]
    fn test_conflict_markers_are_a_multiset() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        let node = tree.add_child(root, module("m"), NodeDescriptor::new("m")).unwrap();
        let markers = [scope_marker("a"), scope_marker("b"), scope_marker("a")];

        assert!(tree.add_conflict_marker(node, markers[0].clone()));
        assert!(!tree.add_conflict_marker(node, markers[1].clone()));
        assert!(!tree.add_conflict_marker(node, markers[2].clone()));
        assert_eq!(tree.node(node).unwrap().state(), NodeState::Conflict);

        assert!(!tree.remove_conflict_marker(node, &markers[0]));
        assert!(!tree.remove_conflict_marker(node, &markers[1]));
        assert_eq!(tree.node(node).unwrap().state(), NodeState::Conflict);
        assert!(tree.remove_conflict_marker(node, &markers[2]));
        assert_eq!(tree.node(node).unwrap().state(), NodeState::NoChange);

        // Removing an absent marker is a no-op.
        assert!(!tree.remove_conflict_marker(node, &markers[0]));
    }

    #[test]
    fn test_conflict_marker_keeps_local_state() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        let node = tree
            .add_child(
                root,
                module("m"),
                NodeDescriptor::new("m").with_state(NodeState::NativeLocal),
            )
            .unwrap();
        assert!(!tree.add_conflict_marker(node, scope_marker("a")));
        assert_eq!(tree.node(node).unwrap().state(), NodeState::NativeLocal);
        assert!(!tree.remove_conflict_marker(node, &scope_marker("a")));
        assert_eq!(tree.node(node).unwrap().state(), NodeState::NativeLocal);
    }

    #[test]
    fn test_marker_after_local_state_cleared() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        let node = tree
            .add_child(
                root,
                module("m"),
                NodeDescriptor::new("m").with_state(NodeState::NativeLocal),
            )
            .unwrap();
        assert!(!tree.add_conflict_marker(node, scope_marker("a")));
        tree.set_state(node, NodeState::NoChange);

        // Markers already present must not block the switch to Conflict.
        assert!(tree.add_conflict_marker(node, scope_marker("b")));
        assert_eq!(tree.node(node).unwrap().state(), NodeState::Conflict);
        assert_eq!(tree.node(node).unwrap().conflict_markers().len(), 2);
    }

    #[test]
    fn test_state_and_tooltip_emit_once() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        tree.add_child(root, module("a"), NodeDescriptor::new("a"));
        let z = tree.add_child(root, module("z"), NodeDescriptor::new("z")).unwrap();

        let changed = Arc::new(Mutex::new(0));
        let count = changed.clone();
        tree.signals().node_changed.connect(move |_| *count.lock() += 1);

        assert!(tree.set_state_and_tooltip(
            z,
            NodeState::ExternalLocal,
            Some("external".to_string())
        ));
        assert_eq!(*changed.lock(), 1);
        assert_eq!(names(&tree, root), vec!["z", "a"]);
        assert_eq!(tree.node(z).unwrap().tooltip().as_deref(), Some("external"));

        assert!(!tree.set_state_and_tooltip(
            z,
            NodeState::ExternalLocal,
            Some("external".to_string())
        ));
        assert_eq!(*changed.lock(), 1);
    }

    #[test]
    fn test_paths_and_lookup() {
        let (mut tree, root) = tree_with_root(Arc::new(InMemoryNativeModel::new("p")));
        let a = tree.add_child(root, module("a"), NodeDescriptor::new("a")).unwrap();
        let b = tree.add_child(a, module("b"), NodeDescriptor::new("b")).unwrap();

        assert_eq!(tree.path_to_root(b), vec![b, a, root]);
        assert_eq!(tree.depth(b), 2);
        assert_eq!(tree.descendants(root), vec![root, a, b]);
        assert_eq!(
            tree.find_child(root, &EntityId::from(ModuleId::new(Owner::External, "a"))),
            Some(a)
        );
        assert_eq!(tree.children_of_kind(root, EntityKind::Module), vec![a]);
        assert!(tree.children_of_kind(root, EntityKind::Jar).is_empty());
    }
}

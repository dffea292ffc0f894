//! Nodes of the structure tree.

use slotmap::new_key_type;

use crate::change::Change;
use crate::identity::{EntityId, EntityKind};

new_key_type! {
    /// Handle of a node inside a [`StructureTree`](crate::tree::StructureTree).
    ///
    /// Handles of removed nodes are never reused for different nodes.
    pub struct NodeId;
}

/// Visual state of a node, as shown by a view.
///
/// For local-only states this is also the node's "owner of record": an
/// identity tagged external keeps its tag after the divergence resolves, and
/// only the state moves back to [`NodeState::NoChange`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Both models agree.
    #[default]
    NoChange,
    /// Both models know the entity but disagree on some property.
    Conflict,
    /// Only the native model knows the entity.
    NativeLocal,
    /// Only the external model knows the entity.
    ExternalLocal,
    /// The two models reference different versions of the same library.
    Outdated,
}

impl NodeState {
    /// Whether the state marks a one-sided entity.
    pub fn is_local(self) -> bool {
        matches!(self, Self::NativeLocal | Self::ExternalLocal)
    }

    /// Whether conflict markers may switch this state to [`NodeState::Conflict`].
    pub(crate) fn accepts_conflict(self) -> bool {
        matches!(self, Self::NoChange)
    }
}

/// Display information of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub display_name: String,
    pub tooltip: Option<String>,
    pub state: NodeState,
}

impl NodeDescriptor {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            tooltip: None,
            state: NodeState::NoChange,
        }
    }

    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

/// A node of the structure tree.
///
/// Nodes live in the tree's arena; `children` lists owned child handles in
/// display order and `parent` is a non-owning back reference.
#[derive(Debug, Clone)]
pub struct StructureNode {
    pub(crate) identity: EntityId,
    pub(crate) descriptor: NodeDescriptor,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    /// Multiset of outstanding divergences attributed to this node.
    pub(crate) markers: Vec<Change>,
}

impl StructureNode {
    pub(crate) fn new(identity: EntityId, descriptor: NodeDescriptor) -> Self {
        Self {
            identity,
            descriptor,
            children: Vec::new(),
            parent: None,
            markers: Vec::new(),
        }
    }

    pub fn identity(&self) -> &EntityId {
        &self.identity
    }

    pub fn kind(&self) -> EntityKind {
        self.identity.kind()
    }

    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    pub fn state(&self) -> NodeState {
        self.descriptor.state
    }

    /// Tooltip text, including one line per active conflict marker.
    pub fn tooltip(&self) -> Option<String> {
        let mut lines: Vec<String> = self.descriptor.tooltip.iter().cloned().collect();
        lines.extend(self.markers.iter().map(ToString::to_string));
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn conflict_markers(&self) -> &[Change] {
        &self.markers
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{DependencyId, DependencyScope, PropertyChange};
    use crate::identity::{LibraryDependencyId, Owner};

    #[test]
    fn test_tooltip_lists_markers() {
        let id = LibraryDependencyId::new(Owner::Native, "app", "L");
        let mut node = StructureNode::new(
            EntityId::from(id.clone()),
            NodeDescriptor::new("L").with_tooltip("library"),
        );
        assert_eq!(node.tooltip().as_deref(), Some("library"));

        node.markers.push(Change::DependencyScope(PropertyChange::new(
            DependencyId::Library(id),
            DependencyScope::Compile,
            DependencyScope::Runtime,
        )));
        assert_eq!(
            node.tooltip().as_deref(),
            Some("library\nscope: external compile, native runtime")
        );
    }

    #[test]
    fn test_state_flags() {
        assert!(NodeState::NativeLocal.is_local());
        assert!(NodeState::ExternalLocal.is_local());
        assert!(!NodeState::Conflict.is_local());
        assert!(NodeState::NoChange.accepts_conflict());
        assert!(!NodeState::Outdated.accepts_conflict());
        assert!(!NodeState::ExternalLocal.accepts_conflict());
    }
}

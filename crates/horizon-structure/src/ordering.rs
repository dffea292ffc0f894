//! Sibling ordering policy.
//!
//! Children of every node are kept sorted by [`NodeOrdering::compare`]:
//!
//! 1. External-only nodes float above everything else.
//! 2. Nodes are grouped in bands by kind weight. Module and library
//!    dependencies share a single band so that they interleave the way the
//!    module's classpath does.
//! 3. Inside a band, entries resolvable in the native model rank by their
//!    position there: order-entry index for dependencies, content-root index
//!    for content roots. Unresolvable entries follow every resolved one.
//! 4. Remaining ties break on kind weight, then display name.
//!
//! Positions are re-queried from the native model on every comparison,
//! because the native order-entry list can change between calls.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::accessor::{NativeModelAccessor, OrderEntryKind};
use crate::identity::{EntityId, EntityKind};
use crate::node::{NodeState, StructureNode};

/// Band shared by every classpath entry kind.
const ORDER_ENTRY_BAND: u32 = 4;

/// Total order over sibling nodes.
#[derive(Clone)]
pub struct NodeOrdering {
    native: Arc<dyn NativeModelAccessor>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    /// 0 for external-only nodes.
    locality: u8,
    band: u32,
    /// `(0, index)` when resolved, `(1, 0)` otherwise.
    position: (u8, usize),
    weight: u32,
}

impl NodeOrdering {
    pub fn new(native: Arc<dyn NativeModelAccessor>) -> Self {
        Self { native }
    }

    /// Compare two sibling nodes.
    pub fn compare(&self, a: &StructureNode, b: &StructureNode) -> Ordering {
        self.sort_key(a)
            .cmp(&self.sort_key(b))
            .then_with(|| a.display_name().cmp(b.display_name()))
    }

    fn sort_key(&self, node: &StructureNode) -> SortKey {
        let kind = node.kind();
        let band = match kind {
            EntityKind::ModuleDependency
            | EntityKind::LibraryDependency
            | EntityKind::CompositeLibraryDependency => ORDER_ENTRY_BAND,
            other => other.weight(),
        };
        let position = match self.native_position(node.identity()) {
            Some(index) => (0, index),
            None => (1, 0),
        };
        SortKey {
            locality: if node.state() == NodeState::ExternalLocal { 0 } else { 1 },
            band,
            position,
            weight: kind.weight(),
        }
    }

    /// Position of the entity inside its module's native lists, if resolvable.
    pub fn native_position(&self, identity: &EntityId) -> Option<usize> {
        match identity {
            EntityId::ContentRoot(id) => self
                .native
                .content_roots(&id.module)
                .iter()
                .position(|root| root.path == id.path),
            EntityId::ModuleDependency(id) => self
                .native
                .order_entries(&id.module)
                .into_iter()
                .find(|entry| {
                    matches!(&entry.kind, OrderEntryKind::ModuleDependency { target } if *target == id.target)
                })
                .map(|entry| entry.index),
            EntityId::LibraryDependency(id) => self.library_entry_index(&id.module, &id.library),
            EntityId::CompositeLibraryDependency(id) => {
                self.library_entry_index(&id.native.module, &id.native.library)
            }
            _ => None,
        }
    }

    fn library_entry_index(&self, module: &str, library: &str) -> Option<usize> {
        self.native
            .order_entries(module)
            .into_iter()
            .find(|entry| {
                matches!(&entry.kind, OrderEntryKind::LibraryDependency { library: name } if name == library)
            })
            .map(|entry| entry.index)
    }
}

impl std::fmt::Debug for NodeOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeOrdering").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{
        LibraryDependencyId, ModuleDependencyId, ModuleId, Owner, SyntheticKind,
    };
    use crate::node::NodeDescriptor;
    use crate::testing::InMemoryNativeModel;

    fn node(identity: EntityId, state: NodeState) -> StructureNode {
        let name = identity.default_display_name();
        StructureNode::new(identity, NodeDescriptor::new(name).with_state(state))
    }

    fn lib(module: &str, library: &str) -> StructureNode {
        node(
            EntityId::from(LibraryDependencyId::new(Owner::Native, module, library)),
            NodeState::NoChange,
        )
    }

    #[test]
    fn test_external_only_floats_to_top() {
        let native = Arc::new(InMemoryNativeModel::new("p"));
        let ordering = NodeOrdering::new(native);

        let external = node(
            EntityId::from(ModuleId::new(Owner::External, "zzz")),
            NodeState::ExternalLocal,
        );
        let group = node(
            EntityId::SyntheticGroup(SyntheticKind::Dependencies),
            NodeState::NoChange,
        );
        assert_eq!(ordering.compare(&external, &group), Ordering::Less);
        assert_eq!(ordering.compare(&group, &external), Ordering::Greater);
    }

    #[test]
    fn test_kind_weight_then_name() {
        let native = Arc::new(InMemoryNativeModel::new("p"));
        let ordering = NodeOrdering::new(native);

        let a = node(EntityId::from(ModuleId::new(Owner::Native, "b")), NodeState::NoChange);
        let b = node(EntityId::from(ModuleId::new(Owner::Native, "a")), NodeState::NoChange);
        let group = node(
            EntityId::SyntheticGroup(SyntheticKind::Dependencies),
            NodeState::NoChange,
        );
        assert_eq!(ordering.compare(&b, &a), Ordering::Less);
        assert_eq!(ordering.compare(&a, &group), Ordering::Less);
    }

    #[test]
    fn test_order_entry_index_breaks_ties() {
        let native = Arc::new(InMemoryNativeModel::new("p"));
        native.add_module("app");
        native.add_library_dependency("app", "z-lib");
        native.add_module_dependency("app", "core");
        native.add_library_dependency("app", "a-lib");
        let ordering = NodeOrdering::new(native.clone());

        let z = lib("app", "z-lib");
        let a = lib("app", "a-lib");
        let core = node(
            EntityId::from(ModuleDependencyId::new(Owner::Native, "app", "core")),
            NodeState::NoChange,
        );

        // Classpath order wins over kind weight and name.
        assert_eq!(ordering.compare(&z, &core), Ordering::Less);
        assert_eq!(ordering.compare(&core, &a), Ordering::Less);
        assert_eq!(ordering.compare(&z, &a), Ordering::Less);

        // Re-queried each time: dropping an entry moves it behind resolved ones.
        native.remove_library_dependency("app", "z-lib");
        assert_eq!(ordering.compare(&z, &a), Ordering::Greater);
        assert_eq!(ordering.compare(&z, &core), Ordering::Greater);
    }

    #[test]
    fn test_unresolved_sorts_before_next_band() {
        let native = Arc::new(InMemoryNativeModel::new("p"));
        let ordering = NodeOrdering::new(native);

        let unresolved = lib("app", "gone");
        let library = node(
            EntityId::from(crate::identity::LibraryId::new(Owner::Native, "gone")),
            NodeState::NoChange,
        );
        assert_eq!(ordering.compare(&unresolved, &library), Ordering::Less);
    }
}

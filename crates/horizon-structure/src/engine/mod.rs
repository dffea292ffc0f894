//! The reconciliation engine.
//!
//! [`ReconciliationEngine`] owns the structure tree. It builds the tree from
//! the native model with [`rebuild`](ReconciliationEngine::rebuild), then
//! keeps it in sync with the stream of divergences reported by a change
//! source. Each delta carries the previous and the current set of changes;
//! only changes that appeared or disappeared are applied.
//!
//! # Threading
//!
//! The engine is single-writer. Deltas produced on other threads go through
//! a [`DispatchSender`] and are applied by
//! [`process_pending`](ReconciliationEngine::process_pending) on the owning
//! thread. In [`DeliveryMode::Synchronous`], deltas submitted on the owning
//! thread are applied inline.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_structure::{EngineConfig, ReconciliationEngine};
//! use horizon_structure::testing::{InMemoryExternalModel, InMemoryNativeModel};
//!
//! let native = Arc::new(InMemoryNativeModel::new("demo"));
//! native.add_module("app");
//! let external = Arc::new(InMemoryExternalModel::new(native.clone()));
//!
//! let mut engine = ReconciliationEngine::new(native, external, EngineConfig::new().synchronous());
//! engine.rebuild();
//! assert!(engine.find_module("app").is_some());
//! ```

mod handlers;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use horizon_structure_core::logging::targets;
use horizon_structure_core::{DeliveryMode, DispatchQueue, DispatchSender, PerfSpan, ThreadAffinity};
use slotmap::SlotMap;

use crate::accessor::{ExternalModelAccessor, NativeModelAccessor, OrderEntryKind};
use crate::change::Change;
use crate::config::EngineConfig;
use crate::debug::StructureTreeDebug;
use crate::error::{Error, Result};
use crate::filter::{FilterEngine, FilterId, NodeFilter};
use crate::identity::{
    ContentRootId, EntityId, EntityKind, JarId, JarKind, LibraryDependencyId, ModuleDependencyId,
    ModuleId, Owner, ProjectId, SyntheticKind, file_name,
};
use crate::node::{NodeDescriptor, NodeId, NodeState, StructureNode};
use crate::ordering::NodeOrdering;
use crate::tree::StructureTree;

/// A pair of change sets reported by the change source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeDelta {
    pub old: HashSet<Change>,
    pub new: HashSet<Change>,
}

impl ChangeDelta {
    pub fn new(
        old: impl IntoIterator<Item = Change>,
        new: impl IntoIterator<Item = Change>,
    ) -> Self {
        Self {
            old: old.into_iter().collect(),
            new: new.into_iter().collect(),
        }
    }
}

/// Direction in which a change is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// The divergence appeared.
    Current,
    /// The divergence went away.
    Obsolete,
}

/// Keeps a structure tree in sync with the divergences between two models.
pub struct ReconciliationEngine {
    native: Arc<dyn NativeModelAccessor>,
    external: Arc<dyn ExternalModelAccessor>,
    config: EngineConfig,
    tree: StructureTree,
    /// Module name to module node.
    module_nodes: HashMap<String, NodeId>,
    /// Module name to that module's dependency group node.
    dependency_group_nodes: HashMap<String, NodeId>,
    filters: SlotMap<FilterId, Arc<dyn NodeFilter>>,
    /// Changes currently reflected in the tree.
    known_changes: HashSet<Change>,
    deltas: DispatchQueue<ChangeDelta>,
    affinity: ThreadAffinity,
}

impl ReconciliationEngine {
    /// Create an unbuilt engine. Call [`rebuild`](Self::rebuild) before use.
    pub fn new(
        native: Arc<dyn NativeModelAccessor>,
        external: Arc<dyn ExternalModelAccessor>,
        config: EngineConfig,
    ) -> Self {
        let tree = StructureTree::new(NodeOrdering::new(native.clone()));
        let deltas = DispatchQueue::new(config.delivery);
        Self {
            native,
            external,
            config,
            tree,
            module_nodes: HashMap::new(),
            dependency_group_nodes: HashMap::new(),
            filters: SlotMap::with_key(),
            known_changes: HashSet::new(),
            deltas,
            affinity: ThreadAffinity::current(),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> &StructureTree {
        &self.tree
    }

    /// Whether [`rebuild`](Self::rebuild) has run.
    pub fn is_built(&self) -> bool {
        self.tree.root().is_some()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    pub fn node(&self, id: NodeId) -> Option<&StructureNode> {
        self.tree.node(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.tree.children(id)
    }

    pub fn children_of_kind(&self, id: NodeId, kind: EntityKind) -> Vec<NodeId> {
        self.tree.children_of_kind(id, kind)
    }

    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.path_to_root(id)
    }

    /// The node of a module, if it is currently in the tree.
    pub fn find_module(&self, name: &str) -> Option<NodeId> {
        self.module_nodes
            .get(name)
            .copied()
            .filter(|&id| self.tree.contains(id))
    }

    /// The dependency group of a module, if it is currently in the tree.
    pub fn dependency_group(&self, module: &str) -> Option<NodeId> {
        self.dependency_group_nodes
            .get(module)
            .copied()
            .filter(|&id| self.tree.contains(id))
    }

    /// Changes currently reflected in the tree.
    pub fn known_changes(&self) -> &HashSet<Change> {
        &self.known_changes
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    /// Rebuild the whole tree from the native model.
    ///
    /// Known changes are replayed onto the fresh tree, then filters are
    /// applied.
    #[tracing::instrument(skip(self), target = "horizon_structure::engine")]
    pub fn rebuild(&mut self) {
        self.affinity.debug_assert_same_thread();
        let _perf = PerfSpan::new("rebuild");

        self.module_nodes.clear();
        self.dependency_group_nodes.clear();

        let project = self.native.project_name();
        self.tree.reset(
            EntityId::Project(ProjectId::new(Owner::Native, project.clone())),
            NodeDescriptor::new(project),
        );

        for module in self.native.modules() {
            self.build_module(&module.name);
        }

        let mut replay: Vec<Change> = self.known_changes.drain().collect();
        replay.sort();
        for change in replay {
            self.apply_one(&change, Phase::Current);
            self.known_changes.insert(change);
        }

        self.refilter();

        tracing::debug!(
            target: targets::ENGINE,
            nodes = self.tree.len(),
            modules = self.module_nodes.len(),
            "tree rebuilt"
        );
        if self.config.dump_tree_after_rebuild {
            let dump = StructureTreeDebug::with_options(self.config.tree_format.clone());
            tracing::trace!(target: targets::ENGINE, "\n{}", dump.format(&self.tree));
        }
    }

    fn build_module(&mut self, name: &str) {
        if self.ensure_module_node(name, Owner::Native).is_none() {
            return;
        }

        let roots = self.native.content_roots(name);
        for root in &roots {
            let id = ContentRootId::new(Owner::Native, name, root.path.clone());
            self.add_content_root_node(id, roots.len());
        }

        for entry in self.native.order_entries(name) {
            match entry.kind {
                OrderEntryKind::ModuleSource => {}
                OrderEntryKind::ModuleDependency { target } => {
                    let id = ModuleDependencyId::new(Owner::Native, name, target);
                    self.add_dependency_node(EntityId::ModuleDependency(id), Owner::Native);
                }
                OrderEntryKind::LibraryDependency { library } => {
                    let id = LibraryDependencyId::new(Owner::Native, name, library);
                    self.add_library_dependency_node(id);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Node helpers
    // -------------------------------------------------------------------------

    /// The module node for `name`, created under the root if missing.
    fn ensure_module_node(&mut self, name: &str, owner: Owner) -> Option<NodeId> {
        if let Some(node) = self.find_module(name) {
            return Some(node);
        }
        let root = self.tree.root()?;
        let identity = EntityId::Module(ModuleId::new(owner, name));
        let node = match self.tree.find_child(root, &identity) {
            Some(node) => node,
            None => self
                .tree
                .add_child(root, identity, NodeDescriptor::new(name))?,
        };
        self.module_nodes.insert(name.to_string(), node);
        Some(node)
    }

    /// The dependency group of `module`, created (with its module) if missing.
    fn ensure_dependency_group(&mut self, module: &str, owner: Owner) -> Option<NodeId> {
        if let Some(group) = self.dependency_group(module) {
            return Some(group);
        }
        let module_node = self.ensure_module_node(module, owner)?;
        let identity = EntityId::SyntheticGroup(SyntheticKind::Dependencies);
        let group = match self.tree.find_child(module_node, &identity) {
            Some(group) => group,
            None => self.tree.add_child(
                module_node,
                identity,
                NodeDescriptor::new(self.config.dependencies_group_name.clone()),
            )?,
        };
        self.dependency_group_nodes.insert(module.to_string(), group);
        Some(group)
    }

    fn add_content_root_node(&mut self, id: ContentRootId, sibling_roots: usize) -> Option<NodeId> {
        let module = self.ensure_module_node(&id.module, id.owner)?;
        let identity = EntityId::ContentRoot(id.clone());
        if let Some(existing) = self.tree.find_child(module, &identity) {
            return Some(existing);
        }
        let mut name = file_name(&id.path);
        if sibling_roots > 1 && self.config.content_root_path_suffix {
            name = format!("{} ({})", name, id.path.display());
        }
        self.tree.add_child(module, identity, NodeDescriptor::new(name))
    }

    /// Add a dependency node under its module's group, reusing an existing one.
    fn add_dependency_node(&mut self, identity: EntityId, owner: Owner) -> Option<NodeId> {
        let module = identity.owning_module()?.to_string();
        let group = self.ensure_dependency_group(&module, owner)?;
        if let Some(existing) = self.tree.find_child(group, &identity) {
            return Some(existing);
        }
        let name = identity.default_display_name();
        self.tree.add_child(group, identity, NodeDescriptor::new(name))
    }

    /// Add a library dependency node together with its binary jars.
    ///
    /// An existing node is returned as is; only a new node is populated with
    /// the jars of `id`'s owner.
    fn add_library_dependency_node(&mut self, id: LibraryDependencyId) -> Option<NodeId> {
        let owner = id.owner;
        let library = id.library_id();
        let group = self.dependency_group(&id.module);
        let identity = EntityId::LibraryDependency(id);
        if let Some(existing) = group.and_then(|g| self.tree.find_child(g, &identity)) {
            return Some(existing);
        }
        let node = self.add_dependency_node(identity, owner)?;

        let files = match owner {
            Owner::Native => self.native.library_files(&library.name, JarKind::Binary),
            Owner::External => self
                .external
                .find_library(&library)
                .map(|found| found.binary_paths)
                .unwrap_or_default(),
        };
        for path in files {
            let identity = EntityId::Jar(JarId::new(path, JarKind::Binary, library.clone()));
            if self.tree.find_child(node, &identity).is_none() {
                let name = identity.default_display_name();
                self.tree.add_child(node, identity, NodeDescriptor::new(name));
            }
        }
        Some(node)
    }

    /// Mark a node as existing only in `owner`'s model.
    fn mark_local(&mut self, node: NodeId, owner: Owner) {
        let state = match owner {
            Owner::Native => NodeState::NativeLocal,
            Owner::External => NodeState::ExternalLocal,
        };
        self.tree.set_state_and_tooltip(
            node,
            state,
            Some(format!("Exists only in the {owner} model")),
        );
    }

    /// Mark a node as present in both models.
    ///
    /// A node that still carries conflict markers goes back to
    /// [`NodeState::Conflict`].
    fn mark_resolved(&mut self, node: NodeId) {
        let state = if self
            .tree
            .node(node)
            .is_some_and(|n| !n.conflict_markers().is_empty())
        {
            NodeState::Conflict
        } else {
            NodeState::NoChange
        };
        if !self.tree.set_state_and_tooltip(node, state, None) {
            self.tree.correct_position_if_needed(node);
        }
    }

    /// Remove a node and drop cache entries that pointed into its subtree.
    fn remove_node(&mut self, node: NodeId) {
        if self.tree.remove_from_parent(node).is_some() {
            self.evict_detached();
        }
    }

    /// Remove empty dependency groups starting at `node` and walking up.
    fn prune_empty_groups(&mut self, node: Option<NodeId>) {
        let mut current = node;
        while let Some(id) = current {
            let Some(n) = self.tree.node(id) else {
                return;
            };
            if n.kind() != EntityKind::SyntheticGroup || n.has_children() {
                return;
            }
            current = n.parent();
            self.remove_node(id);
        }
    }

    fn evict_detached(&mut self) {
        let tree = &self.tree;
        self.module_nodes.retain(|_, id| tree.contains(*id));
        self.dependency_group_nodes.retain(|_, id| tree.contains(*id));
    }

    /// Whether the entity exists in the model its identity names.
    fn entity_exists(&self, identity: &EntityId) -> bool {
        match identity {
            EntityId::Module(id) => self.external.find_module(id).is_some(),
            EntityId::ContentRoot(id) => self.external.find_content_root(id).is_some(),
            EntityId::ModuleDependency(id) => self.external.is_module_dependency_present(id),
            EntityId::LibraryDependency(id) => self.external.is_library_dependency_present(id),
            EntityId::Library(id) => self.external.find_library(id).is_some(),
            EntityId::Jar(id) => self.external.is_jar_present(id),
            EntityId::Project(_)
            | EntityId::CompositeLibraryDependency(_)
            | EntityId::SyntheticGroup(_) => true,
        }
    }

    /// Re-run the filter pass if any filter is registered.
    fn refilter(&mut self) {
        if self.filters.is_empty() {
            return;
        }
        let filters: Vec<Arc<dyn NodeFilter>> = self.filters.values().cloned().collect();
        let removed = FilterEngine::apply(&mut self.tree, &filters);
        if !removed.is_empty() {
            self.evict_detached();
        }
    }

    // -------------------------------------------------------------------------
    // Applying changes
    // -------------------------------------------------------------------------

    /// Apply changes that appeared.
    ///
    /// The whole batch is validated first; a malformed record rejects the
    /// batch before anything is applied. Changes already known are skipped.
    #[tracing::instrument(skip_all, target = "horizon_structure::engine")]
    pub fn apply_current(&mut self, changes: impl IntoIterator<Item = Change>) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        if !self.is_built() {
            return Err(Error::NotBuilt);
        }
        let batch = prepare_batch(changes)?;
        self.apply_batch(batch, Phase::Current);
        Ok(())
    }

    /// Retract changes that went away.
    ///
    /// Same validation as [`apply_current`](Self::apply_current). Changes
    /// that are not known are skipped.
    #[tracing::instrument(skip_all, target = "horizon_structure::engine")]
    pub fn apply_obsolete(&mut self, changes: impl IntoIterator<Item = Change>) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        if !self.is_built() {
            return Err(Error::NotBuilt);
        }
        let batch = prepare_batch(changes)?;
        self.apply_batch(batch, Phase::Obsolete);
        Ok(())
    }

    /// Handle one delta from the change source.
    ///
    /// Applies `(old - new)` as obsolete and `(new - old)` as current,
    /// ignoring anything already in the requested state, so delivering the
    /// same delta twice is a no-op. Before the first rebuild only the known
    /// set is updated; it is replayed when the tree is built.
    #[tracing::instrument(
        skip_all,
        target = "horizon_structure::engine",
        fields(old = old.len(), new = new.len())
    )]
    pub fn on_change_delta(&mut self, old: &HashSet<Change>, new: &HashSet<Change>) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let obsolete = prepare_batch(
            old.difference(new)
                .filter(|c| self.known_changes.contains(*c))
                .cloned(),
        )?;
        let current = prepare_batch(
            new.difference(old)
                .filter(|c| !self.known_changes.contains(*c))
                .cloned(),
        )?;
        tracing::debug!(
            target: targets::ENGINE,
            obsolete = obsolete.len(),
            current = current.len(),
            "change delta"
        );

        if !self.is_built() {
            for change in &obsolete {
                self.known_changes.remove(change);
            }
            self.known_changes.extend(current);
            return Ok(());
        }

        self.apply_batch(obsolete, Phase::Obsolete);
        self.apply_batch(current, Phase::Current);
        Ok(())
    }

    fn apply_batch(&mut self, batch: Vec<Change>, phase: Phase) {
        for change in batch {
            match phase {
                Phase::Current => {
                    if self.known_changes.contains(&change) {
                        tracing::debug!(target: targets::ENGINE, %change, "already applied");
                        continue;
                    }
                    self.apply_one(&change, phase);
                    self.known_changes.insert(change);
                }
                Phase::Obsolete => {
                    if !self.known_changes.remove(&change) {
                        tracing::debug!(target: targets::ENGINE, %change, "not applied, nothing to retract");
                        continue;
                    }
                    self.apply_one(&change, phase);
                }
            }
        }
    }

    /// Re-sort the dependency groups after the native classpath order changed.
    pub fn on_native_model_structure_changed(&mut self) {
        self.affinity.debug_assert_same_thread();
        let groups: Vec<NodeId> = self.dependency_group_nodes.values().copied().collect();
        let resorted = groups
            .into_iter()
            .filter(|&group| self.tree.sort_children(group))
            .count();
        tracing::debug!(target: targets::ENGINE, resorted, "dependency groups resorted");
    }

    // -------------------------------------------------------------------------
    // Filters
    // -------------------------------------------------------------------------

    /// Register a filter. Rebuilds the tree if it is built.
    pub fn add_filter(&mut self, filter: impl NodeFilter + 'static) -> FilterId {
        let id = self.filters.insert(Arc::new(filter));
        self.rebuild_if_built();
        id
    }

    /// Unregister a filter. Rebuilds the tree if it is built.
    pub fn remove_filter(&mut self, id: FilterId) -> Result<()> {
        self.filters.remove(id).ok_or(Error::UnknownFilter)?;
        self.rebuild_if_built();
        Ok(())
    }

    /// Unregister every filter. Rebuilds the tree if it is built.
    pub fn clear_filters(&mut self) {
        if self.filters.is_empty() {
            return;
        }
        self.filters.clear();
        self.rebuild_if_built();
    }

    fn rebuild_if_built(&mut self) {
        if self.is_built() {
            self.rebuild();
        }
    }

    // -------------------------------------------------------------------------
    // Delta delivery
    // -------------------------------------------------------------------------

    /// A handle for submitting deltas from any thread.
    pub fn delta_sender(&self) -> DispatchSender<ChangeDelta> {
        self.deltas.sender()
    }

    /// Submit a delta on the owning thread.
    ///
    /// Applied inline in synchronous mode, queued otherwise.
    pub fn submit_delta(&mut self, delta: ChangeDelta) -> Result<()> {
        match self.deltas.mode() {
            DeliveryMode::Synchronous if self.affinity.is_same_thread() => {
                self.on_change_delta(&delta.old, &delta.new)
            }
            _ => {
                self.deltas.post(delta);
                Ok(())
            }
        }
    }

    /// Apply every queued delta in submission order.
    ///
    /// Returns how many deltas were processed. Stops at the first delta with
    /// a malformed change.
    pub fn process_pending(&mut self) -> Result<usize> {
        self.affinity.debug_assert_same_thread();
        let mut processed = 0;
        while let Some(delta) = self.deltas.try_next() {
            self.on_change_delta(&delta.old, &delta.new)?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Number of deltas waiting for [`process_pending`](Self::process_pending).
    pub fn pending_deltas(&self) -> usize {
        self.deltas.pending_count()
    }
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("tree", &self.tree)
            .field("modules", &self.module_nodes.len())
            .field("filters", &self.filters.len())
            .field("known_changes", &self.known_changes.len())
            .finish_non_exhaustive()
    }
}

/// Validate every change, then sort the batch into application order.
fn prepare_batch(changes: impl IntoIterator<Item = Change>) -> Result<Vec<Change>> {
    let mut batch: Vec<Change> = changes.into_iter().collect();
    for change in &batch {
        change.validate()?;
    }
    batch.sort();
    batch.dedup();
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::PresenceChange;
    use crate::testing::{InMemoryExternalModel, InMemoryNativeModel};

    fn engine() -> (Arc<InMemoryNativeModel>, ReconciliationEngine) {
        let native = Arc::new(InMemoryNativeModel::new("p"));
        native.add_module("app");
        native.add_content_root("app", "/work/app");
        native.add_library_dependency("app", "L");
        native.add_library_file("L", JarKind::Binary, "/repo/l.jar");
        native.add_library_file("L", JarKind::Sources, "/repo/l-src.jar");
        let external = Arc::new(InMemoryExternalModel::new(native.clone()));
        let engine = ReconciliationEngine::new(native.clone(), external, EngineConfig::default());
        (native, engine)
    }

    #[test]
    fn test_unbuilt_engine() {
        let (_, mut engine) = engine();
        assert!(!engine.is_built());
        assert!(matches!(engine.apply_current([]), Err(Error::NotBuilt)));
        assert!(matches!(engine.apply_obsolete([]), Err(Error::NotBuilt)));
    }

    #[test]
    fn test_rebuild_structure() {
        let (_, mut engine) = engine();
        engine.rebuild();
        let root = engine.root().unwrap();
        assert_eq!(engine.node(root).unwrap().display_name(), "p");

        let app = engine.find_module("app").unwrap();
        let kinds: Vec<EntityKind> = engine
            .children(app)
            .iter()
            .map(|&id| engine.node(id).unwrap().kind())
            .collect();
        assert_eq!(kinds, vec![EntityKind::ContentRoot, EntityKind::SyntheticGroup]);

        let group = engine.dependency_group("app").unwrap();
        let deps = engine.children_of_kind(group, EntityKind::LibraryDependency);
        assert_eq!(deps.len(), 1);
        // Only binary jars are shown.
        let jars = engine.children(deps[0]);
        assert_eq!(jars.len(), 1);
        assert_eq!(engine.node(jars[0]).unwrap().display_name(), "l.jar");
    }

    #[test]
    fn test_delta_before_rebuild_is_replayed() {
        let (_, mut engine) = engine();
        let change = Change::ModulePresence(PresenceChange::external_only(ModuleId::new(
            Owner::External,
            "remote",
        )));
        let delta = ChangeDelta::new([], [change.clone()]);
        engine.on_change_delta(&delta.old, &delta.new).unwrap();
        assert!(engine.known_changes().contains(&change));

        engine.rebuild();
        let remote = engine.find_module("remote").unwrap();
        assert_eq!(engine.node(remote).unwrap().state(), NodeState::ExternalLocal);
    }

    #[test]
    fn test_prepare_batch_sorts_and_rejects() {
        let good = Change::ModulePresence(PresenceChange::native_only(ModuleId::new(
            Owner::Native,
            "a",
        )));
        let bad = Change::JarPresence(PresenceChange::new(None, None));
        assert!(prepare_batch([good.clone(), bad]).is_err());
        assert_eq!(prepare_batch([good.clone(), good.clone()]).unwrap(), vec![good]);
    }
}

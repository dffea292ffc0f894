//! Per-kind change handlers.

use horizon_structure_core::logging::targets;

use super::{Phase, ReconciliationEngine};
use crate::change::{Change, OutdatedLibraryVersionChange, PresenceChange};
use crate::identity::{CompositeLibraryDependencyId, EntityId, EntityKind, JarId, JarKind, Owner};
use crate::node::{NodeDescriptor, NodeId, NodeState};

impl ReconciliationEngine {
    /// Dispatch one validated change.
    pub(super) fn apply_one(&mut self, change: &Change, phase: Phase) {
        tracing::trace!(target: targets::ENGINE, %change, ?phase, "applying change");
        match change {
            Change::ModulePresence(c) => self.apply_presence(c, phase),
            Change::ContentRootPresence(c) => self.apply_presence(c, phase),
            Change::ModuleDependencyPresence(c) => self.apply_presence(c, phase),
            Change::LibraryDependencyPresence(c) => self.apply_presence(c, phase),
            Change::JarPresence(c) => self.apply_jar_presence(c, phase),
            Change::OutdatedLibraryVersion(c) => self.apply_outdated_version(c, phase),
            Change::Rename(c) | Change::LanguageLevel(c) => {
                let target = self.project_level_node(&c.entity);
                self.apply_marker(target.into_iter().collect(), change, phase);
            }
            Change::DependencyScope(c) => {
                let nodes = self.dependency_nodes(&c.entity.to_entity());
                self.apply_marker(nodes, change, phase);
            }
            Change::DependencyExported(c) => {
                let nodes = self.dependency_nodes(&c.entity.to_entity());
                self.apply_marker(nodes, change, phase);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Presence
    // -------------------------------------------------------------------------

    fn apply_presence<I>(&mut self, change: &PresenceChange<I>, phase: Phase)
    where
        I: Clone + Into<EntityId>,
    {
        let Some((owner, id)) = change.side() else {
            return;
        };
        let identity: EntityId = id.clone().into();
        match phase {
            Phase::Current => self.presence_current(identity, owner),
            Phase::Obsolete => self.presence_obsolete(identity, owner),
        }
    }

    fn presence_current(&mut self, identity: EntityId, owner: Owner) {
        let node = match &identity {
            EntityId::Module(id) => self.ensure_module_node(&id.name, owner),
            EntityId::ContentRoot(id) => {
                let siblings = self.native.content_roots(&id.module).len().max(1);
                self.add_content_root_node(id.clone(), siblings)
            }
            EntityId::LibraryDependency(id) => self.add_library_dependency_node(id.clone()),
            EntityId::ModuleDependency(_) => self.add_dependency_node(identity.clone(), owner),
            _ => None,
        };
        let Some(node) = node else {
            tracing::debug!(target: targets::ENGINE, %identity, "no place for node, skipping");
            return;
        };
        self.mark_local(node, owner);
        self.refilter();
    }

    fn presence_obsolete(&mut self, identity: EntityId, owner: Owner) {
        let Some(node) = self.find_node(&identity) else {
            tracing::debug!(target: targets::ENGINE, %identity, "node not in tree, nothing to retract");
            return;
        };
        self.resolve_retracted(node, &identity, owner);
    }

    /// Settle a node whose one-sided divergence was retracted.
    ///
    /// If the counterpart now exists the node becomes a plain node; if the
    /// entity itself is gone the node is removed.
    fn resolve_retracted(&mut self, node: NodeId, identity: &EntityId, owner: Owner) {
        if self.entity_exists(&identity.with_owner(owner.counterpart())) {
            tracing::debug!(target: targets::ENGINE, %identity, "now present in both models");
            self.mark_resolved(node);
            self.refilter();
        } else if !self.entity_exists(identity) {
            tracing::debug!(target: targets::ENGINE, %identity, "entity vanished, removing node");
            let parent = self.tree.parent(node);
            self.remove_node(node);
            self.prune_empty_groups(parent);
            self.refilter();
        } else {
            tracing::debug!(
                target: targets::ENGINE,
                %identity,
                "divergence retracted but entity is still one-sided"
            );
        }
    }

    /// Locate the node of a presence identity without creating anything.
    fn find_node(&self, identity: &EntityId) -> Option<NodeId> {
        match identity {
            EntityId::Module(id) => self.find_module(&id.name),
            EntityId::ContentRoot(id) => {
                let module = self.find_module(&id.module)?;
                self.tree.find_child(module, identity)
            }
            EntityId::ModuleDependency(_) | EntityId::LibraryDependency(_) => {
                let group = self.dependency_group(identity.owning_module()?)?;
                self.tree.find_child(group, identity)
            }
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Jars
    // -------------------------------------------------------------------------

    fn apply_jar_presence(&mut self, change: &PresenceChange<JarId>, phase: Phase) {
        let Some((owner, jar)) = change.side() else {
            return;
        };
        if jar.kind != JarKind::Binary {
            tracing::trace!(target: targets::ENGINE, path = %jar.path.display(), "non-binary jar ignored");
            return;
        }
        let identity = EntityId::Jar(jar.clone());

        for dependency in self.library_dependency_nodes(&jar.library.name) {
            match phase {
                Phase::Current => {
                    let dependency_state = self.tree.node(dependency).map(|n| n.state());
                    if owner == Owner::Native && dependency_state == Some(NodeState::ExternalLocal) {
                        continue;
                    }
                    let node = match self.tree.find_child(dependency, &identity) {
                        Some(node) => Some(node),
                        None => self.tree.add_child(
                            dependency,
                            identity.clone(),
                            NodeDescriptor::new(identity.default_display_name()),
                        ),
                    };
                    if let Some(node) = node {
                        self.mark_local(node, owner);
                    }
                }
                Phase::Obsolete => {
                    if let Some(node) = self.tree.find_child(dependency, &identity) {
                        self.resolve_retracted(node, &identity, owner);
                    }
                }
            }
        }
        self.refilter();
    }

    /// Every plain library dependency node on the named library.
    fn library_dependency_nodes(&self, library: &str) -> Vec<NodeId> {
        self.dependency_group_nodes
            .values()
            .flat_map(|&group| self.tree.children_of_kind(group, EntityKind::LibraryDependency))
            .filter(|&node| {
                self.tree.node(node).is_some_and(|n| {
                    matches!(n.identity(), EntityId::LibraryDependency(id) if id.library == library)
                })
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Outdated library versions
    // -------------------------------------------------------------------------

    fn apply_outdated_version(&mut self, change: &OutdatedLibraryVersionChange, phase: Phase) {
        let composite = EntityId::CompositeLibraryDependency(CompositeLibraryDependencyId {
            external: change.external.clone(),
            native: change.native.clone(),
        });
        match phase {
            Phase::Current => {
                let Some(group) = self.ensure_dependency_group(&change.native.module, Owner::Native)
                else {
                    return;
                };
                for side in [&change.native, &change.external] {
                    let plain = EntityId::LibraryDependency(side.clone());
                    if let Some(node) = self.tree.find_child(group, &plain) {
                        self.remove_node(node);
                    }
                }
                if self.tree.find_child(group, &composite).is_none() {
                    let descriptor = NodeDescriptor::new(format!(
                        "{} ({} -> {})",
                        change.base_name, change.native_version, change.external_version
                    ))
                    .with_state(NodeState::Outdated)
                    .with_tooltip(format!(
                        "Native model uses {} {}, external model uses {}",
                        change.base_name, change.native_version, change.external_version
                    ));
                    self.tree.add_child(group, composite, descriptor);
                }
                self.refilter();
            }
            Phase::Obsolete => {
                let Some(group) = self.dependency_group(&change.native.module) else {
                    return;
                };
                if let Some(node) = self.tree.find_child(group, &composite) {
                    self.remove_node(node);
                }
                if self.external.is_library_dependency_present(&change.native) {
                    self.add_library_dependency_node(change.native.clone());
                } else {
                    tracing::debug!(
                        target: targets::ENGINE,
                        library = %change.native.library,
                        "native library no longer resolves, not restoring"
                    );
                }
                self.prune_empty_groups(Some(group));
                self.refilter();
            }
        }
    }

    // -------------------------------------------------------------------------
    // Property divergences
    // -------------------------------------------------------------------------

    /// The root for project identities, the module node for module identities.
    fn project_level_node(&self, entity: &EntityId) -> Option<NodeId> {
        match entity {
            EntityId::Project(_) => self.tree.root(),
            EntityId::Module(id) => self.find_module(&id.name),
            other => {
                tracing::debug!(target: targets::ENGINE, entity = %other, "not a project or module");
                None
            }
        }
    }

    /// Dependency nodes naming the entity, across all dependency groups.
    fn dependency_nodes(&self, entity: &EntityId) -> Vec<NodeId> {
        self.dependency_group_nodes
            .values()
            .filter_map(|&group| self.tree.find_child(group, entity))
            .collect()
    }

    fn apply_marker(&mut self, nodes: Vec<NodeId>, change: &Change, phase: Phase) {
        if nodes.is_empty() {
            tracing::debug!(target: targets::ENGINE, %change, "no node carries this divergence");
            return;
        }
        for node in nodes {
            match phase {
                Phase::Current => {
                    self.tree.add_conflict_marker(node, change.clone());
                }
                Phase::Obsolete => {
                    self.tree.remove_conflict_marker(node, change);
                }
            }
        }
        self.refilter();
    }
}

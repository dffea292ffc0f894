//! In-memory models and notification recording for tests.
//!
//! Available in this crate's tests and, for downstream crates, behind the
//! `testing` feature.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use horizon_structure_core::ConnectionGuard;
use parking_lot::{Mutex, RwLock};

use crate::accessor::{
    ContentRootRef, ExternalModelAccessor, LibraryRef, ModuleRef, NativeModelAccessor,
    OrderEntryKind, OrderEntryRef,
};
use crate::change::DependencyScope;
use crate::identity::{
    ContentRootId, JarId, JarKind, LibraryDependencyId, LibraryId, ModuleDependencyId, ModuleId,
    Owner,
};
use crate::node::NodeId;
use crate::tree::{RemovedNode, TreeSignals};

#[derive(Debug, Default)]
struct ModelState {
    project: String,
    modules: Vec<ModuleState>,
    libraries: HashMap<String, HashMap<JarKind, Vec<PathBuf>>>,
}

#[derive(Debug)]
struct ModuleState {
    name: String,
    content_roots: Vec<PathBuf>,
    entries: Vec<EntryState>,
}

#[derive(Debug, Clone)]
struct EntryState {
    kind: OrderEntryKind,
    scope: DependencyScope,
    exported: bool,
}

impl EntryState {
    fn names(&self, name: &str) -> bool {
        match &self.kind {
            OrderEntryKind::ModuleSource => false,
            OrderEntryKind::ModuleDependency { target } => target == name,
            OrderEntryKind::LibraryDependency { library } => library == name,
        }
    }
}

impl ModelState {
    fn module(&self, name: &str) -> Option<&ModuleState> {
        self.modules.iter().find(|m| m.name == name)
    }

    fn module_mut(&mut self, name: &str) -> Option<&mut ModuleState> {
        self.modules.iter_mut().find(|m| m.name == name)
    }
}

/// A mutable project model held in memory.
///
/// Implements [`NativeModelAccessor`] and is used for both sides of an
/// [`InMemoryExternalModel`]. All mutators take `&self` so the model can be
/// shared with an engine through an `Arc` and edited afterwards.
#[derive(Debug, Default)]
pub struct InMemoryModel {
    state: RwLock<ModelState>,
}

/// The native side of a test setup.
pub type InMemoryNativeModel = InMemoryModel;

impl InMemoryModel {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(ModelState {
                project: project.into(),
                ..Default::default()
            }),
        }
    }

    pub fn set_project_name(&self, name: impl Into<String>) {
        self.state.write().project = name.into();
    }

    /// Add a module whose first order entry is its own source.
    pub fn add_module(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.state.write();
        if state.module(&name).is_some() {
            return;
        }
        state.modules.push(ModuleState {
            name,
            content_roots: Vec::new(),
            entries: vec![EntryState {
                kind: OrderEntryKind::ModuleSource,
                scope: DependencyScope::Compile,
                exported: false,
            }],
        });
    }

    pub fn remove_module(&self, name: &str) {
        self.state.write().modules.retain(|m| m.name != name);
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.state.read().module(name).is_some()
    }

    pub fn add_content_root(&self, module: &str, path: impl Into<PathBuf>) {
        if let Some(m) = self.state.write().module_mut(module) {
            m.content_roots.push(path.into());
        }
    }

    pub fn remove_content_root(&self, module: &str, path: &Path) {
        if let Some(m) = self.state.write().module_mut(module) {
            m.content_roots.retain(|root| root != path);
        }
    }

    pub fn has_content_root(&self, module: &str, path: &Path) -> bool {
        self.state
            .read()
            .module(module)
            .is_some_and(|m| m.content_roots.iter().any(|root| root == path))
    }

    pub fn add_module_dependency(&self, module: &str, target: impl Into<String>) {
        self.push_entry(
            module,
            OrderEntryKind::ModuleDependency {
                target: target.into(),
            },
        );
    }

    pub fn remove_module_dependency(&self, module: &str, target: &str) {
        self.remove_entry(module, |kind| {
            matches!(kind, OrderEntryKind::ModuleDependency { target: t } if t == target)
        });
    }

    pub fn has_module_dependency(&self, module: &str, target: &str) -> bool {
        self.has_entry(module, |kind| {
            matches!(kind, OrderEntryKind::ModuleDependency { target: t } if t == target)
        })
    }

    /// Add a library dependency, registering the library if it is new.
    pub fn add_library_dependency(&self, module: &str, library: impl Into<String>) {
        let library = library.into();
        self.state
            .write()
            .libraries
            .entry(library.clone())
            .or_default();
        self.push_entry(module, OrderEntryKind::LibraryDependency { library });
    }

    pub fn remove_library_dependency(&self, module: &str, library: &str) {
        self.remove_entry(module, |kind| {
            matches!(kind, OrderEntryKind::LibraryDependency { library: l } if l == library)
        });
    }

    pub fn has_library_dependency(&self, module: &str, library: &str) -> bool {
        self.has_entry(module, |kind| {
            matches!(kind, OrderEntryKind::LibraryDependency { library: l } if l == library)
        })
    }

    /// Set scope and exported flag of the dependency on `name`.
    pub fn set_dependency_attributes(
        &self,
        module: &str,
        name: &str,
        scope: DependencyScope,
        exported: bool,
    ) {
        if let Some(m) = self.state.write().module_mut(module)
            && let Some(entry) = m.entries.iter_mut().find(|e| e.names(name))
        {
            entry.scope = scope;
            entry.exported = exported;
        }
    }

    /// Move the dependency on `name` (module or library) to `index`.
    pub fn move_order_entry(&self, module: &str, name: &str, index: usize) {
        if let Some(m) = self.state.write().module_mut(module)
            && let Some(from) = m.entries.iter().position(|e| e.names(name))
        {
            let entry = m.entries.remove(from);
            let index = index.min(m.entries.len());
            m.entries.insert(index, entry);
        }
    }

    pub fn add_library_file(&self, library: &str, kind: JarKind, path: impl Into<PathBuf>) {
        self.state
            .write()
            .libraries
            .entry(library.to_string())
            .or_default()
            .entry(kind)
            .or_default()
            .push(path.into());
    }

    pub fn remove_library_file(&self, library: &str, kind: JarKind, path: &Path) {
        if let Some(files) = self
            .state
            .write()
            .libraries
            .get_mut(library)
            .and_then(|kinds| kinds.get_mut(&kind))
        {
            files.retain(|file| file != path);
        }
    }

    pub fn has_library(&self, library: &str) -> bool {
        self.state.read().libraries.contains_key(library)
    }

    fn push_entry(&self, module: &str, kind: OrderEntryKind) {
        if let Some(m) = self.state.write().module_mut(module) {
            m.entries.push(EntryState {
                kind,
                scope: DependencyScope::Compile,
                exported: false,
            });
        }
    }

    fn remove_entry(&self, module: &str, matches: impl Fn(&OrderEntryKind) -> bool) {
        if let Some(m) = self.state.write().module_mut(module) {
            m.entries.retain(|e| !matches(&e.kind));
        }
    }

    fn has_entry(&self, module: &str, matches: impl Fn(&OrderEntryKind) -> bool) -> bool {
        self.state
            .read()
            .module(module)
            .is_some_and(|m| m.entries.iter().any(|e| matches(&e.kind)))
    }
}

impl NativeModelAccessor for InMemoryModel {
    fn project_name(&self) -> String {
        self.state.read().project.clone()
    }

    fn modules(&self) -> Vec<ModuleRef> {
        self.state
            .read()
            .modules
            .iter()
            .map(|m| ModuleRef {
                name: m.name.clone(),
            })
            .collect()
    }

    fn content_roots(&self, module: &str) -> Vec<ContentRootRef> {
        self.state
            .read()
            .module(module)
            .map(|m| {
                m.content_roots
                    .iter()
                    .map(|path| ContentRootRef { path: path.clone() })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn order_entries(&self, module: &str) -> Vec<OrderEntryRef> {
        self.state
            .read()
            .module(module)
            .map(|m| {
                m.entries
                    .iter()
                    .enumerate()
                    .map(|(index, e)| OrderEntryRef {
                        index,
                        kind: e.kind.clone(),
                        scope: e.scope,
                        exported: e.exported,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn library_files(&self, library: &str, kind: JarKind) -> Vec<PathBuf> {
        self.state
            .read()
            .libraries
            .get(library)
            .and_then(|kinds| kinds.get(&kind))
            .cloned()
            .unwrap_or_default()
    }
}

/// Existence queries answered by two in-memory models.
#[derive(Debug)]
pub struct InMemoryExternalModel {
    native: Arc<InMemoryModel>,
    external: Arc<InMemoryModel>,
}

impl InMemoryExternalModel {
    /// Pair an existing native model with a fresh, empty external one.
    pub fn new(native: Arc<InMemoryModel>) -> Self {
        let project = native.project_name();
        Self {
            native,
            external: Arc::new(InMemoryModel::new(project)),
        }
    }

    /// The external side, for editing.
    pub fn external(&self) -> &InMemoryModel {
        &self.external
    }

    pub fn native(&self) -> &InMemoryModel {
        &self.native
    }

    fn side(&self, owner: Owner) -> &InMemoryModel {
        match owner {
            Owner::Native => &self.native,
            Owner::External => &self.external,
        }
    }
}

impl ExternalModelAccessor for InMemoryExternalModel {
    fn find_module(&self, id: &ModuleId) -> Option<ModuleRef> {
        self.side(id.owner).has_module(&id.name).then(|| ModuleRef {
            name: id.name.clone(),
        })
    }

    fn find_library(&self, id: &LibraryId) -> Option<LibraryRef> {
        let side = self.side(id.owner);
        side.has_library(&id.name).then(|| LibraryRef {
            name: id.name.clone(),
            binary_paths: side.library_files(&id.name, JarKind::Binary),
        })
    }

    fn find_content_root(&self, id: &ContentRootId) -> Option<ContentRootRef> {
        self.side(id.owner)
            .has_content_root(&id.module, &id.path)
            .then(|| ContentRootRef {
                path: id.path.clone(),
            })
    }

    fn is_library_dependency_present(&self, id: &LibraryDependencyId) -> bool {
        self.side(id.owner)
            .has_library_dependency(&id.module, &id.library)
    }

    fn is_module_dependency_present(&self, id: &ModuleDependencyId) -> bool {
        self.side(id.owner).has_module_dependency(&id.module, &id.target)
    }

    fn is_jar_present(&self, id: &JarId) -> bool {
        self.side(id.library.owner)
            .library_files(&id.library.name, id.kind)
            .contains(&id.path)
    }
}

/// One recorded tree notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    Inserted { parent: NodeId, index: usize },
    Removed { parent: NodeId, index: usize, node: RemovedNode },
    Changed(NodeId),
    Reordered { parent: NodeId, permutation: Vec<usize> },
    Reset,
}

impl TreeEvent {
    /// Whether the event changes the shape of the tree.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Changed(_))
    }
}

/// Records every notification of a tree while alive.
pub struct NotificationRecorder {
    events: Arc<Mutex<Vec<TreeEvent>>>,
    _inserted: ConnectionGuard<(NodeId, usize)>,
    _removed: ConnectionGuard<(NodeId, usize, RemovedNode)>,
    _changed: ConnectionGuard<NodeId>,
    _reordered: ConnectionGuard<(NodeId, Vec<usize>)>,
    _reset: ConnectionGuard<()>,
}

impl NotificationRecorder {
    pub fn attach(signals: &TreeSignals) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));

        let sink = events.clone();
        let inserted = signals.node_inserted.connect_scoped(move |&(parent, index)| {
            sink.lock().push(TreeEvent::Inserted { parent, index });
        });
        let sink = events.clone();
        let removed = signals
            .nodes_removed
            .connect_scoped(move |(parent, index, node)| {
                sink.lock().push(TreeEvent::Removed {
                    parent: *parent,
                    index: *index,
                    node: node.clone(),
                });
            });
        let sink = events.clone();
        let changed = signals
            .node_changed
            .connect_scoped(move |&node| sink.lock().push(TreeEvent::Changed(node)));
        let sink = events.clone();
        let reordered = signals
            .children_reordered
            .connect_scoped(move |(parent, permutation)| {
                sink.lock().push(TreeEvent::Reordered {
                    parent: *parent,
                    permutation: permutation.clone(),
                });
            });
        let sink = events.clone();
        let reset = signals
            .tree_reset
            .connect_scoped(move |_| sink.lock().push(TreeEvent::Reset));

        Self {
            events,
            _inserted: inserted,
            _removed: removed,
            _changed: changed,
            _reordered: reordered,
            _reset: reset,
        }
    }

    /// A copy of everything recorded so far.
    pub fn events(&self) -> Vec<TreeEvent> {
        self.events.lock().clone()
    }

    /// Return and forget everything recorded so far.
    pub fn take(&self) -> Vec<TreeEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

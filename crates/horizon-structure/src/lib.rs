//! Horizon Structure - project-structure reconciliation.
//!
//! Maintains one ordered tree describing a project (project, modules,
//! content roots, dependency groups, dependencies, jars) and keeps it in sync
//! with the divergences between two models of that project: the IDE's own
//! native model and an externally imported build description.
//!
//! - [`ReconciliationEngine`] builds the tree and applies change deltas.
//! - [`StructureTree`] stores the nodes and emits [`TreeSignals`] for views.
//! - [`NodeOrdering`] decides sibling order.
//! - [`FilterEngine`] hides nodes while keeping visible descendants reachable.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_structure::{
//!     Change, ChangeDelta, EngineConfig, ModuleId, NodeState, Owner, PresenceChange,
//!     ReconciliationEngine,
//! };
//! use horizon_structure::testing::{InMemoryExternalModel, InMemoryNativeModel};
//!
//! let native = Arc::new(InMemoryNativeModel::new("demo"));
//! native.add_module("app");
//! let external = Arc::new(InMemoryExternalModel::new(native.clone()));
//! external.external().add_module("tools");
//!
//! let mut engine = ReconciliationEngine::new(native, external, EngineConfig::new().synchronous());
//! engine.rebuild();
//!
//! let tools = Change::ModulePresence(PresenceChange::external_only(ModuleId::new(
//!     Owner::External,
//!     "tools",
//! )));
//! engine.submit_delta(ChangeDelta::new([], [tools])).unwrap();
//!
//! let node = engine.find_module("tools").unwrap();
//! assert_eq!(engine.node(node).unwrap().state(), NodeState::ExternalLocal);
//! ```

pub mod accessor;
pub mod change;
mod config;
mod debug;
pub mod engine;
mod error;
pub mod filter;
pub mod identity;
pub mod node;
pub mod ordering;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tree;

pub use accessor::{
    ContentRootRef, ExternalModelAccessor, LibraryRef, ModuleRef, NativeModelAccessor,
    OrderEntryKind, OrderEntryRef,
};
pub use change::{
    Change, ChangeKind, DependencyId, DependencyScope, OutdatedLibraryVersionChange,
    PresenceChange, PropertyChange,
};
pub use config::EngineConfig;
pub use debug::StructureTreeDebug;
pub use engine::{ChangeDelta, ReconciliationEngine};
pub use error::{Error, Result};
pub use filter::{FilterEngine, FilterFn, FilterId, FnFilter, NodeFilter, StateFilter};
pub use identity::{
    CompositeLibraryDependencyId, ContentRootId, EntityId, EntityKind, JarId, JarKind, LibraryDependencyId,
    LibraryId, ModuleDependencyId, ModuleId, Owner, ProjectId, SyntheticKind,
};
pub use node::{NodeDescriptor, NodeId, NodeState, StructureNode};
pub use ordering::NodeOrdering;
pub use tree::{RemovedNode, StructureTree, TreeSignals};

//! Interfaces to the two project models.
//!
//! The engine never owns project data. It reads the native model through
//! [`NativeModelAccessor`] when building the tree, and asks
//! [`ExternalModelAccessor`] whether entities currently exist when it has to
//! decide how a retracted divergence resolved.
//!
//! All lookups are expected to be in-memory and non-blocking.

use std::path::PathBuf;

use crate::change::DependencyScope;
use crate::identity::{
    ContentRootId, JarId, JarKind, LibraryDependencyId, LibraryId, ModuleDependencyId, ModuleId,
};

/// A module as reported by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub name: String,
}

/// A content root as reported by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRootRef {
    pub path: PathBuf,
}

/// A library as reported by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRef {
    pub name: String,
    /// Binary classpath entries.
    pub binary_paths: Vec<PathBuf>,
}

/// What an order entry points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEntryKind {
    /// The module's own sources.
    ModuleSource,
    ModuleDependency { target: String },
    LibraryDependency { library: String },
}

/// One entry of a module's ordered classpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntryRef {
    /// 0-based position inside the module's order-entry list.
    pub index: usize,
    pub kind: OrderEntryKind,
    pub scope: DependencyScope,
    pub exported: bool,
}

/// Read access to the IDE's own project model.
pub trait NativeModelAccessor {
    /// Name of the open project.
    fn project_name(&self) -> String;

    /// Modules in model order.
    fn modules(&self) -> Vec<ModuleRef>;

    /// Content roots of a module in model order.
    fn content_roots(&self, module: &str) -> Vec<ContentRootRef>;

    /// The module's order entries, each carrying its index.
    fn order_entries(&self, module: &str) -> Vec<OrderEntryRef>;

    /// Files of the given kind attached to a library.
    fn library_files(&self, library: &str, kind: JarKind) -> Vec<PathBuf>;
}

/// Existence queries against both models.
///
/// Every identity carries an owner tag; implementations answer against the
/// model that tag names.
pub trait ExternalModelAccessor {
    fn find_module(&self, id: &ModuleId) -> Option<ModuleRef>;

    fn find_library(&self, id: &LibraryId) -> Option<LibraryRef>;

    fn find_content_root(&self, id: &ContentRootId) -> Option<ContentRootRef>;

    fn is_library_dependency_present(&self, id: &LibraryDependencyId) -> bool;

    fn is_module_dependency_present(&self, id: &ModuleDependencyId) -> bool;

    fn is_jar_present(&self, id: &JarId) -> bool;
}

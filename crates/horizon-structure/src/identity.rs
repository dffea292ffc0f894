//! Entity identities for nodes of the project structure tree.
//!
//! An [`EntityId`] names one thing in a project model: the project itself, a
//! module, a content root, a dependency, a library or jar, or a synthetic
//! grouping node. Most variants carry an [`Owner`] tag telling which model
//! (native or external) the identity must be resolved against.
//!
//! Identities are immutable values. When a divergence is resolved and a node
//! that was "external only" becomes present in both models, the node's
//! visual state changes; its identity never does. Use
//! [`EntityId::same_entity`] to compare identities regardless of owner.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which model an identity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    /// The IDE's own live project model.
    Native,
    /// The separately imported build description.
    External,
}

impl Owner {
    /// The other model.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Native => Self::External,
            Self::External => Self::Native,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::External => write!(f, "external"),
        }
    }
}

/// Classpath flavour of a library file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JarKind {
    /// Compiled classes; the only kind shown in the tree.
    Binary,
    /// Source archives.
    Sources,
    /// Documentation archives.
    Docs,
}

/// Kinds of synthetic grouping nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticKind {
    /// Groups a module's dependency nodes.
    Dependencies,
}

/// The whole project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId {
    pub owner: Owner,
    pub name: String,
}

impl ProjectId {
    pub fn new(owner: Owner, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

/// A module, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub owner: Owner,
    pub name: String,
}

impl ModuleId {
    pub fn new(owner: Owner, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

/// A content root of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentRootId {
    pub owner: Owner,
    pub module: String,
    pub path: PathBuf,
}

impl ContentRootId {
    pub fn new(owner: Owner, module: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            owner,
            module: module.into(),
            path: path.into(),
        }
    }
}

/// A dependency of one module on another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleDependencyId {
    pub owner: Owner,
    /// The module declaring the dependency.
    pub module: String,
    /// The module depended upon.
    pub target: String,
}

impl ModuleDependencyId {
    pub fn new(owner: Owner, module: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            owner,
            module: module.into(),
            target: target.into(),
        }
    }
}

/// A library, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryId {
    pub owner: Owner,
    pub name: String,
}

impl LibraryId {
    pub fn new(owner: Owner, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

/// A dependency of a module on a library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryDependencyId {
    pub owner: Owner,
    /// The module declaring the dependency.
    pub module: String,
    /// The library depended upon.
    pub library: String,
}

impl LibraryDependencyId {
    pub fn new(owner: Owner, module: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            owner,
            module: module.into(),
            library: library.into(),
        }
    }

    /// The library this dependency points at, with the same owner.
    pub fn library_id(&self) -> LibraryId {
        LibraryId::new(self.owner, self.library.clone())
    }
}

/// A same-named library whose versions diverged between the two models.
///
/// This is the only identity that pairs both owners on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeLibraryDependencyId {
    pub external: LibraryDependencyId,
    pub native: LibraryDependencyId,
}

/// A file on a library's classpath.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JarId {
    pub path: PathBuf,
    pub kind: JarKind,
    pub library: LibraryId,
}

impl JarId {
    pub fn new(path: impl Into<PathBuf>, kind: JarKind, library: LibraryId) -> Self {
        Self {
            path: path.into(),
            kind,
            library,
        }
    }
}

/// Identity of a tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityId {
    Project(ProjectId),
    Module(ModuleId),
    ContentRoot(ContentRootId),
    ModuleDependency(ModuleDependencyId),
    LibraryDependency(LibraryDependencyId),
    CompositeLibraryDependency(CompositeLibraryDependencyId),
    Jar(JarId),
    Library(LibraryId),
    SyntheticGroup(SyntheticKind),
}

/// The variant of an [`EntityId`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Module,
    ContentRoot,
    SyntheticGroup,
    ModuleDependency,
    LibraryDependency,
    CompositeLibraryDependency,
    Library,
    Jar,
}

impl EntityKind {
    /// Weight used when no better ordering information is available.
    pub fn weight(self) -> u32 {
        match self {
            Self::Project => 0,
            Self::Module => 1,
            Self::ContentRoot => 2,
            Self::SyntheticGroup => 3,
            Self::ModuleDependency => 4,
            Self::LibraryDependency => 5,
            Self::Library => 6,
            Self::Jar => 7,
            Self::CompositeLibraryDependency => UNKNOWN_WEIGHT,
        }
    }
}

/// Weight of kinds without an entry in the weight table.
pub const UNKNOWN_WEIGHT: u32 = 20;

impl EntityId {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Project(_) => EntityKind::Project,
            Self::Module(_) => EntityKind::Module,
            Self::ContentRoot(_) => EntityKind::ContentRoot,
            Self::ModuleDependency(_) => EntityKind::ModuleDependency,
            Self::LibraryDependency(_) => EntityKind::LibraryDependency,
            Self::CompositeLibraryDependency(_) => EntityKind::CompositeLibraryDependency,
            Self::Jar(_) => EntityKind::Jar,
            Self::Library(_) => EntityKind::Library,
            Self::SyntheticGroup(_) => EntityKind::SyntheticGroup,
        }
    }

    /// The owner tag, for variants that carry one.
    pub fn owner(&self) -> Option<Owner> {
        match self {
            Self::Project(id) => Some(id.owner),
            Self::Module(id) => Some(id.owner),
            Self::ContentRoot(id) => Some(id.owner),
            Self::ModuleDependency(id) => Some(id.owner),
            Self::LibraryDependency(id) => Some(id.owner),
            Self::Library(id) => Some(id.owner),
            Self::CompositeLibraryDependency(_) | Self::Jar(_) | Self::SyntheticGroup(_) => None,
        }
    }

    /// The module an order-entry-like identity belongs to.
    pub fn owning_module(&self) -> Option<&str> {
        match self {
            Self::ContentRoot(id) => Some(&id.module),
            Self::ModuleDependency(id) => Some(&id.module),
            Self::LibraryDependency(id) => Some(&id.module),
            Self::CompositeLibraryDependency(id) => Some(&id.native.module),
            _ => None,
        }
    }

    /// Whether both identities name the same entity, ignoring owner tags.
    pub fn same_entity(&self, other: &EntityId) -> bool {
        self.with_owner(Owner::Native) == other.with_owner(Owner::Native)
    }

    /// A copy with every owner tag replaced, naming the same entity as seen
    /// from the given model. Jars take the owner of their library.
    pub fn with_owner(&self, owner: Owner) -> EntityId {
        match self {
            Self::Project(id) => Self::Project(ProjectId {
                owner,
                ..id.clone()
            }),
            Self::Module(id) => Self::Module(ModuleId {
                owner,
                ..id.clone()
            }),
            Self::ContentRoot(id) => Self::ContentRoot(ContentRootId {
                owner,
                ..id.clone()
            }),
            Self::ModuleDependency(id) => Self::ModuleDependency(ModuleDependencyId {
                owner,
                ..id.clone()
            }),
            Self::LibraryDependency(id) => Self::LibraryDependency(LibraryDependencyId {
                owner,
                ..id.clone()
            }),
            Self::Library(id) => Self::Library(LibraryId {
                owner,
                ..id.clone()
            }),
            Self::Jar(id) => Self::Jar(JarId {
                library: LibraryId {
                    owner,
                    ..id.library.clone()
                },
                ..id.clone()
            }),
            Self::CompositeLibraryDependency(_) | Self::SyntheticGroup(_) => self.clone(),
        }
    }

    /// The name shown for this entity when nothing more specific is known.
    pub fn default_display_name(&self) -> String {
        match self {
            Self::Project(id) => id.name.clone(),
            Self::Module(id) => id.name.clone(),
            Self::ContentRoot(id) => file_name(&id.path),
            Self::ModuleDependency(id) => id.target.clone(),
            Self::LibraryDependency(id) => id.library.clone(),
            Self::CompositeLibraryDependency(id) => id.native.library.clone(),
            Self::Jar(id) => file_name(&id.path),
            Self::Library(id) => id.name.clone(),
            Self::SyntheticGroup(SyntheticKind::Dependencies) => "Dependencies".to_string(),
        }
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project '{}' ({})", id.name, id.owner),
            Self::Module(id) => write!(f, "module '{}' ({})", id.name, id.owner),
            Self::ContentRoot(id) => write!(
                f,
                "content root '{}' of '{}' ({})",
                id.path.display(),
                id.module,
                id.owner
            ),
            Self::ModuleDependency(id) => write!(
                f,
                "module dependency '{}' -> '{}' ({})",
                id.module, id.target, id.owner
            ),
            Self::LibraryDependency(id) => write!(
                f,
                "library dependency '{}' -> '{}' ({})",
                id.module, id.library, id.owner
            ),
            Self::CompositeLibraryDependency(id) => write!(
                f,
                "library dependency '{}' -> '{}' / '{}'",
                id.native.module, id.native.library, id.external.library
            ),
            Self::Jar(id) => write!(f, "jar '{}' of '{}'", id.path.display(), id.library.name),
            Self::Library(id) => write!(f, "library '{}' ({})", id.name, id.owner),
            Self::SyntheticGroup(kind) => write!(f, "group {:?}", kind),
        }
    }
}

impl From<ModuleId> for EntityId {
    fn from(id: ModuleId) -> Self {
        Self::Module(id)
    }
}

impl From<ContentRootId> for EntityId {
    fn from(id: ContentRootId) -> Self {
        Self::ContentRoot(id)
    }
}

impl From<ModuleDependencyId> for EntityId {
    fn from(id: ModuleDependencyId) -> Self {
        Self::ModuleDependency(id)
    }
}

impl From<LibraryDependencyId> for EntityId {
    fn from(id: LibraryDependencyId) -> Self {
        Self::LibraryDependency(id)
    }
}

impl From<JarId> for EntityId {
    fn from(id: JarId) -> Self {
        Self::Jar(id)
    }
}

impl From<LibraryId> for EntityId {
    fn from(id: LibraryId) -> Self {
        Self::Library(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_entity_ignores_owner() {
        let native = EntityId::from(ModuleId::new(Owner::Native, "app"));
        let external = EntityId::from(ModuleId::new(Owner::External, "app"));
        assert_ne!(native, external);
        assert!(native.same_entity(&external));

        let other = EntityId::from(ModuleId::new(Owner::Native, "lib"));
        assert!(!native.same_entity(&other));
    }

    #[test]
    fn test_same_entity_for_jars_ignores_library_owner() {
        let a = EntityId::from(JarId::new(
            "/repo/l.jar",
            JarKind::Binary,
            LibraryId::new(Owner::Native, "L"),
        ));
        let b = EntityId::from(JarId::new(
            "/repo/l.jar",
            JarKind::Binary,
            LibraryId::new(Owner::External, "L"),
        ));
        assert!(a.same_entity(&b));
        assert_eq!(a.with_owner(Owner::External), b);
    }

    #[test]
    fn test_kind_weights() {
        assert!(EntityKind::Project.weight() < EntityKind::Module.weight());
        assert!(EntityKind::ContentRoot.weight() < EntityKind::SyntheticGroup.weight());
        assert!(EntityKind::ModuleDependency.weight() < EntityKind::LibraryDependency.weight());
        assert!(EntityKind::Library.weight() < EntityKind::Jar.weight());
        assert_eq!(EntityKind::CompositeLibraryDependency.weight(), UNKNOWN_WEIGHT);
    }

    #[test]
    fn test_owner_tags() {
        assert_eq!(Owner::Native.counterpart(), Owner::External);
        assert_eq!(
            EntityId::SyntheticGroup(SyntheticKind::Dependencies).owner(),
            None
        );
        assert_eq!(
            EntityId::from(LibraryDependencyId::new(Owner::External, "app", "L")).owner(),
            Some(Owner::External)
        );
    }

    #[test]
    fn test_default_display_names() {
        let root = EntityId::from(ContentRootId::new(Owner::Native, "app", "/work/app"));
        assert_eq!(root.default_display_name(), "app");
        let dep = EntityId::from(ModuleDependencyId::new(Owner::Native, "app", "core"));
        assert_eq!(dep.default_display_name(), "core");
    }
}

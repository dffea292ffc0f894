//! Structure change records.
//!
//! A [`Change`] describes one divergence between the native and the external
//! project model. Presence changes say an entity exists in only one model;
//! property changes say both models know the entity but disagree on a value.
//!
//! Changes are immutable values compared by content. The engine keeps sets of
//! them and diffs old against new sets to find what appeared and what went
//! away.
//!
//! Variant order matters: batches are applied in `Ord` order, so presence of
//! containers (modules, dependencies) is established before the changes that
//! decorate them (jars, conflict markers).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::{
    ContentRootId, EntityId, JarId, LibraryDependencyId, ModuleDependencyId, ModuleId, Owner,
};

/// A divergence where an entity exists in exactly one model.
///
/// The populated side is the model where the entity currently exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PresenceChange<I> {
    pub external: Option<I>,
    pub native: Option<I>,
}

impl<I> PresenceChange<I> {
    /// Build a change from both sides as delivered.
    ///
    /// Validity (exactly one side populated) is checked when the change is
    /// applied.
    pub fn new(external: Option<I>, native: Option<I>) -> Self {
        Self { external, native }
    }

    /// An entity that exists only in the external model.
    pub fn external_only(id: I) -> Self {
        Self {
            external: Some(id),
            native: None,
        }
    }

    /// An entity that exists only in the native model.
    pub fn native_only(id: I) -> Self {
        Self {
            external: None,
            native: Some(id),
        }
    }

    /// The populated side and its identity.
    pub fn side(&self) -> Option<(Owner, &I)> {
        match (&self.external, &self.native) {
            (Some(id), None) => Some((Owner::External, id)),
            (None, Some(id)) => Some((Owner::Native, id)),
            _ => None,
        }
    }

    fn validate(&self, kind: ChangeKind) -> Result<()> {
        match (&self.external, &self.native) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(Error::MalformedChange {
                kind,
                reason: "both sides are populated",
            }),
            (None, None) => Err(Error::MalformedChange {
                kind,
                reason: "neither side is populated",
            }),
        }
    }
}

/// A divergence where both models know an entity but disagree on a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyChange<I, V> {
    pub entity: I,
    pub external_value: V,
    pub native_value: V,
}

impl<I, V> PropertyChange<I, V> {
    pub fn new(entity: I, external_value: V, native_value: V) -> Self {
        Self {
            entity,
            external_value,
            native_value,
        }
    }
}

/// Scope of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyScope {
    Compile,
    Test,
    Runtime,
    Provided,
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Compile => "compile",
            Self::Test => "test",
            Self::Runtime => "runtime",
            Self::Provided => "provided",
        };
        f.write_str(name)
    }
}

/// The subject of a dependency-level property divergence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyId {
    Module(ModuleDependencyId),
    Library(LibraryDependencyId),
}

impl DependencyId {
    pub fn to_entity(&self) -> EntityId {
        match self {
            Self::Module(id) => EntityId::ModuleDependency(id.clone()),
            Self::Library(id) => EntityId::LibraryDependency(id.clone()),
        }
    }
}

/// The same library is referenced at different versions by the two models.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutdatedLibraryVersionChange {
    /// Library name without a version.
    pub base_name: String,
    pub external: LibraryDependencyId,
    pub external_version: String,
    pub native: LibraryDependencyId,
    pub native_version: String,
}

/// A single divergence record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    ModulePresence(PresenceChange<ModuleId>),
    ContentRootPresence(PresenceChange<ContentRootId>),
    ModuleDependencyPresence(PresenceChange<ModuleDependencyId>),
    LibraryDependencyPresence(PresenceChange<LibraryDependencyId>),
    OutdatedLibraryVersion(OutdatedLibraryVersionChange),
    JarPresence(PresenceChange<JarId>),
    /// Project or module name differs.
    Rename(PropertyChange<EntityId, String>),
    /// Project or module language level differs.
    LanguageLevel(PropertyChange<EntityId, String>),
    DependencyScope(PropertyChange<DependencyId, DependencyScope>),
    DependencyExported(PropertyChange<DependencyId, bool>),
}

/// The kind of a [`Change`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    ModulePresence,
    ContentRootPresence,
    ModuleDependencyPresence,
    LibraryDependencyPresence,
    OutdatedLibraryVersion,
    JarPresence,
    Rename,
    LanguageLevel,
    DependencyScope,
    DependencyExported,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ModulePresence => "module presence",
            Self::ContentRootPresence => "content root presence",
            Self::ModuleDependencyPresence => "module dependency presence",
            Self::LibraryDependencyPresence => "library dependency presence",
            Self::OutdatedLibraryVersion => "outdated library version",
            Self::JarPresence => "jar presence",
            Self::Rename => "rename",
            Self::LanguageLevel => "language level",
            Self::DependencyScope => "dependency scope",
            Self::DependencyExported => "dependency exported",
        };
        f.write_str(name)
    }
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::ModulePresence(_) => ChangeKind::ModulePresence,
            Self::ContentRootPresence(_) => ChangeKind::ContentRootPresence,
            Self::ModuleDependencyPresence(_) => ChangeKind::ModuleDependencyPresence,
            Self::LibraryDependencyPresence(_) => ChangeKind::LibraryDependencyPresence,
            Self::OutdatedLibraryVersion(_) => ChangeKind::OutdatedLibraryVersion,
            Self::JarPresence(_) => ChangeKind::JarPresence,
            Self::Rename(_) => ChangeKind::Rename,
            Self::LanguageLevel(_) => ChangeKind::LanguageLevel,
            Self::DependencyScope(_) => ChangeKind::DependencyScope,
            Self::DependencyExported(_) => ChangeKind::DependencyExported,
        }
    }

    /// Check the structural invariants of the record.
    ///
    /// Presence changes must populate exactly one side.
    pub fn validate(&self) -> Result<()> {
        let kind = self.kind();
        match self {
            Self::ModulePresence(c) => c.validate(kind),
            Self::ContentRootPresence(c) => c.validate(kind),
            Self::ModuleDependencyPresence(c) => c.validate(kind),
            Self::LibraryDependencyPresence(c) => c.validate(kind),
            Self::JarPresence(c) => c.validate(kind),
            Self::OutdatedLibraryVersion(_)
            | Self::Rename(_)
            | Self::LanguageLevel(_)
            | Self::DependencyScope(_)
            | Self::DependencyExported(_) => Ok(()),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn presence<I: Clone + Into<EntityId>>(
            f: &mut fmt::Formatter<'_>,
            change: &PresenceChange<I>,
        ) -> fmt::Result {
            match change.side() {
                Some((owner, id)) => write!(f, "{} exists only in the {owner} model", id.clone().into()),
                None => write!(f, "malformed presence change"),
            }
        }

        match self {
            Self::ModulePresence(c) => presence(f, c),
            Self::ContentRootPresence(c) => presence(f, c),
            Self::ModuleDependencyPresence(c) => presence(f, c),
            Self::LibraryDependencyPresence(c) => presence(f, c),
            Self::JarPresence(c) => presence(f, c),
            Self::OutdatedLibraryVersion(c) => write!(
                f,
                "library '{}' is at version {} natively and {} externally",
                c.base_name, c.native_version, c.external_version
            ),
            Self::Rename(c) => write!(
                f,
                "name: external '{}', native '{}'",
                c.external_value, c.native_value
            ),
            Self::LanguageLevel(c) => write!(
                f,
                "language level: external {}, native {}",
                c.external_value, c.native_value
            ),
            Self::DependencyScope(c) => write!(
                f,
                "scope: external {}, native {}",
                c.external_value, c.native_value
            ),
            Self::DependencyExported(c) => write!(
                f,
                "exported: external {}, native {}",
                c.external_value, c.native_value
            ),
        }
    }
}

//! # Storage Backends
//!
//! Two interchangeable implementations of the store contract:
//! - `MemoryHypergraph`: volatile, BTreeMap-based
//! - `RedbHypergraph`: persistent, redb-based
//!
//! `Store` selects one of them at runtime from a `StoreConfig`.

mod memory;
mod redb_hypergraph;

pub use memory::MemoryHypergraph;
pub use redb_hypergraph::RedbHypergraph;

use crate::config::{BackendKind, StoreConfig};
use crate::entity::{Atom, Entity};
use crate::hypergraph::{AttributeMap, Hypergraph};
use crate::types::{AttributeValue, HypergraphError, Result, StarOptions};

/// A store whose backend is chosen at runtime.
#[derive(Debug)]
pub enum Store {
    /// In-memory storage (fast, volatile).
    Memory(MemoryHypergraph),
    /// redb-based persistent storage (ACID, crash-safe).
    Redb(Box<RedbHypergraph>),
}

impl Store {
    /// Open the backend described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let name = config.resolved_name();
        match config.backend {
            BackendKind::Memory => Ok(Self::Memory(
                MemoryHypergraph::new(name).with_policy(config.primary_policy),
            )),
            BackendKind::Redb => {
                let path = config.path.as_deref().ok_or_else(|| {
                    HypergraphError::Config("the redb backend requires a database path".to_string())
                })?;
                let graph = RedbHypergraph::open(path)?
                    .with_name(name)
                    .with_policy(config.primary_policy);
                Ok(Self::Redb(Box::new(graph)))
            }
        }
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        match self {
            Self::Memory(_) => BackendKind::Memory,
            Self::Redb(_) => BackendKind::Redb,
        }
    }

    /// Whether data survives the process.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Redb(_))
    }

    fn inner(&self) -> &dyn Hypergraph {
        match self {
            Self::Memory(graph) => graph,
            Self::Redb(graph) => graph.as_ref(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Hypergraph {
        match self {
            Self::Memory(graph) => graph,
            Self::Redb(graph) => graph.as_mut(),
        }
    }
}

impl Hypergraph for Store {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn exists(&self, entity: &Entity) -> Result<bool> {
        self.inner().exists(entity)
    }

    fn insert(&mut self, entity: &Entity, primary: bool) -> Result<()> {
        self.inner_mut().insert(entity, primary)
    }

    fn delete(&mut self, entity: &Entity) -> Result<bool> {
        self.inner_mut().delete(entity)
    }

    fn is_primary(&self, entity: &Entity) -> Result<bool> {
        self.inner().is_primary(entity)
    }

    fn set_primary(&mut self, entity: &Entity, primary: bool) -> Result<()> {
        self.inner_mut().set_primary(entity, primary)
    }

    fn entities(&self) -> Result<Vec<Entity>> {
        self.inner().entities()
    }

    fn attribute(&self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        self.inner().attribute(entity, name)
    }

    fn set_attribute(
        &mut self,
        entity: &Entity,
        name: &str,
        value: AttributeValue,
    ) -> Result<bool> {
        self.inner_mut().set_attribute(entity, name, value)
    }

    fn inc_attribute(&mut self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        self.inner_mut().inc_attribute(entity, name)
    }

    fn dec_attribute(&mut self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        self.inner_mut().dec_attribute(entity, name)
    }

    fn degree(&self, entity: &Entity) -> Result<usize> {
        self.inner().degree(entity)
    }

    fn star(&self, center: &Entity, options: StarOptions) -> Result<Vec<Entity>> {
        self.inner().star(center, options)
    }

    fn atom_count(&self) -> Result<usize> {
        self.inner().atom_count()
    }

    fn edge_count(&self) -> Result<usize> {
        self.inner().edge_count()
    }

    fn primary_atom_count(&self) -> Result<usize> {
        self.inner().primary_atom_count()
    }

    fn primary_edge_count(&self) -> Result<usize> {
        self.inner().primary_edge_count()
    }

    fn destroy(&mut self) -> Result<()> {
        self.inner_mut().destroy()
    }

    fn close(&mut self) -> Result<()> {
        self.inner_mut().close()
    }

    fn deep_degree(&self, entity: &Entity) -> Result<usize> {
        self.inner().deep_degree(entity)
    }

    fn lookup_root(&self, root: &str) -> Result<Vec<Atom>> {
        self.inner().lookup_root(root)
    }

    fn lookup_atoms(&self, atoms: &[Atom], root: Option<&str>) -> Result<Vec<Entity>> {
        self.inner().lookup_atoms(atoms, root)
    }

    fn search(&self, pattern: &Entity) -> Result<Vec<Entity>> {
        self.inner().search(pattern)
    }

    fn attributes(&self) -> Result<Vec<(Entity, AttributeMap)>> {
        self.inner().attributes()
    }
}

// =============================================================================
// TESTS
// =============================================================================

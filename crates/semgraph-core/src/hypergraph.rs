//! # Store Contract
//!
//! The `Hypergraph` trait is the only interface a storage backend implements.
//! Everything callers use day to day (`add`, `remove`, pattern queries, ego
//! networks) is derived from it once, in [`crate::query::HypergraphExt`].
//!
//! All operations are synchronous. Absence is reported as `false`, `None`,
//! zero or an empty `Vec`, never as an error.
//!
//! Index-backed lookups have default bodies that return
//! `HypergraphError::UnsupportedOperation`, so a backend that skips them fails
//! fast at the first call instead of returning wrong answers.

use crate::entity::{Atom, Entity};
use crate::types::{AttributeValue, HypergraphError, Result, StarOptions};
use std::collections::BTreeMap;

/// Attributes of one entity, by name.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// The backend contract of the semantic hypergraph store.
pub trait Hypergraph {
    /// Name of the hypergraph (e.g. the database file stem).
    fn name(&self) -> &str;

    /// True iff `entity` is currently stored.
    fn exists(&self, entity: &Entity) -> Result<bool>;

    /// Insert a single entity whose children are already stored.
    ///
    /// Idempotent. For an entity that already exists, only the primary flag
    /// may change, according to the backend's `PrimaryPolicy`. Returns
    /// `DanglingChild` if an edge child is missing.
    fn insert(&mut self, entity: &Entity, primary: bool) -> Result<()>;

    /// Delete a single entity, its attributes and its index entries.
    ///
    /// Sub-edges are left alone. Returns whether the entity existed.
    fn delete(&mut self, entity: &Entity) -> Result<bool>;

    /// Primary flag of a stored entity; `false` when absent.
    fn is_primary(&self, entity: &Entity) -> Result<bool>;

    /// Override the primary flag. No effect on absent entities.
    fn set_primary(&mut self, entity: &Entity, primary: bool) -> Result<()>;

    /// Whole-store scan, in a stable order for a fixed store state.
    fn entities(&self) -> Result<Vec<Entity>>;

    /// Read one attribute.
    fn attribute(&self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>>;

    /// Write one attribute. Returns `false` if the entity is not stored.
    fn set_attribute(&mut self, entity: &Entity, name: &str, value: AttributeValue)
    -> Result<bool>;

    /// Atomically increment a numeric attribute (absent starts at 0).
    /// Returns the new value, or `None` if the entity is not stored.
    fn inc_attribute(&mut self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>>;

    /// Atomically decrement a numeric attribute (absent starts at 0).
    fn dec_attribute(&mut self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>>;

    /// Number of primary edges that contain `entity` as a direct child.
    fn degree(&self, entity: &Entity) -> Result<usize>;

    /// Edges that contain `center` as a direct child, primary or not.
    fn star(&self, center: &Entity, options: StarOptions) -> Result<Vec<Entity>>;

    /// Number of stored atoms.
    fn atom_count(&self) -> Result<usize>;

    /// Number of stored edges.
    fn edge_count(&self) -> Result<usize>;

    /// Number of primary atoms.
    fn primary_atom_count(&self) -> Result<usize>;

    /// Number of primary edges.
    fn primary_edge_count(&self) -> Result<usize>;

    /// Erase every entity and attribute.
    fn destroy(&mut self) -> Result<()>;

    /// Flush and release backend resources. The store stays usable.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    // =========================================================================
    // INDEX-BACKED LOOKUPS
    // =========================================================================

    /// Number of primary edges that contain `entity` at any depth.
    fn deep_degree(&self, _entity: &Entity) -> Result<usize> {
        Err(HypergraphError::UnsupportedOperation("deep_degree"))
    }

    /// Atoms with the given root label.
    fn lookup_root(&self, _root: &str) -> Result<Vec<Atom>> {
        Err(HypergraphError::UnsupportedOperation("atoms_with_root"))
    }

    /// Edges whose direct children include every atom in `atoms`, optionally
    /// also including some atom whose root is `root`.
    fn lookup_atoms(&self, _atoms: &[Atom], _root: Option<&str>) -> Result<Vec<Entity>> {
        Err(HypergraphError::UnsupportedOperation("edges_with_atoms"))
    }

    /// Candidate edges for an edge pattern. May over-approximate; the caller
    /// applies the positional matcher to every candidate.
    fn search(&self, _pattern: &Entity) -> Result<Vec<Entity>> {
        Err(HypergraphError::UnsupportedOperation("search"))
    }

    /// Every entity that carries at least one attribute, with its attributes.
    fn attributes(&self) -> Result<Vec<(Entity, AttributeMap)>> {
        Err(HypergraphError::UnsupportedOperation("all_attributes"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

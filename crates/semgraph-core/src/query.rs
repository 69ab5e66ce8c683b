//! # Derived Queries
//!
//! Operations written once against the [`Hypergraph`] contract and available
//! on every backend through the blanket `HypergraphExt` implementation:
//!
//! - recursive `add` and (deep) `remove`
//! - pattern queries (`match_all`, `match_pattern`)
//! - `ego`, `remove_by_pattern`, whole-store scans
//! - typed attribute getters with caller-supplied defaults

use crate::entity::{Atom, Entity};
use crate::hypergraph::Hypergraph;
use crate::pattern::{Matches, Pattern, full_pattern};
use crate::types::{
    AddOptions, DeepRemoval, HypergraphError, RemoveOptions, Result, StarOptions, StoreCounts,
};
use std::collections::BTreeSet;

fn add_recursive<H: Hypergraph + ?Sized>(
    store: &mut H,
    entity: &Entity,
    primary: bool,
) -> Result<()> {
    for child in entity.children() {
        // Present children keep their flag; only absent ones are added.
        if !store.exists(child)? {
            add_recursive(store, child, false)?;
        }
    }
    store.insert(entity, primary)
}

/// Backend-agnostic operations derived from the store contract.
pub trait HypergraphExt: Hypergraph {
    /// Add a primary entity, adding absent children as non-primary.
    /// Returns the entity.
    fn add(&mut self, entity: Entity) -> Result<Entity> {
        self.add_with(entity, AddOptions::default())
    }

    /// Add an entity with explicit options.
    fn add_with(&mut self, entity: Entity, options: AddOptions) -> Result<Entity> {
        if entity.is_pattern() {
            return Err(HypergraphError::InvalidEntity(format!(
                "pattern syntax cannot be stored: {}",
                entity
            )));
        }
        add_recursive(self, &entity, options.primary)?;
        Ok(entity)
    }

    /// Remove an entity and its attributes. Sub-edges are kept.
    fn remove(&mut self, entity: &Entity) -> Result<bool> {
        self.remove_with(entity, RemoveOptions::default())
    }

    /// Remove an entity, optionally with every sub-edge at any depth.
    ///
    /// Atoms are never removed by deep removal.
    fn remove_with(&mut self, entity: &Entity, options: RemoveOptions) -> Result<bool> {
        let existed = self.delete(entity)?;
        if !options.deep {
            return Ok(existed);
        }

        for sub in entity.subedges().into_iter().skip(1) {
            if options.sharing == DeepRemoval::KeepShared
                && !self.star(sub, StarOptions::limited(1))?.is_empty()
            {
                tracing::debug!(edge = %sub, "keeping shared sub-edge");
                continue;
            }
            self.delete(sub)?;
        }
        Ok(existed)
    }

    /// Every stored entity.
    fn all(&self) -> Result<Matches> {
        Ok(Matches::all(self.entities()?))
    }

    /// Every stored atom.
    fn all_atoms(&self) -> Result<Matches> {
        Ok(Matches::atoms(self.entities()?))
    }

    /// Every stored edge.
    fn all_edges(&self) -> Result<Matches> {
        Ok(Matches::edges(self.entities()?))
    }

    /// Parse a textual pattern and run it.
    fn match_all(&self, pattern: &str) -> Result<Matches> {
        self.match_pattern(Pattern::parse(pattern)?)
    }

    /// Run a normalized pattern.
    fn match_pattern(&self, pattern: Pattern) -> Result<Matches> {
        match pattern {
            Pattern::AnyEntity => self.all(),
            Pattern::AnyAtom => self.all_atoms(),
            Pattern::AnyEdge => self.all_edges(),
            Pattern::Atom(atom) => {
                let entity = Entity::Atom(atom);
                if self.exists(&entity)? {
                    Ok(Matches::all(vec![entity]))
                } else {
                    Ok(Matches::empty())
                }
            }
            Pattern::Edge(edge) if full_pattern(&edge) => {
                Ok(Matches::pattern(self.entities()?, edge))
            }
            Pattern::Edge(edge) => {
                let candidates = self.search(&edge)?;
                Ok(Matches::pattern(candidates, edge))
            }
        }
    }

    /// Atoms of every edge that directly contains `center`, deduplicated.
    fn ego(&self, center: &Entity) -> Result<BTreeSet<Atom>> {
        let mut atoms = BTreeSet::new();
        for edge in self.star(center, StarOptions::default())? {
            atoms.extend(edge.atoms());
        }
        Ok(atoms)
    }

    /// Remove every entity matching a textual pattern. Returns how many
    /// entities were removed.
    fn remove_by_pattern(&mut self, pattern: &str) -> Result<usize> {
        self.remove_matching(Pattern::parse(pattern)?)
    }

    /// Remove every entity matching `pattern`.
    ///
    /// Matches are collected before the first deletion; entities added while
    /// this runs are never removed.
    fn remove_matching(&mut self, pattern: Pattern) -> Result<usize> {
        let snapshot: Vec<Entity> = self.match_pattern(pattern)?.collect();
        let mut removed = 0usize;
        for entity in &snapshot {
            if self.remove(entity)? {
                removed = removed.saturating_add(1);
            }
        }
        tracing::debug!(matched = snapshot.len(), removed, "removed by pattern");
        Ok(removed)
    }

    /// Atoms with the given root. An empty root never reaches the backend.
    fn atoms_with_root(&self, root: &str) -> Result<Vec<Atom>> {
        if root.is_empty() {
            return Ok(Vec::new());
        }
        self.lookup_root(root)
    }

    /// Edges whose direct children include every atom in `atoms`, optionally
    /// also containing an atom with root `root`.
    fn edges_with_atoms(&self, atoms: &[Atom], root: Option<&str>) -> Result<Vec<Entity>> {
        self.lookup_atoms(atoms, root)
    }

    /// String attribute, or `or_else` when absent.
    fn get_str_attribute(&self, entity: &Entity, name: &str, or_else: &str) -> Result<String> {
        Ok(self
            .attribute(entity, name)?
            .map(|v| v.as_string())
            .unwrap_or_else(|| or_else.to_string()))
    }

    /// Integer attribute, or `or_else` when absent or not an integer.
    fn get_int_attribute(&self, entity: &Entity, name: &str, or_else: i64) -> Result<i64> {
        Ok(self
            .attribute(entity, name)?
            .and_then(|v| v.as_int())
            .unwrap_or(or_else))
    }

    /// Float attribute, or `or_else` when absent or not a number.
    fn get_float_attribute(&self, entity: &Entity, name: &str, or_else: f64) -> Result<f64> {
        Ok(self
            .attribute(entity, name)?
            .and_then(|v| v.as_float())
            .unwrap_or(or_else))
    }

    /// Atom/edge counts, split by primary flag.
    fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            atoms: self.atom_count()?,
            edges: self.edge_count()?,
            primary_atoms: self.primary_atom_count()?,
            primary_edges: self.primary_edge_count()?,
        })
    }
}

impl<T: Hypergraph + ?Sized> HypergraphExt for T {}

// =============================================================================
// TESTS
// =============================================================================

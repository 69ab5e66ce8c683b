//! # In-Memory Hypergraph
//!
//! The volatile backend. All data structures use `BTreeMap`/`BTreeSet` so
//! every scan and star query has a deterministic order.
//!
//! Indices kept alongside the entity records:
//! - containment: child -> edges that hold it as a direct child
//! - roots: atom root label -> atoms with that root

use crate::config::PrimaryPolicy;
use crate::entity::{Atom, Entity};
use crate::hypergraph::{AttributeMap, Hypergraph};
use crate::pattern::first_concrete_child;
use crate::types::{AttributeValue, HypergraphError, Result, StarOptions, Step};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Per-entity state.
#[derive(Debug, Clone, Default, PartialEq)]
struct EntityRecord {
    primary: bool,
    attributes: AttributeMap,
}

/// Volatile hypergraph held entirely in process memory.
#[derive(Debug, Clone)]
pub struct MemoryHypergraph {
    name: String,
    policy: PrimaryPolicy,
    records: BTreeMap<Entity, EntityRecord>,
    /// child -> direct parents
    parents: BTreeMap<Entity, BTreeSet<Entity>>,
    roots: BTreeMap<String, BTreeSet<Atom>>,
}

impl Default for MemoryHypergraph {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryHypergraph {
    /// Create an empty store.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: PrimaryPolicy::default(),
            records: BTreeMap::new(),
            parents: BTreeMap::new(),
            roots: BTreeMap::new(),
        }
    }

    /// Set the re-insert primary policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PrimaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> PrimaryPolicy {
        self.policy
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn direct_parents(&self, entity: &Entity) -> impl Iterator<Item = &Entity> {
        self.parents.get(entity).into_iter().flatten()
    }

    fn is_primary_record(&self, entity: &Entity) -> bool {
        self.records.get(entity).is_some_and(|r| r.primary)
    }

    fn step_attribute(
        &mut self,
        entity: &Entity,
        name: &str,
        step: Step,
    ) -> Result<Option<AttributeValue>> {
        let Some(record) = self.records.get_mut(entity) else {
            return Ok(None);
        };
        let next = AttributeValue::stepped(record.attributes.get(name), name, step)?;
        record.attributes.insert(name.to_string(), next.clone());
        Ok(Some(next))
    }

    fn count_where(&self, keep: impl Fn(&Entity, &EntityRecord) -> bool) -> usize {
        self.records.iter().filter(|(e, r)| keep(e, r)).count()
    }
}

// =============================================================================
// STORE CONTRACT
// =============================================================================

impl Hypergraph for MemoryHypergraph {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, entity: &Entity) -> Result<bool> {
        Ok(self.records.contains_key(entity))
    }

    fn insert(&mut self, entity: &Entity, primary: bool) -> Result<()> {
        if let Some(record) = self.records.get_mut(entity) {
            record.primary = self.policy.resolve(record.primary, primary);
            return Ok(());
        }

        for child in entity.children() {
            if !self.records.contains_key(child) {
                return Err(HypergraphError::DanglingChild {
                    edge: entity.to_string(),
                    child: child.to_string(),
                });
            }
        }

        match entity {
            Entity::Atom(atom) => {
                self.roots
                    .entry(atom.root().to_string())
                    .or_default()
                    .insert(atom.clone());
            }
            Entity::Edge(children) => {
                for child in children {
                    self.parents
                        .entry(child.clone())
                        .or_default()
                        .insert(entity.clone());
                }
            }
        }

        self.records.insert(
            entity.clone(),
            EntityRecord {
                primary,
                attributes: AttributeMap::new(),
            },
        );
        Ok(())
    }

    fn delete(&mut self, entity: &Entity) -> Result<bool> {
        if self.records.remove(entity).is_none() {
            return Ok(false);
        }

        // Rows where the entity is the child belong to its parents and
        // outlive it; only a parent's own delete drops them.
        match entity {
            Entity::Atom(atom) => {
                if let Some(set) = self.roots.get_mut(atom.root()) {
                    set.remove(atom);
                    if set.is_empty() {
                        self.roots.remove(atom.root());
                    }
                }
            }
            Entity::Edge(children) => {
                for child in children {
                    if let Some(set) = self.parents.get_mut(child) {
                        set.remove(entity);
                        if set.is_empty() {
                            self.parents.remove(child);
                        }
                    }
                }
            }
        }
        Ok(true)
    }

    fn is_primary(&self, entity: &Entity) -> Result<bool> {
        Ok(self.is_primary_record(entity))
    }

    fn set_primary(&mut self, entity: &Entity, primary: bool) -> Result<()> {
        if let Some(record) = self.records.get_mut(entity) {
            record.primary = primary;
        }
        Ok(())
    }

    fn entities(&self) -> Result<Vec<Entity>> {
        Ok(self.records.keys().cloned().collect())
    }

    fn attribute(&self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        Ok(self
            .records
            .get(entity)
            .and_then(|r| r.attributes.get(name))
            .cloned())
    }

    fn set_attribute(
        &mut self,
        entity: &Entity,
        name: &str,
        value: AttributeValue,
    ) -> Result<bool> {
        match self.records.get_mut(entity) {
            Some(record) => {
                record.attributes.insert(name.to_string(), value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn inc_attribute(&mut self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        self.step_attribute(entity, name, Step::Up)
    }

    fn dec_attribute(&mut self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        self.step_attribute(entity, name, Step::Down)
    }

    fn degree(&self, entity: &Entity) -> Result<usize> {
        Ok(self
            .direct_parents(entity)
            .filter(|edge| self.is_primary_record(edge))
            .count())
    }

    fn star(&self, center: &Entity, options: StarOptions) -> Result<Vec<Entity>> {
        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(self.direct_parents(center).take(limit).cloned().collect())
    }

    fn atom_count(&self) -> Result<usize> {
        Ok(self.count_where(|e, _| e.is_atom()))
    }

    fn edge_count(&self) -> Result<usize> {
        Ok(self.count_where(|e, _| e.is_edge()))
    }

    fn primary_atom_count(&self) -> Result<usize> {
        Ok(self.count_where(|e, r| e.is_atom() && r.primary))
    }

    fn primary_edge_count(&self) -> Result<usize> {
        Ok(self.count_where(|e, r| e.is_edge() && r.primary))
    }

    fn destroy(&mut self) -> Result<()> {
        tracing::debug!(
            name = %self.name,
            entities = self.records.len(),
            "destroying in-memory store"
        );
        self.records.clear();
        self.parents.clear();
        self.roots.clear();
        Ok(())
    }

    fn deep_degree(&self, entity: &Entity) -> Result<usize> {
        let mut visited: BTreeSet<&Entity> = BTreeSet::new();
        let mut queue: VecDeque<&Entity> = self.direct_parents(entity).collect();
        let mut count = 0usize;

        while let Some(edge) = queue.pop_front() {
            if !visited.insert(edge) {
                continue;
            }
            if self.is_primary_record(edge) {
                count = count.saturating_add(1);
            }
            queue.extend(self.direct_parents(edge));
        }
        Ok(count)
    }

    fn lookup_root(&self, root: &str) -> Result<Vec<Atom>> {
        Ok(self
            .roots
            .get(root)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn lookup_atoms(&self, atoms: &[Atom], root: Option<&str>) -> Result<Vec<Entity>> {
        let Some((first, rest)) = atoms.split_first() else {
            return Ok(Vec::new());
        };
        let mut edges: BTreeSet<&Entity> = self
            .direct_parents(&Entity::Atom(first.clone()))
            .collect();
        for atom in rest {
            let other: BTreeSet<&Entity> =
                self.direct_parents(&Entity::Atom(atom.clone())).collect();
            edges.retain(|edge| other.contains(edge));
        }

        Ok(edges
            .into_iter()
            .filter(|edge| match root {
                Some(root) => edge
                    .children()
                    .iter()
                    .any(|c| c.as_atom().is_some_and(|a| a.root() == root)),
                None => true,
            })
            .cloned()
            .collect())
    }

    fn search(&self, pattern: &Entity) -> Result<Vec<Entity>> {
        match first_concrete_child(pattern) {
            Some(anchor) => Ok(self.direct_parents(anchor).cloned().collect()),
            None => Ok(self
                .records
                .keys()
                .filter(|e| e.is_edge())
                .cloned()
                .collect()),
        }
    }

    fn attributes(&self) -> Result<Vec<(Entity, AttributeMap)>> {
        Ok(self
            .records
            .iter()
            .filter(|(_, r)| !r.attributes.is_empty())
            .map(|(e, r)| (e.clone(), r.attributes.clone()))
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

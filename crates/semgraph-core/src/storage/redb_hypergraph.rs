//! # redb-backed Hypergraph Storage
//!
//! A disk-backed hypergraph using the redb embedded database, providing:
//! - ACID transactions (one write transaction per mutation)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Entities are assigned dense `u64` ids on first insert, keyed by their
//! postcard encoding so storage identity is structural identity. An id stays
//! assigned after its entity is deleted: containment rows of surviving
//! parents keep pointing at it, and a later insert of the same entity reuses
//! it. An entity is stored iff its id has a record in `entities`.

use crate::config::PrimaryPolicy;
use crate::entity::{Atom, Entity};
use crate::hypergraph::{AttributeMap, Hypergraph};
use crate::pattern::first_concrete_child;
use crate::types::{AttributeValue, HypergraphError, Result, StarOptions, Step};
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table,
    TableDefinition, WriteTransaction,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

/// Postcard-encoded entity -> entity id
const ENTITY_IDS: TableDefinition<&[u8], u64> = TableDefinition::new("entity_ids");

/// Entity id -> serialized `StoredEntity`
const ENTITIES: TableDefinition<u64, &[u8]> = TableDefinition::new("entities");

/// Containment index: (child_id, parent_id) for every direct child
const PARENTS: TableDefinition<(u64, u64), ()> = TableDefinition::new("parents");

/// Root index: (root label, atom_id)
const ROOTS: TableDefinition<(&str, u64), ()> = TableDefinition::new("roots");

/// Entity id -> serialized `AttributeMap`
const ATTRIBUTES: TableDefinition<u64, &[u8]> = TableDefinition::new("attributes");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_ID: &str = "next_id";

/// Record stored per entity id.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntity {
    entity: Entity,
    primary: bool,
}

fn storage<E: std::fmt::Display>(e: E) -> HypergraphError {
    HypergraphError::Io(e.to_string())
}

fn codec(e: postcard::Error) -> HypergraphError {
    HypergraphError::Serialization(e.to_string())
}

fn missing_record(id: u64) -> HypergraphError {
    HypergraphError::Io(format!("entity index references missing record {}", id))
}

// =============================================================================
// TABLE HELPERS
// =============================================================================

fn entity_key(entity: &Entity) -> Result<Vec<u8>> {
    postcard::to_allocvec(entity).map_err(codec)
}

/// Id assigned to `entity`, stored or not.
fn lookup_id(
    ids: &impl ReadableTable<&'static [u8], u64>,
    entity: &Entity,
) -> Result<Option<u64>> {
    let key = entity_key(entity)?;
    Ok(ids
        .get(key.as_slice())
        .map_err(storage)?
        .map(|guard| guard.value()))
}

/// Id of `entity` if it is currently stored.
fn live_id(
    ids: &impl ReadableTable<&'static [u8], u64>,
    records: &impl ReadableTable<u64, &'static [u8]>,
    entity: &Entity,
) -> Result<Option<u64>> {
    match lookup_id(ids, entity)? {
        Some(id) if records.get(id).map_err(storage)?.is_some() => Ok(Some(id)),
        _ => Ok(None),
    }
}

fn load_record(
    records: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<Option<StoredEntity>> {
    match records.get(id).map_err(storage)? {
        Some(data) => postcard::from_bytes(data.value()).map(Some).map_err(codec),
        None => Ok(None),
    }
}

fn require_record(
    records: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<StoredEntity> {
    load_record(records, id)?.ok_or_else(|| missing_record(id))
}

fn store_record(
    records: &mut Table<u64, &'static [u8]>,
    id: u64,
    record: &StoredEntity,
) -> Result<()> {
    let bytes = postcard::to_allocvec(record).map_err(codec)?;
    records.insert(id, bytes.as_slice()).map_err(storage)?;
    Ok(())
}

fn load_attributes(
    attrs: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<AttributeMap> {
    match attrs.get(id).map_err(storage)? {
        Some(data) => postcard::from_bytes(data.value()).map_err(codec),
        None => Ok(AttributeMap::new()),
    }
}

fn store_attributes(
    attrs: &mut Table<u64, &'static [u8]>,
    id: u64,
    map: &AttributeMap,
) -> Result<()> {
    let bytes = postcard::to_allocvec(map).map_err(codec)?;
    attrs.insert(id, bytes.as_slice()).map_err(storage)?;
    Ok(())
}

/// Ids of the edges holding `id` as a direct child, in id order.
fn parents_of(parents: &impl ReadableTable<(u64, u64), ()>, id: u64) -> Result<Vec<u64>> {
    let mut out = Vec::new();
    for entry in parents
        .range((id, 0u64)..=(id, u64::MAX))
        .map_err(storage)?
    {
        let (key, _) = entry.map_err(storage)?;
        out.push(key.value().1);
    }
    Ok(out)
}

fn create_tables(txn: &WriteTransaction) -> Result<()> {
    txn.open_table(ENTITY_IDS).map_err(storage)?;
    txn.open_table(ENTITIES).map_err(storage)?;
    txn.open_table(PARENTS).map_err(storage)?;
    txn.open_table(ROOTS).map_err(storage)?;
    txn.open_table(ATTRIBUTES).map_err(storage)?;
    txn.open_table(METADATA).map_err(storage)?;
    Ok(())
}

// =============================================================================
// REDB HYPERGRAPH
// =============================================================================

/// A disk-backed hypergraph store using redb.
pub struct RedbHypergraph {
    db: Database,
    name: String,
    policy: PrimaryPolicy,
}

impl std::fmt::Debug for RedbHypergraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbHypergraph")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RedbHypergraph {
    /// Open or create a hypergraph database at the given path.
    ///
    /// The store is named after the file stem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(storage)?;

        let txn = db.begin_write().map_err(storage)?;
        create_tables(&txn)?;
        txn.commit().map_err(storage)?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "semgraph".to_string());
        tracing::debug!(path = %path.display(), %name, "opened redb hypergraph");

        Ok(Self {
            db,
            name,
            policy: PrimaryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PrimaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> PrimaryPolicy {
        self.policy
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<()> {
        self.db.compact().map_err(storage)?;
        Ok(())
    }

    fn read(&self) -> Result<ReadTransaction> {
        self.db.begin_read().map_err(storage)
    }

    fn write(&self) -> Result<WriteTransaction> {
        self.db.begin_write().map_err(storage)
    }

    /// Id assigned to an entity, stored or not.
    fn id_of(&self, txn: &ReadTransaction, entity: &Entity) -> Result<Option<u64>> {
        let ids = txn.open_table(ENTITY_IDS).map_err(storage)?;
        lookup_id(&ids, entity)
    }

    /// Id of a stored entity.
    fn live_id_of(&self, txn: &ReadTransaction, entity: &Entity) -> Result<Option<u64>> {
        let ids = txn.open_table(ENTITY_IDS).map_err(storage)?;
        let records = txn.open_table(ENTITIES).map_err(storage)?;
        live_id(&ids, &records, entity)
    }

    fn count_where(&self, keep: impl Fn(&StoredEntity) -> bool) -> Result<usize> {
        let txn = self.read()?;
        let records = txn.open_table(ENTITIES).map_err(storage)?;
        let mut count = 0usize;
        for entry in records.iter().map_err(storage)? {
            let (_, data) = entry.map_err(storage)?;
            let record: StoredEntity = postcard::from_bytes(data.value()).map_err(codec)?;
            if keep(&record) {
                count = count.saturating_add(1);
            }
        }
        Ok(count)
    }

    fn load_entities(&self, txn: &ReadTransaction, ids: &[u64]) -> Result<Vec<Entity>> {
        let records = txn.open_table(ENTITIES).map_err(storage)?;
        ids.iter()
            .map(|id| require_record(&records, *id).map(|r| r.entity))
            .collect()
    }

    fn step_attribute(
        &mut self,
        entity: &Entity,
        name: &str,
        step: Step,
    ) -> Result<Option<AttributeValue>> {
        let txn = self.write()?;
        let next = {
            let ids = txn.open_table(ENTITY_IDS).map_err(storage)?;
            let records = txn.open_table(ENTITIES).map_err(storage)?;
            let Some(id) = live_id(&ids, &records, entity)? else {
                return Ok(None);
            };
            let mut attrs = txn.open_table(ATTRIBUTES).map_err(storage)?;
            let mut map = load_attributes(&attrs, id)?;
            let next = AttributeValue::stepped(map.get(name), name, step)?;
            map.insert(name.to_string(), next.clone());
            store_attributes(&mut attrs, id, &map)?;
            next
        };
        txn.commit().map_err(storage)?;
        Ok(Some(next))
    }
}

// =============================================================================
// STORE CONTRACT
// =============================================================================

impl Hypergraph for RedbHypergraph {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, entity: &Entity) -> Result<bool> {
        let txn = self.read()?;
        Ok(self.live_id_of(&txn, entity)?.is_some())
    }

    fn insert(&mut self, entity: &Entity, primary: bool) -> Result<()> {
        let txn = self.write()?;
        {
            let mut ids = txn.open_table(ENTITY_IDS).map_err(storage)?;
            let mut records = txn.open_table(ENTITIES).map_err(storage)?;

            if let Some(id) = live_id(&ids, &records, entity)? {
                let mut record = require_record(&records, id)?;
                let resolved = self.policy.resolve(record.primary, primary);
                if resolved != record.primary {
                    record.primary = resolved;
                    store_record(&mut records, id, &record)?;
                }
            } else {
                let mut child_ids = Vec::with_capacity(entity.arity());
                for child in entity.children() {
                    match live_id(&ids, &records, child)? {
                        Some(child_id) => child_ids.push(child_id),
                        None => {
                            return Err(HypergraphError::DanglingChild {
                                edge: entity.to_string(),
                                child: child.to_string(),
                            });
                        }
                    }
                }

                let id = match lookup_id(&ids, entity)? {
                    Some(id) => id,
                    None => {
                        let mut meta = txn.open_table(METADATA).map_err(storage)?;
                        let id = meta
                            .get(NEXT_ID)
                            .map_err(storage)?
                            .map(|v| v.value())
                            .unwrap_or(0);
                        meta.insert(NEXT_ID, id.saturating_add(1))
                            .map_err(storage)?;
                        let key = entity_key(entity)?;
                        ids.insert(key.as_slice(), id).map_err(storage)?;
                        id
                    }
                };
                store_record(
                    &mut records,
                    id,
                    &StoredEntity {
                        entity: entity.clone(),
                        primary,
                    },
                )?;

                match entity {
                    Entity::Atom(atom) => {
                        let mut roots = txn.open_table(ROOTS).map_err(storage)?;
                        roots.insert((atom.root(), id), ()).map_err(storage)?;
                    }
                    Entity::Edge(_) => {
                        let mut parents = txn.open_table(PARENTS).map_err(storage)?;
                        for child_id in child_ids {
                            parents.insert((child_id, id), ()).map_err(storage)?;
                        }
                    }
                }
            }
        }
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn delete(&mut self, entity: &Entity) -> Result<bool> {
        let txn = self.write()?;
        {
            let ids = txn.open_table(ENTITY_IDS).map_err(storage)?;
            let mut records = txn.open_table(ENTITIES).map_err(storage)?;
            let Some(id) = live_id(&ids, &records, entity)? else {
                return Ok(false);
            };

            records.remove(id).map_err(storage)?;
            let mut attrs = txn.open_table(ATTRIBUTES).map_err(storage)?;
            attrs.remove(id).map_err(storage)?;

            // Rows where the entity is the child belong to its parents and
            // outlive it; only a parent's own delete drops them.
            let mut parents = txn.open_table(PARENTS).map_err(storage)?;
            match entity {
                Entity::Atom(atom) => {
                    let mut roots = txn.open_table(ROOTS).map_err(storage)?;
                    roots.remove((atom.root(), id)).map_err(storage)?;
                }
                Entity::Edge(children) => {
                    for child in children {
                        if let Some(child_id) = lookup_id(&ids, child)? {
                            parents.remove((child_id, id)).map_err(storage)?;
                        }
                    }
                }
            }
        }
        txn.commit().map_err(storage)?;
        Ok(true)
    }

    fn is_primary(&self, entity: &Entity) -> Result<bool> {
        let txn = self.read()?;
        let Some(id) = self.live_id_of(&txn, entity)? else {
            return Ok(false);
        };
        let records = txn.open_table(ENTITIES).map_err(storage)?;
        Ok(require_record(&records, id)?.primary)
    }

    fn set_primary(&mut self, entity: &Entity, primary: bool) -> Result<()> {
        let txn = self.write()?;
        {
            let ids = txn.open_table(ENTITY_IDS).map_err(storage)?;
            let mut records = txn.open_table(ENTITIES).map_err(storage)?;
            let Some(id) = live_id(&ids, &records, entity)? else {
                return Ok(());
            };
            let mut record = require_record(&records, id)?;
            if record.primary != primary {
                record.primary = primary;
                store_record(&mut records, id, &record)?;
            }
        }
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn entities(&self) -> Result<Vec<Entity>> {
        let txn = self.read()?;
        let records = txn.open_table(ENTITIES).map_err(storage)?;
        let mut out = Vec::new();
        for entry in records.iter().map_err(storage)? {
            let (_, data) = entry.map_err(storage)?;
            let record: StoredEntity = postcard::from_bytes(data.value()).map_err(codec)?;
            out.push(record.entity);
        }
        Ok(out)
    }

    fn attribute(&self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        let txn = self.read()?;
        let Some(id) = self.live_id_of(&txn, entity)? else {
            return Ok(None);
        };
        let attrs = txn.open_table(ATTRIBUTES).map_err(storage)?;
        Ok(load_attributes(&attrs, id)?.remove(name))
    }

    fn set_attribute(
        &mut self,
        entity: &Entity,
        name: &str,
        value: AttributeValue,
    ) -> Result<bool> {
        let txn = self.write()?;
        {
            let ids = txn.open_table(ENTITY_IDS).map_err(storage)?;
            let records = txn.open_table(ENTITIES).map_err(storage)?;
            let Some(id) = live_id(&ids, &records, entity)? else {
                return Ok(false);
            };
            let mut attrs = txn.open_table(ATTRIBUTES).map_err(storage)?;
            let mut map = load_attributes(&attrs, id)?;
            map.insert(name.to_string(), value);
            store_attributes(&mut attrs, id, &map)?;
        }
        txn.commit().map_err(storage)?;
        Ok(true)
    }

    fn inc_attribute(&mut self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        self.step_attribute(entity, name, Step::Up)
    }

    fn dec_attribute(&mut self, entity: &Entity, name: &str) -> Result<Option<AttributeValue>> {
        self.step_attribute(entity, name, Step::Down)
    }

    fn degree(&self, entity: &Entity) -> Result<usize> {
        let txn = self.read()?;
        let Some(id) = self.id_of(&txn, entity)? else {
            return Ok(0);
        };
        let parents = txn.open_table(PARENTS).map_err(storage)?;
        let records = txn.open_table(ENTITIES).map_err(storage)?;
        let mut count = 0usize;
        for parent_id in parents_of(&parents, id)? {
            if require_record(&records, parent_id)?.primary {
                count = count.saturating_add(1);
            }
        }
        Ok(count)
    }

    fn star(&self, center: &Entity, options: StarOptions) -> Result<Vec<Entity>> {
        let txn = self.read()?;
        let Some(id) = self.id_of(&txn, center)? else {
            return Ok(Vec::new());
        };
        let parents = txn.open_table(PARENTS).map_err(storage)?;
        let mut edge_ids = parents_of(&parents, id)?;
        if let Some(limit) = options.limit {
            edge_ids.truncate(limit);
        }
        self.load_entities(&txn, &edge_ids)
    }

    fn atom_count(&self) -> Result<usize> {
        self.count_where(|r| r.entity.is_atom())
    }

    fn edge_count(&self) -> Result<usize> {
        self.count_where(|r| r.entity.is_edge())
    }

    fn primary_atom_count(&self) -> Result<usize> {
        self.count_where(|r| r.entity.is_atom() && r.primary)
    }

    fn primary_edge_count(&self) -> Result<usize> {
        self.count_where(|r| r.entity.is_edge() && r.primary)
    }

    fn destroy(&mut self) -> Result<()> {
        tracing::debug!(name = %self.name, "destroying redb hypergraph");
        let txn = self.write()?;
        txn.delete_table(ENTITY_IDS).map_err(storage)?;
        txn.delete_table(ENTITIES).map_err(storage)?;
        txn.delete_table(PARENTS).map_err(storage)?;
        txn.delete_table(ROOTS).map_err(storage)?;
        txn.delete_table(ATTRIBUTES).map_err(storage)?;
        txn.delete_table(METADATA).map_err(storage)?;
        create_tables(&txn)?;
        txn.commit().map_err(storage)?;
        self.compact()
    }

    fn close(&mut self) -> Result<()> {
        let txn = self.read()?;
        let records = txn.open_table(ENTITIES).map_err(storage)?;
        let len = records.len().map_err(storage)?;
        tracing::debug!(name = %self.name, entities = len, "closing redb hypergraph");
        Ok(())
    }

    fn deep_degree(&self, entity: &Entity) -> Result<usize> {
        let txn = self.read()?;
        let Some(id) = self.id_of(&txn, entity)? else {
            return Ok(0);
        };
        let parents = txn.open_table(PARENTS).map_err(storage)?;
        let records = txn.open_table(ENTITIES).map_err(storage)?;

        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<u64> = parents_of(&parents, id)?.into();
        let mut count = 0usize;
        while let Some(edge_id) = queue.pop_front() {
            if !visited.insert(edge_id) {
                continue;
            }
            if require_record(&records, edge_id)?.primary {
                count = count.saturating_add(1);
            }
            queue.extend(parents_of(&parents, edge_id)?);
        }
        Ok(count)
    }

    fn lookup_root(&self, root: &str) -> Result<Vec<Atom>> {
        let txn = self.read()?;
        let roots = txn.open_table(ROOTS).map_err(storage)?;
        let records = txn.open_table(ENTITIES).map_err(storage)?;

        let mut out = Vec::new();
        for entry in roots
            .range((root, 0u64)..=(root, u64::MAX))
            .map_err(storage)?
        {
            let (key, _) = entry.map_err(storage)?;
            let (_, atom_id) = key.value();
            if let Entity::Atom(atom) = require_record(&records, atom_id)?.entity {
                out.push(atom);
            }
        }
        out.sort();
        Ok(out)
    }

    fn lookup_atoms(&self, atoms: &[Atom], root: Option<&str>) -> Result<Vec<Entity>> {
        let txn = self.read()?;
        let ids = txn.open_table(ENTITY_IDS).map_err(storage)?;
        let parents = txn.open_table(PARENTS).map_err(storage)?;

        let mut common: Option<BTreeSet<u64>> = None;
        for atom in atoms {
            let Some(atom_id) = lookup_id(&ids, &Entity::Atom(atom.clone()))? else {
                return Ok(Vec::new());
            };
            let edges: BTreeSet<u64> = parents_of(&parents, atom_id)?.into_iter().collect();
            common = Some(match common {
                Some(acc) => acc.intersection(&edges).copied().collect(),
                None => edges,
            });
        }

        let edge_ids: Vec<u64> = common.unwrap_or_default().into_iter().collect();
        let edges = self.load_entities(&txn, &edge_ids)?;
        Ok(edges
            .into_iter()
            .filter(|edge| match root {
                Some(root) => edge
                    .children()
                    .iter()
                    .any(|c| c.as_atom().is_some_and(|a| a.root() == root)),
                None => true,
            })
            .collect())
    }

    fn search(&self, pattern: &Entity) -> Result<Vec<Entity>> {
        let Some(anchor) = first_concrete_child(pattern) else {
            return Ok(self
                .entities()?
                .into_iter()
                .filter(Entity::is_edge)
                .collect());
        };
        self.star(anchor, StarOptions::default())
    }

    fn attributes(&self) -> Result<Vec<(Entity, AttributeMap)>> {
        let txn = self.read()?;
        let attrs = txn.open_table(ATTRIBUTES).map_err(storage)?;
        let records = txn.open_table(ENTITIES).map_err(storage)?;

        let mut out = Vec::new();
        for entry in attrs.iter().map_err(storage)? {
            let (key, data) = entry.map_err(storage)?;
            let map: AttributeMap = postcard::from_bytes(data.value()).map_err(codec)?;
            if map.is_empty() {
                continue;
            }
            out.push((require_record(&records, key.value())?.entity, map));
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn e(text: &str) -> Entity {
        Entity::parse(text).expect("parse")
    }

    fn add_edge(graph: &mut RedbHypergraph, text: &str) -> Entity {
        let edge = e(text);
        for child in edge.children() {
            graph.insert(child, false).expect("insert child");
        }
        graph.insert(&edge, true).expect("insert edge");
        edge
    }

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        let edge = add_edge(&mut graph, "(is/pd mary/c happy/c)");
        assert!(graph.exists(&edge).expect("exists"));
        assert_eq!(graph.atom_count().expect("count"), 3);
        assert_eq!(graph.edge_count().expect("count"), 1);
        assert_eq!(graph.primary_edge_count().expect("count"), 1);
        assert_eq!(graph.primary_atom_count().expect("count"), 0);
        assert_eq!(graph.name(), "test");
    }

    #[test]
    fn dangling_child_rejected_without_side_effects() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        graph.insert(&e("mary/c"), false).expect("insert");
        let result = graph.insert(&e("(is/pd mary/c)"), true);
        assert!(matches!(result, Err(HypergraphError::DanglingChild { .. })));
        assert_eq!(graph.entities().expect("entities"), vec![e("mary/c")]);
    }

    #[test]
    fn entity_deduplication() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        graph.insert(&e("mary/c"), true).expect("insert");
        graph.insert(&e("mary/c"), false).expect("insert");
        assert_eq!(graph.atom_count().expect("count"), 1);
        assert!(graph.is_primary(&e("mary/c")).expect("primary"));
    }

    #[test]
    fn overwrite_policy_demotes() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb"))
            .expect("open db")
            .with_policy(PrimaryPolicy::Overwrite);

        graph.insert(&e("mary/c"), true).expect("insert");
        graph.insert(&e("mary/c"), false).expect("insert");
        assert!(!graph.is_primary(&e("mary/c")).expect("primary"));
    }

    #[test]
    fn star_degree_and_delete() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        let first = add_edge(&mut graph, "(is/pd mary/c happy/c)");
        let second = add_edge(&mut graph, "(is/pd mary/c tall/c)");

        assert_eq!(graph.degree(&e("mary/c")).expect("degree"), 2);
        assert_eq!(
            graph.star(&e("mary/c"), StarOptions::default()).expect("star"),
            vec![first.clone(), second.clone()]
        );
        assert_eq!(
            graph.star(&e("mary/c"), StarOptions::limited(1)).expect("star"),
            vec![first.clone()]
        );

        assert!(graph.delete(&first).expect("delete"));
        assert!(!graph.delete(&first).expect("delete"));
        assert_eq!(
            graph.star(&e("mary/c"), StarOptions::default()).expect("star"),
            vec![second]
        );
        assert!(graph.exists(&e("happy/c")).expect("exists"));
    }

    #[test]
    fn reinserted_child_keeps_parent_rows() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        let edge = add_edge(&mut graph, "(is/pd mary/c happy/c)");
        assert!(graph.delete(&e("mary/c")).expect("delete"));
        assert!(!graph.exists(&e("mary/c")).expect("exists"));
        assert!(graph.lookup_root("mary").expect("root").is_empty());

        graph.insert(&e("mary/c"), false).expect("insert");
        assert_eq!(graph.degree(&e("mary/c")).expect("degree"), 1);
        assert_eq!(
            graph.star(&e("mary/c"), StarOptions::default()).expect("star"),
            vec![edge.clone()]
        );
        assert_eq!(graph.lookup_root("mary").expect("root").len(), 1);

        // the parent's own delete drops the row
        assert!(graph.delete(&edge).expect("delete"));
        assert_eq!(graph.degree(&e("mary/c")).expect("degree"), 0);
    }

    #[test]
    fn identity_is_structural() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        let typed = Entity::Atom(Atom::new("a").with_type("b"));
        let raw = Entity::Atom(Atom::new("a/b"));
        assert_eq!(typed.to_string(), raw.to_string());

        graph.insert(&typed, true).expect("insert");
        assert!(graph.exists(&typed).expect("exists"));
        assert!(!graph.exists(&raw).expect("exists"));

        graph.insert(&raw, false).expect("insert");
        assert_eq!(graph.atom_count().expect("count"), 2);
        assert!(graph.is_primary(&typed).expect("primary"));
        assert!(!graph.is_primary(&raw).expect("primary"));
    }

    #[test]
    fn deep_degree_walks_ancestors() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        let inner = e("(is/pd mary/c happy/c)");
        for child in inner.children() {
            graph.insert(child, false).expect("insert");
        }
        graph.insert(&inner, false).expect("insert");
        graph.insert(&e("says/pd"), false).expect("insert");
        graph.insert(&e("john/c"), false).expect("insert");
        graph
            .insert(&e("(says/pd john/c (is/pd mary/c happy/c))"), true)
            .expect("insert");

        assert_eq!(graph.degree(&e("mary/c")).expect("degree"), 0);
        assert_eq!(graph.deep_degree(&e("mary/c")).expect("deep"), 1);
    }

    #[test]
    fn attributes_and_counters() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        graph.insert(&e("mary/c"), true).expect("insert");
        assert!(graph
            .set_attribute(&e("mary/c"), "label", AttributeValue::from("Mary"))
            .expect("set"));
        assert_eq!(
            graph.inc_attribute(&e("mary/c"), "count").expect("inc"),
            Some(AttributeValue::Int(1))
        );
        assert_eq!(
            graph.dec_attribute(&e("mary/c"), "count").expect("dec"),
            Some(AttributeValue::Int(0))
        );
        assert!(graph.inc_attribute(&e("mary/c"), "label").is_err());
        assert_eq!(graph.inc_attribute(&e("ghost"), "n").expect("inc"), None);

        let all = graph.attributes().expect("attributes");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1.len(), 2);
    }

    #[test]
    fn root_and_atom_lookups() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        add_edge(&mut graph, "(is/pd mary/c happy/c)");
        add_edge(&mut graph, "(is/pd mary/p tall/c)");

        let atoms = graph.lookup_root("mary").expect("root");
        assert_eq!(atoms.len(), 2);

        let mary = Atom::parse("mary/c").expect("atom");
        let edges = graph.lookup_atoms(&[mary], Some("happy")).expect("lookup");
        assert_eq!(edges, vec![e("(is/pd mary/c happy/c)")]);
        assert!(graph
            .lookup_atoms(&[Atom::new("ghost")], None)
            .expect("lookup")
            .is_empty());
    }

    #[test]
    fn recovery_persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        // Phase 1: create data
        {
            let mut graph = RedbHypergraph::open(&db_path).expect("open db");
            add_edge(&mut graph, "(is/pd mary/c happy/c)");
            graph
                .set_attribute(&e("mary/c"), "n", AttributeValue::Int(7))
                .expect("set");
            graph.close().expect("close");
        }

        // Phase 2: reopen and verify all data persisted
        {
            let mut graph = RedbHypergraph::open(&db_path).expect("reopen db");
            assert!(graph.exists(&e("(is/pd mary/c happy/c)")).expect("exists"));
            assert_eq!(
                graph.attribute(&e("mary/c"), "n").expect("attr"),
                Some(AttributeValue::Int(7))
            );

            // ids keep increasing across sessions
            add_edge(&mut graph, "(is/pd john/c sad/c)");
            assert_eq!(graph.edge_count().expect("count"), 2);
            assert_eq!(graph.atom_count().expect("count"), 5);
        }
    }

    #[test]
    fn destroy_and_compact() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbHypergraph::open(temp.path().join("test.redb")).expect("open db");

        add_edge(&mut graph, "(is/pd mary/c happy/c)");
        graph.destroy().expect("destroy");
        assert!(graph.entities().expect("entities").is_empty());
        assert!(graph.lookup_root("mary").expect("root").is_empty());

        add_edge(&mut graph, "(is/pd mary/c happy/c)");
        assert_eq!(graph.edge_count().expect("count"), 1);
    }
}

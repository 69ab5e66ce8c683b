//! # semgraph-core
//!
//! A semantic hypergraph store whose edges are recursive: an edge is an
//! ordered sequence of entities, and any of them may itself be an edge.
//!
//! ## Layers
//!
//! - `entity`: atoms, edges and the textual grammar
//! - `pattern`: structural matching with `*`, `@`, `&` and `...`
//! - `hypergraph`: the store contract every backend implements
//! - `query`: operations derived once from the contract
//! - `storage`: the in-memory and redb backends
//! - `formats`: backend-independent snapshots
//!
//! ## Architectural Constraints
//!
//! - Synchronous: no async, no network dependencies
//! - Deterministic: `BTreeMap`/`BTreeSet` ordering for every enumerated result
//! - Absence is a value (`false`, `None`, empty), never an error

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod entity;
pub mod formats;
pub mod hypergraph;
pub mod pattern;
pub mod primitives;
pub mod query;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use entity::{Atom, Entity, TypeCode};
pub use types::{
    AddOptions, AttributeValue, DeepRemoval, HypergraphError, RemoveOptions, Result, StarOptions,
    Step, StoreCounts,
};

// =============================================================================
// RE-EXPORTS: Contract, Queries and Backends
// =============================================================================

pub use config::{BackendKind, PrimaryPolicy, StoreConfig};
pub use hypergraph::{AttributeMap, Hypergraph};
pub use pattern::{Matches, Pattern, Wildcard, full_pattern, is_open_ended, matches};
pub use query::HypergraphExt;
pub use storage::{MemoryHypergraph, RedbHypergraph, Store};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{Snapshot, SnapshotEntry, export_snapshot, import_snapshot};

//! # Formats
//!
//! Binary snapshot format shared by every backend. File I/O stays in the
//! app layer; everything here works on byte slices.

pub mod snapshot;

pub use snapshot::{
    MAX_SNAPSHOT_SIZE, Snapshot, SnapshotEntry, SnapshotHeader, export_snapshot, import_snapshot,
    snapshot_from_bytes, snapshot_to_bytes,
};

#[cfg(feature = "crypto-hash")]
pub use snapshot::snapshot_crypto_hash;

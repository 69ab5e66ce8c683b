//! # Snapshot Format
//!
//! Backend-independent binary dump of a store, used for export/import and
//! for moving data between the in-memory and redb backends.
//!
//! Format: header (5 bytes) + postcard-serialized `Snapshot`.
//! - 4 bytes: Magic ("SMHG")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is deserialized.

use crate::entity::Entity;
use crate::hypergraph::{AttributeMap, Hypergraph};
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES};
use crate::query::HypergraphExt;
use crate::types::{AddOptions, HypergraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum accepted snapshot size, checked before deserialization.
pub const MAX_SNAPSHOT_SIZE: usize = 500 * 1024 * 1024; // 500 MB

const HEADER_LEN: usize = 5;

fn serialization(message: impl Into<String>) -> HypergraphError {
    HypergraphError::Serialization(message.into())
}

// =============================================================================
// HEADER
// =============================================================================

/// The header precedes every snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if &self.magic != MAGIC_BYTES {
            return Err(serialization("Invalid magic bytes"));
        }
        if self.version != FORMAT_VERSION {
            return Err(serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(serialization("Header too short"));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One stored entity with its flag and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub entity: Entity,
    pub primary: bool,
    pub attributes: AttributeMap,
}

/// Full contents of a store, entries in entity order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub checksum: u64,
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Capture every entity, flag and attribute of `store`.
    pub fn capture<H: Hypergraph + ?Sized>(store: &H) -> Result<Self> {
        let mut attributes: BTreeMap<Entity, AttributeMap> = match store.attributes() {
            Ok(all) => all.into_iter().collect(),
            Err(HypergraphError::UnsupportedOperation(_)) => BTreeMap::new(),
            Err(e) => return Err(e),
        };

        let mut entities = store.entities()?;
        entities.sort();

        let mut entries = Vec::with_capacity(entities.len());
        for entity in entities {
            let primary = store.is_primary(&entity)?;
            let attrs = attributes.remove(&entity).unwrap_or_default();
            entries.push(SnapshotEntry {
                entity,
                primary,
                attributes: attrs,
            });
        }

        let checksum = entries_checksum(&entries)?;
        Ok(Self {
            name: store.name().to_string(),
            checksum,
            entries,
        })
    }

    /// Verify the stored checksum against the entries.
    pub fn verify(&self) -> Result<()> {
        let computed = entries_checksum(&self.entries)?;
        if computed != self.checksum {
            return Err(serialization(format!(
                "Checksum mismatch: expected {}, got {}",
                self.checksum, computed
            )));
        }
        Ok(())
    }

    /// Insert every entry into `store`. Returns the number of entries.
    ///
    /// Entries are inserted shallowest first, so children precede parents.
    /// Children missing from the snapshot are added as non-primary. Flags are
    /// written verbatim, bypassing the store's primary policy.
    pub fn restore_into<H: Hypergraph + ?Sized>(&self, store: &mut H) -> Result<usize> {
        let mut ordered: Vec<&SnapshotEntry> = self.entries.iter().collect();
        ordered.sort_by_key(|entry| entry.entity.depth());

        for entry in &ordered {
            for child in entry.entity.children() {
                if !store.exists(child)? {
                    store.add_with(child.clone(), AddOptions::non_primary())?;
                }
            }
            store.insert(&entry.entity, entry.primary)?;
            store.set_primary(&entry.entity, entry.primary)?;
            for (name, value) in &entry.attributes {
                store.set_attribute(&entry.entity, name, value.clone())?;
            }
        }
        tracing::debug!(name = %self.name, entries = ordered.len(), "restored snapshot");
        Ok(ordered.len())
    }
}

/// FNV-1a over the serialized entries.
fn entries_checksum(entries: &[SnapshotEntry]) -> Result<u64> {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let bytes = postcard::to_allocvec(entries).map_err(|e| serialization(e.to_string()))?;
    Ok(bytes.iter().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    }))
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(snapshot).map_err(|e| serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize and verify a snapshot.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot> {
    if bytes.len() < HEADER_LEN {
        return Err(serialization(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(serialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    SnapshotHeader::from_bytes(bytes)?.validate()?;

    let snapshot: Snapshot = postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| serialization(format!("Failed to deserialize snapshot: {}", e)))?;
    snapshot.verify()?;
    Ok(snapshot)
}

/// Capture and serialize a store.
pub fn export_snapshot<H: Hypergraph + ?Sized>(store: &H) -> Result<Vec<u8>> {
    snapshot_to_bytes(&Snapshot::capture(store)?)
}

/// Deserialize a snapshot and restore it into `store`.
pub fn import_snapshot<H: Hypergraph + ?Sized>(store: &mut H, bytes: &[u8]) -> Result<usize> {
    snapshot_from_bytes(bytes)?.restore_into(store)
}

/// BLAKE3 hash of serialized snapshot bytes, as hex.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn snapshot_crypto_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::storage::MemoryHypergraph;
    use crate::types::AttributeValue;

    fn e(text: &str) -> Entity {
        Entity::parse(text).expect("parse")
    }

    fn sample_store() -> MemoryHypergraph {
        let mut store = MemoryHypergraph::new("sample");
        store.add(e("(says/pd john/c (is/pd mary/c happy/c))")).expect("add");
        store.add(e("mary/c")).expect("add");
        store
            .set_attribute(&e("mary/c"), "label", AttributeValue::from("Mary"))
            .expect("set");
        store
            .set_attribute(&e("mary/c"), "weight", AttributeValue::Float(0.5))
            .expect("set");
        store
    }

    #[test]
    fn header_roundtrip() {
        let header = SnapshotHeader::new();
        let restored = SnapshotHeader::from_bytes(&header.to_bytes()).expect("parse header");
        assert_eq!(restored, header);
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let store = sample_store();
        let bytes1 = export_snapshot(&store).expect("export");

        let mut restored = MemoryHypergraph::new("sample");
        import_snapshot(&mut restored, &bytes1).expect("import");
        let bytes2 = export_snapshot(&restored).expect("export");

        assert_eq!(bytes1, bytes2, "export -> import -> export must be bit-exact");
    }

    #[test]
    fn restore_preserves_flags_and_attributes() {
        let store = sample_store();
        let snapshot = Snapshot::capture(&store).expect("capture");

        let mut target = MemoryHypergraph::default();
        let count = snapshot.restore_into(&mut target).expect("restore");
        assert_eq!(count, 7);
        assert!(target.is_primary(&e("mary/c")).expect("primary"));
        assert!(!target.is_primary(&e("(is/pd mary/c happy/c)")).expect("primary"));
        assert_eq!(
            target.attribute(&e("mary/c"), "weight").expect("attr"),
            Some(AttributeValue::Float(0.5))
        );
    }

    #[test]
    fn restore_fills_missing_children() {
        let snapshot = Snapshot {
            name: "partial".to_string(),
            checksum: 0,
            entries: vec![SnapshotEntry {
                entity: e("(is/pd mary/c)"),
                primary: true,
                attributes: AttributeMap::new(),
            }],
        };
        let mut target = MemoryHypergraph::default();
        snapshot.restore_into(&mut target).expect("restore");
        assert!(target.exists(&e("mary/c")).expect("exists"));
        assert!(!target.is_primary(&e("mary/c")).expect("primary"));
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(snapshot_from_bytes(&bytes).is_err());
    }

    #[test]
    fn short_input_rejected() {
        assert!(snapshot_from_bytes(b"SMH").is_err());
    }

    #[test]
    fn corrupted_payload_rejected() {
        let store = sample_store();
        let mut bytes = export_snapshot(&store).expect("export");
        // re-encode with a wrong checksum
        let snapshot = Snapshot::capture(&store).expect("capture");
        let tampered = Snapshot {
            checksum: snapshot.checksum ^ 1,
            ..snapshot
        };
        bytes.truncate(HEADER_LEN);
        bytes.extend_from_slice(&postcard::to_allocvec(&tampered).expect("ser"));
        assert!(matches!(
            snapshot_from_bytes(&bytes),
            Err(HypergraphError::Serialization(_))
        ));
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn crypto_hash_is_stable() {
        let bytes = export_snapshot(&sample_store()).expect("export");
        assert_eq!(snapshot_crypto_hash(&bytes), snapshot_crypto_hash(&bytes));
        assert_eq!(snapshot_crypto_hash(&bytes).len(), 64);
    }
}

//! File-backed snapshot persistence.
//!
//! Layout inside the store directory:
//! ```text
//! store.meta.json            - metadata and schema version
//! snapshots/
//!   000001.snapshot.cbor.zst - CBOR+zstd compressed snapshots
//! integrity/
//!   manifest.json            - sha256 hash chain manifest
//! ```

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use glade_kernel::{KindCatalog, World, WorldConfig, WorldError};

use crate::snapshot::WorldSnapshot;

/// Current on-disk schema version.
const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("no snapshots found")]
    NoSnapshots,
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Metadata stored in store.meta.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub snapshot_schema_version: u32,
    pub snapshot_count: u32,
}

/// A single entry in the integrity manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    pub prev_hash: Option<String>,
}

/// Integrity manifest tracking all segment hashes in a chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

/// File-backed snapshot store with schema versioning and integrity checking.
pub struct SnapshotStore {
    root: PathBuf,
    meta: StoreMeta,
    manifest: IntegrityManifest,
}

impl SnapshotStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("snapshots"))?;
        std::fs::create_dir_all(root.join("integrity"))?;

        let meta_path = root.join("store.meta.json");
        let manifest_path = root.join("integrity").join("manifest.json");

        let (meta, manifest) = if meta_path.exists() {
            let meta: StoreMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            if meta.snapshot_schema_version != SNAPSHOT_SCHEMA_VERSION {
                return Err(PersistError::SchemaMismatch {
                    file_version: meta.snapshot_schema_version,
                    expected_version: SNAPSHOT_SCHEMA_VERSION,
                });
            }
            let manifest: IntegrityManifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            (meta, manifest)
        } else {
            let meta = StoreMeta {
                snapshot_schema_version: SNAPSHOT_SCHEMA_VERSION,
                snapshot_count: 0,
            };
            let manifest = IntegrityManifest::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            serde_json::to_writer_pretty(std::fs::File::create(&manifest_path)?, &manifest)?;
            (meta, manifest)
        };

        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    /// Capture the world and write the snapshot as a new segment.
    pub fn take_snapshot(&mut self, world: &World) -> Result<(), PersistError> {
        let snap = WorldSnapshot::capture(world);
        self.meta.snapshot_count += 1;
        let index = self.meta.snapshot_count;
        let filename = format!("{index:06}.snapshot.cbor.zst");
        let path = self.root.join("snapshots").join(&filename);

        let cbor_bytes = cbor_serialize(&snap)?;
        let compressed = zstd_compress(&cbor_bytes)?;

        let hash = sha256_hex(&compressed);
        let prev_hash = self.manifest.entries.last().map(|e| e.sha256.clone());

        std::fs::write(&path, &compressed)?;

        self.manifest.entries.push(ManifestEntry {
            filename: filename.clone(),
            sha256: hash,
            prev_hash,
        });

        self.save_meta()?;
        self.save_manifest()?;
        tracing::debug!(%filename, tick = snap.tick, "snapshot written");
        Ok(())
    }

    /// Load the most recent snapshot, verifying its hashes.
    pub fn load_latest(&self) -> Result<WorldSnapshot, PersistError> {
        if self.meta.snapshot_count == 0 {
            return Err(PersistError::NoSnapshots);
        }
        let snap = self.load_snapshot(self.meta.snapshot_count)?;
        if !snap.verify() {
            return Err(PersistError::IntegrityMismatch {
                expected: "valid snapshot content hash".into(),
                actual: "snapshot content hash mismatch".into(),
            });
        }
        Ok(snap)
    }

    /// Load the most recent snapshot and rebuild the world from it.
    pub fn restore_latest(
        &self,
        catalog: &KindCatalog,
        config: WorldConfig,
    ) -> Result<World, PersistError> {
        let snap = self.load_latest()?;
        Ok(snap.restore(catalog, config)?)
    }

    /// Verify every hash in the manifest and the chain between them.
    pub fn verify_integrity(&self) -> Result<(), PersistError> {
        let mut prev_hash: Option<String> = None;
        for entry in &self.manifest.entries {
            if entry.prev_hash != prev_hash {
                return Err(PersistError::IntegrityMismatch {
                    expected: prev_hash.unwrap_or_else(|| "None".into()),
                    actual: entry.prev_hash.clone().unwrap_or_else(|| "None".into()),
                });
            }

            let path = self.root.join("snapshots").join(&entry.filename);
            let data = std::fs::read(&path)?;
            let actual = sha256_hex(&data);
            if actual != entry.sha256 {
                return Err(PersistError::IntegrityMismatch {
                    expected: entry.sha256.clone(),
                    actual,
                });
            }

            prev_hash = Some(entry.sha256.clone());
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    fn load_snapshot(&self, index: u32) -> Result<WorldSnapshot, PersistError> {
        let filename = format!("{index:06}.snapshot.cbor.zst");
        let path = self.root.join("snapshots").join(&filename);
        let compressed = std::fs::read(&path)?;

        self.verify_file_hash(&filename, &compressed)?;

        let cbor_bytes = zstd_decompress(&compressed)?;
        cbor_deserialize(&cbor_bytes)
    }

    fn verify_file_hash(&self, filename: &str, data: &[u8]) -> Result<(), PersistError> {
        let actual = sha256_hex(data);
        for entry in &self.manifest.entries {
            if entry.filename == filename {
                if entry.sha256 != actual {
                    return Err(PersistError::IntegrityMismatch {
                        expected: entry.sha256.clone(),
                        actual,
                    });
                }
                return Ok(());
            }
        }
        // A file missing from the manifest is fine right after creation.
        Ok(())
    }

    fn save_meta(&self) -> Result<(), PersistError> {
        let path = self.root.join("store.meta.json");
        serde_json::to_writer_pretty(std::fs::File::create(&path)?, &self.meta)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), PersistError> {
        let path = self.root.join("integrity").join("manifest.json");
        serde_json::to_writer_pretty(std::fs::File::create(&path)?, &self.manifest)?;
        Ok(())
    }
}

fn cbor_serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, PersistError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| PersistError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, PersistError> {
    ciborium::from_reader(data).map_err(|e| PersistError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, PersistError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, PersistError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glade_common::{ConnectionId, ObjectId, Position};
    use glade_kernel::objs::DropObject;

    fn demo_world() -> World {
        let mut world = World::with_seed(WorldConfig::default(), 7);
        world.join(ConnectionId::new(), "ada").unwrap();
        world
            .spawn(Box::new(DropObject::new(
                ObjectId::new(),
                Position::new(1.0, 1.0),
                "sword",
            )))
            .unwrap();
        world.tick();
        world
    }

    #[test]
    fn take_and_restore_latest() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::open(dir.path()).unwrap();
        let world = demo_world();

        store.take_snapshot(&world).unwrap();
        assert_eq!(store.meta().snapshot_count, 1);

        let restored = store
            .restore_latest(&KindCatalog::builtin(), WorldConfig::default())
            .unwrap();
        assert_eq!(restored.object_count(), world.object_count());
        assert_eq!(restored.tick_count(), world.tick_count());
    }

    #[test]
    fn reopen_reads_existing_meta() {
        let dir = tempfile::tempdir().unwrap();
        let world = demo_world();
        {
            let mut store = SnapshotStore::open(dir.path()).unwrap();
            store.take_snapshot(&world).unwrap();
            store.take_snapshot(&world).unwrap();
        }
        let store = SnapshotStore::open(dir.path()).unwrap();
        assert_eq!(store.meta().snapshot_count, 2);
        store.verify_integrity().unwrap();
    }

    #[test]
    fn empty_store_has_no_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.load_latest(),
            Err(PersistError::NoSnapshots)
        ));
    }

    #[test]
    fn tampered_segment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::open(dir.path()).unwrap();
        store.take_snapshot(&demo_world()).unwrap();

        // Flip bytes in the stored segment.
        let seg = dir.path().join("snapshots").join("000001.snapshot.cbor.zst");
        let mut bytes = std::fs::read(&seg).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&seg, &bytes).unwrap();

        assert!(matches!(
            store.load_latest(),
            Err(PersistError::IntegrityMismatch { .. })
        ));
        assert!(store.verify_integrity().is_err());
    }

    #[test]
    fn hash_chain_links_segments() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::open(dir.path()).unwrap();
        let world = demo_world();
        store.take_snapshot(&world).unwrap();
        store.take_snapshot(&world).unwrap();

        let manifest: IntegrityManifest = serde_json::from_reader(
            std::fs::File::open(dir.path().join("integrity").join("manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert!(manifest.entries[0].prev_hash.is_none());
        assert_eq!(
            manifest.entries[1].prev_hash.as_deref(),
            Some(manifest.entries[0].sha256.as_str())
        );
    }
}

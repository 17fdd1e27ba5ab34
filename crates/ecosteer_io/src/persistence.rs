//! Versioned save files for per-agent herd state.
//!
//! [`FileComponentStore`] answers the engine's persistence port from memory
//! and round-trips its contents through JSON or rkyv snapshots.

use crate::error::{IoError, Result};
use crate::serialization::{read_json_file, read_rkyv_file, write_json_file, write_rkyv_file};
use ecosteer_core::ports::ComponentStore;
use ecosteer_data::{HerdComponent, Uuid};
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Newest record layout this build writes and reads.
pub const COMPONENT_FORMAT_VERSION: u32 = 1;

/// On-disk form of [`HerdComponent`].
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct HerdComponentRecord {
    pub version: u32,
    pub dominance: f64,
    #[serde(default)]
    pub last_decay_tick: u64,
}

impl From<HerdComponent> for HerdComponentRecord {
    fn from(component: HerdComponent) -> Self {
        Self {
            version: COMPONENT_FORMAT_VERSION,
            dominance: component.dominance,
            last_decay_tick: component.last_decay_tick,
        }
    }
}

impl TryFrom<HerdComponentRecord> for HerdComponent {
    type Error = IoError;

    fn try_from(record: HerdComponentRecord) -> Result<Self> {
        check_version(record.version)?;
        if !record.dominance.is_finite() {
            return Err(IoError::validation(format!(
                "dominance must be finite, got {}",
                record.dominance
            )));
        }
        Ok(HerdComponent::with_dominance(
            record.dominance,
            record.last_decay_tick,
        ))
    }
}

fn check_version(found: u32) -> Result<()> {
    if found == 0 || found > COMPONENT_FORMAT_VERSION {
        return Err(IoError::UnsupportedVersion {
            found,
            supported: COMPONENT_FORMAT_VERSION,
        });
    }
    Ok(())
}

#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct StoredComponent {
    pub id: Uuid,
    pub record: HerdComponentRecord,
}

/// Everything needed to resume a run: the tick, the config it ran under and
/// every persisted component, sorted by agent id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct ComponentSnapshot {
    pub version: u32,
    pub tick: u64,
    pub config_fingerprint: String,
    pub checksum: String,
    pub components: Vec<StoredComponent>,
}

impl ComponentSnapshot {
    #[must_use]
    pub fn new(tick: u64, config_fingerprint: String, mut components: Vec<StoredComponent>) -> Self {
        components.sort_by_key(|c| c.id);
        let checksum = Self::compute_checksum(tick, &components);
        Self {
            version: COMPONENT_FORMAT_VERSION,
            tick,
            config_fingerprint,
            checksum,
            components,
        }
    }

    fn compute_checksum(tick: u64, components: &[StoredComponent]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(tick.to_le_bytes());
        for c in components {
            hasher.update(c.id.as_bytes());
            hasher.update(c.record.version.to_le_bytes());
            hasher.update(c.record.dominance.to_bits().to_le_bytes());
            hasher.update(c.record.last_decay_tick.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Checks the format version and that the checksum matches the payload.
    pub fn verify(&self) -> Result<()> {
        check_version(self.version)?;
        let expected = Self::compute_checksum(self.tick, &self.components);
        if expected != self.checksum {
            return Err(IoError::ChecksumMismatch {
                expected,
                found: self.checksum.clone(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// In-memory component store with explicit save/load.
#[derive(Debug, Default)]
pub struct FileComponentStore {
    components: Mutex<HashMap<Uuid, HerdComponent>>,
}

impl FileComponentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets an agent, e.g. after it dies.
    pub fn remove(&self, id: Uuid) -> Option<HerdComponent> {
        self.components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
    }

    #[must_use]
    pub fn snapshot(&self, tick: u64, config_fingerprint: &str) -> ComponentSnapshot {
        let components = self
            .components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(&id, &component)| StoredComponent {
                id,
                record: component.into(),
            })
            .collect();
        ComponentSnapshot::new(tick, config_fingerprint.to_string(), components)
    }

    /// Replaces the store contents. Nothing is changed if any record fails to
    /// validate.
    pub fn restore(&self, snapshot: &ComponentSnapshot) -> Result<()> {
        snapshot.verify()?;
        let mut restored = HashMap::with_capacity(snapshot.len());
        for stored in &snapshot.components {
            let component = HerdComponent::try_from(stored.record)
                .map_err(|e| e.with_context(format!("component for {}", stored.id)))?;
            restored.insert(stored.id, component);
        }
        *self.components.lock().unwrap_or_else(|e| e.into_inner()) = restored;
        tracing::debug!(
            components = snapshot.len(),
            tick = snapshot.tick,
            "Restored herd components"
        );
        Ok(())
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P, tick: u64, fingerprint: &str) -> Result<()> {
        write_json_file(&self.snapshot(tick, fingerprint), path)
    }

    /// Loads a JSON save and returns its snapshot header for the caller to
    /// compare fingerprints.
    pub fn load_json<P: AsRef<Path>>(&self, path: P) -> Result<ComponentSnapshot> {
        let snapshot: ComponentSnapshot = read_json_file(path)?;
        self.restore(&snapshot)?;
        Ok(snapshot)
    }

    pub fn save_rkyv<P: AsRef<Path>>(&self, path: P, tick: u64, fingerprint: &str) -> Result<()> {
        write_rkyv_file(&self.snapshot(tick, fingerprint), path)
    }

    pub fn load_rkyv<P: AsRef<Path>>(&self, path: P) -> Result<ComponentSnapshot> {
        let snapshot: ComponentSnapshot = read_rkyv_file(path)?;
        self.restore(&snapshot)?;
        Ok(snapshot)
    }
}

impl ComponentStore for FileComponentStore {
    fn load(&self, id: Uuid) -> Option<HerdComponent> {
        self.components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .copied()
    }

    fn store(&self, id: Uuid, component: HerdComponent) {
        self.components
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, component);
    }
}

//! Raw surface sources.
//!
//! A [`SurfaceStore`] answers "give me the grid at this address" with either a
//! grid or `None`. Two implementations are provided: an in-memory store used
//! by tests and embedders, and a directory of JSON grid files.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use co2_common::{Co2Error, Co2Result, MaskedGrid, SurfaceAddress, SurfaceSelector};

/// Source of raw per-realization (or statistical) surfaces.
#[async_trait]
pub trait SurfaceStore: Send + Sync {
    /// Identifier of this ensemble; part of every qualified address.
    fn provider_id(&self) -> &str;

    /// Fetch a surface. `Ok(None)` when the address has no data.
    async fn get_surface(&self, address: &SurfaceAddress) -> Co2Result<Option<MaskedGrid>>;
}

/// Surfaces held in memory, keyed by address.
pub struct InMemorySurfaceStore {
    provider_id: String,
    surfaces: HashMap<SurfaceAddress, MaskedGrid>,
    fetches: AtomicU64,
}

impl InMemorySurfaceStore {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            surfaces: HashMap::new(),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn insert(&mut self, address: SurfaceAddress, surface: MaskedGrid) {
        self.surfaces.insert(address, surface);
    }

    pub fn with_surface(mut self, address: SurfaceAddress, surface: MaskedGrid) -> Self {
        self.insert(address, surface);
        self
    }

    /// Number of `get_surface` calls served, hits and misses alike.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SurfaceStore for InMemorySurfaceStore {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn get_surface(&self, address: &SurfaceAddress) -> Co2Result<Option<MaskedGrid>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.surfaces.get(address).cloned())
    }
}

/// Surfaces stored as JSON files under a root directory.
///
/// # Layout
/// - `<root>/realization-<r>/<name>--<attribute>--<datestr>.json`
/// - `<root>/<statistic>/<name>--<attribute>--<datestr>.json` for
///   precomputed statistics; the realization list is not part of the path
///
/// Each file is a serialized [`MaskedGrid`].
pub struct DirectorySurfaceStore {
    provider_id: String,
    root: PathBuf,
}

impl DirectorySurfaceStore {
    pub fn new(provider_id: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            provider_id: provider_id.into(),
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing `address`.
    pub fn path_for(&self, address: &SurfaceAddress) -> PathBuf {
        let dir = match &address.selector {
            SurfaceSelector::Realization(r) => format!("realization-{}", r),
            SurfaceSelector::Statistic { statistic, .. } => statistic.as_str().to_string(),
        };
        self.root.join(dir).join(format!(
            "{}--{}--{}.json",
            address.name, address.attribute, address.datestr
        ))
    }

    /// Write a surface to its file, creating directories as needed.
    pub async fn write_surface(
        &self,
        address: &SurfaceAddress,
        surface: &MaskedGrid,
    ) -> Co2Result<()> {
        let path = self.path_for(address);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // JSON has no NaN; masked cells are written as 0.0
        let stored = MaskedGrid::new(surface.spec, surface.filled(0.0), surface.mask.clone())?;
        let json = serde_json::to_vec(&stored)?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl SurfaceStore for DirectorySurfaceStore {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn get_surface(&self, address: &SurfaceAddress) -> Co2Result<Option<MaskedGrid>> {
        let path = self.path_for(address);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?path, "Surface file not found");
                return Ok(None);
            }
            Err(e) => {
                return Err(Co2Error::SurfaceRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let surface: MaskedGrid = serde_json::from_slice(&bytes)?;
        // Re-validate geometry; the file may have been edited by hand
        MaskedGrid::new(surface.spec, surface.values, surface.mask).map(Some)
    }
}

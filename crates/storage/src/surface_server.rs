//! Write-once publish cache for display-ready surfaces.
//!
//! Each [`QualifiedSurfaceAddress`] owns one slot. The first caller to miss
//! computes the surface, encodes it and fills the slot; concurrent callers on
//! the same key wait for that result instead of computing again. A slot that
//! has been filled is never replaced, evicted or expired.
//!
//! ## Metrics
//!
//! - `hits`: lookups answered from a filled slot
//! - `misses`: lookups that found the slot empty
//! - `published`: slots filled
//! - `not_found`: computations that produced no surface

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use co2_common::{Co2Error, Co2Result, MaskedGrid, QualifiedSurfaceAddress};
use renderer::encode_surface_png;

/// Default prefix for image handles.
pub const DEFAULT_URL_PREFIX: &str = "/surface/image/";

/// Description of a published surface image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceImageMeta {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub rotation_deg: f64,
    /// Range of valid values; (0, 0) when every cell is masked
    pub val_min: f64,
    pub val_max: f64,
    /// Range used to quantize values into the image
    pub color_min: f64,
    pub color_max: f64,
    pub width: usize,
    pub height: usize,
}

impl SurfaceImageMeta {
    fn describe(grid: &MaskedGrid) -> Self {
        let (x_min, y_min, x_max, y_max) = grid.spec.bounds();
        let (val_min, val_max) = grid.value_range().unwrap_or((0.0, 0.0));
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            rotation_deg: grid.spec.rotation_deg,
            val_min,
            val_max,
            color_min: val_min,
            color_max: val_max,
            width: grid.spec.ncol,
            height: grid.spec.nrow,
        }
    }
}

/// Everything stored for one published key.
#[derive(Debug)]
pub struct PublishedSurface {
    pub meta: SurfaceImageMeta,
    pub grid: MaskedGrid,
    pub png: Bytes,
    pub url: String,
}

/// Result of [`SurfaceImageServer::get_or_publish`].
#[derive(Debug)]
pub enum PublishOutcome<T> {
    /// Slot was already filled (possibly by a concurrent caller).
    Cached(Arc<PublishedSurface>),
    /// This caller computed and filled the slot; carries the computation's extra output.
    Published(Arc<PublishedSurface>, T),
    /// Computation produced nothing; slot left empty.
    NotFound,
}

/// Cache statistics.
///
/// All fields are atomic for lock-free reads.
#[derive(Debug, Default)]
pub struct PublishCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub published: AtomicU64,
    pub not_found: AtomicU64,
}

impl PublishCacheStats {
    /// Calculate cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

enum InitFailure {
    NotFound,
    Failed(Co2Error),
}

type Slot = Arc<OnceCell<Arc<PublishedSurface>>>;

/// Publish cache keyed by qualified surface address.
pub struct SurfaceImageServer {
    slots: RwLock<HashMap<QualifiedSurfaceAddress, Slot>>,
    images: RwLock<HashMap<String, Arc<PublishedSurface>>>,
    url_prefix: String,
    stats: PublishCacheStats,
}

impl Default for SurfaceImageServer {
    fn default() -> Self {
        Self::new(DEFAULT_URL_PREFIX)
    }
}

impl SurfaceImageServer {
    pub fn new(url_prefix: impl Into<String>) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            images: RwLock::new(HashMap::new()),
            url_prefix: url_prefix.into(),
            stats: PublishCacheStats::default(),
        }
    }

    /// Handle under which the image for `key` is (or will be) served.
    pub fn encode_partial_url(&self, key: &QualifiedSurfaceAddress) -> String {
        format!("{}{}", self.url_prefix, urlencoding::encode(&key.to_string()))
    }

    /// Published entry for `key`, if any. Never computes.
    pub async fn get_published(
        &self,
        key: &QualifiedSurfaceAddress,
    ) -> Option<Arc<PublishedSurface>> {
        let slots = self.slots.read().await;
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Metadata for `key`, if published.
    pub async fn get_surface_metadata(
        &self,
        key: &QualifiedSurfaceAddress,
    ) -> Option<SurfaceImageMeta> {
        self.get_published(key).await.map(|p| p.meta.clone())
    }

    /// Encoded PNG for a handle returned by [`Self::encode_partial_url`].
    pub async fn get_image(&self, url: &str) -> Option<Bytes> {
        self.images.read().await.get(url).map(|p| p.png.clone())
    }

    pub fn stats(&self) -> &PublishCacheStats {
        &self.stats
    }

    /// Number of published surfaces.
    pub async fn len(&self) -> usize {
        self.images.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Return the published surface for `key`, computing it on first use.
    ///
    /// `compute` runs at most once per successful publish of a key; callers
    /// that race on an empty slot wait for the running computation. If the
    /// computation returns `Ok(None)` or an error nothing is kept for the key
    /// and a later call may try again.
    pub async fn get_or_publish<T, F, Fut>(
        &self,
        key: &QualifiedSurfaceAddress,
        compute: F,
    ) -> Co2Result<PublishOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Co2Result<Option<(MaskedGrid, T)>>>,
    {
        let slot = self.slot(key).await;
        if let Some(published) = slot.get() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Surface cache hit");
            return Ok(PublishOutcome::Cached(Arc::clone(published)));
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let mut extra = None;
        let result = slot
            .get_or_try_init(|| async {
                let (grid, output) = match compute().await {
                    Ok(Some(computed)) => computed,
                    Ok(None) => return Err(InitFailure::NotFound),
                    Err(e) => return Err(InitFailure::Failed(e)),
                };
                let published = match self.store(key, grid).await {
                    Ok(published) => published,
                    Err(e) => return Err(InitFailure::Failed(e)),
                };
                extra = Some(output);
                Ok(published)
            })
            .await;

        match result {
            Ok(published) => match extra {
                Some(output) => Ok(PublishOutcome::Published(Arc::clone(published), output)),
                None => Ok(PublishOutcome::Cached(Arc::clone(published))),
            },
            Err(InitFailure::NotFound) => {
                self.stats.not_found.fetch_add(1, Ordering::Relaxed);
                self.release_empty(key, &slot).await;
                Ok(PublishOutcome::NotFound)
            }
            Err(InitFailure::Failed(e)) => {
                self.release_empty(key, &slot).await;
                Err(e)
            }
        }
    }

    /// Remove the slot for `key` if it is still empty and no other caller
    /// holds it, so keys that never publish do not accumulate.
    async fn release_empty(&self, key: &QualifiedSurfaceAddress, slot: &Slot) {
        let mut slots = self.slots.write().await;
        // The map and `slot` are the only expected holders
        let unused = slots.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot)
                && current.get().is_none()
                && Arc::strong_count(current) == 2
        });
        if unused {
            slots.remove(key);
        }
    }

    /// Slot for `key`, inserting an empty one if needed.
    async fn slot(&self, key: &QualifiedSurfaceAddress) -> Slot {
        if let Some(slot) = self.slots.read().await.get(key) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    async fn store(
        &self,
        key: &QualifiedSurfaceAddress,
        grid: MaskedGrid,
    ) -> Co2Result<Arc<PublishedSurface>> {
        let meta = SurfaceImageMeta::describe(&grid);
        let png = encode_surface_png(&grid, (meta.color_min, meta.color_max))?;
        let url = self.encode_partial_url(key);
        let published = Arc::new(PublishedSurface {
            meta,
            grid,
            png: Bytes::from(png),
            url: url.clone(),
        });

        self.images
            .write()
            .await
            .insert(url.clone(), Arc::clone(&published));
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        info!(
            key = %key,
            url = %url,
            width = published.meta.width,
            height = published.meta.height,
            "Published surface"
        );
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use co2_common::SurfaceAddress;
    use std::sync::atomic::AtomicUsize;
    use test_utils::{constant_surface, surface_from_rows};

    fn key(real: i32) -> QualifiedSurfaceAddress {
        let address = SurfaceAddress::simulated("top", "max_sgas", "2030", real);
        QualifiedSurfaceAddress::new("ens", address)
    }

    #[tokio::test]
    async fn test_publish_then_hit() {
        let server = SurfaceImageServer::default();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some((surface_from_rows(&[&[1.0, 2.0], &[f64::NAN, 4.0]]), 7)))
        };

        let first = server.get_or_publish(&key(0), compute).await.unwrap();
        let PublishOutcome::Published(published, extra) = first else {
            panic!("expected a fresh publish");
        };
        assert_eq!(extra, 7);
        assert_eq!(published.meta.val_min, 1.0);
        assert_eq!(published.meta.val_max, 4.0);
        assert_eq!((published.meta.width, published.meta.height), (2, 2));

        let second = server.get_or_publish(&key(0), compute).await.unwrap();
        let PublishOutcome::Cached(cached) = second else {
            panic!("expected a cache hit");
        };
        assert!(Arc::ptr_eq(&published, &cached));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(server.stats().hits.load(Ordering::Relaxed), 1);
        assert_eq!(server.stats().hit_rate(), 50.0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_compute_once() {
        let server = SurfaceImageServer::default();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let shared = key(9);

        let requests = (0..8).map(|_| {
            server.get_or_publish(&shared, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                Ok(Some((constant_surface(4, 4, 3.0), ())))
            })
        });
        let outcomes = futures::future::join_all(requests).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        let published = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(PublishOutcome::Published(..))))
            .count();
        assert_eq!(published, 1);
        assert_eq!(server.stats().published(), 1);
    }

    #[tokio::test]
    async fn test_not_found_leaves_slot_empty() {
        let server = SurfaceImageServer::default();
        let outcome = server
            .get_or_publish(&key(1), || async { Ok(None::<(MaskedGrid, ())>) })
            .await
            .unwrap();
        assert!(matches!(outcome, PublishOutcome::NotFound));
        assert!(server.get_surface_metadata(&key(1)).await.is_none());
        assert!(server.is_empty().await);
        assert!(server.slots.read().await.is_empty());

        // A later call can still publish
        let outcome = server
            .get_or_publish(&key(1), || async { Ok(Some((constant_surface(2, 2, 1.0), ()))) })
            .await
            .unwrap();
        assert!(matches!(outcome, PublishOutcome::Published(..)));
    }

    #[tokio::test]
    async fn test_error_propagates_without_publishing() {
        let server = SurfaceImageServer::default();
        let result = server
            .get_or_publish(&key(2), || async {
                Err::<Option<(MaskedGrid, ())>, _>(Co2Error::SurfaceRead("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(server.get_surface_metadata(&key(2)).await.is_none());
        assert!(server.slots.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_keys_do_not_accumulate() {
        let server = SurfaceImageServer::default();
        for real in 0..50 {
            let outcome = server
                .get_or_publish(&key(real), || async { Ok(None::<(MaskedGrid, ())>) })
                .await
                .unwrap();
            assert!(matches!(outcome, PublishOutcome::NotFound));
        }
        server
            .get_or_publish(&key(7), || async { Ok(Some((constant_surface(2, 2, 1.0), ()))) })
            .await
            .unwrap();

        assert_eq!(server.slots.read().await.len(), 1);
        assert_eq!(server.stats().not_found.load(Ordering::Relaxed), 50);
    }

    #[tokio::test]
    async fn test_image_is_served_by_url() {
        let server = SurfaceImageServer::new("/img/");
        server
            .get_or_publish(&key(3), || async { Ok(Some((constant_surface(3, 3, 2.0), ()))) })
            .await
            .unwrap();

        let url = server.encode_partial_url(&key(3));
        assert!(url.starts_with("/img/ens___max_sgas"));
        let png = server.get_image(&url).await.unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert!(server.get_image("/img/unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_fully_masked_surface_meta() {
        let server = SurfaceImageServer::default();
        let outcome = server
            .get_or_publish(&key(4), || async {
                Ok(Some((surface_from_rows(&[&[f64::NAN, f64::NAN]]), ())))
            })
            .await
            .unwrap();
        let PublishOutcome::Published(published, ()) = outcome else {
            panic!("expected a fresh publish");
        };
        assert_eq!((published.meta.val_min, published.meta.val_max), (0.0, 0.0));
    }
}

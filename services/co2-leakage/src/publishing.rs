//! Publish-and-describe for CO2 leakage surfaces.
//!
//! A request names either a plain surface in the store or a truncated
//! (ensemble plume count) surface built from several realizations. The first
//! request for a key fetches or synthesizes the grid, post-processes it and
//! publishes it to the [`SurfaceImageServer`]; later requests are answered
//! from the cache without touching the store.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use co2_common::{
    Co2Error, Co2Result, MapAttribute, MapType, MaskedGrid, QualifiedSurfaceAddress,
    SurfaceAddress, TruncatedSurfaceAddress,
};
use grid_processor::truncate_surfaces;
use storage::{PublishOutcome, SurfaceImageMeta, SurfaceImageServer, SurfaceStore};

use crate::config::VisualizationConfig;

/// What to publish.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceRequest {
    /// A surface read directly from the store.
    Plain(SurfaceAddress),
    /// Per-cell count of realizations with plume presence.
    Truncated(TruncatedSurfaceAddress),
}

/// Description returned for a published surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedSurfaceInfo {
    pub meta: SurfaceImageMeta,
    /// Handle for [`SurfaceImageServer::get_image`].
    pub url: String,
    /// Sum of valid cells of a mass surface, in the configured unit.
    /// Only reported by the call that published the surface.
    pub summed_mass: Option<f64>,
}

/// Publishes surfaces from one store under one visualization config.
pub struct SurfacePublisher {
    server: SurfaceImageServer,
    store: Arc<dyn SurfaceStore>,
    config: VisualizationConfig,
}

impl SurfacePublisher {
    pub fn new(store: Arc<dyn SurfaceStore>, config: VisualizationConfig) -> Self {
        let server = SurfaceImageServer::new(config.image_url_prefix.clone());
        Self {
            server,
            store,
            config,
        }
    }

    pub fn server(&self) -> &SurfaceImageServer {
        &self.server
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    /// Cache key for a request.
    pub fn qualified_address(&self, request: &SurfaceRequest) -> QualifiedSurfaceAddress {
        let provider_id = self.store.provider_id();
        match request {
            SurfaceRequest::Plain(address) => {
                QualifiedSurfaceAddress::new(provider_id, address.clone())
            }
            SurfaceRequest::Truncated(address) => {
                QualifiedSurfaceAddress::truncated(provider_id, address)
            }
        }
    }

    /// Publish the requested surface if needed and describe it.
    ///
    /// Returns `Ok(None)` when the surface (or every basis realization of a
    /// truncated surface) is missing from the store or cannot be read;
    /// nothing is cached then.
    /// A plain address whose attribute is not one of the configured map
    /// attributes is an error.
    pub async fn publish_and_describe(
        &self,
        request: &SurfaceRequest,
    ) -> Co2Result<Option<PublishedSurfaceInfo>> {
        let key = self.qualified_address(request);
        let outcome = match request {
            SurfaceRequest::Plain(address) => {
                let attribute = self
                    .config
                    .attribute_names
                    .find(&address.attribute)
                    .ok_or_else(|| Co2Error::UnknownMapAttribute(address.attribute.clone()))?;
                self.server
                    .get_or_publish(&key, || self.load_plain(address, attribute))
                    .await?
            }
            SurfaceRequest::Truncated(address) => {
                self.server
                    .get_or_publish(&key, || self.load_truncated(address))
                    .await?
            }
        };

        Ok(match outcome {
            PublishOutcome::Cached(published) => Some(PublishedSurfaceInfo {
                meta: published.meta.clone(),
                url: published.url.clone(),
                summed_mass: None,
            }),
            PublishOutcome::Published(published, summed_mass) => Some(PublishedSurfaceInfo {
                meta: published.meta.clone(),
                url: published.url.clone(),
                summed_mass,
            }),
            PublishOutcome::NotFound => {
                warn!(key = %key, "Could not find surface");
                None
            }
        })
    }

    /// Fetch a plain surface and apply unit scaling and thresholding.
    async fn load_plain(
        &self,
        address: &SurfaceAddress,
        attribute: MapAttribute,
    ) -> Co2Result<Option<(MaskedGrid, Option<f64>)>> {
        let Some(mut surface) = self.fetch(address).await else {
            return Ok(None);
        };

        let map_type = attribute.map_type();
        let mut summed_mass = None;
        if map_type == MapType::Mass {
            surface.scale_by(self.config.unit.divisor());
            summed_mass = Some(surface.masked_sum());
        }

        if map_type.is_thresholdable() {
            if let Some(threshold) = self.config.threshold(attribute) {
                surface.mask_at_or_below(threshold);
            }
        }

        Ok(Some((surface, summed_mass)))
    }

    /// Read a surface from the store. A surface that exists but cannot be
    /// read is treated like a missing one.
    async fn fetch(&self, address: &SurfaceAddress) -> Option<MaskedGrid> {
        match self.store.get_surface(address).await {
            Ok(surface) => surface,
            Err(e) => {
                warn!(
                    realization = ?address.realization(),
                    attribute = %address.attribute,
                    error = %e,
                    "Could not read surface"
                );
                None
            }
        }
    }

    /// Fetch every basis realization and count plume presence.
    async fn load_truncated(
        &self,
        address: &TruncatedSurfaceAddress,
    ) -> Co2Result<Option<(MaskedGrid, Option<f64>)>> {
        let fetches = address.realizations.iter().map(|r| {
            let basis = address.basis_address(*r);
            async move {
                let surface = self.fetch(&basis).await;
                if surface.is_none() {
                    warn!(
                        realization = *r,
                        attribute = %address.basis_attribute,
                        "Basis surface unavailable, dropping realization"
                    );
                }
                surface
            }
        });
        let surfaces: Vec<MaskedGrid> = join_all(fetches).await.into_iter().flatten().collect();

        let Some(count) = truncate_surfaces(&surfaces, address.threshold, address.smoothing)?
        else {
            return Ok(None);
        };
        debug!(
            attribute = %address.attribute(),
            plume_count = count.plume_count,
            "Computed truncated surface"
        );
        Ok(Some((count.grid, None)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use co2_common::MapUnit;
    use storage::InMemorySurfaceStore;
    use test_utils::{assert_approx_eq, surface_from_rows};

    fn publisher(store: InMemorySurfaceStore, config: VisualizationConfig) -> SurfacePublisher {
        SurfacePublisher::new(Arc::new(store), config)
    }

    #[tokio::test]
    async fn test_mass_surface_is_scaled_and_summed() {
        let address = SurfaceAddress::simulated("top", "co2-mass-total", "2030", 0);
        let store = InMemorySurfaceStore::new("ens").with_surface(
            address.clone(),
            surface_from_rows(&[&[1000.0, 2000.0], &[f64::NAN, 3000.0]]),
        );
        let config = VisualizationConfig {
            unit: MapUnit::MTons,
            ..Default::default()
        };
        let publisher = publisher(store, config);

        let info = publisher
            .publish_and_describe(&SurfaceRequest::Plain(address.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_approx_eq!(info.summed_mass.unwrap(), 0.006, 1e-12);
        assert_approx_eq!(info.meta.val_max, 0.003, 1e-12);

        // Cached answer carries no mass
        let again = publisher
            .publish_and_describe(&SurfaceRequest::Plain(address))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.summed_mass, None);
        assert_eq!(again.meta, info.meta);
        assert_eq!(again.url, info.url);
    }

    #[tokio::test]
    async fn test_threshold_masks_at_or_below() {
        let address = SurfaceAddress::simulated("top", "max_sgas", "2030", 0);
        let store = InMemorySurfaceStore::new("ens").with_surface(
            address.clone(),
            surface_from_rows(&[&[0.0, 0.1], &[0.2, 0.3]]),
        );
        let mut config = VisualizationConfig::default();
        config.thresholds.insert(MapAttribute::MaxSgas, 0.1);
        let publisher = publisher(store, config);

        let info = publisher
            .publish_and_describe(&SurfaceRequest::Plain(address.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.summed_mass, None);
        assert_eq!((info.meta.val_min, info.meta.val_max), (0.2, 0.3));

        let key = publisher.qualified_address(&SurfaceRequest::Plain(address));
        let published = publisher.server().get_published(&key).await.unwrap();
        assert_eq!(published.grid.valid_count(), 2);
    }

    #[tokio::test]
    async fn test_migration_time_ignores_threshold() {
        let address = SurfaceAddress::simulated("top", "migrationtime_sgas", "2030", 0);
        let store = InMemorySurfaceStore::new("ens").with_surface(
            address.clone(),
            surface_from_rows(&[&[0.0, 5.0]]),
        );
        let mut config = VisualizationConfig::default();
        config.thresholds.insert(MapAttribute::MigrationTimeSgas, 1.0);
        let publisher = publisher(store, config);

        let info = publisher
            .publish_and_describe(&SurfaceRequest::Plain(address))
            .await
            .unwrap()
            .unwrap();
        assert_eq!((info.meta.val_min, info.meta.val_max), (0.0, 5.0));
    }

    #[tokio::test]
    async fn test_plume_ignores_threshold() {
        let address = SurfaceAddress::simulated("top", "plume_sgas", "2030", 0);
        let store = InMemorySurfaceStore::new("ens").with_surface(
            address.clone(),
            surface_from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]),
        );
        let mut config = VisualizationConfig::default();
        config.thresholds.insert(MapAttribute::SgasPlume, 0.5);
        let publisher = publisher(store, config);

        let info = publisher
            .publish_and_describe(&SurfaceRequest::Plain(address.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!((info.meta.val_min, info.meta.val_max), (0.0, 1.0));
        assert_eq!(info.summed_mass, None);

        let key = publisher.qualified_address(&SurfaceRequest::Plain(address));
        let published = publisher.server().get_published(&key).await.unwrap();
        assert_eq!(published.grid.valid_count(), 4);
    }

    #[tokio::test]
    async fn test_unknown_attribute_is_an_error() {
        let address = SurfaceAddress::simulated("top", "porosity", "2030", 0);
        let publisher = publisher(InMemorySurfaceStore::new("ens"), VisualizationConfig::default());

        let err = publisher
            .publish_and_describe(&SurfaceRequest::Plain(address))
            .await
            .unwrap_err();
        assert!(matches!(err, Co2Error::UnknownMapAttribute(ref a) if a == "porosity"));
        assert!(err.is_precondition());
    }
}

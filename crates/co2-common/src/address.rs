//! Surface addresses and the qualified keys used by the publish cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistic computed over a set of realizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceStatistic {
    Mean,
    StdDev,
    Minimum,
    Maximum,
    P10,
    P90,
}

impl SurfaceStatistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::StdDev => "stddev",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::P10 => "p10",
            Self::P90 => "p90",
        }
    }
}

/// Selects which realization(s) a surface comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceSelector {
    /// A single simulated realization.
    Realization(i32),
    /// A statistic over an explicit list of realizations.
    Statistic {
        statistic: SurfaceStatistic,
        realizations: Vec<i32>,
    },
}

/// Identifies a raw surface in a surface store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceAddress {
    pub name: String,
    pub attribute: String,
    pub datestr: String,
    pub selector: SurfaceSelector,
}

impl SurfaceAddress {
    /// Address of a single simulated realization.
    pub fn simulated(
        name: impl Into<String>,
        attribute: impl Into<String>,
        datestr: impl Into<String>,
        realization: i32,
    ) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
            datestr: datestr.into(),
            selector: SurfaceSelector::Realization(realization),
        }
    }

    /// Address of a statistic over several realizations.
    pub fn statistical(
        name: impl Into<String>,
        attribute: impl Into<String>,
        datestr: impl Into<String>,
        statistic: SurfaceStatistic,
        realizations: Vec<i32>,
    ) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
            datestr: datestr.into(),
            selector: SurfaceSelector::Statistic {
                statistic,
                realizations,
            },
        }
    }

    /// The realization index, if this addresses a single realization.
    pub fn realization(&self) -> Option<i32> {
        match self.selector {
            SurfaceSelector::Realization(r) => Some(r),
            SurfaceSelector::Statistic { .. } => None,
        }
    }
}

/// Request for an ensemble plume-presence count surface.
///
/// Not hashable itself since threshold and smoothing are floats; its cache
/// identity is the [`SurfaceKey::Truncated`] produced by [`Self::key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncatedSurfaceAddress {
    pub name: String,
    pub datestr: String,
    pub realizations: Vec<i32>,
    pub basis_attribute: String,
    pub threshold: f64,
    pub smoothing: f64,
}

impl TruncatedSurfaceAddress {
    /// Deterministic attribute name encoding basis attribute, threshold and smoothing.
    pub fn attribute(&self) -> String {
        format!(
            "Truncated_{}_{}_{}",
            self.basis_attribute, self.threshold, self.smoothing
        )
    }

    /// Simulated address of the basis surface for one realization.
    pub fn basis_address(&self, realization: i32) -> SurfaceAddress {
        SurfaceAddress::simulated(
            self.name.clone(),
            self.basis_attribute.clone(),
            self.datestr.clone(),
            realization,
        )
    }

    pub fn key(&self) -> SurfaceKey {
        SurfaceKey::Truncated {
            attribute: self.attribute(),
            name: self.name.clone(),
            datestr: self.datestr.clone(),
            realizations: self.realizations.clone(),
        }
    }
}

/// Kinds of surfaces that can occupy a slot in the publish cache.
///
/// Truncated surfaces share the key space with statistical surfaces (an
/// attribute plus a realization list) but get their own variant so they are
/// never mistaken for a real statistic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceKey {
    Surface(SurfaceAddress),
    Truncated {
        attribute: String,
        name: String,
        datestr: String,
        realizations: Vec<i32>,
    },
}

/// Globally unique identity of a published surface. This is the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedSurfaceAddress {
    pub provider_id: String,
    pub key: SurfaceKey,
}

impl QualifiedSurfaceAddress {
    pub fn new(provider_id: impl Into<String>, address: SurfaceAddress) -> Self {
        Self {
            provider_id: provider_id.into(),
            key: SurfaceKey::Surface(address),
        }
    }

    pub fn truncated(provider_id: impl Into<String>, address: &TruncatedSurfaceAddress) -> Self {
        Self {
            provider_id: provider_id.into(),
            key: address.key(),
        }
    }
}

fn join_realizations(realizations: &[i32]) -> String {
    realizations
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// Stable string form, e.g. `prov___max_sgas___top___2030___real-3`.
impl fmt::Display for QualifiedSurfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            SurfaceKey::Surface(address) => {
                write!(
                    f,
                    "{}___{}___{}___{}___",
                    self.provider_id, address.attribute, address.name, address.datestr
                )?;
                match &address.selector {
                    SurfaceSelector::Realization(r) => write!(f, "real-{}", r),
                    SurfaceSelector::Statistic {
                        statistic,
                        realizations,
                    } => write!(
                        f,
                        "{}-{}",
                        statistic.as_str(),
                        join_realizations(realizations)
                    ),
                }
            }
            SurfaceKey::Truncated {
                attribute,
                name,
                datestr,
                realizations,
            } => write!(
                f,
                "{}___{}___{}___{}___truncated-{}",
                self.provider_id,
                attribute,
                name,
                datestr,
                join_realizations(realizations)
            ),
        }
    }
}

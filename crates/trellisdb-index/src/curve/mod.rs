//! Space-filling curve settings.
//!
//! Spatial values are linearized into index keys with a space-filling curve.
//! The curve's parameters — dimension count, per-axis envelope, bits per
//! dimension — depend on the point's coordinate reference system and are
//! supplied by a [`CurveSettingsProvider`]. A populator snapshots the
//! provider once, at construction, into an [`IndexCurveSettings`]: the
//! snapshot is frozen for the index's entire lifetime, because any change to
//! curve parameters changes the key layout and invalidates the region.
//!
//! The snapshot is an explicit, per-build object passed into the populator —
//! never process-global state — so concurrent builds with different settings
//! cannot interfere.

mod zorder;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use trellisdb_core::EncodingError;

pub use zorder::ZOrderCurve;

/// WGS84 geographic 2D coordinates (longitude, latitude).
pub const CRS_WGS84: u32 = 4326;
/// WGS84 geographic 3D coordinates (longitude, latitude, height).
pub const CRS_WGS84_3D: u32 = 7203;
/// Cartesian 2D coordinates.
pub const CRS_CARTESIAN: u32 = 0;
/// Cartesian 3D coordinates.
pub const CRS_CARTESIAN_3D: u32 = 9157;

/// Curve parameters for one coordinate reference system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSettings {
    /// Number of dimensions (2 or 3).
    pub dimensions: usize,
    /// Lower envelope bound per axis.
    pub min: Vec<f64>,
    /// Upper envelope bound per axis.
    pub max: Vec<f64>,
    /// Curve resolution: grid bits per dimension. `dimensions *
    /// bits_per_dimension` must not exceed 63 so derived values fit in a
    /// `u64` key field.
    pub bits_per_dimension: u32,
}

impl CurveSettings {
    /// Create settings, validating the envelope shape.
    ///
    /// Returns `None` if the axis bounds don't match the dimension count,
    /// any axis is empty or inverted, or the total bit count exceeds 63.
    #[must_use]
    pub fn new(min: Vec<f64>, max: Vec<f64>, bits_per_dimension: u32) -> Option<Self> {
        let dimensions = min.len();
        if dimensions == 0 || dimensions != max.len() {
            return None;
        }
        if dimensions as u32 * bits_per_dimension > 63 || bits_per_dimension == 0 {
            return None;
        }
        if min.iter().zip(&max).any(|(lo, hi)| !(lo < hi)) {
            return None;
        }
        Some(Self { dimensions, min, max, bits_per_dimension })
    }
}

/// Source of curve settings per coordinate reference system.
///
/// Typically backed by database configuration; queried once per build and
/// never again.
pub trait CurveSettingsProvider {
    /// Settings for the given CRS, or `None` if it is not configured.
    fn resolve(&self, crs: u32) -> Option<CurveSettings>;

    /// Every CRS this provider has settings for.
    fn configured_crs(&self) -> Vec<u32>;
}

/// Curve settings backed by an explicit per-CRS table.
///
/// The default configuration covers the four built-in reference systems:
/// WGS84 (2D/3D) with geographic envelopes and cartesian (2D/3D) with a
/// symmetric envelope of one million units per axis.
#[derive(Debug, Clone)]
pub struct ConfiguredCurveSettings {
    settings: HashMap<u32, CurveSettings>,
}

impl ConfiguredCurveSettings {
    /// Settings table with the built-in defaults.
    #[must_use]
    pub fn defaults() -> Self {
        let mut settings = HashMap::new();
        if let Some(s) = CurveSettings::new(vec![-180.0, -90.0], vec![180.0, 90.0], 30) {
            settings.insert(CRS_WGS84, s);
        }
        if let Some(s) = CurveSettings::new(
            vec![-180.0, -90.0, -1_000_000.0],
            vec![180.0, 90.0, 1_000_000.0],
            20,
        ) {
            settings.insert(CRS_WGS84_3D, s);
        }
        if let Some(s) =
            CurveSettings::new(vec![-1_000_000.0, -1_000_000.0], vec![1_000_000.0, 1_000_000.0], 30)
        {
            settings.insert(CRS_CARTESIAN, s);
        }
        if let Some(s) = CurveSettings::new(
            vec![-1_000_000.0, -1_000_000.0, -1_000_000.0],
            vec![1_000_000.0, 1_000_000.0, 1_000_000.0],
            20,
        ) {
            settings.insert(CRS_CARTESIAN_3D, s);
        }
        Self { settings }
    }

    /// Empty settings table.
    #[must_use]
    pub fn empty() -> Self {
        Self { settings: HashMap::new() }
    }

    /// Override or add settings for one CRS.
    #[must_use]
    pub fn with_settings(mut self, crs: u32, settings: CurveSettings) -> Self {
        self.settings.insert(crs, settings);
        self
    }
}

impl Default for ConfiguredCurveSettings {
    fn default() -> Self {
        Self::defaults()
    }
}

impl CurveSettingsProvider for ConfiguredCurveSettings {
    fn resolve(&self, crs: u32) -> Option<CurveSettings> {
        self.settings.get(&crs).cloned()
    }

    fn configured_crs(&self) -> Vec<u32> {
        self.settings.keys().copied().collect()
    }
}

/// The per-build curve snapshot: one constructed curve per configured CRS,
/// frozen for the lifetime of the index being built.
#[derive(Debug, Clone)]
pub struct IndexCurveSettings {
    curves: HashMap<u32, Arc<ZOrderCurve>>,
}

impl IndexCurveSettings {
    /// Snapshot every configured CRS from the provider.
    #[must_use]
    pub fn snapshot(provider: &dyn CurveSettingsProvider) -> Self {
        let mut curves = HashMap::new();
        for crs in provider.configured_crs() {
            if let Some(settings) = provider.resolve(crs) {
                curves.insert(crs, Arc::new(ZOrderCurve::from_settings(&settings)));
            }
        }
        Self { curves }
    }

    /// The frozen curve for a CRS.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnknownCrs`] if the CRS was not configured
    /// when the snapshot was taken.
    pub fn curve_for(&self, crs: u32) -> Result<&ZOrderCurve, EncodingError> {
        self.curves.get(&crs).map(Arc::as_ref).ok_or(EncodingError::UnknownCrs(crs))
    }
}

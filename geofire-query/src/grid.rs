//! H3 grid indexing.
//!
//! Businesses are tagged in the store with the H3 cell containing them at two
//! resolutions: a coarse one (7, ~5 km² cells) used as the lookup key, and a
//! fine one (15, sub-meter cells) used to recover a precise location for
//! distance refinement. A nearby query looks up the origin's coarse cell plus
//! its neighbor ring, so search breadth is a small fixed set of keys instead
//! of a scan over the whole store.

use crate::error::{QueryError, Result};
use crate::geo::GeoPoint;
use h3o::{CellIndex, LatLng};
use rustc_hash::FxHashSet;
use std::fmt;
use std::str::FromStr;

pub use h3o::Resolution;

/// Resolution of the coarse lookup key (`h3index7`).
pub const COARSE_RESOLUTION: Resolution = Resolution::Seven;

/// Resolution of the stored fine location (`h3index15`).
pub const FINE_RESOLUTION: Resolution = Resolution::Fifteen;

/// An H3 cell at some resolution.
///
/// Displays and parses as the canonical lowercase hex string, which is the
/// form stored in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(CellIndex);

impl CellId {
    /// Resolution of this cell.
    pub fn resolution(&self) -> Resolution {
        self.0.resolution()
    }

    /// The underlying H3 index.
    pub fn index(&self) -> CellIndex {
        self.0
    }
}

impl From<CellIndex> for CellId {
    fn from(index: CellIndex) -> Self {
        Self(index)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CellId {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        CellIndex::from_str(s.trim())
            .map(Self)
            .map_err(|_| QueryError::InvalidCell(s.to_string()))
    }
}

/// Validate a numeric resolution.
pub fn resolution(level: u8) -> Result<Resolution> {
    Resolution::try_from(level).map_err(|_| QueryError::InvalidResolution(level))
}

/// Cell containing `point` at `resolution`.
pub fn cell_of(point: GeoPoint, resolution: Resolution) -> Result<CellId> {
    let point = point.validate()?;
    let ll = LatLng::new(point.latitude, point.longitude).map_err(|_| {
        QueryError::InvalidCoordinate {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    })?;
    Ok(CellId(ll.to_cell(resolution)))
}

/// The center cell plus every cell within grid distance `radius`.
///
/// The center is always first and no cell appears twice. Radius 1 yields 7
/// cells, or 6 around one of the 12 pentagons.
pub fn ring(center: CellId, radius: u32) -> Vec<CellId> {
    let disk: Vec<CellIndex> = center.0.grid_disk(radius);

    let mut seen: FxHashSet<CellIndex> = FxHashSet::default();
    seen.insert(center.0);

    let mut cells = Vec::with_capacity(disk.len().max(1));
    cells.push(center);
    for index in disk {
        if seen.insert(index) {
            cells.push(CellId(index));
        }
    }
    cells
}

/// Centroid of a cell.
pub fn to_point(cell: CellId) -> GeoPoint {
    let ll = LatLng::from(cell.0);
    GeoPoint {
        latitude: ll.lat(),
        longitude: ll.lng(),
    }
}

//! Request, response and business types.
//!
//! Wire names are camelCase so the JSON matches what the server exposes.

use crate::geo::{Distance, GeoPoint};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A business record read from the store and decorated for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    /// Store-assigned identifier (the record key).
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Fine-resolution cell identifier, when the record carried a valid one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_cell: Option<String>,

    /// Distance from the query origin; absent when the location was not
    /// resolvable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,

    /// Remaining display attributes, passed through untouched.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Business {
    /// Create a business with just an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            location_cell: None,
            distance: None,
            attributes: Map::new(),
        }
    }

    /// Distance in kilometers, if annotated.
    pub fn distance_km(&self) -> Option<f64> {
        self.distance.map(|d| d.distance_km)
    }
}

/// Maximum-distance filter carried by a request.
///
/// Accepted and logged but not applied: results are bounded by the
/// neighbor ring only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterDistance {
    #[default]
    None,
    Mi1,
    Mi5,
    Mi10,
    Mi25,
}

/// Ordering preference carried by a request. Not applied, see
/// [`FilterDistance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBy {
    #[default]
    Default,
    #[serde(rename = "A_to_Z", alias = "AToZ")]
    AToZ,
}

/// A nearby-businesses query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub geo_point: GeoPoint,
    #[serde(default)]
    pub filter_distance: FilterDistance,
    #[serde(default)]
    pub order_by: OrderBy,
}

impl QueryRequest {
    /// Request centered on `geo_point` with default filter and ordering.
    pub fn at(geo_point: GeoPoint) -> Self {
        Self {
            geo_point,
            filter_distance: FilterDistance::default(),
            order_by: OrderBy::default(),
        }
    }

    /// Set the ordering preference.
    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    /// Set the distance filter.
    pub fn with_filter_distance(mut self, filter: FilterDistance) -> Self {
        self.filter_distance = filter;
        self
    }
}

/// The businesses gathered for one request. Order is not meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub businesses: Vec<Business>,
}

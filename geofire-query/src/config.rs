//! Query engine configuration.

use crate::error::Result;
use crate::grid::{self, Resolution};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest accepted neighbor ring radius. Radius 3 is 37 cells.
pub const MAX_RING_RADIUS: u32 = 3;

/// What a cell branch does after a record fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedRecordPolicy {
    /// Drop the record and keep reading the cell.
    #[default]
    Skip,
    /// Drop the record and stop reading the cell.
    AbortBranch,
}

/// Configuration for the nearby query path.
///
/// Field names and limits default to the layout of the `businesses`
/// collection: coarse key `h3index7`, fine location `h3index15`, at most 20
/// records per cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryConfig {
    /// Collection holding business documents.
    pub collection: String,

    /// Field holding the coarse cell identifier (the lookup key).
    pub coarse_field: String,

    /// Field holding the fine cell identifier (the precise location).
    pub fine_field: String,

    /// H3 resolution of the coarse field (0-15).
    pub coarse_resolution: u8,

    /// Grid distance of the neighbor ring around the origin cell, at most
    /// [`MAX_RING_RADIUS`].
    pub ring_radius: u32,

    /// Maximum records fetched per cell.
    pub cell_limit: usize,

    /// Deadline for the whole fan-out.
    #[serde(with = "duration_millis")]
    pub deadline: Duration,

    /// Behavior on a record that fails to decode.
    pub malformed_policy: MalformedRecordPolicy,

    /// Capacity of the channel between cell branches and the aggregator.
    pub channel_capacity: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            collection: "businesses".to_string(),
            coarse_field: "h3index7".to_string(),
            fine_field: "h3index15".to_string(),
            coarse_resolution: 7,
            ring_radius: 1,
            cell_limit: 20,
            deadline: Duration::from_secs(60),
            malformed_policy: MalformedRecordPolicy::default(),
            channel_capacity: 64,
        }
    }
}

impl QueryConfig {
    /// Set the per-cell record limit.
    pub fn with_cell_limit(mut self, limit: usize) -> Self {
        self.cell_limit = limit;
        self
    }

    /// Set the neighbor ring radius.
    pub fn with_ring_radius(mut self, radius: u32) -> Self {
        self.ring_radius = radius;
        self
    }

    /// Set the fan-out deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the malformed record policy.
    pub fn with_malformed_policy(mut self, policy: MalformedRecordPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    /// Set the coarse resolution.
    pub fn with_coarse_resolution(mut self, level: u8) -> Self {
        self.coarse_resolution = level;
        self
    }

    /// Validated coarse resolution.
    pub fn resolution(&self) -> Result<Resolution> {
        grid::resolution(self.coarse_resolution)
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<()> {
        use crate::error::QueryError;

        self.resolution()?;
        if self.cell_limit == 0 {
            return Err(QueryError::Config("cellLimit must be at least 1".into()));
        }
        if self.ring_radius > MAX_RING_RADIUS {
            return Err(QueryError::Config(format!(
                "ringRadius {} exceeds the maximum of {MAX_RING_RADIUS}",
                self.ring_radius
            )));
        }
        if self.channel_capacity == 0 {
            return Err(QueryError::Config(
                "channelCapacity must be at least 1".into(),
            ));
        }
        if self.coarse_field.is_empty() || self.fine_field.is_empty() {
            return Err(QueryError::Config("cell field names must be set".into()));
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

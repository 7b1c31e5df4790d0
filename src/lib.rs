// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::op_ref
)]

pub mod boundary;
pub mod config;
pub mod export;
pub mod hull;
pub mod kmeans;
pub mod pipeline;
pub mod points;
pub mod triangulation;
pub mod zones;

#[cfg(test)]
mod test_pipeline;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{PatrolZones, PipelineError, generate_patrol_zones};
pub use points::{AxisOrder, Geolocated, LabeledPoint, Point2D, PointSet};

/// Fewest secondary centroids an alpha shape can be built from.
pub const MIN_BOUNDARY_POINTS: usize = 4;

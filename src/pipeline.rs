use crate::MIN_BOUNDARY_POINTS;
use crate::boundary::{BoundaryError, BoundaryOutput, BoundarySegment, assemble_lon_lat};
use crate::config::{ConfigError, PipelineConfig};
use crate::hull::AlphaShapeExtractor;
use crate::points::{Geolocated, LabeledPoint, PointSet, filter_points, lat_lon_set};
use crate::zones::{HierarchicalClusterOrchestrator, ZonePlan};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid pipeline config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to assemble boundary for zone {zone}: {source}")]
    Boundary {
        zone: usize,
        #[source]
        source: BoundaryError,
    },
}

/// Why a zone does or does not have a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BoundaryStatus {
    Built { edges: usize },
    TooFewCentroids { centroids: usize },
    NoEdges,
    ClusteringFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReport {
    pub zone: usize,
    pub member_count: usize,
    pub secondary_k: usize,
    /// Secondary centroids, longitude first. Empty if secondary clustering failed.
    pub centroids: Vec<(f64, f64)>,
    pub segments: Vec<BoundarySegment>,
    pub status: BoundaryStatus,
}

impl ZoneReport {
    pub fn has_boundary(&self) -> bool {
        !self.segments.is_empty()
    }
}

/// Everything a renderer needs for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatrolZones {
    /// Records that passed validation, in input order.
    pub points: Vec<LabeledPoint>,
    /// Zone id for each entry of `points`.
    pub primary_assignment: Vec<usize>,
    /// Every zone's boundary segments, merged in ascending zone order.
    pub boundary: BoundaryOutput,
    pub zones: Vec<ZoneReport>,
}

impl PatrolZones {
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn zones_with_boundary(&self) -> impl Iterator<Item = &ZoneReport> {
        self.zones.iter().filter(|z| z.has_boundary())
    }
}

fn zone_report(
    plan: ZonePlan,
    extractor: &AlphaShapeExtractor,
) -> Result<ZoneReport, PipelineError> {
    let zone = plan.zone;
    let mut report = ZoneReport {
        zone,
        member_count: plan.members.len(),
        secondary_k: plan.secondary_k,
        centroids: Vec::new(),
        segments: Vec::new(),
        status: BoundaryStatus::NoEdges,
    };

    let centroids: PointSet = match plan.secondary {
        Ok(centroids) => centroids,
        Err(e) => {
            report.status = BoundaryStatus::ClusteringFailed {
                reason: e.to_string(),
            };
            return Ok(report);
        }
    };
    report.centroids = centroids.points.iter().map(|p| p.as_tuple()).collect();

    if centroids.len() < MIN_BOUNDARY_POINTS {
        report.status = BoundaryStatus::TooFewCentroids {
            centroids: centroids.len(),
        };
        return Ok(report);
    }

    let edges = extractor.extract(&centroids.points);
    if edges.is_empty() {
        tracing::debug!(zone, centroids = centroids.len(), "alpha shape produced no edges");
        return Ok(report);
    }

    report.segments = assemble_lon_lat(&centroids, &edges)
        .map_err(|source| PipelineError::Boundary { zone, source })?;
    report.status = BoundaryStatus::Built { edges: edges.len() };

    Ok(report)
}

/// Clusters the records into at most `desired_zones` patrol zones and
/// extracts an outline for every zone that has enough data for one.
///
/// Missing or invalid coordinates are dropped. No usable points, or a zone
/// count of zero, gives an empty result rather than an error. An invalid
/// `config` is rejected before any work is done.
#[tracing::instrument(skip(records, config), fields(records = records.len()))]
pub fn generate_patrol_zones<R: Geolocated>(
    records: &[R],
    desired_zones: usize,
    config: &PipelineConfig,
) -> Result<PatrolZones, PipelineError> {
    config.validate()?;

    let points = filter_points(records);
    let lat_lon = lat_lon_set(&points);

    let orchestrator = HierarchicalClusterOrchestrator::new(config.kmeans, config.parallel);

    let Some(primary) = orchestrator.primary_pass(&lat_lon, desired_zones) else {
        tracing::info!(valid = points.len(), "nothing to cluster");
        return Ok(PatrolZones::default());
    };

    let extractor = config.alpha_shape();
    let zones = orchestrator
        .map_zones(&lat_lon, &primary.assignment, |plan| {
            zone_report(plan, &extractor)
        })
        .into_iter()
        .collect::<Result<Vec<ZoneReport>, PipelineError>>()?;

    let mut boundary = BoundaryOutput::default();
    for report in &zones {
        boundary.extend(&report.segments);
    }

    tracing::info!(
        valid = points.len(),
        zones = zones.len(),
        outlined = zones.iter().filter(|z| z.has_boundary()).count(),
        segments = boundary.len(),
        "patrol zones generated"
    );

    Ok(PatrolZones {
        points,
        primary_assignment: primary.assignment.labels,
        boundary,
        zones,
    })
}

use crate::MIN_BOUNDARY_POINTS;
use crate::kmeans::{
    ClusterAssignment, KMeansClusterer, KMeansConfig, KMeansError, KMeansOutcome,
};
use crate::points::{AxisOrder, PointSet};
use rayon::prelude::*;

/// `max(1, floor(m^0.25))`, using an exact integer fourth root so values
/// like 81 are not lost to floating point error.
pub fn secondary_cluster_count(member_count: usize) -> usize {
    let pow4 = |r: usize| (r as u128).pow(4);
    let m = member_count as u128;

    let mut root = (member_count as f64).powf(0.25) as usize;
    while pow4(root + 1) <= m {
        root += 1;
    }
    while root > 0 && pow4(root) > m {
        root -= 1;
    }

    root.max(1)
}

/// Secondary clustering result for one primary zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePlan {
    pub zone: usize,
    /// Indices into the primary point set.
    pub members: Vec<usize>,
    pub secondary_k: usize,
    /// Secondary centroids, longitude first.
    pub secondary: Result<PointSet, KMeansError>,
}

impl ZonePlan {
    /// The centroid set to build a boundary from, if there are enough centroids.
    pub fn boundary_input(&self) -> Option<&PointSet> {
        self.secondary
            .as_ref()
            .ok()
            .filter(|set| set.len() >= MIN_BOUNDARY_POINTS)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalClusterOrchestrator {
    pub kmeans: KMeansConfig,
    pub parallel: bool,
}

impl HierarchicalClusterOrchestrator {
    pub fn new(kmeans: KMeansConfig, parallel: bool) -> Self {
        Self { kmeans, parallel }
    }

    /// Clusters every point into at most `requested` zones, latitude first.
    /// Returns `None` when there is nothing to cluster.
    pub fn primary_pass(&self, points: &PointSet, requested: usize) -> Option<KMeansOutcome> {
        let k = requested.min(points.len());
        if k < 1 {
            return None;
        }

        let points = points.in_order(AxisOrder::LatLon);
        match KMeansClusterer::new(self.kmeans).cluster(&points.points, k) {
            Ok(outcome) => {
                tracing::debug!(
                    requested,
                    k,
                    zones = outcome.assignment.cluster_count,
                    iterations = outcome.iterations,
                    converged = outcome.converged,
                    "primary pass done"
                );
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!("primary clustering failed: {}", e);
                None
            }
        }
    }

    /// Sub-clusters one zone's members, longitude first.
    pub fn secondary_pass(
        &self,
        points: &PointSet,
        zone: usize,
        members: Vec<usize>,
    ) -> ZonePlan {
        let member_points = member_set(points, &members);
        let secondary_k = secondary_cluster_count(members.len());

        let clusterer =
            KMeansClusterer::new(self.kmeans).with_init(self.kmeans.init.for_subrun(zone as u64));

        let secondary = clusterer
            .cluster(&member_points.points, secondary_k)
            .map(|outcome| {
                PointSet::new(
                    AxisOrder::LonLat,
                    outcome.centroids.iter().map(|c| c.position()).collect(),
                )
            });

        if let Err(e) = &secondary {
            tracing::warn!(
                zone,
                members = members.len(),
                "secondary clustering skipped: {}",
                e
            );
        }

        ZonePlan {
            zone,
            members,
            secondary_k,
            secondary,
        }
    }

    /// Runs the secondary pass for every zone of `primary` in ascending zone
    /// order and hands each plan to `work`. Output order matches zone order
    /// whether or not the work runs in parallel.
    pub fn map_zones<T, F>(
        &self,
        points: &PointSet,
        primary: &ClusterAssignment,
        work: F,
    ) -> Vec<T>
    where
        T: Send,
        F: Fn(ZonePlan) -> T + Sync + Send,
    {
        let groups: Vec<(usize, Vec<usize>)> =
            primary.groups().into_iter().enumerate().collect();
        let run = |(zone, members): (usize, Vec<usize>)| {
            work(self.secondary_pass(points, zone, members))
        };

        if self.parallel {
            groups.into_par_iter().map(run).collect()
        } else {
            groups.into_iter().map(run).collect()
        }
    }
}

fn member_set(points: &PointSet, members: &[usize]) -> PointSet {
    let swap = points.order != AxisOrder::LonLat;
    PointSet::new(
        AxisOrder::LonLat,
        members
            .iter()
            .map(|&i| {
                let p = points.points[i];
                if swap { p.swap() } else { p }
            })
            .collect(),
    )
}

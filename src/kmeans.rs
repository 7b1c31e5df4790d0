use crate::points::Point2D;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// sklearn KMeans default
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

// pi * 100_000
pub const DEFAULT_SEED: u64 = 314159;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KMeansError {
    #[error("cannot cluster an empty point set")]
    EmptyInput,
    #[error("invalid cluster count {k} for {points} points")]
    InvalidClusterCount { k: usize, points: usize },
    #[error("iteration cap must be at least 1")]
    ZeroIterations,
}

/// How the first `k` centroids are picked from the input points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStrategy {
    /// The first `k` distinct points in input order, topped up with repeated
    /// points when there are fewer than `k` distinct locations.
    FirstDistinct,
    /// `k` points sampled without replacement from a seeded generator.
    Random { seed: u64 },
}

impl Default for InitStrategy {
    fn default() -> Self {
        InitStrategy::Random { seed: DEFAULT_SEED }
    }
}

impl InitStrategy {
    /// Derives an independent but reproducible strategy for one sub-run.
    pub fn for_subrun(self, salt: u64) -> Self {
        match self {
            InitStrategy::Random { seed } => InitStrategy::Random {
                seed: seed ^ salt.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    pub max_iterations: usize,
    pub init: InitStrategy,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            init: InitStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid(pub Point2D);

impl Centroid {
    pub fn position(&self) -> Point2D {
        self.0
    }
}

/// Cluster id for every input point. Ids are dense and start at 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub labels: Vec<usize>,
    pub cluster_count: usize,
}

impl ClusterAssignment {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Point indices per cluster, indexed by cluster id.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.cluster_count];
        for (point, &label) in self.labels.iter().enumerate() {
            groups[label].push(point);
        }
        groups
    }

    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.cluster_count];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansOutcome {
    pub assignment: ClusterAssignment,
    pub centroids: Vec<Centroid>,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KMeansClusterer {
    pub config: KMeansConfig,
}

impl KMeansClusterer {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.config.init = init;
        self
    }

    /// Lloyd's method. Runs until no point changes cluster or the iteration cap is hit.
    pub fn cluster(&self, points: &[Point2D], k: usize) -> Result<KMeansOutcome, KMeansError> {
        if points.is_empty() {
            return Err(KMeansError::EmptyInput);
        }
        if k < 1 || k > points.len() {
            return Err(KMeansError::InvalidClusterCount {
                k,
                points: points.len(),
            });
        }
        if self.config.max_iterations == 0 {
            return Err(KMeansError::ZeroIterations);
        }

        let mut centroids = initial_centroids(points, k, self.config.init);
        let mut labels = vec![usize::MAX; points.len()];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;

            if !assign(points, &centroids, &mut labels) {
                converged = true;
                break;
            }

            update_centroids(points, &labels, &mut centroids);
        }

        if !converged {
            tracing::debug!(
                k,
                points = points.len(),
                iterations,
                "k-means hit the iteration cap before converging"
            );
        }

        let (assignment, centroids) = compact(labels, centroids);

        Ok(KMeansOutcome {
            assignment,
            centroids,
            iterations,
            converged,
        })
    }
}

fn initial_centroids(points: &[Point2D], k: usize, init: InitStrategy) -> Vec<Point2D> {
    match init {
        InitStrategy::FirstDistinct => {
            let mut chosen: Vec<usize> = Vec::with_capacity(k);
            for (i, p) in points.iter().enumerate() {
                if chosen.len() == k {
                    break;
                }
                if !chosen.iter().any(|&c| points[c] == *p) {
                    chosen.push(i);
                }
            }
            // Not enough distinct locations, repeat points in order.
            let mut i = 0;
            while chosen.len() < k {
                if !chosen.contains(&i) {
                    chosen.push(i);
                }
                i += 1;
            }
            chosen.into_iter().map(|i| points[i]).collect()
        }
        InitStrategy::Random { seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            rand::seq::index::sample(&mut rng, points.len(), k)
                .into_iter()
                .map(|i| points[i])
                .collect()
        }
    }
}

/// Moves every point to its nearest centroid. Ties go to the lowest id.
/// Returns whether any label changed.
fn assign(points: &[Point2D], centroids: &[Point2D], labels: &mut [usize]) -> bool {
    let mut changed = false;

    for (p, label) in points.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (id, c) in centroids.iter().enumerate() {
            let d = p.distance_squared(c);
            if d < best_dist {
                best_dist = d;
                best = id;
            }
        }
        if *label != best {
            *label = best;
            changed = true;
        }
    }

    changed
}

/// Empty clusters keep their previous centroid.
fn update_centroids(points: &[Point2D], labels: &[usize], centroids: &mut [Point2D]) {
    let mut sums = vec![(0.0, 0.0, 0usize); centroids.len()];
    for (p, &label) in points.iter().zip(labels) {
        let s = &mut sums[label];
        s.0 += p.x;
        s.1 += p.y;
        s.2 += 1;
    }

    for (centroid, (sx, sy, count)) in centroids.iter_mut().zip(sums) {
        if count > 0 {
            *centroid = Point2D::new(sx / count as f64, sy / count as f64);
        }
    }
}

/// Drops clusters that ended up without members and renumbers the rest in
/// ascending order so ids stay dense.
fn compact(labels: Vec<usize>, centroids: Vec<Point2D>) -> (ClusterAssignment, Vec<Centroid>) {
    let mut counts = vec![0usize; centroids.len()];
    for &label in &labels {
        counts[label] += 1;
    }

    let mut remap = vec![usize::MAX; centroids.len()];
    let mut kept = Vec::with_capacity(centroids.len());
    for (old, centroid) in centroids.into_iter().enumerate() {
        if counts[old] > 0 {
            remap[old] = kept.len();
            kept.push(Centroid(centroid));
        }
    }

    let labels = labels.into_iter().map(|l| remap[l]).collect();

    (
        ClusterAssignment {
            labels,
            cluster_count: kept.len(),
        },
        kept,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, ConvexHull, MultiPoint, Point};

    fn first_distinct() -> KMeansClusterer {
        KMeansClusterer::default().with_init(InitStrategy::FirstDistinct)
    }

    #[test]
    fn test_rejects_bad_input() {
        let clusterer = KMeansClusterer::default();
        assert_eq!(clusterer.cluster(&[], 1), Err(KMeansError::EmptyInput));

        let points = vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)];
        assert_eq!(
            clusterer.cluster(&points, 0),
            Err(KMeansError::InvalidClusterCount { k: 0, points: 2 })
        );
        assert_eq!(
            clusterer.cluster(&points, 3),
            Err(KMeansError::InvalidClusterCount { k: 3, points: 2 })
        );
    }

    #[test]
    fn test_tie_goes_to_lowest_id() {
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(1.0, 0.0),
        ];
        let outcome = first_distinct().cluster(&points, 2).unwrap();
        assert_eq!(outcome.assignment.labels, vec![0, 1, 0]);
        assert!(outcome.converged);
        assert_eq!(outcome.centroids[0].position(), Point2D::new(0.5, 0.0));
        assert_eq!(outcome.centroids[1].position(), Point2D::new(2.0, 0.0));
    }

    #[test]
    fn test_k_equal_to_len_gives_singletons() {
        let points: Vec<Point2D> = (0..6)
            .map(|i| Point2D::new(i as f64, (i * i) as f64))
            .collect();

        for clusterer in [first_distinct(), KMeansClusterer::default()] {
            let outcome = clusterer.cluster(&points, points.len()).unwrap();
            assert_eq!(outcome.assignment.cluster_count, 6);
            assert!(outcome.assignment.sizes().iter().all(|&s| s == 1));
        }
    }

    #[test]
    fn test_empty_cluster_is_dropped() {
        let points = vec![Point2D::new(1.0, 1.0); 3];
        let outcome = first_distinct().cluster(&points, 2).unwrap();
        assert_eq!(outcome.centroids.len(), 1);
        assert_eq!(outcome.assignment.cluster_count, 1);
        assert_eq!(outcome.assignment.labels, vec![0, 0, 0]);
    }

    #[test]
    fn test_separated_groups_converge_inside_hulls() {
        let centres = [(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)];
        let offsets = [(-0.1, -0.1), (0.1, -0.1), (0.1, 0.1), (-0.1, 0.1)];

        // Interleaved so the first distinct points come from different groups.
        let mut points = Vec::new();
        for (ox, oy) in offsets {
            for (cx, cy) in centres {
                points.push(Point2D::new(cx + ox, cy + oy));
            }
        }

        let outcome = first_distinct().cluster(&points, 3).unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations <= 3, "took {} iterations", outcome.iterations);

        let groups = outcome.assignment.groups();
        assert_eq!(groups.len(), 3);
        for (id, members) in groups.iter().enumerate() {
            assert_eq!(members.len(), 4);
            let hull = MultiPoint::from(
                members
                    .iter()
                    .map(|&i| Point::from(points[i]))
                    .collect::<Vec<_>>(),
            )
            .convex_hull();
            let centroid = Point::from(outcome.centroids[id].position());
            assert!(hull.contains(&centroid));
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let points: Vec<Point2D> = (0..50)
            .map(|i| Point2D::new((i % 7) as f64 * 1.3, (i % 11) as f64 * 0.7))
            .collect();
        let clusterer = KMeansClusterer::default().with_init(InitStrategy::Random { seed: 7 });

        let a = clusterer.cluster(&points, 4).unwrap();
        let b = clusterer.cluster(&points, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_iteration_cap_is_respected() {
        let points: Vec<Point2D> = (0..40)
            .map(|i| Point2D::new(i as f64, ((i * 7) % 13) as f64))
            .collect();
        let clusterer = KMeansClusterer::new(KMeansConfig {
            max_iterations: 1,
            init: InitStrategy::FirstDistinct,
        });

        let outcome = clusterer.cluster(&points, 5).unwrap();
        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.converged);
        assert_eq!(outcome.assignment.len(), 40);
    }

    #[test]
    fn test_zero_iteration_cap_is_an_error() {
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 1.0),
        ];
        let clusterer = KMeansClusterer::new(KMeansConfig {
            max_iterations: 0,
            init: InitStrategy::FirstDistinct,
        });

        assert_eq!(
            clusterer.cluster(&points, 2),
            Err(KMeansError::ZeroIterations)
        );
    }
}

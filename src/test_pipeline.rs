use crate::kmeans::{InitStrategy, KMeansConfig};
use crate::pipeline::{BoundaryStatus, PatrolZones, PipelineError, generate_patrol_zones};
use crate::{ConfigError, PipelineConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn config_with(init: InitStrategy) -> PipelineConfig {
    PipelineConfig {
        kmeans: KMeansConfig {
            init,
            ..KMeansConfig::default()
        },
        ..PipelineConfig::default()
    }
}

/// `(lat, lon)` incidents scattered uniformly inside a box.
fn incidents_in_box(
    n: usize,
    lat: (f64, f64),
    lon: (f64, f64),
    seed: u64,
) -> Vec<(f64, f64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (rng.random_range(lat.0..lat.1), rng.random_range(lon.0..lon.1)))
        .collect()
}

fn three_neighbourhoods() -> Vec<(f64, f64)> {
    let mut records = incidents_in_box(700, (34.00, 34.10), (-118.40, -118.30), 1);
    records.extend(incidents_in_box(700, (34.20, 34.30), (-118.20, -118.10), 2));
    records.extend(incidents_in_box(700, (33.90, 34.00), (-118.00, -117.90), 3));
    records
}

#[test]
fn test_three_small_groups_have_no_boundary() {
    let centres = [(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)];
    let offsets = [(-0.1, -0.1), (0.1, -0.1), (0.1, 0.1), (-0.1, 0.1)];
    let mut records = Vec::new();
    for (olat, olon) in offsets {
        for (clat, clon) in centres {
            records.push((clat + olat, clon + olon));
        }
    }

    let zones =
        generate_patrol_zones(&records, 3, &config_with(InitStrategy::FirstDistinct)).unwrap();

    assert_eq!(zones.primary_assignment.len(), 12);
    assert_eq!(zones.zone_count(), 3);
    for (i, &zone) in zones.primary_assignment.iter().enumerate() {
        // Records were interleaved, so record i belongs to group i % 3.
        assert_eq!(zone, zones.primary_assignment[i % 3]);
    }

    for report in &zones.zones {
        assert_eq!(report.member_count, 4);
        assert_eq!(report.secondary_k, 1);
        assert_eq!(report.centroids.len(), 1);
        assert_eq!(
            report.status,
            BoundaryStatus::TooFewCentroids { centroids: 1 }
        );
    }

    assert!(zones.boundary.first_endpoints.is_empty());
    assert!(zones.boundary.second_endpoints.is_empty());
}

#[test]
fn test_seeded_runs_are_identical() {
    let records = three_neighbourhoods();
    let config = config_with(InitStrategy::Random { seed: 2024 });

    let first = generate_patrol_zones(&records, 3, &config).unwrap();
    let second = generate_patrol_zones(&records, 3, &config).unwrap();
    assert_eq!(first, second);

    let sequential = PipelineConfig {
        parallel: false,
        ..config
    };
    let third = generate_patrol_zones(&records, 3, &sequential).unwrap();
    assert_eq!(first, third);
}

#[test]
fn test_boundary_is_lon_first() {
    let records = incidents_in_box(400, (34.0, 34.3), (-118.4, -117.9), 5);
    let config = PipelineConfig {
        alpha: 10.0,
        ..config_with(InitStrategy::Random { seed: 3 })
    };

    let zones = generate_patrol_zones(&records, 1, &config).unwrap();
    assert_eq!(zones.zones[0].secondary_k, 4);
    assert!(matches!(zones.zones[0].status, BoundaryStatus::Built { .. }));

    assert!(!zones.boundary.is_empty());
    assert_eq!(
        zones.boundary.first_endpoints.len(),
        zones.boundary.second_endpoints.len()
    );
    for (a, b) in zones.boundary.segments() {
        for (x, y) in [a, b] {
            assert!((-118.4..=-117.9).contains(&x), "x should be a longitude: {}", x);
            assert!((34.0..=34.3).contains(&y), "y should be a latitude: {}", y);
        }
    }
}

#[test]
fn test_boundary_merges_in_zone_order() {
    let records = three_neighbourhoods();
    let config = PipelineConfig {
        alpha: 10.0,
        ..config_with(InitStrategy::Random { seed: 8 })
    };

    let zones = generate_patrol_zones(&records, 3, &config).unwrap();
    assert_eq!(zones.zone_count(), 3);

    let mut expected = Vec::new();
    for report in &zones.zones {
        expected.extend(report.segments.iter().map(|s| (s.a.as_tuple(), s.b.as_tuple())));
    }
    assert!(!expected.is_empty());
    assert_eq!(zones.boundary.segments().collect::<Vec<_>>(), expected);
}

#[test]
fn test_tiny_alpha_leaves_no_edges() {
    let records = incidents_in_box(400, (34.0, 34.3), (-118.4, -117.9), 9);
    let config = PipelineConfig {
        alpha: 1e-6,
        ..PipelineConfig::default()
    };

    let zones = generate_patrol_zones(&records, 1, &config).unwrap();
    assert_eq!(zones.zones[0].status, BoundaryStatus::NoEdges);
    assert!(zones.boundary.is_empty());
    assert_eq!(zones.primary_assignment.len(), 400);
}

#[test]
fn test_requested_zones_clamped_to_point_count() {
    let records = vec![
        (34.00, -118.00),
        (34.01, -118.02),
        (34.03, -118.01),
        (34.05, -118.05),
        (34.02, -118.08),
    ];

    let zones = generate_patrol_zones(&records, 50, &PipelineConfig::default()).unwrap();
    assert_eq!(zones.zone_count(), 5);
    assert!(zones.zones.iter().all(|z| z.member_count == 1));

    let mut labels = zones.primary_assignment.clone();
    labels.sort();
    assert_eq!(labels, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_malformed_records_are_skipped() {
    let records = vec![
        (Some(34.00), Some(-118.00)),
        (None, Some(-118.10)),
        (Some(34.01), None),
        (Some(f64::NAN), Some(-118.2)),
        (Some(34.02), Some(-118.03)),
    ];

    let zones = generate_patrol_zones(&records, 2, &PipelineConfig::default()).unwrap();
    let sources: Vec<usize> = zones.points.iter().map(|p| p.source).collect();
    assert_eq!(sources, vec![0, 4]);
    assert_eq!(zones.primary_assignment.len(), 2);
}

#[test]
fn test_nothing_to_cluster_is_empty_output() {
    let records: Vec<(Option<f64>, Option<f64>)> = vec![(None, None), (Some(f64::NAN), None)];
    let zones = generate_patrol_zones(&records, 3, &PipelineConfig::default()).unwrap();
    assert_eq!(zones, PatrolZones::default());

    let records = vec![(34.0, -118.0), (34.1, -118.1)];
    let zones = generate_patrol_zones(&records, 0, &PipelineConfig::default()).unwrap();
    assert_eq!(zones, PatrolZones::default());
}

#[test]
fn test_invalid_config_is_rejected() {
    let records = incidents_in_box(50, (34.0, 34.1), (-118.1, -118.0), 4);

    for alpha in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let config = PipelineConfig {
            alpha,
            ..PipelineConfig::default()
        };
        let result = generate_patrol_zones(&records, 2, &config);
        assert!(
            matches!(
                result,
                Err(PipelineError::Config(ConfigError::InvalidAlpha(_)))
            ),
            "alpha = {}: {:?}",
            alpha,
            result
        );
    }

    let config = PipelineConfig {
        kmeans: KMeansConfig {
            max_iterations: 0,
            ..KMeansConfig::default()
        },
        ..PipelineConfig::default()
    };
    let result = generate_patrol_zones(&records, 2, &config);
    assert!(
        matches!(
            result,
            Err(PipelineError::Config(ConfigError::ZeroIterations))
        ),
        "{:?}",
        result
    );
}

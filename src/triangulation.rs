use crate::points::Point2D;
use delaunator::{Point as DPoint, triangulate};
use thiserror::Error;

// Points closer than this on both axes are treated as one vertex.
const DEDUP_EPSILON: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriangulationError {
    #[error("need at least 3 distinct points to triangulate, got {distinct}")]
    TooFewPoints { distinct: usize },
    #[error("all {points} points are collinear")]
    Collinear { points: usize },
}

/// Three indices into the point slice that was triangulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle(pub usize, pub usize, pub usize);

impl Triangle {
    pub fn vertices(&self) -> [usize; 3] {
        [self.0, self.1, self.2]
    }

    /// The three sides, each in the triangle's winding direction.
    pub fn sides(&self) -> [(usize, usize); 3] {
        [(self.0, self.1), (self.1, self.2), (self.2, self.0)]
    }
}

/// Delaunay triangulation of `points`.
///
/// Duplicate points are collapsed before triangulating; every returned index
/// refers to the first occurrence of that location in `points`.
pub fn delaunay(points: &[Point2D]) -> Result<Vec<Triangle>, TriangulationError> {
    // Deduplicate, keeping the lowest original index for each location
    let mut origin: Vec<usize> = (0..points.len()).collect();
    origin.sort_by(|&a, &b| {
        points[a]
            .x
            .total_cmp(&points[b].x)
            .then_with(|| points[a].y.total_cmp(&points[b].y))
            .then_with(|| a.cmp(&b))
    });
    origin.dedup_by(|a, b| {
        (points[*a].x - points[*b].x).abs() < DEDUP_EPSILON
            && (points[*a].y - points[*b].y).abs() < DEDUP_EPSILON
    });

    if origin.len() < 3 {
        return Err(TriangulationError::TooFewPoints {
            distinct: origin.len(),
        });
    }

    let d_points: Vec<DPoint> = origin
        .iter()
        .map(|&i| DPoint {
            x: points[i].x,
            y: points[i].y,
        })
        .collect();

    let triangulation = triangulate(&d_points);

    if triangulation.triangles.is_empty() {
        return Err(TriangulationError::Collinear {
            points: d_points.len(),
        });
    }

    Ok(triangulation
        .triangles
        .chunks_exact(3)
        .map(|t| Triangle(origin[t[0]], origin[t[1]], origin[t[2]]))
        .collect())
}

use crate::hull::BoundaryEdgeSet;
use crate::points::{AxisOrder, Point2D, PointSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("edge endpoint {index} is out of range for {len} centroids")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One renderable line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundarySegment {
    pub a: Point2D,
    pub b: Point2D,
}

/// Segment endpoints as two parallel vectors; position `p` in both forms one
/// segment. Coordinates are `(longitude, latitude)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryOutput {
    pub first_endpoints: Vec<(f64, f64)>,
    pub second_endpoints: Vec<(f64, f64)>,
}

impl BoundaryOutput {
    pub fn len(&self) -> usize {
        self.first_endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_endpoints.is_empty()
    }

    pub fn push(&mut self, segment: &BoundarySegment) {
        self.first_endpoints.push(segment.a.as_tuple());
        self.second_endpoints.push(segment.b.as_tuple());
    }

    pub fn extend<'a>(&mut self, segments: impl IntoIterator<Item = &'a BoundarySegment>) {
        for segment in segments {
            self.push(segment);
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.first_endpoints
            .iter()
            .copied()
            .zip(self.second_endpoints.iter().copied())
    }
}

/// Resolves edges to literal coordinates, keeping the axis order of `centroids`.
pub fn assemble(
    centroids: &PointSet,
    edges: &BoundaryEdgeSet,
) -> Result<Vec<BoundarySegment>, BoundaryError> {
    let len = centroids.len();
    let resolve = |index: usize| {
        centroids
            .points
            .get(index)
            .copied()
            .ok_or(BoundaryError::IndexOutOfRange { index, len })
    };

    edges
        .iter()
        .map(|edge| {
            Ok::<_, BoundaryError>(BoundarySegment {
                a: resolve(edge.from)?,
                b: resolve(edge.to)?,
            })
        })
        .collect()
}

/// Same as [`assemble`], with the result forced into longitude-first order.
pub fn assemble_lon_lat(
    centroids: &PointSet,
    edges: &BoundaryEdgeSet,
) -> Result<Vec<BoundarySegment>, BoundaryError> {
    let segments = assemble(centroids, edges)?;
    Ok(match centroids.order {
        AxisOrder::LonLat => segments,
        AxisOrder::LatLon => segments
            .into_iter()
            .map(|s| BoundarySegment {
                a: s.a.swap(),
                b: s.b.swap(),
            })
            .collect(),
    })
}

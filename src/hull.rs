use crate::MIN_BOUNDARY_POINTS;
use crate::points::Point2D;
use crate::triangulation::{Triangle, delaunay};
use ahash::AHashMap as HashMap;
use geo::{Distance, Euclidean};
use std::collections::hash_map::Entry;
use std::hash::{Hash, Hasher};

/// An edge between two points. Equality and hashing ignore direction;
/// `from`/`to` keep the direction the edge was first registered in.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

impl Edge {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// `(min, max)` form used as the dedup key.
    pub fn key(&self) -> (usize, usize) {
        if self.from < self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Edges that survived alpha filtering, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryEdgeSet {
    pub edges: Vec<Edge>,
}

impl BoundaryEdgeSet {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        let wanted = Edge::new(a, b);
        self.edges.iter().any(|e| *e == wanted)
    }
}

/// Insertion-ordered edge set where a repeated registration can cancel the
/// first one.
struct EdgeRegistry {
    slots: Vec<Option<Edge>>,
    index: HashMap<(usize, usize), usize>,
    outer_only: bool,
}

impl EdgeRegistry {
    fn new(outer_only: bool) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            outer_only,
        }
    }

    fn register(&mut self, from: usize, to: usize) {
        let edge = Edge::new(from, to);
        match self.index.entry(edge.key()) {
            // Second registration comes from the neighbouring triangle, so the
            // edge is interior to the surviving region.
            Entry::Occupied(slot) => {
                if self.outer_only {
                    let slot = slot.remove();
                    self.slots[slot] = None;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(self.slots.len());
                self.slots.push(Some(edge));
            }
        }
    }

    fn finish(self) -> BoundaryEdgeSet {
        BoundaryEdgeSet {
            edges: self.slots.into_iter().flatten().collect(),
        }
    }
}

/// Radius of the circle through the triangle's corners, or `None` when the
/// triangle has no area.
pub fn circumradius(a: Point2D, b: Point2D, c: Point2D) -> Option<f64> {
    let len_ab = Euclidean.distance(geo::Point::from(a), geo::Point::from(b));
    let len_bc = Euclidean.distance(geo::Point::from(b), geo::Point::from(c));
    let len_ca = Euclidean.distance(geo::Point::from(c), geo::Point::from(a));

    // Heron's formula
    let s = (len_ab + len_bc + len_ca) / 2.0;
    let area = (s * (s - len_ab) * (s - len_bc) * (s - len_ca)).max(0.0).sqrt();

    if area <= 0.0 || !area.is_finite() {
        return None;
    }

    Some(len_ab * len_bc * len_ca / (4.0 * area))
}

/// Alpha shape boundary of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaShapeExtractor {
    /// Triangles with a circumradius at or above this are discarded.
    pub alpha: f64,
    /// Cancel edges shared by two surviving triangles, leaving only the outline.
    pub outer_only: bool,
}

impl AlphaShapeExtractor {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            outer_only: true,
        }
    }

    /// Triangulates `points` and extracts the boundary. Any geometry failure
    /// gives an empty set.
    pub fn extract(&self, points: &[Point2D]) -> BoundaryEdgeSet {
        if points.len() < MIN_BOUNDARY_POINTS {
            return BoundaryEdgeSet::default();
        }

        match delaunay(points) {
            Ok(triangles) => self.extract_from_triangles(points, &triangles),
            Err(e) => {
                tracing::debug!(points = points.len(), "no alpha shape: {}", e);
                BoundaryEdgeSet::default()
            }
        }
    }

    pub fn extract_from_triangles(
        &self,
        points: &[Point2D],
        triangles: &[Triangle],
    ) -> BoundaryEdgeSet {
        if points.len() < MIN_BOUNDARY_POINTS {
            return BoundaryEdgeSet::default();
        }

        let mut registry = EdgeRegistry::new(self.outer_only);
        let mut degenerate = 0usize;
        let mut out_of_range = 0usize;

        for triangle in triangles {
            let [ia, ib, ic] = triangle.vertices();
            let (Some(&a), Some(&b), Some(&c)) = (points.get(ia), points.get(ib), points.get(ic))
            else {
                out_of_range += 1;
                continue;
            };
            let Some(radius) = circumradius(a, b, c) else {
                degenerate += 1;
                continue;
            };

            if radius < self.alpha {
                for (from, to) in triangle.sides() {
                    registry.register(from, to);
                }
            }
        }

        if degenerate > 0 {
            tracing::debug!(degenerate, "skipped zero-area triangles");
        }
        if out_of_range > 0 {
            tracing::warn!(
                out_of_range,
                points = points.len(),
                "skipped triangles referencing missing points"
            );
        }

        registry.finish()
    }
}

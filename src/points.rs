use serde::{Deserialize, Serialize};

/// Which geographic axis each coordinate of a [`Point2D`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// `x` is latitude, `y` is longitude. Used by the primary clustering pass.
    LatLon,
    /// `x` is longitude, `y` is latitude. Used by the secondary pass and all boundary output.
    LonLat,
}

impl AxisOrder {
    pub fn swapped(self) -> Self {
        match self {
            AxisOrder::LatLon => AxisOrder::LonLat,
            AxisOrder::LonLat => AxisOrder::LatLon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn swap(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }

    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl From<Point2D> for geo_types::Coord<f64> {
    fn from(p: Point2D) -> Self {
        geo_types::Coord { x: p.x, y: p.y }
    }
}

impl From<Point2D> for geo_types::Point<f64> {
    fn from(p: Point2D) -> Self {
        geo_types::Point::new(p.x, p.y)
    }
}

/// Points that share one axis convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    pub order: AxisOrder,
    pub points: Vec<Point2D>,
}

impl PointSet {
    pub fn new(order: AxisOrder, points: Vec<Point2D>) -> Self {
        Self { order, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns a copy with both coordinates of every point exchanged.
    pub fn swapped(&self) -> PointSet {
        PointSet {
            order: self.order.swapped(),
            points: self.points.iter().map(|p| p.swap()).collect(),
        }
    }

    /// Returns the points in `order`, swapping only if needed.
    pub fn in_order(&self, order: AxisOrder) -> PointSet {
        if self.order == order {
            self.clone()
        } else {
            self.swapped()
        }
    }
}

/// Anything that may carry a latitude and longitude.
pub trait Geolocated {
    fn latitude(&self) -> Option<f64>;
    fn longitude(&self) -> Option<f64>;
}

impl Geolocated for (f64, f64) {
    fn latitude(&self) -> Option<f64> {
        Some(self.0)
    }

    fn longitude(&self) -> Option<f64> {
        Some(self.1)
    }
}

impl Geolocated for (Option<f64>, Option<f64>) {
    fn latitude(&self) -> Option<f64> {
        self.0
    }

    fn longitude(&self) -> Option<f64> {
        self.1
    }
}

/// A validated incident location with the index of the record it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub source: usize,
}

impl LabeledPoint {
    pub fn lat_lon(&self) -> Point2D {
        Point2D::new(self.latitude, self.longitude)
    }

    pub fn lon_lat(&self) -> Point2D {
        Point2D::new(self.longitude, self.latitude)
    }
}

fn valid_coordinate(value: Option<f64>, limit: f64) -> Option<f64> {
    value.filter(|v| v.is_finite() && v.abs() <= limit)
}

/// Keeps the records whose latitude and longitude are both present, finite
/// and inside WGS-84 range. Input order is preserved.
pub fn filter_points<R: Geolocated>(records: &[R]) -> Vec<LabeledPoint> {
    let points: Vec<LabeledPoint> = records
        .iter()
        .enumerate()
        .filter_map(|(source, record)| {
            let latitude = valid_coordinate(record.latitude(), 90.0)?;
            let longitude = valid_coordinate(record.longitude(), 180.0)?;
            Some(LabeledPoint {
                latitude,
                longitude,
                source,
            })
        })
        .collect();

    let dropped = records.len() - points.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = points.len(), "dropped records without usable coordinates");
    }

    points
}

/// Latitude-first set used for the primary clustering pass.
pub fn lat_lon_set(points: &[LabeledPoint]) -> PointSet {
    PointSet::new(
        AxisOrder::LatLon,
        points.iter().map(LabeledPoint::lat_lon).collect(),
    )
}

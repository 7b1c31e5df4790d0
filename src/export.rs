//! GeoJSON output for map front ends.

use crate::pipeline::PatrolZones;
use crate::points::LabeledPoint;
use geo_types::{LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use itertools::izip;

fn feature(geometry: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// One `LineString` feature per boundary segment, tagged with its zone.
pub fn boundary_features(zones: &PatrolZones) -> Vec<Feature> {
    zones
        .zones_with_boundary()
        .flat_map(|report| {
            report.segments.iter().map(move |segment| {
                let line: LineString<f64> =
                    vec![segment.a.as_tuple(), segment.b.as_tuple()].into();

                let mut properties = JsonObject::new();
                properties.insert("kind".to_string(), "boundary".into());
                properties.insert("zone".to_string(), report.zone.into());

                feature(Value::from(&line), properties)
            })
        })
        .collect()
}

/// One `Point` feature per incident. `attributes` can add properties taken
/// from the source record.
pub fn marker_features<F>(zones: &PatrolZones, attributes: F) -> Vec<Feature>
where
    F: Fn(&LabeledPoint) -> JsonObject,
{
    izip!(&zones.points, &zones.primary_assignment)
        .map(|(point, &zone)| {
            let location = Point::new(point.longitude, point.latitude);

            let mut properties = attributes(point);
            properties.insert("kind".to_string(), "incident".into());
            properties.insert("zone".to_string(), zone.into());
            properties.insert("source".to_string(), point.source.into());

            feature(Value::from(&location), properties)
        })
        .collect()
}

pub fn feature_collection<F>(zones: &PatrolZones, attributes: F) -> FeatureCollection
where
    F: Fn(&LabeledPoint) -> JsonObject,
{
    let mut features = boundary_features(zones);
    features.extend(marker_features(zones, attributes));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

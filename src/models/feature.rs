//! Input feature model and the GeoJSON edge conversion.

use geo::{Geometry, MultiPolygon};
use serde_json::{Map, Value};

/// A boundary feature: a geometry plus an open property map.
///
/// Geometry is kept as-is at this stage; the clip stage skips anything that
/// is not a polygon or multipolygon.
#[derive(Debug, Clone)]
pub struct RegionFeature {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl RegionFeature {
    pub fn new(geometry: Geometry<f64>, properties: Map<String, Value>) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Convert from a GeoJSON feature. Features without a geometry, or with
    /// one that does not translate to a geo type, are rejected.
    pub fn from_geojson(feature: &geojson::Feature) -> Option<Self> {
        let geometry = feature.geometry.as_ref()?;
        let geometry = Geometry::<f64>::try_from(geometry).ok()?;
        let properties = feature.properties.clone().unwrap_or_default();
        Some(Self {
            geometry,
            properties,
        })
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Type-tolerant property read: strings pass through, numbers are
    /// formatted. Real GIS property maps mix both for identifiers.
    pub fn property_as_string(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// View a geometry as a multipolygon; `None` for non-areal types.
pub fn as_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};
    use serde_json::json;

    fn feature_with_properties(properties: Value) -> RegionFeature {
        let Value::Object(map) = properties else {
            panic!("expected object");
        };
        RegionFeature::new(Geometry::Point(point! { x: 0.0, y: 0.0 }), map)
    }

    #[test]
    fn test_property_as_string_mixed_types() {
        let feature = feature_with_properties(json!({
            "GEO_ID": 42,
            "NAME": "Somerset",
            "EMPTY": "",
            "FLAG": true,
        }));

        assert_eq!(feature.property_as_string("GEO_ID").unwrap(), "42");
        assert_eq!(feature.property_as_string("NAME").unwrap(), "Somerset");
        assert!(feature.property_as_string("EMPTY").is_none());
        assert!(feature.property_as_string("FLAG").is_none());
        assert!(feature.property_as_string("MISSING").is_none());
    }

    #[test]
    fn test_from_geojson_rejects_missing_geometry() {
        let feature = geojson::Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: None,
            foreign_members: None,
        };
        assert!(RegionFeature::from_geojson(&feature).is_none());
    }

    #[test]
    fn test_from_geojson_polygon_roundtrip() {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        let feature = geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&poly))),
            id: None,
            properties: serde_json::from_value(json!({"name": "tri"})).unwrap(),
            foreign_members: None,
        };

        let region = RegionFeature::from_geojson(&feature).unwrap();
        assert!(matches!(region.geometry, Geometry::Polygon(_)));
        assert_eq!(region.property_as_string("name").unwrap(), "tri");
        assert!(as_multi_polygon(&region.geometry).is_some());
    }

    #[test]
    fn test_as_multi_polygon_skips_lines() {
        let line = Geometry::LineString(geo::LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        assert!(as_multi_polygon(&line).is_none());
    }
}

//! Canonical region property record emitted by the clip stage.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Which provider in the label-point fallback chain produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMethod {
    /// Point inside the polygon maximally distant from any edge.
    PoleOfInaccessibility,
    /// A point guaranteed to lie on the feature.
    PointOnSurface,
    CenterOfMass,
    /// Mean of the exterior-ring vertices.
    VertexMean,
}

/// A representative point used to anchor a region's text label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LabelPoint {
    pub lat: f64,
    pub lng: f64,
    pub method: LabelMethod,
    pub within_polygon: bool,
}

/// All label-point candidates for a region, with the chosen primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelPoints {
    pub primary: LabelPoint,
    pub candidates: Vec<LabelPoint>,
}

/// Normalized region properties.
///
/// Field names serialize in the upper-case form the downstream map and
/// reporting consumers key on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RegionProperties {
    /// Source identifier, preserved for joins with external indices.
    pub id: Option<String>,

    pub name: Option<String>,

    /// First non-empty value among the configured name properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Primary label point latitude.
    pub lat: f64,

    /// Primary label point longitude.
    pub lng: f64,

    pub label_points: LabelPoints,

    /// Whether the feature lies entirely inside the query bbox.
    pub within_bbox: bool,

    /// Area of the clipped geometry, km².
    pub area_within_bbox: f64,

    /// Area of the original geometry, km².
    pub total_area: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_type_code: Option<String>,
}

/// A clipped feature with its normalized properties, ready for
/// serialization as GeoJSON.
#[derive(Debug, Clone)]
pub struct ClippedRegion {
    pub geometry: MultiPolygon<f64>,
    pub properties: RegionProperties,
}

impl ClippedRegion {
    pub fn to_geojson_feature(&self) -> geojson::Feature {
        let properties = match serde_json::to_value(&self.properties) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        };
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn sample_properties() -> RegionProperties {
        let primary = LabelPoint {
            lat: 1.0,
            lng: 2.0,
            method: LabelMethod::PoleOfInaccessibility,
            within_polygon: true,
        };
        RegionProperties {
            id: Some("0500000US25009".to_string()),
            name: Some("Essex".to_string()),
            display_name: Some("Essex County".to_string()),
            lat: primary.lat,
            lng: primary.lng,
            label_points: LabelPoints {
                primary,
                candidates: vec![primary],
            },
            within_bbox: true,
            area_within_bbox: 12.5,
            total_area: 12.5,
            population: None,
            unit_type: Some("County".to_string()),
            unit_type_code: Some("06".to_string()),
        }
    }

    #[test]
    fn test_properties_serialize_upper_case_keys() {
        let value = serde_json::to_value(sample_properties()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["ID"], "0500000US25009");
        assert_eq!(obj["DISPLAY_NAME"], "Essex County");
        assert!(obj["WITHIN_BBOX"].as_bool().unwrap());
        assert_eq!(obj["LABEL_POINTS"]["primary"]["method"], "pole_of_inaccessibility");
        // absent optionals stay out of the map entirely
        assert!(!obj.contains_key("POPULATION"));
    }

    #[test]
    fn test_to_geojson_feature_carries_properties() {
        let region = ClippedRegion {
            geometry: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ]]),
            properties: sample_properties(),
        };

        let feature = region.to_geojson_feature();
        assert!(feature.geometry.is_some());
        let props = feature.properties.unwrap();
        assert_eq!(props["NAME"], "Essex");
        assert_eq!(props["UNIT_TYPE_CODE"], "06");
    }
}

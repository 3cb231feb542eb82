//! Axis-aligned bounding boxes in WGS84 degrees.

use geo::BoundingRect;
use geo_types::{coord, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box: west/south/east/north in WGS84 degrees.
///
/// Valid inputs satisfy `west < east` and `south < north`; downstream code
/// does not re-validate this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundaryBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self {
            west: rect.min().x,
            south: rect.min().y,
            east: rect.max().x,
            north: rect.max().y,
        }
    }

    /// Bounding box of a multipolygon, `None` when it has no coordinates.
    pub fn of_multi_polygon(geometry: &MultiPolygon<f64>) -> Option<Self> {
        geometry.bounding_rect().map(Self::from_rect)
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Check if a point (lng, lat) lies inside or on this box.
    pub fn contains_point(&self, lng: f64, lat: f64) -> bool {
        lng >= self.west && lng <= self.east && lat >= self.south && lat <= self.north
    }

    /// Closed overlap test; boxes that only share an edge still intersect.
    pub fn intersects(&self, other: &BoundaryBox) -> bool {
        self.west <= other.east
            && self.east >= other.west
            && self.south <= other.north
            && self.north >= other.south
    }

    /// Check if `other` lies entirely inside this box.
    pub fn contains_bbox(&self, other: &BoundaryBox) -> bool {
        other.west >= self.west
            && other.east <= self.east
            && other.south >= self.south
            && other.north <= self.north
    }

    /// Grow this box so it also covers `other`.
    pub fn expand_to_include(&mut self, other: &BoundaryBox) {
        self.west = self.west.min(other.west);
        self.south = self.south.min(other.south);
        self.east = self.east.max(other.east);
        self.north = self.north.max(other.north);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_contains_point_edges_inclusive() {
        let bbox = BoundaryBox::new(-10.0, -5.0, 10.0, 5.0);
        assert!(bbox.contains_point(0.0, 0.0));
        assert!(bbox.contains_point(10.0, 5.0));
        assert!(bbox.contains_point(-10.0, -5.0));
        assert!(!bbox.contains_point(10.1, 0.0));
    }

    #[test]
    fn test_intersects_and_containment() {
        let a = BoundaryBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundaryBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundaryBox::new(2.0, 2.0, 3.0, 3.0);
        let d = BoundaryBox::new(11.0, 11.0, 12.0, 12.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&d));
        assert!(a.contains_bbox(&c));
        assert!(!a.contains_bbox(&b));
    }

    #[test]
    fn test_expand_to_include() {
        let mut bbox = BoundaryBox::new(0.0, 0.0, 5.0, 5.0);
        bbox.expand_to_include(&BoundaryBox::new(-2.0, 3.0, 4.0, 9.0));
        assert_eq!(bbox, BoundaryBox::new(-2.0, 0.0, 5.0, 9.0));
    }

    #[test]
    fn test_of_multi_polygon() {
        let poly = polygon![
            (x: 1.0, y: 2.0),
            (x: 4.0, y: 2.0),
            (x: 4.0, y: 6.0),
            (x: 1.0, y: 6.0),
            (x: 1.0, y: 2.0),
        ];
        let bbox = BoundaryBox::of_multi_polygon(&MultiPolygon::new(vec![poly])).unwrap();
        assert_eq!(bbox, BoundaryBox::new(1.0, 2.0, 4.0, 6.0));

        assert!(BoundaryBox::of_multi_polygon(&MultiPolygon::new(vec![])).is_none());
    }
}

//! Per-feature boundary decomposition and planar projection.

use geo::{BoundingRect, Coord, Geometry, Polygon};

use crate::models::BoundaryBox;

/// Meters per degree of latitude (WGS84 mean circumference / 360).
pub const METERS_PER_DEGREE: f64 = 111_319.49;

/// Rings of one sub-polygon projected into planar meters. Ring 0 is the
/// exterior; any further rings are holes.
#[derive(Debug, Clone)]
pub struct ProjectedPolygon {
    pub rings: Vec<Vec<Coord<f64>>>,
}

/// Geometry derived once per boundary feature at prepare time, immutable
/// afterwards. Reused by both the grid index and the planar arc-length path.
#[derive(Debug, Clone)]
pub struct BoundaryParams {
    /// Feature-level bbox: min/max across all sub-polygon bboxes.
    pub bbox: BoundaryBox,

    /// One bbox per sub-polygon.
    pub poly_bboxes: Vec<BoundaryBox>,

    /// Planar-projected rings, one entry per sub-polygon, aligned with
    /// `poly_bboxes`.
    pub projected_polygons: Vec<ProjectedPolygon>,

    /// Midpoint of the feature bbox latitude; the single projection
    /// reference that keeps local distortion low without a CRS library.
    pub base_latitude: f64,
}

impl BoundaryParams {
    /// Decompose a polygon or multipolygon into per-ring coordinate arrays,
    /// per-polygon bboxes and a latitude-localized planar projection.
    ///
    /// Returns `None` for non-areal geometry and for input without a single
    /// usable ring.
    pub fn prepare(geometry: &Geometry<f64>) -> Option<Self> {
        let polygons: Vec<&Polygon<f64>> = match geometry {
            Geometry::Polygon(p) => vec![p],
            Geometry::MultiPolygon(mp) => mp.0.iter().collect(),
            _ => return None,
        };

        let mut poly_bboxes = Vec::with_capacity(polygons.len());
        let mut kept: Vec<&Polygon<f64>> = Vec::with_capacity(polygons.len());
        for poly in polygons {
            let Some(rect) = poly.bounding_rect() else {
                continue;
            };
            poly_bboxes.push(BoundaryBox::from_rect(rect));
            kept.push(poly);
        }

        let mut bbox = *poly_bboxes.first()?;
        for poly_bbox in &poly_bboxes[1..] {
            bbox.expand_to_include(poly_bbox);
        }

        let base_latitude = (bbox.south + bbox.north) / 2.0;

        let projected_polygons = kept
            .iter()
            .map(|poly| {
                let mut rings = Vec::with_capacity(1 + poly.interiors().len());
                rings.push(project_ring(poly.exterior().0.as_slice(), base_latitude));
                for interior in poly.interiors() {
                    rings.push(project_ring(interior.0.as_slice(), base_latitude));
                }
                ProjectedPolygon { rings }
            })
            .collect();

        Some(Self {
            bbox,
            poly_bboxes,
            projected_polygons,
            base_latitude,
        })
    }

    /// Project a geographic coordinate into this feature's planar frame.
    pub fn project(&self, lng: f64, lat: f64) -> Coord<f64> {
        project_with_base(lng, lat, self.base_latitude)
    }
}

/// Equirectangular approximation around `base_latitude`: longitude scaled by
/// its cosine, both axes scaled to meters.
pub(crate) fn project_with_base(lng: f64, lat: f64, base_latitude: f64) -> Coord<f64> {
    let lng_scale = base_latitude.to_radians().cos();
    Coord {
        x: lng * lng_scale * METERS_PER_DEGREE,
        y: lat * METERS_PER_DEGREE,
    }
}

fn project_ring(ring: &[Coord<f64>], base_latitude: f64) -> Vec<Coord<f64>> {
    ring.iter()
        .map(|c| project_with_base(c.x, c.y, base_latitude))
        .collect()
}

//! Clipping boundary features to a query bbox.

use geo::{Area, BooleanOps, Contains, Geometry, Intersects, LineString, MultiPolygon, Polygon};
use tracing::debug;

use crate::models::{as_multi_polygon, BoundaryBox};

/// Tunables for the clip stage.
#[derive(Debug, Clone, Copy)]
pub struct ClipOptions {
    /// Planar area (deg²) below which a post-intersection ring is treated
    /// as degenerate touching residue and dropped during cleaning.
    pub min_ring_area: f64,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            min_ring_area: 1e-12,
        }
    }
}

/// One feature clipped to a query bbox.
#[derive(Debug, Clone)]
pub struct ClippedBoundary {
    /// The original geometry when it lies fully within the bbox, else the
    /// cleaned intersection.
    pub geometry: MultiPolygon<f64>,
    pub fully_within: bool,
}

/// Clip a feature's geometry to `bbox`.
///
/// Returns `None` for non-areal geometry, for features disjoint from the
/// bbox, and for intersections that clean down to nothing; the latter is a
/// legitimate touching/malformed-geometry edge case, not an error.
pub fn clip_to_boundary(
    geometry: &Geometry<f64>,
    bbox: &BoundaryBox,
    options: &ClipOptions,
) -> Option<ClippedBoundary> {
    let subject = as_multi_polygon(geometry)?;
    let bbox_poly = bbox.to_polygon();

    // cheap bbox rejection first, exact intersection test second
    let subject_bbox = BoundaryBox::of_multi_polygon(&subject)?;
    if !bbox.intersects(&subject_bbox) {
        return None;
    }
    if !subject.intersects(&bbox_poly) {
        return None;
    }

    if fully_within_boundary(&subject, &subject_bbox, bbox, &bbox_poly) {
        return Some(ClippedBoundary {
            geometry: subject,
            fully_within: true,
        });
    }

    let intersection = subject.intersection(&bbox_poly);
    let cleaned = clean_multi_polygon(intersection, options);
    if cleaned.0.is_empty() {
        debug!("clip produced no usable rings (touching or malformed geometry), skipping feature");
        return None;
    }

    Some(ClippedBoundary {
        geometry: cleaned,
        fully_within: false,
    })
}

/// Every member polygon must independently lie within the bbox polygon.
///
/// A multipolygon that fails basic ring validation gets the coarse
/// bbox-containment heuristic instead of failing the whole feature.
fn fully_within_boundary(
    subject: &MultiPolygon<f64>,
    subject_bbox: &BoundaryBox,
    bbox: &BoundaryBox,
    bbox_poly: &Polygon<f64>,
) -> bool {
    if !rings_validate(subject) {
        return bbox.contains_bbox(subject_bbox);
    }
    subject.0.iter().all(|poly| bbox_poly.contains(poly))
}

fn rings_validate(subject: &MultiPolygon<f64>) -> bool {
    subject.0.iter().all(|poly| {
        std::iter::once(poly.exterior())
            .chain(poly.interiors())
            .all(|ring| {
                ring.0.len() >= 4 && ring.0.iter().all(|c| c.x.is_finite() && c.y.is_finite())
            })
    })
}

/// Coordinate-cleaning pass over a raw intersection: drop consecutive
/// duplicate coordinates, then whole rings that are unclosed-short,
/// non-finite or below the area tolerance.
fn clean_multi_polygon(geometry: MultiPolygon<f64>, options: &ClipOptions) -> MultiPolygon<f64> {
    let mut kept = Vec::with_capacity(geometry.0.len());
    for poly in geometry {
        let Some(exterior) = clean_ring(poly.exterior(), options) else {
            continue;
        };
        let interiors = poly
            .interiors()
            .iter()
            .filter_map(|ring| clean_ring(ring, options))
            .collect();
        kept.push(Polygon::new(exterior, interiors));
    }
    MultiPolygon::new(kept)
}

fn clean_ring(ring: &LineString<f64>, options: &ClipOptions) -> Option<LineString<f64>> {
    let mut coords: Vec<_> = ring.0.clone();
    coords.dedup();
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
    if coords.len() < 4 {
        return None;
    }
    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return None;
    }

    let cleaned = LineString::new(coords);
    let area = Polygon::new(cleaned.clone(), vec![]).unsigned_area();
    if area < options.min_ring_area {
        return None;
    }
    Some(cleaned)
}

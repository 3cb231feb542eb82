//! Length of a line feature inside a boundary polygon.
//!
//! Two paths: a planar fast path over the feature's precomputed projection,
//! for high-frequency recomputation, and a geodesic exact path reserved for
//! lower-frequency, precision-sensitive callers.

use geo::{
    BooleanOps, BoundingRect, Contains, Coord, Haversine, Intersects, Length, LineString,
    MultiLineString, MultiPolygon, Point, Relate,
};

use super::params::{BoundaryParams, ProjectedPolygon};
use crate::models::BoundaryBox;

/// Length of `arc` inside the boundary described by `params`, in km,
/// measured on the feature's local planar frame.
///
/// When `known_length` (the true geodesic length of the whole arc, meters)
/// is supplied, the planar inside-share is rescaled by it to cancel
/// projection distortion. Arcs with fewer than two coordinates yield `0.0`;
/// zero is a valid answer here, not a failure sentinel.
pub fn planar_arc_length_inside_boundary(
    arc: &LineString<f64>,
    known_length: Option<f64>,
    params: &BoundaryParams,
) -> f64 {
    if arc.0.len() < 2 {
        return 0.0;
    }

    let mut total_planar = 0.0;
    let mut inside_planar = 0.0;

    for pair in arc.0.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let pa = params.project(a.x, a.y);
        let pb = params.project(b.x, b.y);
        let seg_len = (pb.x - pa.x).hypot(pb.y - pa.y);
        total_planar += seg_len;
        if seg_len == 0.0 {
            continue;
        }

        let seg_bbox = BoundaryBox::new(
            a.x.min(b.x),
            a.y.min(b.y),
            a.x.max(b.x),
            a.y.max(b.y),
        );
        if !params.bbox.intersects(&seg_bbox) {
            continue;
        }

        // Parametric crossings of this segment against every ring of every
        // sub-polygon whose bbox it overlaps.
        let mut ts = vec![0.0, 1.0];
        for (poly_bbox, projected) in params.poly_bboxes.iter().zip(&params.projected_polygons) {
            if !poly_bbox.intersects(&seg_bbox) {
                continue;
            }
            for ring in &projected.rings {
                collect_ring_crossings(pa, pb, ring, &mut ts);
            }
        }
        ts.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));

        // Containment is constant between crossings; one midpoint test per
        // sub-interval decides the whole run.
        for window in ts.windows(2) {
            let (t0, t1) = (window[0], window[1]);
            if t1 - t0 <= f64::EPSILON {
                continue;
            }
            let tm = (t0 + t1) / 2.0;
            let mid = Coord {
                x: pa.x + (pb.x - pa.x) * tm,
                y: pa.y + (pb.y - pa.y) * tm,
            };
            if point_in_projected_polygons(mid, &params.projected_polygons) {
                inside_planar += (t1 - t0) * seg_len;
            }
        }
    }

    if let Some(known) = known_length {
        if total_planar > 0.0 {
            return inside_planar / total_planar * known / 1000.0;
        }
    }
    inside_planar / 1000.0
}

/// Length of `arc` inside `boundary`, in km, measured on the sphere.
///
/// When the whole arc is provably within the boundary, a supplied
/// `known_length` (meters) is returned verbatim as km and no splitting is
/// performed. Otherwise the arc is split at every boundary crossing into
/// maximal runs and the lengths of contained runs are summed.
pub fn geodesic_arc_length_inside_boundary(
    arc: &LineString<f64>,
    boundary: &MultiPolygon<f64>,
    boundary_bbox: &BoundaryBox,
    known_length: Option<f64>,
) -> f64 {
    if arc.0.len() < 2 {
        return 0.0;
    }
    let Some(arc_rect) = arc.bounding_rect() else {
        return 0.0;
    };
    if !boundary_bbox.intersects(&BoundaryBox::from_rect(arc_rect)) {
        return 0.0;
    }
    if !boundary.intersects(arc) {
        return 0.0;
    }

    if boundary.relate(arc).is_contains() {
        return match known_length {
            Some(known) => known / 1000.0,
            None => Haversine.length(arc) / 1000.0,
        };
    }

    let runs = boundary.clip(&MultiLineString::new(vec![arc.clone()]), false);
    let mut inside_meters = 0.0;
    for run in &runs.0 {
        if run.0.len() < 2 {
            continue;
        }
        let Some(mid) = run_midpoint(run) else {
            continue;
        };
        if boundary.contains(&mid) {
            inside_meters += Haversine.length(run);
        }
    }
    inside_meters / 1000.0
}

/// Push the arc-segment parameters `t ∈ (0, 1)` at which `pa → pb` crosses a
/// ring edge.
fn collect_ring_crossings(
    pa: Coord<f64>,
    pb: Coord<f64>,
    ring: &[Coord<f64>],
    ts: &mut Vec<f64>,
) {
    if ring.len() < 2 {
        return;
    }
    let d1 = Coord {
        x: pb.x - pa.x,
        y: pb.y - pa.y,
    };
    for edge in ring.windows(2) {
        let (q, s) = (edge[0], edge[1]);
        let d2 = Coord {
            x: s.x - q.x,
            y: s.y - q.y,
        };
        let denom = d1.x * d2.y - d1.y * d2.x;
        if denom.abs() < f64::EPSILON {
            continue; // parallel or degenerate edge
        }
        let qp = Coord {
            x: q.x - pa.x,
            y: q.y - pa.y,
        };
        let t = (qp.x * d2.y - qp.y * d2.x) / denom;
        let u = (qp.x * d1.y - qp.y * d1.x) / denom;
        if t > 0.0 && t < 1.0 && (0.0..=1.0).contains(&u) {
            ts.push(t);
        }
    }
}

/// Even-odd test over every ring of every sub-polygon; crossing an inner
/// ring toggles the point back out, so holes subtract.
fn point_in_projected_polygons(pt: Coord<f64>, polygons: &[ProjectedPolygon]) -> bool {
    let mut inside = false;
    for poly in polygons {
        for ring in &poly.rings {
            for edge in ring.windows(2) {
                let (a, b) = (edge[0], edge[1]);
                if (a.y > pt.y) != (b.y > pt.y)
                    && pt.x < (b.x - a.x) * (pt.y - a.y) / (b.y - a.y) + a.x
                {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

/// Midpoint of the run's longest segment: a point interior to the run even
/// when the run starts and ends on the boundary.
fn run_midpoint(run: &LineString<f64>) -> Option<Point<f64>> {
    let mut best: Option<(f64, Coord<f64>)> = None;
    for pair in run.0.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len_sq = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
        if best.map(|(l, _)| len_sq > l).unwrap_or(true) {
            best = Some((
                len_sq,
                Coord {
                    x: (a.x + b.x) / 2.0,
                    y: (a.y + b.y) / 2.0,
                },
            ));
        }
    }
    match best {
        Some((len_sq, mid)) if len_sq > 0.0 => Some(Point::from(mid)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Distance, Geometry};

    fn square_boundary() -> (MultiPolygon<f64>, BoundaryBox, BoundaryParams) {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ];
        let params = BoundaryParams::prepare(&Geometry::Polygon(poly.clone())).unwrap();
        (
            MultiPolygon::new(vec![poly]),
            BoundaryBox::new(0.0, 0.0, 10.0, 10.0),
            params,
        )
    }

    #[test]
    fn test_planar_trivial_arcs_are_zero() {
        let (_, _, params) = square_boundary();
        let empty = LineString::new(vec![]);
        let single = LineString::from(vec![(1.0, 1.0)]);
        assert_eq!(planar_arc_length_inside_boundary(&empty, None, &params), 0.0);
        assert_eq!(
            planar_arc_length_inside_boundary(&single, None, &params),
            0.0
        );
    }

    #[test]
    fn test_planar_disjoint_arc_is_zero() {
        let (_, _, params) = square_boundary();
        let arc = LineString::from(vec![(20.0, 20.0), (25.0, 25.0)]);
        assert_eq!(planar_arc_length_inside_boundary(&arc, None, &params), 0.0);
    }

    #[test]
    fn test_planar_half_inside_with_known_length_scaling() {
        let (_, _, params) = square_boundary();
        // crosses the western edge at x=0; exactly half the arc is inside
        let arc = LineString::from(vec![(-5.0, 5.0), (5.0, 5.0)]);

        let km = planar_arc_length_inside_boundary(&arc, Some(1000.0), &params);
        assert!((km - 0.5).abs() < 1e-9, "got {km}");
    }

    #[test]
    fn test_planar_never_exceeds_segment_length() {
        let (_, _, params) = square_boundary();
        let arc = LineString::from(vec![(-5.0, 5.0), (5.0, 5.0)]);

        let inside_km = planar_arc_length_inside_boundary(&arc, None, &params);
        let a = params.project(-5.0, 5.0);
        let b = params.project(5.0, 5.0);
        let segment_km = (b.x - a.x).hypot(b.y - a.y) / 1000.0;

        assert!(inside_km > 0.0);
        assert!(inside_km <= segment_km);
    }

    #[test]
    fn test_planar_hole_subtracts() {
        let poly = polygon![
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
                (x: 0.0, y: 0.0),
            ],
            interiors: [[
                (x: 4.0, y: 4.0),
                (x: 6.0, y: 4.0),
                (x: 6.0, y: 6.0),
                (x: 4.0, y: 6.0),
                (x: 4.0, y: 4.0),
            ]],
        ];
        let params = BoundaryParams::prepare(&Geometry::Polygon(poly)).unwrap();

        // spans the square, passing straight through the 2-wide hole
        let arc = LineString::from(vec![(0.0, 5.0), (10.0, 5.0)]);
        let km = planar_arc_length_inside_boundary(&arc, Some(1000.0), &params);

        // 8 of 10 units lie inside once the hole is subtracted
        assert!((km - 0.8).abs() < 1e-9, "got {km}");
    }

    #[test]
    fn test_geodesic_trivial_and_disjoint_are_zero() {
        let (boundary, bbox, _) = square_boundary();
        let single = LineString::from(vec![(1.0, 1.0)]);
        let disjoint = LineString::from(vec![(20.0, 20.0), (25.0, 25.0)]);

        assert_eq!(
            geodesic_arc_length_inside_boundary(&single, &boundary, &bbox, None),
            0.0
        );
        assert_eq!(
            geodesic_arc_length_inside_boundary(&disjoint, &boundary, &bbox, None),
            0.0
        );
    }

    #[test]
    fn test_geodesic_fully_within_returns_known_length_verbatim() {
        let (boundary, bbox, _) = square_boundary();
        let arc = LineString::from(vec![(2.0, 5.0), (8.0, 5.0)]);

        let km = geodesic_arc_length_inside_boundary(&arc, &boundary, &bbox, Some(1234.0));
        assert_eq!(km, 1.234);
    }

    #[test]
    fn test_geodesic_fully_within_measures_when_unknown() {
        let (boundary, bbox, _) = square_boundary();
        let arc = LineString::from(vec![(2.0, 5.0), (8.0, 5.0)]);

        let km = geodesic_arc_length_inside_boundary(&arc, &boundary, &bbox, None);
        let expected = Haversine.distance(Point::new(2.0, 5.0), Point::new(8.0, 5.0)) / 1000.0;
        assert!((km - expected).abs() < 1e-9);
    }

    #[test]
    fn test_geodesic_splits_at_boundary_crossing() {
        let (boundary, bbox, _) = square_boundary();
        let arc = LineString::from(vec![(-5.0, 5.0), (5.0, 5.0)]);

        let km = geodesic_arc_length_inside_boundary(&arc, &boundary, &bbox, None);
        let expected = Haversine.distance(Point::new(0.0, 5.0), Point::new(5.0, 5.0)) / 1000.0;
        assert!((km - expected).abs() < 1e-6, "got {km}, want {expected}");
    }
}

//! Representative label points for region polygons.
//!
//! An ordered chain of independently fallible providers; a failing provider
//! only removes its own candidate, never aborts the chain.

use std::collections::BinaryHeap;

use geo::{
    Area, BoundingRect, Centroid, Contains, Coord, InteriorPoint, MultiPolygon, Point, Polygon,
};
use thiserror::Error;
use tracing::debug;

use crate::models::{LabelMethod, LabelPoint, LabelPoints};

/// Tolerance for the pole-of-inaccessibility refinement, in degrees.
const POLE_PRECISION_DEG: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum LabelPointError {
    /// Every provider in the fallback chain failed.
    #[error("no label point could be resolved for the polygon")]
    Unresolvable,
}

/// Resolve label points for a polygon.
///
/// Providers run in order (pole of inaccessibility, point on surface,
/// center of mass, vertex mean) and every successful candidate is
/// recorded. The primary label is the first candidate inside the polygon;
/// when none is, the first candidate that resolved at all.
pub fn resolve_label_points(geometry: &MultiPolygon<f64>) -> Result<LabelPoints, LabelPointError> {
    let providers: [(LabelMethod, fn(&MultiPolygon<f64>) -> Option<Point<f64>>); 4] = [
        (LabelMethod::PoleOfInaccessibility, pole_of_inaccessibility),
        (LabelMethod::PointOnSurface, point_on_surface),
        (LabelMethod::CenterOfMass, center_of_mass),
        (LabelMethod::VertexMean, vertex_mean),
    ];

    let mut candidates = Vec::with_capacity(providers.len());
    for (method, provider) in providers {
        let Some(point) = provider(geometry) else {
            debug!(?method, "label point provider failed, falling through");
            continue;
        };
        if !point.x().is_finite() || !point.y().is_finite() {
            debug!(?method, "label point provider produced non-finite coordinates");
            continue;
        }
        candidates.push(LabelPoint {
            lat: point.y(),
            lng: point.x(),
            method,
            within_polygon: geometry.contains(&point),
        });
    }

    let primary = candidates
        .iter()
        .find(|c| c.within_polygon)
        .or_else(|| candidates.first())
        .copied()
        .ok_or(LabelPointError::Unresolvable)?;

    Ok(LabelPoints {
        primary,
        candidates,
    })
}

/// Pole of inaccessibility on the largest-area member polygon.
fn pole_of_inaccessibility(geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
    let largest = geometry.0.iter().max_by(|a, b| {
        let (a, b) = (finite_area(a), finite_area(b));
        a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
    })?;
    polylabel(largest, POLE_PRECISION_DEG)
}

fn finite_area(poly: &Polygon<f64>) -> f64 {
    let area = poly.unsigned_area();
    if area.is_finite() {
        area
    } else {
        0.0
    }
}

fn point_on_surface(geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
    if !geometry.0.iter().all(polygon_coords_finite) {
        return None;
    }
    geometry.interior_point()
}

fn center_of_mass(geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
    if !geometry.0.iter().all(polygon_coords_finite) {
        return None;
    }
    geometry.centroid()
}

/// Mean of the exterior-ring vertices, skipping each ring's closing
/// duplicate. The cheapest fallback; never expected to fail for a valid
/// polygon.
fn vertex_mean(geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
    let mut sum = Coord { x: 0.0, y: 0.0 };
    let mut count = 0usize;
    for poly in &geometry.0 {
        let ring = &poly.exterior().0;
        let open_len = if ring.len() > 1 && ring.first() == ring.last() {
            ring.len() - 1
        } else {
            ring.len()
        };
        for c in &ring[..open_len] {
            sum.x += c.x;
            sum.y += c.y;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some(Point::new(sum.x / count as f64, sum.y / count as f64))
}

/// Search cell for the pole-of-inaccessibility grid refinement.
#[derive(Debug, Clone, Copy)]
struct Cell {
    x: f64,
    y: f64,
    half: f64,
    /// Signed distance from the cell center to the polygon edge, positive
    /// inside.
    dist: f64,
    /// Upper bound on the distance any point in the cell can reach.
    max: f64,
}

impl Cell {
    fn new(x: f64, y: f64, half: f64, poly: &Polygon<f64>) -> Self {
        let dist = signed_distance(x, y, poly);
        Self {
            x,
            y,
            half,
            dist,
            max: dist + half * std::f64::consts::SQRT_2,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.max == other.max
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.max.total_cmp(&other.max)
    }
}

/// Pole of inaccessibility: the interior point maximally distant from any
/// edge, found by iterative grid refinement over a max-priority queue
/// (after Mapbox's polylabel).
fn polylabel(poly: &Polygon<f64>, precision: f64) -> Option<Point<f64>> {
    if !polygon_coords_finite(poly) {
        return None;
    }
    let rect = poly.bounding_rect()?;
    let width = rect.width();
    let height = rect.height();
    let cell_size = width.min(height);
    if cell_size <= 0.0 {
        return None;
    }
    let half = cell_size / 2.0;

    let mut queue = BinaryHeap::new();
    let mut x = rect.min().x;
    while x < rect.max().x {
        let mut y = rect.min().y;
        while y < rect.max().y {
            queue.push(Cell::new(x + half, y + half, half, poly));
            y += cell_size;
        }
        x += cell_size;
    }

    // seed with the centroid and the bbox center so convex cases converge
    // immediately
    let mut best = Cell::new(
        rect.min().x + width / 2.0,
        rect.min().y + height / 2.0,
        0.0,
        poly,
    );
    if let Some(centroid) = poly.centroid() {
        let candidate = Cell::new(centroid.x(), centroid.y(), 0.0, poly);
        if candidate.dist > best.dist {
            best = candidate;
        }
    }

    while let Some(cell) = queue.pop() {
        if cell.dist > best.dist {
            best = cell;
        }
        // no point in this cell can beat the current best by more than the
        // requested precision
        if cell.max - best.dist <= precision {
            continue;
        }
        let h = cell.half / 2.0;
        queue.push(Cell::new(cell.x - h, cell.y - h, h, poly));
        queue.push(Cell::new(cell.x + h, cell.y - h, h, poly));
        queue.push(Cell::new(cell.x - h, cell.y + h, h, poly));
        queue.push(Cell::new(cell.x + h, cell.y + h, h, poly));
    }

    Some(Point::new(best.x, best.y))
}

fn polygon_coords_finite(poly: &Polygon<f64>) -> bool {
    std::iter::once(poly.exterior())
        .chain(poly.interiors())
        .all(|ring| ring.0.iter().all(|c| c.x.is_finite() && c.y.is_finite()))
}

/// Signed distance from a point to the polygon outline: positive inside,
/// negative outside, by even-odd containment over all rings.
fn signed_distance(x: f64, y: f64, poly: &Polygon<f64>) -> f64 {
    let mut inside = false;
    let mut min_dist_sq = f64::INFINITY;

    for ring in std::iter::once(poly.exterior()).chain(poly.interiors()) {
        for edge in ring.0.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            if (a.y > y) != (b.y > y) && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            min_dist_sq = min_dist_sq.min(segment_distance_sq(x, y, a, b));
        }
    }

    let dist = min_dist_sq.sqrt();
    if inside {
        dist
    } else {
        -dist
    }
}

fn segment_distance_sq(x: f64, y: f64, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (mut px, mut py) = (a.x, a.y);
    let (dx, dy) = (b.x - a.x, b.y - a.y);

    if dx != 0.0 || dy != 0.0 {
        let t = ((x - a.x) * dx + (y - a.y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            px = b.x;
            py = b.y;
        } else if t > 0.0 {
            px += dx * t;
            py += dy * t;
        }
    }

    (x - px).powi(2) + (y - py).powi(2)
}

//! Uniform grid spatial index for fast region candidate lookup.

use hashbrown::{HashMap, HashSet};
use tracing::info;

use super::params::BoundaryParams;
use crate::models::BoundaryBox;

/// Uniform grid over a dataset's union bbox, bucketing feature ids by bbox
/// overlap.
///
/// The index is approximate: membership in a cell means "may intersect",
/// never a geometric guarantee. Callers must still run exact tests on the
/// returned candidates. Built once per dataset and read-only afterwards;
/// cells hold only feature ids, never geometry.
#[derive(Debug, Clone)]
pub struct SpatialGridIndex {
    dataset_id: String,
    dataset_bbox: BoundaryBox,
    x_cells: usize,
    y_cells: usize,
    cell_width: f64,
    cell_height: f64,
    cells: HashMap<(usize, usize), HashSet<String>>,
}

impl SpatialGridIndex {
    /// Build an index from a completed feature-id → params map.
    ///
    /// Returns `None` when the map is empty: no index is available and the
    /// caller must fall back to a brute-force scan.
    pub fn from_boundary_params(
        dataset_id: &str,
        params_by_feature: &HashMap<String, BoundaryParams>,
        x_cells: usize,
        y_cells: usize,
    ) -> Option<Self> {
        let mut bboxes = params_by_feature.values().map(|params| params.bbox);
        let mut dataset_bbox = bboxes.next()?;
        for bbox in bboxes {
            dataset_bbox.expand_to_include(&bbox);
        }

        let x_cells = x_cells.max(1);
        let y_cells = y_cells.max(1);

        let mut index = Self {
            dataset_id: dataset_id.to_string(),
            dataset_bbox,
            x_cells,
            y_cells,
            cell_width: dataset_bbox.width() / x_cells as f64,
            cell_height: dataset_bbox.height() / y_cells as f64,
            cells: HashMap::new(),
        };

        for (id, params) in params_by_feature {
            index.insert_bbox(id, &params.bbox);
        }

        info!(
            "Built {}x{} grid index for dataset '{}' ({} features, {} occupied cells)",
            x_cells,
            y_cells,
            dataset_id,
            params_by_feature.len(),
            index.cells.len()
        );

        Some(index)
    }

    /// Feature ids whose bbox may cover the point; empty when the point lies
    /// outside the dataset bbox. Returns a copy of the cell's id set.
    pub fn query_by_point(&self, lng: f64, lat: f64) -> HashSet<String> {
        if !self.dataset_bbox.contains_point(lng, lat) {
            return HashSet::new();
        }
        let key = (self.x_index(lng), self.y_index(lat));
        self.cells.get(&key).cloned().unwrap_or_default()
    }

    /// Union of ids over every cell the query bbox overlaps; empty when the
    /// query bbox misses the dataset bbox entirely.
    pub fn query_by_bbox(&self, bbox: &BoundaryBox) -> HashSet<String> {
        let mut ids = HashSet::new();
        if !self.dataset_bbox.intersects(bbox) {
            return ids;
        }
        let (x0, x1) = (self.x_index(bbox.west), self.x_index(bbox.east));
        let (y0, y1) = (self.y_index(bbox.south), self.y_index(bbox.north));
        for x in x0..=x1 {
            for y in y0..=y1 {
                if let Some(cell) = self.cells.get(&(x, y)) {
                    ids.extend(cell.iter().cloned());
                }
            }
        }
        ids
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn dataset_bbox(&self) -> &BoundaryBox {
        &self.dataset_bbox
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn insert_bbox(&mut self, id: &str, bbox: &BoundaryBox) {
        let (x0, x1) = (self.x_index(bbox.west), self.x_index(bbox.east));
        let (y0, y1) = (self.y_index(bbox.south), self.y_index(bbox.north));
        for x in x0..=x1 {
            for y in y0..=y1 {
                self.cells
                    .entry((x, y))
                    .or_default()
                    .insert(id.to_string());
            }
        }
    }

    /// Cell column for a longitude, clamped to `[0, x_cells - 1]`. A
    /// degenerate-width dataset bbox collapses to column 0.
    fn x_index(&self, lng: f64) -> usize {
        if self.cell_width <= 0.0 {
            return 0;
        }
        let idx = ((lng - self.dataset_bbox.west) / self.cell_width).floor() as isize;
        idx.clamp(0, self.x_cells as isize - 1) as usize
    }

    fn y_index(&self, lat: f64) -> usize {
        if self.cell_height <= 0.0 {
            return 0;
        }
        let idx = ((lat - self.dataset_bbox.south) / self.cell_height).floor() as isize;
        idx.clamp(0, self.y_cells as isize - 1) as usize
    }
}

/// Brute-force bbox scan for callers that got no index. Same approximate
/// contract as the grid: candidates, not guarantees.
pub fn scan_by_point(
    params_by_feature: &HashMap<String, BoundaryParams>,
    lng: f64,
    lat: f64,
) -> HashSet<String> {
    params_by_feature
        .iter()
        .filter(|(_, params)| params.bbox.contains_point(lng, lat))
        .map(|(id, _)| id.clone())
        .collect()
}

//! Region property assembly and the batch clip pass.
//!
//! The one parameterized implementation of the clip pipeline: callers that
//! need no enrichment pass a reduced [`DatasetConfig`] instead of forking
//! the clip logic.

use std::sync::Mutex;

use geo::ChamberlainDuquetteArea;
use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::clip::{clip_to_boundary, ClipOptions, ClippedBoundary};
use super::label::{resolve_label_points, LabelPointError};
use crate::models::{
    as_multi_polygon, BoundaryBox, ClippedRegion, DatasetConfig, RegionFeature, RegionProperties,
};

/// Assemble the canonical property record for one clipped feature.
///
/// `seen_unit_codes` must be scoped to one run: unmapped unit-type codes are
/// logged once per distinct code per run, never per feature.
pub fn assemble_region_properties(
    feature: &RegionFeature,
    config: &DatasetConfig,
    clip: &ClippedBoundary,
    seen_unit_codes: &mut HashSet<String>,
) -> Result<RegionProperties, LabelPointError> {
    // clip.geometry holds the original shape when fully within the bbox,
    // which is exactly the geometry label points should prefer
    let label_points = resolve_label_points(&clip.geometry)?;

    let id = feature.property_as_string(&config.id_property);
    let name = feature.property_as_string(&config.name_property);
    let display_name = config
        .applicable_name_properties
        .iter()
        .find_map(|key| feature.property_as_string(key));

    let total_area = as_multi_polygon(&feature.geometry)
        .map(|mp| mp.chamberlain_duquette_unsigned_area() / 1_000_000.0)
        .unwrap_or(0.0);
    let area_within_bbox = if clip.fully_within {
        total_area
    } else {
        clip.geometry.chamberlain_duquette_unsigned_area() / 1_000_000.0
    };

    let population = config
        .population_property
        .as_ref()
        .and_then(|key| feature.property(key))
        .and_then(parse_population);

    let (unit_type_code, unit_type) = resolve_unit_type(feature, config, seen_unit_codes);

    Ok(RegionProperties {
        id,
        name,
        display_name,
        lat: label_points.primary.lat,
        lng: label_points.primary.lng,
        label_points,
        within_bbox: clip.fully_within,
        area_within_bbox,
        total_area,
        population,
        unit_type,
        unit_type_code,
    })
}

/// Clip a batch of features to `bbox` and assemble their property records.
///
/// Per-feature failures (bad geometry, exhausted label-point chain,
/// degenerate clip result) drop that feature with a log line; the batch
/// always completes with whatever survived.
pub fn clip_features(
    features: &[RegionFeature],
    bbox: &BoundaryBox,
    config: &DatasetConfig,
    options: &ClipOptions,
) -> Vec<ClippedRegion> {
    let seen_unit_codes: Mutex<HashSet<String>> = Mutex::new(HashSet::new());

    let regions: Vec<ClippedRegion> = features
        .par_iter()
        .filter_map(|feature| {
            let clip = clip_to_boundary(&feature.geometry, bbox, options)?;
            let mut seen = seen_unit_codes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match assemble_region_properties(feature, config, &clip, &mut seen) {
                Ok(properties) => Some(ClippedRegion {
                    geometry: clip.geometry,
                    properties,
                }),
                Err(err) => {
                    warn!("Dropping feature from clip output: {err}");
                    None
                }
            }
        })
        .collect();

    info!(
        "Clipped {} of {} features to boundary",
        regions.len(),
        features.len()
    );
    regions
}

/// Merge an external `id → population` index into assembled regions.
///
/// Regions whose population is already set are skipped.
pub fn apply_population_index(regions: &mut [ClippedRegion], index: &HashMap<String, f64>) {
    let mut applied = 0usize;
    for region in regions.iter_mut() {
        if region.properties.population.is_some() {
            continue;
        }
        let Some(id) = &region.properties.id else {
            continue;
        };
        if let Some(population) = index.get(id) {
            region.properties.population = Some(*population);
            applied += 1;
        }
    }
    debug!("Applied external population to {applied} regions");
}

/// Parse a population value, stripping thousands separators. Non-finite
/// results are rejected.
fn parse_population(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let stripped: String = s
                .chars()
                .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}'))
                .collect();
            stripped.parse::<f64>().ok()?
        }
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

fn resolve_unit_type(
    feature: &RegionFeature,
    config: &DatasetConfig,
    seen_unit_codes: &mut HashSet<String>,
) -> (Option<String>, Option<String>) {
    let Some(key) = &config.unit_type_property else {
        return (None, None);
    };
    let Some(code) = feature.property_as_string(key) else {
        return (None, None);
    };
    let label = config.unit_type_labels.get(&code).cloned();
    if label.is_none() && seen_unit_codes.insert(code.clone()) {
        warn!("No unit type label mapped for code '{code}'");
    }
    (Some(code), label)
}

//! Juniper - boundary geometry and spatial indexing for region overlays
//!
//! This library turns administrative/regional boundary polygons into a form
//! usable for mapping, reporting and real-time spatial lookups: bbox
//! clipping with normalized region properties, a uniform grid index for
//! point/bbox candidate lookup, and planar or geodesic estimates of the
//! length of a line feature inside a boundary.

pub mod boundary;
pub mod models;

pub use boundary::{BoundaryParams, ClipOptions, SpatialGridIndex};
pub use models::{BoundaryBox, ClippedRegion, DatasetConfig, RegionFeature, RegionProperties};

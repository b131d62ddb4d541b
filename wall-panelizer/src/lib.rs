//! Panel planning for detected walls.
//!
//! Detected wall rectangles are filtered, measured, and decomposed into
//! catalog panel widths, either freely (wishlist) or limited by on-hand
//! quantities (inventory). Plans are written as CSV and optionally JSON.

pub mod allocator;
pub mod catalog;
pub mod error;
pub mod geometry;
pub mod model;
pub mod noise_filter;
pub mod output;
pub mod report;

pub use allocator::{plan_walls, AllocationMode, AllocationSummary, PanelAllocator};
pub use catalog::{load_catalog, parse_catalog, CatalogKind};
pub use error::{PanelizeError, Result};
pub use geometry::{parse_detections, read_detection_file, DetectionMode, Point};
pub use model::{CatalogEntry, Chain, Hsv, Panel, PanelId, PanelKind, Wall, FIT_EPSILON};
pub use noise_filter::NoiseFilter;
pub use output::{default_output_path, write_plan, write_plan_file, INVENTORY_SUFFIX, WISHLIST_SUFFIX};
pub use report::{write_report, PlanReport, PlanSection, WallReport};

//! Ground control point bookkeeping for marker-based photogrammetry.
//!
//! This crate does not detect markers itself. It expects a
//! [`MarkerDetector`] (for example the OpenCV backend in `gcp-find-opencv`)
//! and handles everything around it:
//! - dictionary catalog and detector thresholds,
//! - world coordinates of surveyed GCPs,
//! - marker centroids and duplicate checks,
//! - ODM / VisualSfM / plain GCP list layouts,
//! - optional PNG debug overlays.
//!
//! ## Quickstart
//!
//! ```no_run
//! use gcp_find_core::{CoordTable, FinderConfig, GcpFinder, MarkerDetector, OutputFormat};
//! # fn run<D: MarkerDetector>(detector: D) -> Result<(), Box<dyn std::error::Error>> {
//! let coords = CoordTable::load("gcp_coords.txt", " ")?;
//! let config = FinderConfig {
//!     format: OutputFormat::Odm,
//!     epsg: Some(23700),
//!     debug: None,
//! };
//! let mut finder = GcpFinder::new(detector, coords, config, std::io::stdout().lock());
//! finder.process_images(["DJI_0001.JPG", "DJI_0002.JPG"])?;
//! # Ok(())
//! # }
//! ```

mod coords;
mod debug;
mod detector;
mod dictionary;
mod finder;
mod format;
mod logger;
mod marker;
mod params;
mod registry;

pub use coords::{parse_line, CoordTable, CoordsError, LineIssue, WorldCoord};
pub use debug::{render_overlay, DebugOptions};
pub use detector::MarkerDetector;
pub use dictionary::{
    list_dictionaries, DictionaryError, DictionarySpec, CUSTOM_3X3_32_ID, DEFAULT_DICTIONARY_ID,
};
pub use finder::{
    load_frame, to_gray, BatchSummary, FinderConfig, FinderError, GcpFinder, ImageOutcome,
    ImageReport,
};
pub use format::OutputFormat;
pub use marker::{duplicate_count, sorted_ids, DetectedMarker, MarkerId, MarkerObservation};
pub use params::{
    CornerRefinement, DetectorParamOverrides, DetectorParams, ParamsError, ParamsIoError,
};
pub use registry::GcpRegistry;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_logging;

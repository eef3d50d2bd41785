//! Find ArUco ground control points on a series of photos.
//!
//! This crate provides:
//! - re-exports of the detector-agnostic bookkeeping in `gcp-find-core`
//! - (feature `opencv`) the OpenCV ArUco detector backend
//! - (feature `cli`) the argument parser and run loop of the `gcp-find` binary
//!
//! ## Command line
//!
//! ```text
//! gcp-find -t ODM -i gcp_coords.txt --epsg 23700 -o gcp_list.txt images/*.JPG
//! gcp-find --list
//! ```
//!
//! The binary needs both `cli` and `opencv`:
//! `cargo install gcp-find --features opencv`.
//!
//! ## API map
//! - `gcp_find::core`: data model, formats, processing loop.
//! - `gcp_find::opencv` (feature `opencv`): `OpencvDetector`.
//! - `gcp_find::cli` / `gcp_find::app` (feature `cli`): argument parsing and the run.

pub use gcp_find_core as core;

pub use gcp_find_core::{
    CoordTable, DetectedMarker, DetectorParams, DictionarySpec, FinderConfig, GcpFinder,
    MarkerDetector, OutputFormat, WorldCoord,
};

#[cfg(feature = "opencv")]
pub use gcp_find_opencv as opencv;

#[cfg(feature = "cli")]
pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
mod error;

#[cfg(feature = "cli")]
pub use error::CliError;

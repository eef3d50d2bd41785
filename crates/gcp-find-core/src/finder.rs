//! Batch processing: photos in, GCP list lines out.
//!
//! [`GcpFinder`] walks the images one at a time, asks the detector for
//! markers, and turns every marker into one output line in the selected
//! layout. Per-image problems (unreadable file, detector failure, no markers,
//! duplicate ids, unknown coordinates) are logged and never stop the batch;
//! only a failing output writer is fatal.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageDecoder, ImageReader, Luma};
use log::{info, warn};

use crate::coords::CoordTable;
use crate::debug::{render_overlay, DebugOptions};
use crate::detector::MarkerDetector;
use crate::format::OutputFormat;
use crate::marker::{duplicate_count, sorted_ids, MarkerId, MarkerObservation};
use crate::registry::GcpRegistry;

#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    #[error("cannot write GCP output: {0}")]
    Output(#[from] std::io::Error),
}

/// Run-wide settings of a [`GcpFinder`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FinderConfig {
    pub format: OutputFormat,
    /// EPSG code written as ODM header line.
    pub epsg: Option<u32>,
    /// Write a PNG overlay per processed image.
    pub debug: Option<DebugOptions>,
}

/// What happened to one image.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageOutcome {
    Unreadable,
    DetectorFailed,
    NoMarkers,
    Processed(ImageReport),
}

/// Details of an image on which markers were found.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageReport {
    pub observations: Vec<MarkerObservation>,
    /// Markers whose id already occurred earlier on the same image.
    pub duplicates: usize,
    /// Lines written to the GCP list.
    pub written: usize,
    /// Detected ids that have no world coordinates.
    pub missing_coords: Vec<MarkerId>,
}

/// Counters for a whole batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub images: usize,
    pub processed: usize,
    pub unreadable: usize,
    pub detector_failed: usize,
    pub no_markers: usize,
    pub lines_written: usize,
}

impl BatchSummary {
    fn add(&mut self, outcome: &ImageOutcome) {
        self.images += 1;
        match outcome {
            ImageOutcome::Unreadable => self.unreadable += 1,
            ImageOutcome::DetectorFailed => self.detector_failed += 1,
            ImageOutcome::NoMarkers => self.no_markers += 1,
            ImageOutcome::Processed(report) => {
                self.processed += 1;
                self.lines_written += report.written;
            }
        }
    }
}

/// Decode an image file, honoring its EXIF orientation.
pub fn load_frame(path: &Path) -> Result<DynamicImage, image::ImageError> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut frame = DynamicImage::from_decoder(decoder)?;
    frame.apply_orientation(orientation);
    Ok(frame)
}

/// Gray conversion with the BT.601 weights and fixed-point rounding OpenCV
/// uses for `COLOR_BGR2GRAY`, so thresholds behave like in OpenCV tools.
pub fn to_gray(frame: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = frame {
        return gray.clone();
    }
    let rgb = frame.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma =
            (u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + 8192) >> 14;
        Luma([luma as u8])
    })
}

fn base_name(image_name: &str) -> String {
    Path::new(image_name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| image_name.to_string())
}

pub struct GcpFinder<D, W> {
    detector: D,
    coords: CoordTable,
    config: FinderConfig,
    out: W,
    registry: GcpRegistry,
    overlays: HashSet<PathBuf>,
    started: bool,
}

impl<D: MarkerDetector, W: Write> GcpFinder<D, W> {
    pub fn new(detector: D, coords: CoordTable, config: FinderConfig, out: W) -> Self {
        Self {
            detector,
            coords,
            config,
            out,
            registry: GcpRegistry::new(),
            overlays: HashSet::new(),
            started: false,
        }
    }

    pub fn registry(&self) -> &GcpRegistry {
        &self.registry
    }

    /// Write the output header, once.
    pub fn start(&mut self) -> Result<(), FinderError> {
        if !self.started {
            self.started = true;
            if let Some(header) = self.config.format.header(self.config.epsg) {
                writeln!(self.out, "{header}")?;
            }
        }
        Ok(())
    }

    /// Process every path in order and log the per-marker summary.
    pub fn process_images<P: AsRef<Path>>(
        &mut self,
        paths: impl IntoIterator<Item = P>,
    ) -> Result<BatchSummary, FinderError> {
        self.start()?;
        let mut summary = BatchSummary::default();
        for path in paths {
            let path = path.as_ref();
            info!("processing {}", path.display());
            let outcome = self.process_image(path)?;
            summary.add(&outcome);
        }
        for line in self.registry.summary_lines() {
            info!("{line}");
        }
        self.out.flush()?;
        Ok(summary)
    }

    /// Load one image file and process it.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(self)))]
    pub fn process_image(&mut self, path: &Path) -> Result<ImageOutcome, FinderError> {
        let frame = match load_frame(path) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("error reading image: {} ({err})", path.display());
                return Ok(ImageOutcome::Unreadable);
            }
        };
        self.process_frame(&path.to_string_lossy(), &frame)
    }

    /// Detect markers on an already decoded frame and write its GCP lines.
    ///
    /// `image_name` is the name as given by the user; output lines carry only
    /// its file name component.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, frame), fields(width = frame.width(), height = frame.height()))
    )]
    pub fn process_frame(
        &mut self,
        image_name: &str,
        frame: &DynamicImage,
    ) -> Result<ImageOutcome, FinderError> {
        self.start()?;
        let gray = to_gray(frame);
        let markers = match self.detector.detect(&gray) {
            Ok(markers) => markers,
            Err(err) => {
                warn!("marker detection failed on image {image_name}: {err}");
                return Ok(ImageOutcome::DetectorFailed);
            }
        };
        if markers.is_empty() {
            warn!("No markers found on image {image_name}");
            return Ok(ImageOutcome::NoMarkers);
        }

        let duplicates = duplicate_count(&markers);
        if duplicates > 0 {
            warn!("duplicate markers on image {image_name}");
            warn!("marker ids: {:?}", sorted_ids(&markers));
        }
        info!("  {} GCP markers found", markers.len());

        let file_name = base_name(image_name);
        let mut report = ImageReport {
            observations: Vec::with_capacity(markers.len()),
            duplicates,
            written: 0,
            missing_coords: Vec::new(),
        };
        for marker in &markers {
            self.registry.record(marker.id, image_name);
            let obs = marker.observation();
            let coord = self.coords.get(marker.id);
            if coord.is_none() {
                report.missing_coords.push(marker.id);
            }
            match self.config.format.format_line(&obs, &file_name, coord) {
                Some(line) => {
                    writeln!(self.out, "{line}")?;
                    report.written += 1;
                }
                None => warn!("No coordinates for {}", marker.id),
            }
            report.observations.push(obs);
        }

        if let Some(opts) = &self.config.debug {
            info!(
                "{} GCP, {} duplicate found on {image_name}",
                markers.len(),
                duplicates
            );
            let path = claim_overlay_path(&mut self.overlays, opts, image_name);
            write_overlay(&path, opts, frame, &markers, &self.coords);
        }

        Ok(ImageOutcome::Processed(report))
    }

    /// Flush the output and hand back the registry and writer.
    pub fn finish(mut self) -> Result<(GcpRegistry, W), FinderError> {
        self.out.flush()?;
        Ok((self.registry, self.out))
    }
}

/// Overlay path not yet used in this run; same-named images from different
/// directories get a numeric suffix.
fn claim_overlay_path(
    used: &mut HashSet<PathBuf>,
    opts: &DebugOptions,
    image_name: &str,
) -> PathBuf {
    let mut n = 1;
    loop {
        let path = opts.numbered_overlay_path(image_name, n);
        if used.insert(path.clone()) {
            if n > 1 {
                warn!(
                    "debug overlay name clash for {image_name}, using {}",
                    path.display()
                );
            }
            return path;
        }
        n += 1;
    }
}

fn write_overlay(
    path: &Path,
    opts: &DebugOptions,
    frame: &DynamicImage,
    markers: &[crate::marker::DetectedMarker],
    coords: &CoordTable,
) {
    let canvas = render_overlay(frame, markers, coords, opts);
    if let Err(err) = std::fs::create_dir_all(&opts.dir) {
        warn!("cannot create debug directory {}: {err}", opts.dir.display());
        return;
    }
    match canvas.save(path) {
        Ok(()) => info!("debug overlay written to {}", path.display()),
        Err(err) => warn!("cannot write debug overlay {}: {err}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_directories() {
        assert_eq!(base_name("/a/b/DJI_0001.JPG"), "DJI_0001.JPG");
        assert_eq!(base_name("c.png"), "c.png");
    }

    #[test]
    fn gray_uses_bt601_weights() {
        let mut rgb = image::RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, image::Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, image::Rgb([255, 255, 255]));
        let gray = to_gray(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(gray.as_raw(), &vec![76, 150, 255]);
    }

    #[test]
    fn clashing_overlay_names_get_numbered() {
        let opts = DebugOptions {
            dir: PathBuf::from("dbg"),
            ..DebugOptions::default()
        };
        let mut used = HashSet::new();
        assert_eq!(
            claim_overlay_path(&mut used, &opts, "a/DJI_1.JPG"),
            PathBuf::from("dbg/DJI_1_gcp.png")
        );
        assert_eq!(
            claim_overlay_path(&mut used, &opts, "b/DJI_1.JPG"),
            PathBuf::from("dbg/DJI_1_gcp_2.png")
        );
        assert_eq!(
            claim_overlay_path(&mut used, &opts, "c/DJI_1.JPG"),
            PathBuf::from("dbg/DJI_1_gcp_3.png")
        );
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut s = BatchSummary::default();
        s.add(&ImageOutcome::Unreadable);
        s.add(&ImageOutcome::NoMarkers);
        s.add(&ImageOutcome::Processed(ImageReport {
            observations: vec![],
            duplicates: 0,
            written: 3,
            missing_coords: vec![],
        }));
        assert_eq!(
            s,
            BatchSummary {
                images: 3,
                processed: 1,
                unreadable: 1,
                detector_failed: 0,
                no_markers: 1,
                lines_written: 3,
            }
        );
    }
}

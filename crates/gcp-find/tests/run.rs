#![cfg(feature = "cli")]

use std::path::Path;

use clap::Parser;
use gcp_find::app;
use gcp_find::cli::Args;
use gcp_find::core::{DetectedMarker, DetectorParams, DictionarySpec, MarkerDetector};
use gcp_find::CliError;

/// Reports the same markers on every image.
struct FixedDetector {
    markers: Vec<DetectedMarker>,
}

impl MarkerDetector for FixedDetector {
    type Error = std::io::Error;

    fn detect(&mut self, _image: &image::GrayImage) -> Result<Vec<DetectedMarker>, Self::Error> {
        Ok(self.markers.clone())
    }
}

/// Degenerate marker with all corners on `(x, y)`.
fn marker(id: u32, x: f32, y: f32) -> DetectedMarker {
    DetectedMarker::new(id, [[x, y].into(); 4])
}

fn fixed(_dict: DictionarySpec, _params: &DetectorParams) -> Result<FixedDetector, std::io::Error> {
    Ok(FixedDetector {
        markers: vec![marker(1, 100.0, 200.0), marker(2, 300.0, 400.0)],
    })
}

fn write_png(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    image::GrayImage::new(8, 8).save(&path).unwrap();
    path.to_string_lossy().into_owned()
}

fn args(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("gcp-find").chain(argv.iter().copied())).unwrap()
}

#[test]
fn odm_run_writes_gcp_list_file() {
    let dir = tempfile::tempdir().unwrap();
    let img1 = write_png(dir.path(), "DJI_0001.png");
    let img2 = write_png(dir.path(), "DJI_0002.png");
    let coords = dir.path().join("coords.txt");
    std::fs::write(&coords, "1 650000 240000 100\n").unwrap();
    let out = dir.path().join("gcp_list.txt");

    let a = args(&[
        "-t",
        "ODM",
        "--epsg",
        "23700",
        "-i",
        coords.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        &img1,
        &img2,
    ]);
    let summary = app::run(&a, fixed).unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.lines_written, 2);

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        text,
        "EPSG:23700\n\
         650000.000 240000.000 100.000 100 200 DJI_0001.png 1\n\
         650000.000 240000.000 100.000 100 200 DJI_0002.png 1\n"
    );
}

#[test]
fn plain_run_without_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_png(dir.path(), "a.png");
    let out = dir.path().join("out.txt");
    let a = args(&["-o", out.to_str().unwrap(), &img]);
    app::run(&a, fixed).unwrap();
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "1 100 200 a.png\n2 300 400 a.png\n"
    );
}

#[test]
fn no_images_is_an_error() {
    let a = args(&["-t", "ODM"]);
    assert!(matches!(app::run(&a, fixed), Err(CliError::NoImages)));
}

#[test]
fn missing_input_file_is_fatal_and_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_png(dir.path(), "a.png");
    let out = dir.path().join("keep.txt");
    std::fs::write(&out, "previous\n").unwrap();
    let a = args(&[
        "-i",
        "/no/such/coords.txt",
        "-o",
        out.to_str().unwrap(),
        &img,
    ]);
    assert!(matches!(app::run(&a, fixed), Err(CliError::Coords(_))));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous\n");
}

#[test]
fn bad_dictionary_and_params_are_rejected() {
    let a = args(&["-d", "77", "x.png"]);
    assert!(matches!(app::run(&a, fixed), Err(CliError::Dictionary(_))));

    let a = args(&["--winstep", "0", "x.png"]);
    assert!(matches!(app::run(&a, fixed), Err(CliError::Params(_))));
}

#[test]
fn detector_setup_failure_is_reported() {
    let a = args(&["x.png"]);
    let err = app::run(&a, |_, _| -> Result<FixedDetector, std::io::Error> {
        Err(std::io::Error::other("no backend"))
    })
    .unwrap_err();
    assert!(matches!(err, CliError::Detector(_)));
    assert!(err.to_string().contains("no backend"));
}

#[test]
fn dictionary_listing() {
    let mut buf = Vec::new();
    app::write_dictionary_list(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.first(), Some(&"0 : DICT_4X4_50"));
    assert!(lines.contains(&"1 : DICT_4X4_100"));
    assert_eq!(lines.last(), Some(&"99 : DICT_3X3_32 custom"));
}

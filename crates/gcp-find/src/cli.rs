//! Command-line arguments of the `gcp-find` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gcp_find_core::{
    CornerRefinement, DebugOptions, DetectorParamOverrides, DetectorParams, DictionaryError,
    DictionarySpec, FinderConfig, OutputFormat, ParamsError, DEFAULT_DICTIONARY_ID,
};

use crate::error::CliError;

/// Layout of the GCP list on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputType {
    #[value(name = "ODM")]
    Odm,
    #[value(name = "VisualSfM")]
    VisualSfm,
}

impl From<OutputType> for OutputFormat {
    fn from(t: OutputType) -> Self {
        match t {
            OutputType::Odm => OutputFormat::Odm,
            OutputType::VisualSfm => OutputFormat::VisualSfm,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gcp-find",
    version,
    about = "Find ArUco GCP markers on a series of images and write a GCP list"
)]
pub struct Args {
    /// Image files to process.
    #[arg(value_name = "FILE")]
    pub names: Vec<PathBuf>,

    /// Marker dictionary id (see --list).
    #[arg(short = 'd', long = "dict", default_value_t = DEFAULT_DICTIONARY_ID)]
    pub dict: i32,

    /// Output GCP list file [default: stdout].
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Target program of the GCP list.
    #[arg(short = 't', long = "type", value_enum)]
    pub output_type: Option<OutputType>,

    /// Input GCP coordinate file (`id east north elev` per line).
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Field separator of the input coordinate file.
    #[arg(short = 's', long, default_value = " ")]
    pub separator: String,

    /// Report progress and a per-marker summary on stderr.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Detect inverted (white on black) markers.
    #[arg(short = 'r', long)]
    pub inverted: bool,

    /// Write an overlay PNG of the detected markers for every image.
    #[arg(long)]
    pub debug: bool,

    /// Directory for debug overlays.
    #[arg(long, default_value = "gcp_debug")]
    pub debug_dir: PathBuf,

    /// Symbol radius on debug overlays, in pixels.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub markersize: u32,

    /// Font cell size on debug overlays, in pixels.
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub fontsize: u32,

    /// JSON file with detector parameters; flags below override it.
    #[arg(long, value_name = "JSON")]
    pub params: Option<PathBuf>,

    /// Adaptive thresholding window min size [default: 3].
    #[arg(long)]
    pub winmin: Option<i32>,
    /// Adaptive thresholding window max size [default: 23].
    #[arg(long)]
    pub winmax: Option<i32>,
    /// Adaptive thresholding window size step [default: 10].
    #[arg(long)]
    pub winstep: Option<i32>,
    /// Adaptive threshold constant [default: 7].
    #[arg(long)]
    pub thres: Option<f64>,
    /// Min marker perimeter rate [default: 0.03].
    #[arg(long)]
    pub minrate: Option<f64>,
    /// Max marker perimeter rate [default: 4].
    #[arg(long)]
    pub maxrate: Option<f64>,
    /// Polygonal approximation accuracy rate [default: 0.03].
    #[arg(long)]
    pub poly: Option<f64>,
    /// Min distance between corners of one marker [default: 0.05].
    #[arg(long)]
    pub corner: Option<f64>,
    /// Min distance between corners of different markers [default: 0.05].
    #[arg(long)]
    pub markerdist: Option<f64>,
    /// Min distance of marker corners to the image border [default: 3].
    #[arg(long)]
    pub borderdist: Option<i32>,
    /// Width of the marker border in bits [default: 1].
    #[arg(long)]
    pub borderbits: Option<i32>,
    /// Min standard deviation of pixel values in a candidate [default: 5].
    #[arg(long)]
    pub otsu: Option<f64>,
    /// Pixels per cell when removing perspective [default: 4].
    #[arg(long)]
    pub persp: Option<i32>,
    /// Ignored margin at cell borders [default: 0.13].
    #[arg(long)]
    pub ignore: Option<f64>,
    /// Allowed erroneous border bits rate [default: 0.35].
    #[arg(long)]
    pub error: Option<f64>,
    /// Bit error correction rate [default: 0.6].
    #[arg(long)]
    pub correct: Option<f64>,
    /// Corner refinement: 0 none, 1 subpix, 2 contour, 3 apriltag [default: 0].
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=3))]
    pub refinement: Option<i32>,
    /// Window size for subpixel refinement [default: 5].
    #[arg(long)]
    pub refwin: Option<i32>,
    /// Max iterations of subpixel refinement [default: 30].
    #[arg(long)]
    pub maxiter: Option<i32>,
    /// Min accuracy of subpixel refinement [default: 0.1].
    #[arg(long)]
    pub minacc: Option<f64>,

    /// Print the available dictionary ids and names, then exit.
    #[arg(short = 'l', long)]
    pub list: bool,

    /// EPSG code of the GCP coordinates (ODM header line).
    #[arg(long)]
    pub epsg: Option<u32>,

    /// Emit JSON log lines (requires the `tracing` feature).
    #[cfg(feature = "tracing")]
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    pub fn dictionary(&self) -> Result<DictionarySpec, DictionaryError> {
        DictionarySpec::from_id(self.dict)
    }

    pub fn format(&self) -> OutputFormat {
        self.output_type.map(OutputFormat::from).unwrap_or_default()
    }

    /// Detector overrides given as flags.
    pub fn param_overrides(&self) -> Result<DetectorParamOverrides, ParamsError> {
        Ok(DetectorParamOverrides {
            detect_inverted_marker: self.inverted.then_some(true),
            adaptive_thresh_win_size_min: self.winmin,
            adaptive_thresh_win_size_max: self.winmax,
            adaptive_thresh_win_size_step: self.winstep,
            adaptive_thresh_constant: self.thres,
            min_marker_perimeter_rate: self.minrate,
            max_marker_perimeter_rate: self.maxrate,
            polygonal_approx_accuracy_rate: self.poly,
            min_corner_distance_rate: self.corner,
            min_marker_distance_rate: self.markerdist,
            min_distance_to_border: self.borderdist,
            marker_border_bits: self.borderbits,
            min_otsu_std_dev: self.otsu,
            perspective_remove_pixel_per_cell: self.persp,
            perspective_remove_ignored_margin_per_cell: self.ignore,
            max_erroneous_bits_in_border_rate: self.error,
            error_correction_rate: self.correct,
            corner_refinement: self
                .refinement
                .map(CornerRefinement::from_code)
                .transpose()?,
            corner_refinement_win_size: self.refwin,
            corner_refinement_max_iterations: self.maxiter,
            corner_refinement_min_accuracy: self.minacc,
        })
    }

    /// Effective, validated detector parameters.
    pub fn detector_params(&self) -> Result<DetectorParams, CliError> {
        let base = match &self.params {
            Some(path) => DetectorParams::load_json(path).map_err(|source| {
                CliError::ParamsFile {
                    path: path.display().to_string(),
                    source,
                }
            })?,
            None => DetectorParams::default(),
        };
        let params = self.param_overrides()?.resolve(base);
        params.validate()?;
        Ok(params)
    }

    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig {
            format: self.format(),
            epsg: self.epsg,
            debug: self.debug.then(|| DebugOptions {
                dir: self.debug_dir.clone(),
                marker_size: self.markersize,
                font_size: self.fontsize,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("gcp-find").chain(argv.iter().copied()))
            .expect("valid args")
    }

    #[test]
    fn defaults() {
        let args = parse(&["a.jpg", "b.jpg"]);
        assert_eq!(args.names.len(), 2);
        assert_eq!(args.dict, 1);
        assert_eq!(args.separator, " ");
        assert_eq!(args.format(), OutputFormat::Plain);
        assert_eq!(args.detector_params().unwrap(), DetectorParams::default());
        assert_eq!(args.finder_config().debug, None);
    }

    #[test]
    fn output_types_use_tool_names() {
        assert_eq!(parse(&["-t", "ODM"]).format(), OutputFormat::Odm);
        assert_eq!(
            parse(&["--type", "VisualSfM"]).format(),
            OutputFormat::VisualSfm
        );
        assert!(Args::try_parse_from(["gcp-find", "-t", "colmap"]).is_err());
    }

    #[test]
    fn threshold_flags_override_defaults() {
        let args = parse(&[
            "-r",
            "--winmin",
            "5",
            "--winmax",
            "45",
            "--thres",
            "9.5",
            "--refinement",
            "1",
            "--minacc",
            "0.05",
            "x.png",
        ]);
        let params = args.detector_params().unwrap();
        assert!(params.detect_inverted_marker);
        assert_eq!(params.adaptive_thresh_win_size_min, 5);
        assert_eq!(params.adaptive_thresh_win_size_max, 45);
        assert_eq!(params.adaptive_thresh_constant, 9.5);
        assert_eq!(params.corner_refinement, CornerRefinement::Subpix);
        assert_eq!(params.corner_refinement_min_accuracy, 0.05);
        assert_eq!(params.marker_border_bits, 1);
    }

    #[test]
    fn refinement_out_of_range_is_rejected_by_parser() {
        assert!(Args::try_parse_from(["gcp-find", "--refinement", "7"]).is_err());
    }

    #[test]
    fn overlay_sizes_are_bounded() {
        for flag in ["--markersize", "--fontsize"] {
            assert!(Args::try_parse_from(["gcp-find", flag, "0"]).is_err());
            assert!(Args::try_parse_from(["gcp-find", flag, "1001"]).is_err());
            assert!(Args::try_parse_from(["gcp-find", flag, "1000"]).is_ok());
        }
    }

    #[test]
    fn invalid_thresholds_fail_validation() {
        let args = parse(&["--winmin", "30", "x.png"]);
        assert!(matches!(
            args.detector_params(),
            Err(CliError::Params(ParamsError::WindowRange { .. }))
        ));
    }

    #[test]
    fn params_file_is_layered_under_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{ "adaptive_thresh_constant": 11.0, "min_otsu_std_dev": 2.0 }"#,
        )
        .unwrap();
        let args = parse(&["--params", path.to_str().unwrap(), "--otsu", "3"]);
        let params = args.detector_params().unwrap();
        assert_eq!(params.adaptive_thresh_constant, 11.0);
        assert_eq!(params.min_otsu_std_dev, 3.0);
    }

    #[test]
    fn debug_options() {
        let args = parse(&["--debug", "--debug-dir", "dbg", "--markersize", "4", "x.png"]);
        assert_eq!(
            args.finder_config().debug,
            Some(DebugOptions {
                dir: PathBuf::from("dbg"),
                marker_size: 4,
                font_size: 6,
            })
        );
    }

    #[test]
    fn unknown_dictionary() {
        let args = parse(&["-d", "50"]);
        assert_eq!(args.dictionary(), Err(DictionaryError::UnknownId(50)));
        assert_eq!(parse(&["-d", "99"]).dictionary(), Ok(DictionarySpec::Custom3x3x32));
    }
}

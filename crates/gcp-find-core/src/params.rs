//! Marker detector thresholds.
//!
//! [`DetectorParams`] mirrors the tunables of OpenCV's ArUco
//! `DetectorParameters` and is forwarded to the backend unchanged. Defaults
//! match the library defaults. [`DetectorParamOverrides`] carries optional
//! per-field overrides (from the command line or a JSON file) that are layered
//! on top of a base configuration.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Subpixel corner refinement applied by the detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerRefinement {
    #[default]
    None,
    Subpix,
    Contour,
    Apriltag,
}

impl CornerRefinement {
    /// Numeric code used by OpenCV (`CORNER_REFINE_*`).
    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Subpix => 1,
            Self::Contour => 2,
            Self::Apriltag => 3,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, ParamsError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Subpix),
            2 => Ok(Self::Contour),
            3 => Ok(Self::Apriltag),
            other => Err(ParamsError::UnknownRefinement(other)),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("unknown corner refinement method {0} (expected 0..=3)")]
    UnknownRefinement(i32),
    #[error("adaptive threshold window min size must be >= 3 (got {0})")]
    WindowMinTooSmall(i32),
    #[error("adaptive threshold window max size {max} is below min size {min}")]
    WindowRange { min: i32, max: i32 },
    #[error("adaptive threshold window step must be > 0 (got {0})")]
    WindowStep(i32),
    #[error("{name} must be > 0 (got {value})")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must be >= 0 (got {value})")]
    Negative { name: &'static str, value: f64 },
    #[error("max marker perimeter rate {max} is below min rate {min}")]
    PerimeterRange { min: f64, max: f64 },
    #[error("{name} must lie in [0, 1] (got {value})")]
    NotAFraction { name: &'static str, value: f64 },
}

#[derive(thiserror::Error, Debug)]
pub enum ParamsIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Thresholds forwarded verbatim to the marker detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Also look for markers with inverted (white-on-black) codes.
    pub detect_inverted_marker: bool,
    pub adaptive_thresh_win_size_min: i32,
    pub adaptive_thresh_win_size_max: i32,
    pub adaptive_thresh_win_size_step: i32,
    pub adaptive_thresh_constant: f64,
    /// Minimum marker perimeter relative to the largest image side.
    pub min_marker_perimeter_rate: f64,
    /// Maximum marker perimeter relative to the largest image side.
    pub max_marker_perimeter_rate: f64,
    pub polygonal_approx_accuracy_rate: f64,
    /// Minimum distance between corners of one marker, relative to its perimeter.
    pub min_corner_distance_rate: f64,
    /// Minimum distance between corners of different markers, relative to perimeter.
    pub min_marker_distance_rate: f64,
    /// Minimum distance of any marker corner to the image border, in pixels.
    pub min_distance_to_border: i32,
    pub marker_border_bits: i32,
    pub min_otsu_std_dev: f64,
    pub perspective_remove_pixel_per_cell: i32,
    pub perspective_remove_ignored_margin_per_cell: f64,
    pub max_erroneous_bits_in_border_rate: f64,
    pub error_correction_rate: f64,
    pub corner_refinement: CornerRefinement,
    pub corner_refinement_win_size: i32,
    pub corner_refinement_max_iterations: i32,
    pub corner_refinement_min_accuracy: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            detect_inverted_marker: false,
            adaptive_thresh_win_size_min: 3,
            adaptive_thresh_win_size_max: 23,
            adaptive_thresh_win_size_step: 10,
            adaptive_thresh_constant: 7.0,
            min_marker_perimeter_rate: 0.03,
            max_marker_perimeter_rate: 4.0,
            polygonal_approx_accuracy_rate: 0.03,
            min_corner_distance_rate: 0.05,
            min_marker_distance_rate: 0.05,
            min_distance_to_border: 3,
            marker_border_bits: 1,
            min_otsu_std_dev: 5.0,
            perspective_remove_pixel_per_cell: 4,
            perspective_remove_ignored_margin_per_cell: 0.13,
            max_erroneous_bits_in_border_rate: 0.35,
            error_correction_rate: 0.6,
            corner_refinement: CornerRefinement::None,
            corner_refinement_win_size: 5,
            corner_refinement_max_iterations: 30,
            corner_refinement_min_accuracy: 0.1,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ParamsError::Negative { name, value })
    }
}

fn fraction(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ParamsError::NotAFraction { name, value })
    }
}

impl DetectorParams {
    /// Load parameters from a JSON file. Missing fields keep their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ParamsIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Reject values the detector would refuse at runtime.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.adaptive_thresh_win_size_min < 3 {
            return Err(ParamsError::WindowMinTooSmall(
                self.adaptive_thresh_win_size_min,
            ));
        }
        if self.adaptive_thresh_win_size_max < self.adaptive_thresh_win_size_min {
            return Err(ParamsError::WindowRange {
                min: self.adaptive_thresh_win_size_min,
                max: self.adaptive_thresh_win_size_max,
            });
        }
        if self.adaptive_thresh_win_size_step <= 0 {
            return Err(ParamsError::WindowStep(self.adaptive_thresh_win_size_step));
        }
        positive("min marker perimeter rate", self.min_marker_perimeter_rate)?;
        positive("max marker perimeter rate", self.max_marker_perimeter_rate)?;
        if self.max_marker_perimeter_rate < self.min_marker_perimeter_rate {
            return Err(ParamsError::PerimeterRange {
                min: self.min_marker_perimeter_rate,
                max: self.max_marker_perimeter_rate,
            });
        }
        positive(
            "polygonal approx accuracy rate",
            self.polygonal_approx_accuracy_rate,
        )?;
        non_negative("min corner distance rate", self.min_corner_distance_rate)?;
        non_negative("min marker distance rate", self.min_marker_distance_rate)?;
        non_negative(
            "min distance to border",
            f64::from(self.min_distance_to_border),
        )?;
        positive("marker border bits", f64::from(self.marker_border_bits))?;
        non_negative("min otsu std dev", self.min_otsu_std_dev)?;
        positive(
            "perspective remove pixel per cell",
            f64::from(self.perspective_remove_pixel_per_cell),
        )?;
        fraction(
            "perspective remove ignored margin per cell",
            self.perspective_remove_ignored_margin_per_cell,
        )?;
        fraction(
            "max erroneous bits in border rate",
            self.max_erroneous_bits_in_border_rate,
        )?;
        fraction("error correction rate", self.error_correction_rate)?;
        positive(
            "corner refinement window size",
            f64::from(self.corner_refinement_win_size),
        )?;
        positive(
            "corner refinement max iterations",
            f64::from(self.corner_refinement_max_iterations),
        )?;
        positive(
            "corner refinement min accuracy",
            self.corner_refinement_min_accuracy,
        )?;
        Ok(())
    }
}

/// Optional overrides applied on top of a base [`DetectorParams`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorParamOverrides {
    #[serde(default)]
    pub detect_inverted_marker: Option<bool>,
    #[serde(default)]
    pub adaptive_thresh_win_size_min: Option<i32>,
    #[serde(default)]
    pub adaptive_thresh_win_size_max: Option<i32>,
    #[serde(default)]
    pub adaptive_thresh_win_size_step: Option<i32>,
    #[serde(default)]
    pub adaptive_thresh_constant: Option<f64>,
    #[serde(default)]
    pub min_marker_perimeter_rate: Option<f64>,
    #[serde(default)]
    pub max_marker_perimeter_rate: Option<f64>,
    #[serde(default)]
    pub polygonal_approx_accuracy_rate: Option<f64>,
    #[serde(default)]
    pub min_corner_distance_rate: Option<f64>,
    #[serde(default)]
    pub min_marker_distance_rate: Option<f64>,
    #[serde(default)]
    pub min_distance_to_border: Option<i32>,
    #[serde(default)]
    pub marker_border_bits: Option<i32>,
    #[serde(default)]
    pub min_otsu_std_dev: Option<f64>,
    #[serde(default)]
    pub perspective_remove_pixel_per_cell: Option<i32>,
    #[serde(default)]
    pub perspective_remove_ignored_margin_per_cell: Option<f64>,
    #[serde(default)]
    pub max_erroneous_bits_in_border_rate: Option<f64>,
    #[serde(default)]
    pub error_correction_rate: Option<f64>,
    #[serde(default)]
    pub corner_refinement: Option<CornerRefinement>,
    #[serde(default)]
    pub corner_refinement_win_size: Option<i32>,
    #[serde(default)]
    pub corner_refinement_max_iterations: Option<i32>,
    #[serde(default)]
    pub corner_refinement_min_accuracy: Option<f64>,
}

macro_rules! apply_fields {
    ($src:expr, $dst:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(v) = $src.$field {
                $dst.$field = v;
            }
        )+
    };
}

impl DetectorParamOverrides {
    /// Overwrite every field of `params` that has an override set.
    pub fn apply_to(&self, params: &mut DetectorParams) {
        apply_fields!(
            self,
            params,
            detect_inverted_marker,
            adaptive_thresh_win_size_min,
            adaptive_thresh_win_size_max,
            adaptive_thresh_win_size_step,
            adaptive_thresh_constant,
            min_marker_perimeter_rate,
            max_marker_perimeter_rate,
            polygonal_approx_accuracy_rate,
            min_corner_distance_rate,
            min_marker_distance_rate,
            min_distance_to_border,
            marker_border_bits,
            min_otsu_std_dev,
            perspective_remove_pixel_per_cell,
            perspective_remove_ignored_margin_per_cell,
            max_erroneous_bits_in_border_rate,
            error_correction_rate,
            corner_refinement,
            corner_refinement_win_size,
            corner_refinement_max_iterations,
            corner_refinement_min_accuracy,
        );
    }

    /// `base` with these overrides applied.
    pub fn resolve(&self, base: DetectorParams) -> DetectorParams {
        let mut params = base;
        self.apply_to(&mut params);
        params
    }
}

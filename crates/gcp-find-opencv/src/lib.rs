//! OpenCV ArUco backend for `gcp-find`.
//!
//! Wraps `cv::aruco::ArucoDetector` behind the [`MarkerDetector`] trait. All
//! thresholds come from [`DetectorParams`] and are copied into OpenCV's
//! `DetectorParameters` one to one.

use gcp_find_core::{DetectedMarker, DetectorParams, DictionarySpec, MarkerDetector};
use image::GrayImage;
use nalgebra::Point2;
use opencv::core::{Mat, Point2f, Scalar, Vector, CV_8UC1};
use opencv::objdetect::{
    extend_dictionary_def, get_predefined_dictionary_i32, ArucoDetector, DetectorParameters,
    Dictionary,
};
use opencv::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by the OpenCV backend.
#[derive(thiserror::Error, Debug)]
pub enum OpencvBackendError {
    #[error("OpenCV error: {0}")]
    Cv(#[from] opencv::Error),
    #[error("image too large for OpenCV ({width}x{height})")]
    ImageTooLarge { width: u32, height: u32 },
    #[error("detector returned {corners} corner sets for {ids} ids")]
    Mismatch { corners: usize, ids: usize },
    #[error("marker {id} has {count} corners, expected 4")]
    BadCorners { id: i32, count: usize },
    #[error("detector returned negative marker id {0}")]
    NegativeId(i32),
}

/// Number of markers in the generated 3x3 dictionary.
const CUSTOM_MARKERS: i32 = 32;
const CUSTOM_MARKER_BITS: i32 = 3;

fn build_dictionary(spec: DictionarySpec) -> Result<Dictionary, OpencvBackendError> {
    let dict = match spec {
        DictionarySpec::Predefined { id, .. } => get_predefined_dictionary_i32(id)?,
        DictionarySpec::Custom3x3x32 => extend_dictionary_def(CUSTOM_MARKERS, CUSTOM_MARKER_BITS)?,
    };
    Ok(dict)
}

fn build_parameters(p: &DetectorParams) -> Result<DetectorParameters, OpencvBackendError> {
    let mut cv = DetectorParameters::default()?;
    cv.set_detect_inverted_marker(p.detect_inverted_marker);
    cv.set_adaptive_thresh_win_size_min(p.adaptive_thresh_win_size_min);
    cv.set_adaptive_thresh_win_size_max(p.adaptive_thresh_win_size_max);
    cv.set_adaptive_thresh_win_size_step(p.adaptive_thresh_win_size_step);
    cv.set_adaptive_thresh_constant(p.adaptive_thresh_constant);
    cv.set_min_marker_perimeter_rate(p.min_marker_perimeter_rate);
    cv.set_max_marker_perimeter_rate(p.max_marker_perimeter_rate);
    cv.set_polygonal_approx_accuracy_rate(p.polygonal_approx_accuracy_rate);
    cv.set_min_corner_distance_rate(p.min_corner_distance_rate);
    cv.set_min_marker_distance_rate(p.min_marker_distance_rate);
    cv.set_min_distance_to_border(p.min_distance_to_border);
    cv.set_marker_border_bits(p.marker_border_bits);
    cv.set_min_otsu_std_dev(p.min_otsu_std_dev);
    cv.set_perspective_remove_pixel_per_cell(p.perspective_remove_pixel_per_cell);
    cv.set_perspective_remove_ignored_margin_per_cell(
        p.perspective_remove_ignored_margin_per_cell,
    );
    cv.set_max_erroneous_bits_in_border_rate(p.max_erroneous_bits_in_border_rate);
    cv.set_error_correction_rate(p.error_correction_rate);
    cv.set_corner_refinement_method(p.corner_refinement.code());
    cv.set_corner_refinement_win_size(p.corner_refinement_win_size);
    cv.set_corner_refinement_max_iterations(p.corner_refinement_max_iterations);
    cv.set_corner_refinement_min_accuracy(p.corner_refinement_min_accuracy);
    Ok(cv)
}

/// Copy an 8-bit grayscale image into a freshly allocated `Mat`.
fn gray_to_mat(img: &GrayImage) -> Result<Mat, OpencvBackendError> {
    let too_large = || OpencvBackendError::ImageTooLarge {
        width: img.width(),
        height: img.height(),
    };
    let rows = i32::try_from(img.height()).map_err(|_| too_large())?;
    let cols = i32::try_from(img.width()).map_err(|_| too_large())?;
    let mut mat = Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(0.0))?;
    mat.data_bytes_mut()?.copy_from_slice(img.as_raw());
    Ok(mat)
}

fn adapt_marker(id: i32, corners: &Vector<Point2f>) -> Result<DetectedMarker, OpencvBackendError> {
    let id_u32 = u32::try_from(id).map_err(|_| OpencvBackendError::NegativeId(id))?;
    if corners.len() != 4 {
        return Err(OpencvBackendError::BadCorners {
            id,
            count: corners.len(),
        });
    }
    let mut out = [Point2::origin(); 4];
    for (dst, c) in out.iter_mut().zip(corners.iter()) {
        *dst = Point2::new(c.x, c.y);
    }
    Ok(DetectedMarker::new(id_u32, out))
}

/// ArUco marker detector backed by OpenCV's `objdetect` module.
pub struct OpencvDetector {
    detector: ArucoDetector,
}

impl OpencvDetector {
    pub fn new(
        dictionary: DictionarySpec,
        params: &DetectorParams,
    ) -> Result<Self, OpencvBackendError> {
        let dict = build_dictionary(dictionary)?;
        let cv_params = build_parameters(params)?;
        let mut detector = ArucoDetector::new_def()?;
        detector.set_dictionary(&dict)?;
        detector.set_detector_parameters(&cv_params)?;
        log::debug!("OpenCV ArUco detector ready ({})", dictionary.name());
        Ok(Self { detector })
    }
}

impl MarkerDetector for OpencvDetector {
    type Error = OpencvBackendError;

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<DetectedMarker>, OpencvBackendError> {
        let mat = gray_to_mat(image)?;
        let mut corners: Vector<Vector<Point2f>> = Vector::new();
        let mut ids: Vector<i32> = Vector::new();
        self.detector.detect_markers_def(&mat, &mut corners, &mut ids)?;

        if corners.len() != ids.len() {
            return Err(OpencvBackendError::Mismatch {
                corners: corners.len(),
                ids: ids.len(),
            });
        }
        ids.iter()
            .zip(corners.iter())
            .map(|(id, quad)| adapt_marker(id, &quad))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(points: &[(f32, f32)]) -> Vector<Point2f> {
        points.iter().map(|&(x, y)| Point2f::new(x, y)).collect()
    }

    #[test]
    fn adapts_opencv_quad() {
        let m = adapt_marker(
            17,
            &quad(&[(1.0, 2.0), (11.0, 2.0), (11.0, 12.0), (1.0, 12.0)]),
        )
        .unwrap();
        assert_eq!(m.id, 17);
        assert_eq!(m.corners[2], Point2::new(11.0, 12.0));
        assert_eq!(m.pixel_center(), (6, 7));
    }

    #[test]
    fn rejects_malformed_quads() {
        assert!(matches!(
            adapt_marker(1, &quad(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])),
            Err(OpencvBackendError::BadCorners { id: 1, count: 3 })
        ));
        assert!(matches!(
            adapt_marker(-2, &quad(&[(0.0, 0.0); 4])),
            Err(OpencvBackendError::NegativeId(-2))
        ));
    }

    #[test]
    fn gray_image_is_copied_into_mat() {
        let img = GrayImage::from_fn(5, 3, |x, y| image::Luma([(y * 5 + x) as u8]));
        let mat = gray_to_mat(&img).unwrap();
        assert_eq!(mat.rows(), 3);
        assert_eq!(mat.cols(), 5);
        assert_eq!(*mat.at_2d::<u8>(2, 4).unwrap(), 14);
    }

    #[test]
    fn default_and_custom_dictionaries_build() {
        for spec in [DictionarySpec::default(), DictionarySpec::Custom3x3x32] {
            assert!(OpencvDetector::new(spec, &DetectorParams::default()).is_ok());
        }
    }

    #[test]
    fn blank_frame_has_no_markers() {
        let mut det = OpencvDetector::new(DictionarySpec::default(), &DetectorParams::default())
            .unwrap();
        let markers = det.detect(&GrayImage::new(64, 64)).unwrap();
        assert!(markers.is_empty());
    }
}

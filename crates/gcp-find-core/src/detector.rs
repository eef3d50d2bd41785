use image::GrayImage;

use crate::marker::DetectedMarker;

/// Seam to the external marker detection library.
///
/// Implementations own whatever dictionary and threshold state they need and
/// return every marker found on a grayscale frame, in detection order.
pub trait MarkerDetector {
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect(&mut self, image: &GrayImage) -> Result<Vec<DetectedMarker>, Self::Error>;
}

impl<D: MarkerDetector + ?Sized> MarkerDetector for Box<D> {
    type Error = D::Error;

    fn detect(&mut self, image: &GrayImage) -> Result<Vec<DetectedMarker>, Self::Error> {
        (**self).detect(image)
    }
}

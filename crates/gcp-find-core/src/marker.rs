//! Detected markers and their image-space centroids.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Numeric marker id as decoded from the dictionary.
pub type MarkerId = u32;

/// One marker reported by a [`crate::MarkerDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedMarker {
    pub id: MarkerId,
    /// Corner positions in image pixels, in detector order
    /// (top-left, top-right, bottom-right, bottom-left of the marker).
    pub corners: [Point2<f32>; 4],
}

impl DetectedMarker {
    pub fn new(id: MarkerId, corners: [Point2<f32>; 4]) -> Self {
        Self { id, corners }
    }

    /// Unweighted mean of the four corners.
    pub fn center(&self) -> Point2<f64> {
        let (sx, sy) = self.corners.iter().fold((0.0f64, 0.0f64), |(sx, sy), c| {
            (sx + f64::from(c.x), sy + f64::from(c.y))
        });
        Point2::new(sx / 4.0, sy / 4.0)
    }

    /// Integer pixel centroid, each axis rounded half-to-even.
    pub fn pixel_center(&self) -> (i64, i64) {
        let c = self.center();
        (c.x.round_ties_even() as i64, c.y.round_ties_even() as i64)
    }

    pub fn observation(&self) -> MarkerObservation {
        let (x, y) = self.pixel_center();
        MarkerObservation { id: self.id, x, y }
    }
}

/// A marker reduced to the integer pixel position written to GCP files.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MarkerObservation {
    pub id: MarkerId,
    pub x: i64,
    pub y: i64,
}

/// Number of markers whose id already appeared earlier in `markers`.
pub fn duplicate_count(markers: &[DetectedMarker]) -> usize {
    let mut ids = sorted_ids(markers);
    let total = ids.len();
    ids.dedup();
    total - ids.len()
}

/// All ids in ascending order, duplicates kept.
pub fn sorted_ids(markers: &[DetectedMarker]) -> Vec<MarkerId> {
    let mut ids: Vec<MarkerId> = markers.iter().map(|m| m.id).collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(id: MarkerId, x0: f32, y0: f32, side: f32) -> DetectedMarker {
        DetectedMarker::new(
            id,
            [
                Point2::new(x0, y0),
                Point2::new(x0 + side, y0),
                Point2::new(x0 + side, y0 + side),
                Point2::new(x0, y0 + side),
            ],
        )
    }

    #[test]
    fn center_is_mean_of_corners() {
        let m = DetectedMarker::new(
            7,
            [
                Point2::new(10.0, 20.0),
                Point2::new(30.0, 22.0),
                Point2::new(31.0, 41.0),
                Point2::new(9.0, 39.0),
            ],
        );
        let c = m.center();
        assert_relative_eq!(c.x, 20.0);
        assert_relative_eq!(c.y, 30.5);
    }

    #[test]
    fn pixel_center_rounds_ties_to_even() {
        // mean x = 10.5, mean y = 11.5
        let m = square(1, 10.0, 11.0, 1.0);
        assert_eq!(m.pixel_center(), (10, 12));

        let m = square(1, 100.2, 50.0, 1.0);
        assert_eq!(m.pixel_center(), (101, 50));
    }

    #[test]
    fn observation_keeps_id() {
        let obs = square(42, 0.0, 0.0, 4.0).observation();
        assert_eq!(obs, MarkerObservation { id: 42, x: 2, y: 2 });
    }

    #[test]
    fn duplicates_are_counted_not_removed() {
        let markers = vec![
            square(3, 0.0, 0.0, 2.0),
            square(1, 10.0, 0.0, 2.0),
            square(3, 20.0, 0.0, 2.0),
            square(3, 30.0, 0.0, 2.0),
        ];
        assert_eq!(duplicate_count(&markers), 2);
        assert_eq!(sorted_ids(&markers), vec![1, 3, 3, 3]);
        assert_eq!(duplicate_count(&markers[..2]), 0);
    }
}

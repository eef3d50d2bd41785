//! GCP list layouts for downstream photogrammetry tools.

use serde::{Deserialize, Serialize};

use crate::coords::WorldCoord;
use crate::marker::MarkerObservation;

/// Target layout of the GCP list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// `id x y image`, or `E N H x y image` when coordinates are known.
    #[default]
    Plain,
    /// OpenDroneMap `gcp_list.txt`: `E N H x y image id`.
    Odm,
    /// VisualSfM GCP file: `image x y E N H`.
    VisualSfm,
}

impl OutputFormat {
    /// Optional first line of the output (ODM coordinate system header).
    pub fn header(self, epsg: Option<u32>) -> Option<String> {
        match (self, epsg) {
            (Self::Odm, Some(code)) => Some(format!("EPSG:{code}")),
            _ => None,
        }
    }

    /// Format one observation, or `None` when this layout needs coordinates
    /// that are not available.
    pub fn format_line(
        self,
        obs: &MarkerObservation,
        image_name: &str,
        coord: Option<&WorldCoord>,
    ) -> Option<String> {
        let MarkerObservation { id, x, y } = *obs;
        match (self, coord) {
            (Self::Odm, Some(c)) => Some(format!(
                "{:.3} {:.3} {:.3} {x} {y} {image_name} {id}",
                c.easting, c.northing, c.elevation
            )),
            (Self::VisualSfm, Some(c)) => Some(format!(
                "{image_name} {x} {y} {:.3} {:.3} {:.3}",
                c.easting, c.northing, c.elevation
            )),
            (Self::Plain, Some(c)) => Some(format!(
                "{:.3} {:.3} {:.3} {x} {y} {image_name}",
                c.easting, c.northing, c.elevation
            )),
            (Self::Plain, None) => Some(format!("{id} {x} {y} {image_name}")),
            (Self::Odm | Self::VisualSfm, None) => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Plain => "plain",
            Self::Odm => "ODM",
            Self::VisualSfm => "VisualSfM",
        })
    }
}

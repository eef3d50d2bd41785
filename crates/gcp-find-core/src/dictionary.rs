//! Catalog of marker dictionaries understood by the detector backend.
//!
//! Ids follow OpenCV's `PredefinedDictionaryType` numbering so that values
//! from existing GCP workflows keep working. Id [`CUSTOM_3X3_32_ID`] selects a
//! small 3x3 dictionary with 32 markers that the backend generates on demand.

/// Id of the generated 3x3, 32-marker dictionary.
pub const CUSTOM_3X3_32_ID: i32 = 99;

/// Default dictionary id (`DICT_4X4_100`).
pub const DEFAULT_DICTIONARY_ID: i32 = 1;

const PREDEFINED: &[(i32, &str)] = &[
    (0, "DICT_4X4_50"),
    (1, "DICT_4X4_100"),
    (2, "DICT_4X4_250"),
    (3, "DICT_4X4_1000"),
    (4, "DICT_5X5_50"),
    (5, "DICT_5X5_100"),
    (6, "DICT_5X5_250"),
    (7, "DICT_5X5_1000"),
    (8, "DICT_6X6_50"),
    (9, "DICT_6X6_100"),
    (10, "DICT_6X6_250"),
    (11, "DICT_6X6_1000"),
    (12, "DICT_7X7_50"),
    (13, "DICT_7X7_100"),
    (14, "DICT_7X7_250"),
    (15, "DICT_7X7_1000"),
    (16, "DICT_ARUCO_ORIGINAL"),
    (17, "DICT_APRILTAG_16h5"),
    (18, "DICT_APRILTAG_25h9"),
    (19, "DICT_APRILTAG_36h10"),
    (20, "DICT_APRILTAG_36h11"),
    (21, "DICT_ARUCO_MIP_36h12"),
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("unknown marker dictionary id {0} (use --list to see the available ones)")]
    UnknownId(i32),
}

/// A dictionary selection, resolved from a numeric id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DictionarySpec {
    /// One of the dictionaries shipped with the detector library.
    Predefined { id: i32, name: &'static str },
    /// 32 markers of 3x3 bits, generated by the backend.
    Custom3x3x32,
}

impl DictionarySpec {
    pub fn from_id(id: i32) -> Result<Self, DictionaryError> {
        if id == CUSTOM_3X3_32_ID {
            return Ok(Self::Custom3x3x32);
        }
        PREDEFINED
            .iter()
            .find(|(known, _)| *known == id)
            .map(|&(id, name)| Self::Predefined { id, name })
            .ok_or(DictionaryError::UnknownId(id))
    }

    pub fn id(&self) -> i32 {
        match self {
            Self::Predefined { id, .. } => *id,
            Self::Custom3x3x32 => CUSTOM_3X3_32_ID,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Predefined { name, .. } => name,
            Self::Custom3x3x32 => "DICT_3X3_32 custom",
        }
    }
}

impl Default for DictionarySpec {
    fn default() -> Self {
        Self::Predefined {
            id: DEFAULT_DICTIONARY_ID,
            name: "DICT_4X4_100",
        }
    }
}

/// All known dictionaries as `(id, name)`, sorted by id.
pub fn list_dictionaries() -> Vec<(i32, &'static str)> {
    let mut out: Vec<(i32, &'static str)> = PREDEFINED.to_vec();
    out.push((CUSTOM_3X3_32_ID, DictionarySpec::Custom3x3x32.name()));
    out.sort_by_key(|&(id, _)| id);
    out
}

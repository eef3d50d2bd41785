//! World coordinates of ground control points.
//!
//! Input is plain text, one record per line: `id easting northing elevation`.
//! Fields past the fourth are ignored. Malformed lines are reported and
//! skipped so a single typo does not discard a whole survey file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::marker::MarkerId;

/// Surveyed position of a GCP.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldCoord {
    pub easting: f64,
    pub northing: f64,
    pub elevation: f64,
}

impl WorldCoord {
    pub fn new(easting: f64, northing: f64, elevation: f64) -> Self {
        Self {
            easting,
            northing,
            elevation,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CoordsError {
    #[error("cannot open input file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reason a single input line was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineIssue {
    TooFewFields,
    BadId,
    BadCoordinate,
}

/// Marker id to world coordinate lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoordTable {
    coords: HashMap<MarkerId, WorldCoord>,
}

impl CoordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a coordinate file from disk.
    pub fn load(path: impl AsRef<Path>, separator: &str) -> Result<Self, CoordsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CoordsError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(BufReader::new(file), separator)
    }

    /// Parse records from any buffered reader.
    pub fn parse(reader: impl BufRead, separator: &str) -> Result<Self, CoordsError> {
        let mut table = Self::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line, separator) {
                Ok((id, coord)) => {
                    table.insert(id, coord);
                }
                Err(LineIssue::TooFewFields) => warn!("Illegal input: {line}"),
                Err(LineIssue::BadId) => warn!("Illegal point id: {line}"),
                Err(LineIssue::BadCoordinate) => warn!("Illegal coordinates: {line}"),
            }
        }
        Ok(table)
    }

    /// Insert or replace a record; returns the previous value for `id`.
    pub fn insert(&mut self, id: MarkerId, coord: WorldCoord) -> Option<WorldCoord> {
        self.coords.insert(id, coord)
    }

    pub fn get(&self, id: MarkerId) -> Option<&WorldCoord> {
        self.coords.get(&id)
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.coords.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

impl FromIterator<(MarkerId, WorldCoord)> for CoordTable {
    fn from_iter<T: IntoIterator<Item = (MarkerId, WorldCoord)>>(iter: T) -> Self {
        Self {
            coords: iter.into_iter().collect(),
        }
    }
}

fn split_fields<'a>(line: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.trim().is_empty() {
        line.split_whitespace().collect()
    } else {
        line.trim().split(separator).map(str::trim).collect()
    }
}

/// Parse one `id east north elev` record.
pub fn parse_line(line: &str, separator: &str) -> Result<(MarkerId, WorldCoord), LineIssue> {
    let fields = split_fields(line, separator);
    if fields.len() < 4 {
        return Err(LineIssue::TooFewFields);
    }
    let id: MarkerId = fields[0].parse().map_err(|_| LineIssue::BadId)?;
    let mut xyz = [0.0f64; 3];
    for (dst, raw) in xyz.iter_mut().zip(&fields[1..4]) {
        *dst = raw.parse().map_err(|_| LineIssue::BadCoordinate)?;
    }
    Ok((id, WorldCoord::new(xyz[0], xyz[1], xyz[2])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_space_separated_records() {
        let input = "1 650000.123 240000.5 112.25\n2  650010.0   240010.0 113.0 extra\n";
        let table = CoordTable::parse(Cursor::new(input), " ").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(1),
            Some(&WorldCoord::new(650000.123, 240000.5, 112.25))
        );
        assert_eq!(
            table.get(2),
            Some(&WorldCoord::new(650010.0, 240010.0, 113.0))
        );
    }

    #[test]
    fn parses_custom_separator() {
        let input = "5; 1.5 ;2.5; 3.5\n";
        let table = CoordTable::parse(Cursor::new(input), ";").unwrap();
        assert_eq!(table.get(5), Some(&WorldCoord::new(1.5, 2.5, 3.5)));
    }

    #[test]
    fn tab_separator_splits_on_whitespace() {
        let table = CoordTable::parse(Cursor::new("3\t1\t2\t3\n"), "\t").unwrap();
        assert!(table.contains(3));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let input = "1 2 3\n\nx 1 2 3\n4 1 two 3\n-1 1 2 3\n7 1 2 3\n";
        let table = CoordTable::parse(Cursor::new(input), " ").unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains(7));
    }

    #[test]
    fn line_issues_are_classified() {
        assert_eq!(parse_line("1 2 3", " "), Err(LineIssue::TooFewFields));
        assert_eq!(parse_line("a 2 3 4", " "), Err(LineIssue::BadId));
        assert_eq!(parse_line("1 2 x 4", " "), Err(LineIssue::BadCoordinate));
        assert_eq!(parse_line("1,2,3", ","), Err(LineIssue::TooFewFields));
    }

    #[test]
    fn later_record_wins() {
        let table = CoordTable::parse(Cursor::new("9 1 1 1\n9 2 2 2\n"), " ").unwrap();
        assert_eq!(table.get(9), Some(&WorldCoord::new(2.0, 2.0, 2.0)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CoordTable::load("/definitely/not/here.txt", " ").unwrap_err();
        assert!(matches!(err, CoordsError::Open { .. }));
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}

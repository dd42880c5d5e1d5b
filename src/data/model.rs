use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the borehole table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV reader infers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Missing,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Missing => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Missing => write!(f, "<NA>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for absent cells and for floating NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// BoreholeRecord – one row of the concatenated table
// ---------------------------------------------------------------------------

/// One borehole observation, aligned with [`BoreholeDataset::columns`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoreholeRecord {
    /// Row number in the concatenated table, before incomplete rows were dropped.
    pub index: usize,
    /// Unit prefix of the file the row came from.
    pub surface: String,
    /// Cell values, one per dataset column (the `surface` column included).
    pub values: Vec<CellValue>,
}

// ---------------------------------------------------------------------------
// Extent – model bounding box derived from the table
// ---------------------------------------------------------------------------

/// Names of the coordinate columns used for [`BoreholeDataset::extent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateColumns {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl Default for CoordinateColumns {
    fn default() -> Self {
        Self {
            x: "x".to_string(),
            y: "y".to_string(),
            z: "z".to_string(),
        }
    }
}

/// `[xmin, xmax, ymin, ymax, zmin, zmax]` box of a model grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

impl Extent {
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.xmin, self.xmax, self.ymin, self.ymax, self.zmin, self.zmax,
        ]
    }
}

// ---------------------------------------------------------------------------
// BoreholeDataset – the complete loaded table
// ---------------------------------------------------------------------------

pub const SURFACE_COLUMN: &str = "surface";

/// All selected borehole rows, concatenated in file-processing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoreholeDataset {
    /// Ordered column names (union over files, in order of first appearance).
    pub columns: Vec<String>,
    pub records: Vec<BoreholeRecord>,
}

impl BoreholeDataset {
    pub fn new(columns: Vec<String>, records: Vec<BoreholeRecord>) -> Self {
        Self { columns, records }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    /// Iterate one column's values top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a CellValue> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.records.iter().map(move |r| &r.values[idx]))
    }

    /// Distinct surface labels, in order of first appearance.
    pub fn surfaces(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.surface.as_str()))
            .map(|r| r.surface.as_str())
            .collect()
    }

    /// Rows belonging to one surface.
    pub fn rows_for<'a>(&'a self, surface: &'a str) -> impl Iterator<Item = &'a BoreholeRecord> + 'a {
        self.records.iter().filter(move |r| r.surface == surface)
    }

    /// Model extent: horizontal bounds of the data, vertical bounds from
    /// `depth` up to the highest observation.
    ///
    /// Returns `None` when a coordinate column is absent or holds no numbers.
    pub fn extent(&self, depth: f64, columns: &CoordinateColumns) -> Option<Extent> {
        let (xmin, xmax) = self.numeric_range(&columns.x)?;
        let (ymin, ymax) = self.numeric_range(&columns.y)?;
        let (_, zmax) = self.numeric_range(&columns.z)?;
        Some(Extent {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin: depth,
            zmax,
        })
    }

    fn numeric_range(&self, name: &str) -> Option<(f64, f64)> {
        self.column(name)?
            .filter_map(CellValue::as_f64)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, surface: &str, x: f64, y: f64, z: f64) -> BoreholeRecord {
        BoreholeRecord {
            index,
            surface: surface.to_string(),
            values: vec![
                CellValue::Float(x),
                CellValue::Float(y),
                CellValue::Float(z),
                CellValue::String(surface.to_string()),
            ],
        }
    }

    fn dataset() -> BoreholeDataset {
        BoreholeDataset::new(
            vec!["X".into(), "Y".into(), "Z".into(), SURFACE_COLUMN.into()],
            vec![
                record(0, "HL", 10.0, 200.0, -3.0),
                record(1, "BX", 15.0, 180.0, -12.5),
                record(3, "HL", 5.0, 220.0, 1.5),
            ],
        )
    }

    #[test]
    fn test_surfaces_keep_first_appearance_order() {
        assert_eq!(dataset().surfaces(), vec!["HL", "BX"]);
        assert_eq!(dataset().rows_for("HL").count(), 2);
    }

    #[test]
    fn test_extent_uses_depth_for_bottom() {
        let extent = dataset()
            .extent(-500.0, &CoordinateColumns::default())
            .expect("coordinates present");
        assert_eq!(extent.as_array(), [5.0, 15.0, 180.0, 220.0, -500.0, 1.5]);
    }

    #[test]
    fn test_extent_requires_coordinate_columns() {
        let cols = CoordinateColumns {
            x: "easting".into(),
            ..CoordinateColumns::default()
        };
        assert!(dataset().extent(-500.0, &cols).is_none());
    }

    #[test]
    fn test_nan_counts_as_missing() {
        assert!(CellValue::Float(f64::NAN).is_missing());
        assert!(CellValue::Missing.is_missing());
        assert!(!CellValue::Integer(0).is_missing());
        assert!(!CellValue::String(String::new()).is_missing());
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::filter::DatasetSelector;
use super::model::{BoreholeDataset, BoreholeRecord, CellValue, SURFACE_COLUMN};
use crate::error::{IngestError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load every selected `<unit>_*.csv` file under `dir` into one table.
///
/// Files are visited in file-name order. Each row is tagged with its file's
/// unit prefix in a `surface` column, the per-file tables are concatenated,
/// and any row holding a missing cell is dropped.
///
/// Fails with [`IngestError::NoDataFound`] when `dir` holds no `.csv` file and
/// with [`IngestError::EmptySelection`] when `selector` rejects all of them.
pub fn load_boreholes(dir: &Path, selector: &DatasetSelector) -> Result<BoreholeDataset> {
    if dir.as_os_str().is_empty() {
        return Err(IngestError::UnsetPath("borehole directory"));
    }

    let csv_files: Vec<(String, PathBuf)> = list_files(dir)?
        .into_iter()
        .filter(|(name, _)| name.ends_with(".csv"))
        .map(|(name, path)| (unit_prefix(&name).to_string(), path))
        .collect();

    if csv_files.is_empty() {
        return Err(IngestError::NoDataFound {
            path: dir.to_path_buf(),
        });
    }

    let found = csv_files.len();
    let selected = selector.apply(csv_files);
    if selected.is_empty() {
        return Err(IngestError::EmptySelection {
            path: dir.to_path_buf(),
            selector: selector.to_string(),
        });
    }
    debug!("selector {selector} kept {} of {found} csv files", selected.len());

    let tables = selected
        .iter()
        .map(|(unit, path)| read_unit_table(path, unit))
        .collect::<Result<Vec<_>>>()?;

    let mut dataset = concat_tables(tables);
    let before = dataset.len();
    drop_incomplete_rows(&mut dataset);

    info!(
        "loaded {} borehole rows from {} files in {:?} ({} incomplete rows dropped)",
        dataset.len(),
        selected.len(),
        dir,
        before - dataset.len()
    );
    Ok(dataset)
}

/// Unit code of a borehole file: the name up to the first `_`, or the file
/// stem when the name has no underscore.
pub fn unit_prefix(file_name: &str) -> &str {
    match file_name.split_once('_') {
        Some((unit, _)) => unit,
        None => Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name),
    }
}

/// Regular files directly under `dir`, sorted by name.
pub(crate) fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => files.push((name, path)),
            Err(name) => debug!("skipping non UTF-8 file name {name:?}"),
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

// ---------------------------------------------------------------------------
// Per-file CSV parsing
// ---------------------------------------------------------------------------

/// One parsed CSV file, `surface` column included.
struct UnitTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Markers read as missing values, as pandas does by default.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn read_unit_table(path: &Path, unit: &str) -> Result<UnitTable> {
    let csv_err = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?;
    if headers.is_empty() {
        return Err(IngestError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    let mut columns = dedup_headers(headers.iter());
    let width = columns.len();

    let surface_idx = match columns.iter().position(|c| c == SURFACE_COLUMN) {
        Some(idx) => idx,
        None => {
            columns.push(SURFACE_COLUMN.to_string());
            columns.len() - 1
        }
    };

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        if record.len() > width {
            return Err(IngestError::RaggedRow {
                path: path.to_path_buf(),
                line: record.position().map_or(0, |p| p.line()),
                expected: width,
                found: record.len(),
            });
        }

        let mut row = vec![CellValue::Missing; columns.len()];
        for (cell, value) in row.iter_mut().zip(record.iter()) {
            *cell = parse_cell(value);
        }
        row[surface_idx] = CellValue::String(unit.to_string());
        rows.push(row);
    }

    debug!("{:?}: {} rows, {} columns", path, rows.len(), width);
    Ok(UnitTable { columns, rows })
}

/// Rename repeated header names to `name.1`, `name.2`, ... so no column
/// shadows another. Suffixes skip names already present in the header.
fn dedup_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let headers: Vec<&str> = headers.collect();
    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for &header in &headers {
        let count = seen.entry(header).or_insert(0);
        if *count == 0 {
            *count = 1;
            columns.push(header.to_string());
            continue;
        }
        let mut renamed = format!("{header}.{count}");
        while headers.contains(&renamed.as_str()) || columns.contains(&renamed) {
            *count += 1;
            renamed = format!("{header}.{count}");
        }
        *count += 1;
        columns.push(renamed);
    }
    columns
}

fn parse_cell(raw: &str) -> CellValue {
    if MISSING_MARKERS.contains(&raw) {
        return CellValue::Missing;
    }
    let s = raw.trim();
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    match s {
        "True" | "true" | "TRUE" => CellValue::Bool(true),
        "False" | "false" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::String(raw.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Concatenation and cleanup
// ---------------------------------------------------------------------------

/// Stack tables vertically over the union of their columns.
fn concat_tables(tables: Vec<UnitTable>) -> BoreholeDataset {
    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for column in &table.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }
    let lookup: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let surface_idx = lookup[SURFACE_COLUMN];

    let mut records = Vec::new();
    for table in tables {
        let positions: Vec<usize> = table.columns.iter().map(|c| lookup[c.as_str()]).collect();
        for row in table.rows {
            let mut values = vec![CellValue::Missing; columns.len()];
            for (&pos, value) in positions.iter().zip(row) {
                values[pos] = value;
            }
            let surface = values[surface_idx].to_string();
            records.push(BoreholeRecord {
                index: records.len(),
                surface,
                values,
            });
        }
    }

    BoreholeDataset::new(columns, records)
}

fn drop_incomplete_rows(dataset: &mut BoreholeDataset) {
    dataset
        .records
        .retain(|r| !r.values.iter().any(CellValue::is_missing));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn test_unit_prefix() {
        assert_eq!(unit_prefix("HL_points.csv"), "HL");
        assert_eq!(unit_prefix("PZWA_a_b.csv"), "PZWA");
        assert_eq!(unit_prefix("KI.csv"), "KI");
    }

    #[test]
    fn test_parse_cell_types() {
        assert_eq!(parse_cell("42"), CellValue::Integer(42));
        assert_eq!(parse_cell("-3.5"), CellValue::Float(-3.5));
        assert_eq!(parse_cell("True"), CellValue::Bool(true));
        assert_eq!(parse_cell("clay"), CellValue::String("clay".into()));
        assert_eq!(parse_cell(""), CellValue::Missing);
        assert_eq!(parse_cell("NaN"), CellValue::Missing);
        assert_eq!(parse_cell("n/a"), CellValue::Missing);
    }

    #[test]
    fn test_surface_column_added_and_rows_tagged() {
        let dir = TempDir::new().unwrap();
        write(&dir, "HL_top.csv", "x,y,z\n1,2,3\n4,5,6\n");

        let ds = load_boreholes(dir.path(), &DatasetSelector::all()).unwrap();
        assert_eq!(ds.columns, vec!["x", "y", "z", "surface"]);
        assert_eq!(ds.len(), 2);
        assert!(ds.records.iter().all(|r| r.surface == "HL"));
        assert_eq!(ds.records[1].values[3], CellValue::String("HL".into()));
    }

    #[test]
    fn test_rows_with_missing_cells_are_dropped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "BX_a.csv", "x,y,z\n1,2,3\n4,,6\n7,8,NaN\n9,10\n11,12,13\n");

        let ds = load_boreholes(dir.path(), &DatasetSelector::all()).unwrap();
        assert_eq!(ds.len(), 2);
        let indices: Vec<usize> = ds.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 4]);
    }

    #[test]
    fn test_columns_missing_from_one_file_drop_its_rows() {
        let dir = TempDir::new().unwrap();
        write(&dir, "A_1.csv", "x,y,z\n1,2,3\n");
        write(&dir, "B_1.csv", "x,y,z,id\n1,2,3,7\n");

        let ds = load_boreholes(dir.path(), &DatasetSelector::all()).unwrap();
        assert_eq!(ds.columns, vec!["x", "y", "z", "surface", "id"]);
        assert_eq!(ds.surfaces(), vec!["B"]);
    }

    #[test]
    fn test_ragged_row_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "A_1.csv", "x,y\n1,2\n1,2,3\n");

        let err = load_boreholes(dir.path(), &DatasetSelector::all()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::RaggedRow {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_headers_keep_every_cell() {
        let dir = TempDir::new().unwrap();
        write(&dir, "HL_a.csv", "x,x,z\n1,2,3\n");

        let ds = load_boreholes(dir.path(), &DatasetSelector::all()).unwrap();
        assert_eq!(ds.columns, vec!["x", "x.1", "z", "surface"]);
        assert_eq!(
            ds.records[0].values,
            vec![
                CellValue::Integer(1),
                CellValue::Integer(2),
                CellValue::Integer(3),
                CellValue::String("HL".into()),
            ]
        );
    }

    #[test]
    fn test_dedup_headers_skips_taken_names() {
        let columns = dedup_headers(["a", "a", "a.1", "a"].into_iter());
        assert_eq!(columns, vec!["a", "a.2", "a.1", "a.3"]);
    }

    #[test]
    fn test_empty_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "HL_a.csv", "");

        let err = load_boreholes(dir.path(), &DatasetSelector::all()).unwrap_err();
        assert!(matches!(err, IngestError::EmptyFile { .. }));
    }

    #[test]
    fn test_non_csv_files_ignored() {
        let dir = TempDir::new().unwrap();
        write(&dir, "notes.txt", "hello");
        write(&dir, "HL_a.CSV.bak", "x\n1\n");

        let err = load_boreholes(dir.path(), &DatasetSelector::all()).unwrap_err();
        assert!(matches!(err, IngestError::NoDataFound { .. }));
    }

    #[test]
    fn test_empty_selection_is_reported() {
        let dir = TempDir::new().unwrap();
        write(&dir, "AAOP_a.csv", "x\n1\n");

        let err = load_boreholes(dir.path(), &DatasetSelector::mid()).unwrap_err();
        assert!(matches!(err, IngestError::EmptySelection { .. }));
    }

    #[test]
    fn test_empty_path_is_unset() {
        let err = load_boreholes(Path::new(""), &DatasetSelector::all()).unwrap_err();
        assert!(matches!(err, IngestError::UnsetPath(_)));
    }
}

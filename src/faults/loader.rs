use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::mesh::{extrude_trace, ExtrusionBounds, FaultCollection, FaultTrace};
use super::shp::ShapeFile;
use crate::data::loader::list_files;
use crate::error::{IngestError, Result};

/// Prefix of the shapefile holding the faults that offset the base unit.
pub const DEFAULT_FAULT_PREFIX: &str = "BR";

/// Which of the matching shapefiles are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaultFileSelection {
    /// Only the first match in name order; the rest are reported and skipped.
    #[default]
    FirstMatch,
    AllMatches,
}

impl FromStr for FaultFileSelection {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(FaultFileSelection::FirstMatch),
            "all" => Ok(FaultFileSelection::AllMatches),
            other => Err(IngestError::Config(format!(
                "fault file selection must be first or all, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for FaultFileSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultFileSelection::FirstMatch => write!(f, "first"),
            FaultFileSelection::AllMatches => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaultOptions {
    pub file_prefix: String,
    pub files: FaultFileSelection,
    pub bounds: ExtrusionBounds,
}

impl Default for FaultOptions {
    fn default() -> Self {
        Self {
            file_prefix: DEFAULT_FAULT_PREFIX.to_string(),
            files: FaultFileSelection::default(),
            bounds: ExtrusionBounds::default(),
        }
    }
}

/// Build one mesh per shape of the fault shapefile(s) in `dir`.
///
/// Returns `Ok(None)` when no `<prefix>*.shp` file exists: faults are an
/// optional enrichment, so the caller may carry on without them. A malformed
/// shapefile aborts the whole load.
pub fn load_fault_meshes(dir: &Path, options: &FaultOptions) -> Result<Option<FaultCollection>> {
    if dir.as_os_str().is_empty() {
        return Err(IngestError::UnsetPath("fault directory"));
    }

    let mut matches = find_fault_files(dir, &options.file_prefix)?;
    if matches.is_empty() {
        warn!("no {}*.shp files found in {:?}", options.file_prefix, dir);
        return Ok(None);
    }

    if options.files == FaultFileSelection::FirstMatch && matches.len() > 1 {
        warn!(
            "reading only {:?}; ignoring {} further fault files",
            matches[0],
            matches.len() - 1
        );
        matches.truncate(1);
    }

    let mut meshes = Vec::new();
    for path in &matches {
        for trace in read_fault_traces(path)? {
            if trace.is_empty() {
                warn!("{:?}: empty fault trace gives an empty mesh", path);
            } else if trace.len() == 1 {
                debug!("{:?}: single-point fault trace has no triangles", path);
            }
            let name = format!("fault{}", meshes.len());
            meshes.push(extrude_trace(name, &trace, options.bounds));
        }
    }

    info!(
        "built {} fault meshes from {} file(s) in {:?} (z {} to {})",
        meshes.len(),
        matches.len(),
        dir,
        options.bounds.zmin,
        options.bounds.zmax
    );
    Ok(Some(FaultCollection::new(meshes)))
}

/// `<prefix>*.shp` files under `dir`, sorted by name.
pub fn find_fault_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    Ok(list_files(dir)?
        .into_iter()
        .filter(|(name, path)| {
            name.starts_with(prefix)
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("shp"))
        })
        .map(|(_, path)| path)
        .collect())
}

/// Every shape of one shapefile as a 2D trace, in file order.
pub fn read_fault_traces(path: &Path) -> Result<Vec<FaultTrace>> {
    let file = ShapeFile::open(path).map_err(|source| IngestError::Shapefile {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "{:?}: {} {:?} records",
        path,
        file.records.len(),
        file.header.shape_type
    );
    Ok(file
        .records
        .iter()
        .map(|r| FaultTrace::new(r.points()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faults::shp::write_polylines;
    use tempfile::TempDir;

    fn two_faults() -> Vec<Vec<[f64; 2]>> {
        vec![
            vec![[0.0, 0.0], [10.0, 0.0], [20.0, 5.0], [30.0, 5.0]],
            vec![[0.0, 50.0], [15.0, 60.0]],
        ]
    }

    #[test]
    fn test_missing_fault_files_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("HL_faults.shp"), b"").unwrap();

        let result = load_fault_meshes(dir.path(), &FaultOptions::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_meshes_follow_shape_order() {
        let dir = TempDir::new().unwrap();
        write_polylines(&dir.path().join("BR_faults.shp"), &two_faults()).unwrap();

        let faults = load_fault_meshes(dir.path(), &FaultOptions::default())
            .unwrap()
            .expect("fault file present");
        assert_eq!(faults.len(), 2);
        assert_eq!(faults.get(0).unwrap().vertex_count(), 8);
        assert_eq!(faults.get(1).unwrap().vertex_count(), 4);
        assert_eq!(faults.get(1).unwrap().name, "fault1");
    }

    #[test]
    fn test_empty_trace_keeps_its_slot() {
        let dir = TempDir::new().unwrap();
        let traces = vec![vec![[0.0, 0.0], [1.0, 0.0]], Vec::new(), vec![[2.0, 0.0], [3.0, 0.0]]];
        write_polylines(&dir.path().join("BR_faults.shp"), &traces).unwrap();

        let faults = load_fault_meshes(dir.path(), &FaultOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(faults.len(), 3);
        assert_eq!(faults.get(1).unwrap().vertex_count(), 0);
        assert_eq!(faults.get(2).unwrap().name, "fault2");
    }

    #[test]
    fn test_sidecar_files_are_not_matched() {
        let dir = TempDir::new().unwrap();
        write_polylines(&dir.path().join("BR_faults.shp"), &two_faults()).unwrap();
        std::fs::write(dir.path().join("BR_faults.dbf"), b"").unwrap();

        let found = find_fault_files(dir.path(), "BR").unwrap();
        assert_eq!(found, vec![dir.path().join("BR_faults.shp")]);
    }

    #[test]
    fn test_first_match_only_by_default() {
        let dir = TempDir::new().unwrap();
        write_polylines(&dir.path().join("BR_a.shp"), &two_faults()).unwrap();
        write_polylines(&dir.path().join("BR_b.shp"), &two_faults()[..1]).unwrap();

        let first = load_fault_meshes(dir.path(), &FaultOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(first.len(), 2);

        let options = FaultOptions {
            files: FaultFileSelection::AllMatches,
            ..FaultOptions::default()
        };
        let all = load_fault_meshes(dir.path(), &options).unwrap().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.get(2).unwrap().name, "fault2");
    }

    #[test]
    fn test_custom_bounds_are_applied() {
        let dir = TempDir::new().unwrap();
        write_polylines(&dir.path().join("BR_faults.shp"), &two_faults()).unwrap();

        let options = FaultOptions {
            bounds: ExtrusionBounds::new(-40.0, 2.0),
            ..FaultOptions::default()
        };
        let faults = load_fault_meshes(dir.path(), &options).unwrap().unwrap();
        let z: Vec<f64> = faults.get(1).unwrap().vertices.iter().map(|v| v[2]).collect();
        assert_eq!(z, vec![-40.0, -40.0, 2.0, 2.0]);
    }

    #[test]
    fn test_malformed_shapefile_aborts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("BR_faults.shp"), b"not a shapefile").unwrap();

        let err = load_fault_meshes(dir.path(), &FaultOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::Shapefile { .. }));
    }

    #[test]
    fn test_parse_file_selection() {
        assert_eq!("ALL".parse::<FaultFileSelection>().unwrap(), FaultFileSelection::AllMatches);
        assert!("some".parse::<FaultFileSelection>().is_err());
    }
}

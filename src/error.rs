use std::path::PathBuf;

use thiserror::Error;

use crate::faults::shp::ShpError;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Everything that can stop a borehole or fault load.
///
/// A directory without fault shapefiles is deliberately absent from this list:
/// faults are optional, so [`crate::faults::load_fault_meshes`] reports that
/// case as `Ok(None)`.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no csv files found in {path:?}")]
    NoDataFound { path: PathBuf },

    #[error("invalid dataset selector: {0:?} (expected few, mid or all)")]
    InvalidSelector(String),

    #[error("selector {selector} kept none of the csv files in {path:?}")]
    EmptySelection { path: PathBuf, selector: String },

    #[error("{0} is not set")]
    UnsetPath(&'static str),

    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv file {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("csv file {path:?} has no header line")]
    EmptyFile { path: PathBuf },

    #[error("{path:?} line {line}: expected {expected} fields, saw {found}")]
    RaggedRow {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("malformed shapefile {path:?}")]
    Shapefile {
        path: PathBuf,
        #[source]
        source: ShpError,
    },

    #[error("arrow conversion failed")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet write failed")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("json serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }
}

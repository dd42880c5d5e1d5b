//! Environment configuration.
//!
//! Values come from a `.env` file (read without touching the process
//! environment) and are overridden by real environment variables.
//!
//! | Variable                 | Meaning                                   |
//! |--------------------------|-------------------------------------------|
//! | `BOREHOLES_SOUTH_FOLDER` | directory of `<unit>_*.csv` borehole files |
//! | `FAULTS_SOUTH_FOLDER`    | directory of fault shapefiles              |
//! | `GEOTOP_SELECTOR`        | `few`, `mid` or `all`                      |
//! | `GEOTOP_FAULT_FILES`     | `first` or `all` matching shapefiles       |
//! | `GEOTOP_FAULT_ZMIN`      | bottom of extruded faults                  |
//! | `GEOTOP_FAULT_ZMAX`      | top of extruded faults                     |
//! | `GEOTOP_DEPTH`           | base of the model extent                   |

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;

use crate::data::DatasetSelector;
use crate::error::{IngestError, Result};
use crate::faults::FaultOptions;

pub const BOREHOLES_VAR: &str = "BOREHOLES_SOUTH_FOLDER";
pub const FAULTS_VAR: &str = "FAULTS_SOUTH_FOLDER";
pub const SELECTOR_VAR: &str = "GEOTOP_SELECTOR";
pub const FAULT_FILES_VAR: &str = "GEOTOP_FAULT_FILES";
pub const FAULT_ZMIN_VAR: &str = "GEOTOP_FAULT_ZMIN";
pub const FAULT_ZMAX_VAR: &str = "GEOTOP_FAULT_ZMAX";
pub const DEPTH_VAR: &str = "GEOTOP_DEPTH";

const KNOWN_VARS: [&str; 7] = [
    BOREHOLES_VAR,
    FAULTS_VAR,
    SELECTOR_VAR,
    FAULT_FILES_VAR,
    FAULT_ZMIN_VAR,
    FAULT_ZMAX_VAR,
    DEPTH_VAR,
];

/// Base of the model grid used by the south model.
pub const DEFAULT_DEPTH: f64 = -500.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub boreholes_folder: Option<PathBuf>,
    pub faults_folder: Option<PathBuf>,
    pub selector: DatasetSelector,
    pub faults: FaultOptions,
    pub depth: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boreholes_folder: None,
            faults_folder: None,
            selector: DatasetSelector::default(),
            faults: FaultOptions::default(),
            depth: DEFAULT_DEPTH,
        }
    }
}

impl Config {
    /// Build from key/value pairs; later pairs win. Empty values count as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        let get = |key: &str| vars.get(key).map(|v| v.trim());

        let mut config = Config {
            boreholes_folder: get(BOREHOLES_VAR).map(PathBuf::from),
            faults_folder: get(FAULTS_VAR).map(PathBuf::from),
            ..Config::default()
        };
        if let Some(s) = get(SELECTOR_VAR) {
            config.selector = s.parse()?;
        }
        if let Some(s) = get(FAULT_FILES_VAR) {
            config.faults.files = s.parse()?;
        }
        if let Some(s) = get(FAULT_ZMIN_VAR) {
            config.faults.bounds.zmin = parse_f64(FAULT_ZMIN_VAR, s)?;
        }
        if let Some(s) = get(FAULT_ZMAX_VAR) {
            config.faults.bounds.zmax = parse_f64(FAULT_ZMAX_VAR, s)?;
        }
        if let Some(s) = get(DEPTH_VAR) {
            config.depth = parse_f64(DEPTH_VAR, s)?;
        }

        config.faults.bounds.validate()?;
        Ok(config)
    }

    /// Read `env_file` (or `./.env` when `None` and present), then let the
    /// process environment override it.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        let mut vars = read_env_file(env_file)?;
        vars.extend(utf8_vars(std::env::vars_os())?);
        Self::from_vars(vars)
    }

    pub fn boreholes_dir(&self) -> Result<&Path> {
        self.boreholes_folder
            .as_deref()
            .ok_or(IngestError::UnsetPath(BOREHOLES_VAR))
    }

    pub fn faults_dir(&self) -> Result<&Path> {
        self.faults_folder
            .as_deref()
            .ok_or(IngestError::UnsetPath(FAULTS_VAR))
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| IngestError::Config(format!("{key}={value:?} is not a number")))
}

/// Keep the UTF-8 pairs of an OS environment. A non UTF-8 value is only an
/// error when it belongs to one of our settings.
fn utf8_vars<I>(vars: I) -> Result<Vec<(String, String)>>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut out = Vec::new();
    for (key, value) in vars {
        let Ok(key) = key.into_string() else {
            continue;
        };
        match value.into_string() {
            Ok(value) => out.push((key, value)),
            Err(_) if KNOWN_VARS.contains(&key.as_str()) => {
                return Err(IngestError::Config(format!("{key} is not valid UTF-8")));
            }
            Err(_) => debug!("ignoring non UTF-8 environment variable {key}"),
        }
    }
    Ok(out)
}

fn read_env_file(path: Option<&Path>) -> Result<Vec<(String, String)>> {
    let iter = match path {
        Some(path) => dotenvy::from_path_iter(path),
        None => dotenvy::dotenv_iter(),
    };
    let iter = match iter {
        Ok(iter) => iter,
        Err(e) if path.is_none() && e.not_found() => {
            debug!("no .env file found, using the process environment only");
            return Ok(Vec::new());
        }
        Err(e) => return Err(IngestError::Config(format!(".env: {e}"))),
    };
    iter.map(|item| item.map_err(|e| IngestError::Config(format!(".env: {e}"))))
        .collect()
}

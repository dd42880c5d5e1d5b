//! Inputs of the south model: boreholes (mandatory) plus faults (optional).

use log::{info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::data::{load_boreholes, BoreholeDataset, CoordinateColumns, Extent};
use crate::error::Result;
use crate::faults::{load_fault_meshes, FaultCollection};

#[derive(Debug, Clone, Default)]
pub struct SurveyOptions {
    /// Keep only the first `n` faults.
    pub fault_limit: Option<usize>,
    pub coordinates: CoordinateColumns,
}

/// Everything the modeling engine is handed.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyInputs {
    pub boreholes: BoreholeDataset,
    /// `None` when the fault directory has no matching shapefile.
    pub faults: Option<FaultCollection>,
    /// Model grid box; `None` when the coordinate columns are missing.
    pub extent: Option<Extent>,
}

impl SurveyInputs {
    /// Load both inputs. Both folders must be configured; a fault folder
    /// without a fault shapefile only drops the faults.
    pub fn load(config: &Config, options: &SurveyOptions) -> Result<Self> {
        let boreholes = load_boreholes(config.boreholes_dir()?, &config.selector)?;
        let faults = load_fault_meshes(config.faults_dir()?, &config.faults)?;
        let faults = match (faults, options.fault_limit) {
            (Some(f), Some(n)) => Some(f.take(n)),
            (f, _) => f,
        };

        let extent = boreholes.extent(config.depth, &options.coordinates);
        if extent.is_none() {
            warn!(
                "no numeric {}/{}/{} columns; model extent unavailable",
                options.coordinates.x, options.coordinates.y, options.coordinates.z
            );
        }

        info!(
            "survey: {} borehole rows over {} surfaces, {} faults",
            boreholes.len(),
            boreholes.surfaces().len(),
            faults.as_ref().map_or(0, FaultCollection::len)
        );
        Ok(SurveyInputs {
            boreholes,
            faults,
            extent,
        })
    }
}

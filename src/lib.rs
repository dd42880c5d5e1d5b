//! Borehole and fault ingestion for GeoTOP stratigraphic models.
//!
//! Two independent loaders feed an external modeling engine:
//!
//! - [`data::load_boreholes`] concatenates per-unit CSV files into one
//!   [`data::BoreholeDataset`], tagging each row with its `surface`.
//! - [`faults::load_fault_meshes`] extrudes the polylines of a fault
//!   shapefile into vertical triangle meshes.
//!
//! Missing borehole data is an error; missing fault data is not.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod faults;
pub mod scene;
pub mod survey;

pub use config::Config;
pub use data::{load_boreholes, BoreholeDataset, DatasetSelector};
pub use error::{IngestError, Result};
pub use faults::{load_fault_meshes, FaultCollection, FaultMesh, FaultOptions};
pub use scene::{attach_meshes_to_scene, Scene};

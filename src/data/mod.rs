/// Borehole layer: table model, file selection and loading.
///
/// Architecture:
/// ```text
///  <unit>_*.csv  <unit>_*.csv  ...
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  DatasetSelector → which unit files take part
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse, tag `surface`, concat, drop incomplete rows
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────┐
///   │ BoreholeDataset │  columns + Vec<BoreholeRecord>
///   └─────────────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;

pub use filter::DatasetSelector;
pub use loader::load_boreholes;
pub use model::{BoreholeDataset, BoreholeRecord, CellValue, CoordinateColumns, Extent};

/// Fault layer: shapefile traces extruded into vertical meshes.
///
/// ```text
///  BR*.shp ──shp──▶ ShapeRecord ──▶ FaultTrace ──extrude──▶ FaultMesh
///                                                              │
///                                                     FaultCollection
/// ```

pub mod loader;
pub mod mesh;
pub mod shp;

pub use loader::{load_fault_meshes, FaultFileSelection, FaultOptions};
pub use mesh::{extrude_trace, ExtrusionBounds, FaultCollection, FaultMesh, FaultTrace};

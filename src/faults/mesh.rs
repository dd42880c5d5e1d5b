use serde::{Deserialize, Serialize};

use crate::data::Extent;
use crate::error::{IngestError, Result};

/// 2D polyline of a fault as recorded in a shapefile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultTrace {
    pub points: Vec<[f64; 2]>,
}

impl FaultTrace {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Elevations a trace is extruded between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionBounds {
    pub zmin: f64,
    pub zmax: f64,
}

impl ExtrusionBounds {
    pub const DEFAULT_ZMIN: f64 = -500.0;
    pub const DEFAULT_ZMAX: f64 = 100.0;

    pub fn new(zmin: f64, zmax: f64) -> Self {
        Self { zmin, zmax }
    }

    /// Reject ranges whose bottom is not strictly below the top.
    pub fn validate(&self) -> Result<()> {
        if self.zmin < self.zmax {
            Ok(())
        } else {
            Err(IngestError::Config(format!(
                "fault zmin {} must be below zmax {}",
                self.zmin, self.zmax
            )))
        }
    }

    /// Use the vertical range of a model extent instead of the fixed survey depth.
    pub fn from_extent(extent: &Extent) -> Self {
        Self::new(extent.zmin, extent.zmax)
    }
}

impl Default for ExtrusionBounds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ZMIN, Self::DEFAULT_ZMAX)
    }
}

/// Triangulated vertical fault surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultMesh {
    pub name: String,
    pub vertices: Vec<[f64; 3]>,
    /// Triangles as indices into `vertices`.
    pub cells: Vec<[u32; 3]>,
}

impl FaultMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Extrude a trace into a vertical curtain between `bounds.zmin` and `bounds.zmax`.
///
/// For an `n`-point trace the first `n` vertices sit at `zmin` and the next `n`
/// at `zmax`. Each segment `i -> i+1` becomes two triangles:
///
/// ```text
///  i+n --- i+n+1
///   | \      |
///   |   \    |
///   |     \  |
///   i  ---  i+1
/// ```
///
/// All lower triangles `[i, i+1, i+n]` come first, then the upper ones
/// `[i+n, i+n+1, i+1]`. Degenerate traces are not rejected: a single point
/// yields two vertices and no cells.
pub fn extrude_trace(name: impl Into<String>, trace: &FaultTrace, bounds: ExtrusionBounds) -> FaultMesh {
    let n = trace.len();

    let mut vertices = Vec::with_capacity(2 * n);
    vertices.extend(trace.points.iter().map(|&[x, y]| [x, y, bounds.zmin]));
    vertices.extend(trace.points.iter().map(|&[x, y]| [x, y, bounds.zmax]));

    let segments = n.saturating_sub(1) as u32;
    let n = n as u32;
    let lower = (0..segments).map(|i| [i, i + 1, i + n]);
    let upper = (0..segments).map(|i| [i + n, i + n + 1, i + 1]);

    FaultMesh {
        name: name.into(),
        vertices,
        cells: lower.chain(upper).collect(),
    }
}

/// Fault meshes in shape order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FaultCollection {
    pub meshes: Vec<FaultMesh>,
}

impl FaultCollection {
    pub fn new(meshes: Vec<FaultMesh>) -> Self {
        Self { meshes }
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FaultMesh> {
        self.meshes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FaultMesh> {
        self.meshes.iter()
    }

    /// Keep only the first `n` faults.
    pub fn take(mut self, n: usize) -> Self {
        self.meshes.truncate(n);
        self
    }
}

impl<'a> IntoIterator for &'a FaultCollection {
    type Item = &'a FaultMesh;
    type IntoIter = std::slice::Iter<'a, FaultMesh>;

    fn into_iter(self) -> Self::IntoIter {
        self.meshes.iter()
    }
}

//! Bridge from fault meshes to a renderer's scene.
//!
//! Renderers take polygon meshes in the VTK layout: a point array and a flat
//! face array where each face is prefixed by its vertex count
//! (`[3, a, b, c, 3, d, e, f, ...]`). [`attach_meshes_to_scene`] converts each
//! [`FaultMesh`] to that layout and hands it to a [`Scene`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use crate::color::{ColorMap, Rgb};
use crate::error::{IngestError, Result};
use crate::faults::{FaultCollection, FaultMesh};

/// Polygon mesh in renderer-native layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyMesh {
    pub name: String,
    pub points: Vec<[f64; 3]>,
    /// Count-prefixed face connectivity.
    pub faces: Vec<u32>,
}

impl PolyMesh {
    pub fn face_count(&self) -> usize {
        let mut count = 0;
        let mut i = 0;
        while i < self.faces.len() {
            i += self.faces[i] as usize + 1;
            count += 1;
        }
        count
    }
}

impl From<&FaultMesh> for PolyMesh {
    fn from(mesh: &FaultMesh) -> Self {
        let faces = mesh
            .cells
            .iter()
            .flat_map(|&[a, b, c]| [3, a, b, c])
            .collect();
        PolyMesh {
            name: mesh.name.clone(),
            points: mesh.vertices.clone(),
            faces,
        }
    }
}

/// Styling passed along with each mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStyle {
    pub color: Rgb,
    pub opacity: f32,
}

impl Default for MeshStyle {
    fn default() -> Self {
        Self {
            color: crate::color::DEFAULT_COLOR,
            opacity: 1.0,
        }
    }
}

/// Anything meshes can be added to.
pub trait Scene {
    fn add_mesh(&mut self, mesh: PolyMesh, style: MeshStyle);
}

/// Convert every fault to a [`PolyMesh`] and add it to `scene`, one colour per fault.
pub fn attach_meshes_to_scene<S: Scene + ?Sized>(meshes: &FaultCollection, scene: &mut S) {
    let colors = ColorMap::new(meshes.iter().map(|m| m.name.as_str()));
    for mesh in meshes {
        let style = MeshStyle {
            color: colors.color_for(&mesh.name),
            ..MeshStyle::default()
        };
        debug!("attaching {} ({} cells)", mesh.name, mesh.cell_count());
        scene.add_mesh(PolyMesh::from(mesh), style);
    }
}

// ---------------------------------------------------------------------------
// VtkScene – collects meshes and writes legacy VTK
// ---------------------------------------------------------------------------

/// Scene that accumulates meshes and writes them as one legacy ASCII VTK
/// PolyData file, with a per-point colour and a per-cell mesh id.
#[derive(Debug, Default)]
pub struct VtkScene {
    pub meshes: Vec<(PolyMesh, MeshStyle)>,
}

impl Scene for VtkScene {
    fn add_mesh(&mut self, mesh: PolyMesh, style: MeshStyle) {
        self.meshes.push((mesh, style));
    }
}

impl VtkScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn write_vtk(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| IngestError::io(path, e))?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w)
            .and_then(|_| w.flush())
            .map_err(|e| IngestError::io(path, e))?;
        info!("wrote {} meshes to {:?}", self.meshes.len(), path);
        Ok(())
    }

    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let n_points: usize = self.meshes.iter().map(|(m, _)| m.points.len()).sum();
        let n_faces: usize = self.meshes.iter().map(|(m, _)| m.face_count()).sum();
        let n_entries: usize = self.meshes.iter().map(|(m, _)| m.faces.len()).sum();

        writeln!(w, "# vtk DataFile Version 3.0")?;
        writeln!(w, "geotop-ingest fault meshes")?;
        writeln!(w, "ASCII")?;
        writeln!(w, "DATASET POLYDATA")?;
        writeln!(w, "POINTS {n_points} double")?;
        for (mesh, _) in &self.meshes {
            for [x, y, z] in &mesh.points {
                writeln!(w, "{x} {y} {z}")?;
            }
        }

        writeln!(w, "POLYGONS {n_faces} {n_entries}")?;
        let mut offset = 0u32;
        for (mesh, _) in &self.meshes {
            let mut i = 0;
            while i < mesh.faces.len() {
                let count = mesh.faces[i] as usize;
                let ids: Vec<String> = mesh.faces[i + 1..i + 1 + count]
                    .iter()
                    .map(|v| (v + offset).to_string())
                    .collect();
                writeln!(w, "{count} {}", ids.join(" "))?;
                i += count + 1;
            }
            offset += mesh.points.len() as u32;
        }

        writeln!(w, "CELL_DATA {n_faces}")?;
        writeln!(w, "SCALARS mesh_id int 1")?;
        writeln!(w, "LOOKUP_TABLE default")?;
        for (id, (mesh, _)) in self.meshes.iter().enumerate() {
            for _ in 0..mesh.face_count() {
                writeln!(w, "{id}")?;
            }
        }

        writeln!(w, "POINT_DATA {n_points}")?;
        writeln!(w, "COLOR_SCALARS color 4")?;
        for (mesh, style) in &self.meshes {
            let [r, g, b] = style.color;
            for _ in &mesh.points {
                writeln!(
                    w,
                    "{:.4} {:.4} {:.4} {:.4}",
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                    style.opacity
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faults::{extrude_trace, ExtrusionBounds, FaultTrace};
    use tempfile::TempDir;

    fn collection() -> FaultCollection {
        let traces = [
            FaultTrace::new(vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]),
            FaultTrace::new(vec![[0.0, 5.0], [4.0, 5.0]]),
        ];
        FaultCollection::new(
            traces
                .iter()
                .enumerate()
                .map(|(i, t)| extrude_trace(format!("fault{i}"), t, ExtrusionBounds::default()))
                .collect(),
        )
    }

    #[test]
    fn test_poly_mesh_face_layout() {
        let faults = collection();
        let poly = PolyMesh::from(faults.get(1).unwrap());
        assert_eq!(poly.points.len(), 4);
        assert_eq!(poly.faces, vec![3, 0, 1, 2, 3, 2, 3, 1]);
        assert_eq!(poly.face_count(), 2);
    }

    #[test]
    fn test_attach_adds_one_mesh_per_fault() {
        let mut scene = VtkScene::new();
        attach_meshes_to_scene(&collection(), &mut scene);
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.meshes[0].0.name, "fault0");
        assert_ne!(scene.meshes[0].1.color, scene.meshes[1].1.color);
    }

    #[test]
    fn test_write_vtk_offsets_point_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faults.vtk");
        let mut scene = VtkScene::new();
        attach_meshes_to_scene(&collection(), &mut scene);
        scene.write_vtk(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("POINTS 12 double"));
        assert!(text.contains("POLYGONS 8 32"));
        // first face of the second mesh, shifted past the 8 points of the first
        assert!(text.contains("\n3 8 9 10\n"));
    }
}

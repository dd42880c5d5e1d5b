//! Handoff formats for the modeling engine and external viewers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;

use crate::data::{BoreholeDataset, CellValue};
use crate::error::{IngestError, Result};
use crate::faults::{FaultCollection, FaultMesh};

// ---------------------------------------------------------------------------
// Borehole table → Arrow / Parquet
// ---------------------------------------------------------------------------

/// Narrowest Arrow type holding every value of a column.
fn column_type<'a>(values: impl Iterator<Item = &'a CellValue>) -> DataType {
    let mut ty: Option<DataType> = None;
    for v in values {
        let this = match v {
            CellValue::Missing => continue,
            CellValue::Integer(_) => DataType::Int64,
            CellValue::Float(_) => DataType::Float64,
            CellValue::Bool(_) => DataType::Boolean,
            CellValue::String(_) => DataType::Utf8,
        };
        ty = Some(match (ty, this) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(DataType::Int64), DataType::Float64) | (Some(DataType::Float64), DataType::Int64) => {
                DataType::Float64
            }
            _ => DataType::Utf8,
        });
    }
    ty.unwrap_or(DataType::Utf8)
}

fn column_array(dataset: &BoreholeDataset, idx: usize, ty: &DataType) -> ArrayRef {
    let cells = dataset.records.iter().map(|r| &r.values[idx]);
    match ty {
        DataType::Int64 => Arc::new(Int64Array::from_iter(cells.map(|c| match c {
            CellValue::Integer(i) => Some(*i),
            _ => None,
        }))),
        DataType::Float64 => Arc::new(Float64Array::from_iter(cells.map(CellValue::as_f64))),
        DataType::Boolean => Arc::new(BooleanArray::from_iter(cells.map(|c| match c {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }))),
        _ => Arc::new(StringArray::from_iter(cells.map(|c| {
            (!c.is_missing()).then(|| c.to_string())
        }))),
    }
}

/// Convert the borehole table into one Arrow record batch with typed columns.
pub fn dataset_to_record_batch(dataset: &BoreholeDataset) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(dataset.columns.len());
    let mut arrays = Vec::with_capacity(dataset.columns.len());
    for (idx, name) in dataset.columns.iter().enumerate() {
        let ty = column_type(dataset.records.iter().map(|r| &r.values[idx]));
        arrays.push(column_array(dataset, idx, &ty));
        fields.push(Field::new(name, ty, true));
    }
    let schema = Arc::new(Schema::new(fields));
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Write the borehole table as a Parquet file.
pub fn write_parquet(dataset: &BoreholeDataset, path: &Path) -> Result<()> {
    let batch = dataset_to_record_batch(dataset)?;
    let file = File::create(path).map_err(|e| IngestError::io(path, e))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    info!("wrote {} borehole rows to {:?}", dataset.len(), path);
    Ok(())
}

// ---------------------------------------------------------------------------
// Fault meshes → JSON / OBJ
// ---------------------------------------------------------------------------

pub fn write_faults_json(faults: &FaultCollection, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| IngestError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, faults)?;
    writer.flush().map_err(|e| IngestError::io(path, e))?;
    info!("wrote {} fault meshes to {:?}", faults.len(), path);
    Ok(())
}

/// Write one fault as a Wavefront OBJ file (1-based face indices).
pub fn write_fault_obj(mesh: &FaultMesh, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| IngestError::io(path, e))?;
    let mut w = BufWriter::new(file);
    write_obj(mesh, &mut w)
        .and_then(|_| w.flush())
        .map_err(|e| IngestError::io(path, e))
}

fn write_obj<W: Write>(mesh: &FaultMesh, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "# {}", mesh.name)?;
    writeln!(w, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(w, "# Faces: {}", mesh.cell_count())?;
    writeln!(w, "o {}", mesh.name)?;
    for [x, y, z] in &mesh.vertices {
        writeln!(w, "v {x:.6} {y:.6} {z:.6}")?;
    }
    for [a, b, c] in &mesh.cells {
        writeln!(w, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}

//! ESRI shapefile geometry codec.
//!
//! Only the main `.shp` file is decoded; attribute tables (`.dbf`) are not
//! needed to build fault meshes. Integers in the file header and record
//! headers are big-endian, everything else is little-endian.
//!
//! The writer emits single-part PolyLine files plus their `.shx` index, which
//! is what the sample generator and the tests need.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_LEN: usize = 100;
const RECORD_HEADER_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum ShpError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("bad file code {0} (expected 9994)")]
    BadFileCode(i32),

    #[error("file truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("record {record}: unsupported shape type {shape_type}")]
    UnsupportedShapeType { record: i32, shape_type: i32 },

    #[error("record {record}: {reason}")]
    MalformedRecord { record: i32, reason: String },
}

/// Shape type codes of the shapefile format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    pub fn from_code(code: i32) -> Option<Self> {
        use ShapeType::*;
        Some(match code {
            0 => Null,
            1 => Point,
            3 => PolyLine,
            5 => Polygon,
            8 => MultiPoint,
            11 => PointZ,
            13 => PolyLineZ,
            15 => PolygonZ,
            18 => MultiPointZ,
            21 => PointM,
            23 => PolyLineM,
            25 => PolygonM,
            28 => MultiPointM,
            31 => MultiPatch,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        use ShapeType::*;
        match self {
            Null => 0,
            Point => 1,
            PolyLine => 3,
            Polygon => 5,
            MultiPoint => 8,
            PointZ => 11,
            PolyLineZ => 13,
            PolygonZ => 15,
            MultiPointZ => 18,
            PointM => 21,
            PolyLineM => 23,
            PolygonM => 25,
            MultiPointM => 28,
            MultiPatch => 31,
        }
    }
}

/// Fixed 100-byte file header.
#[derive(Debug, Clone, PartialEq)]
pub struct ShpHeader {
    /// Declared file length in bytes.
    pub file_length: usize,
    pub shape_type: ShapeType,
    /// `[xmin, ymin, xmax, ymax]`
    pub bbox: [f64; 4],
}

/// One geometry record. Z and M values are not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    /// 1-based record number as stored in the file.
    pub number: i32,
    pub shape_type: ShapeType,
    pub parts: Vec<Vec<[f64; 2]>>,
}

impl ShapeRecord {
    /// All XY points of all parts, in file order.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.parts.iter().flatten().copied().collect()
    }
}

/// A decoded `.shp` file.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFile {
    pub header: ShpHeader,
    pub records: Vec<ShapeRecord>,
}

impl ShapeFile {
    pub fn open(path: &Path) -> Result<Self, ShpError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ShpError> {
        let mut cur = Cursor::new(bytes);

        let code = cur.i32_be()?;
        if code != FILE_CODE {
            return Err(ShpError::BadFileCode(code));
        }
        cur.skip(20)?;
        let file_length = cur.i32_be()?.max(0) as usize * 2;
        let _version = cur.i32_le()?;
        let type_code = cur.i32_le()?;
        let shape_type = ShapeType::from_code(type_code).ok_or(ShpError::UnsupportedShapeType {
            record: 0,
            shape_type: type_code,
        })?;
        let bbox = [cur.f64_le()?, cur.f64_le()?, cur.f64_le()?, cur.f64_le()?];
        cur.skip(32)?;

        if file_length > bytes.len() {
            return Err(ShpError::Truncated {
                offset: bytes.len(),
            });
        }
        let end = file_length.max(HEADER_LEN);

        let mut records = Vec::new();
        while cur.pos < end {
            let number = cur.i32_be()?;
            let content_len = cur.i32_be()?.max(0) as usize * 2;
            let start = cur.pos;
            let content = cur.take(content_len)?;
            records.push(parse_record(number, content, start)?);
        }

        Ok(ShapeFile {
            header: ShpHeader {
                file_length,
                shape_type,
                bbox,
            },
            records,
        })
    }
}

fn parse_record(number: i32, content: &[u8], base: usize) -> Result<ShapeRecord, ShpError> {
    let mut cur = Cursor::with_base(content, base);
    let type_code = cur.i32_le()?;
    let unsupported = ShpError::UnsupportedShapeType {
        record: number,
        shape_type: type_code,
    };
    let shape_type = ShapeType::from_code(type_code).ok_or(unsupported)?;

    use ShapeType::*;
    let parts = match shape_type {
        Null => Vec::new(),
        Point | PointZ | PointM => vec![vec![cur.point()?]],
        MultiPoint | MultiPointZ | MultiPointM => {
            cur.skip(32)?;
            let n = cur.count(number, "point count")?;
            vec![cur.points(n)?]
        }
        PolyLine | PolyLineZ | PolyLineM | Polygon | PolygonZ | PolygonM => {
            cur.skip(32)?;
            let n_parts = cur.count(number, "part count")?;
            let n_points = cur.count(number, "point count")?;
            let mut starts = Vec::with_capacity(n_parts.min(content.len() / 4));
            for _ in 0..n_parts {
                starts.push(cur.count(number, "part index")?);
            }
            let points = cur.points(n_points)?;
            split_parts(number, &starts, points)?
        }
        MultiPatch => {
            return Err(ShpError::UnsupportedShapeType {
                record: number,
                shape_type: type_code,
            })
        }
    };

    Ok(ShapeRecord {
        number,
        shape_type,
        parts,
    })
}

fn split_parts(
    record: i32,
    starts: &[usize],
    points: Vec<[f64; 2]>,
) -> Result<Vec<Vec<[f64; 2]>>, ShpError> {
    let mut parts = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let stop = starts.get(i + 1).copied().unwrap_or(points.len());
        if start > stop || stop > points.len() {
            return Err(ShpError::MalformedRecord {
                record,
                reason: format!("part {i} spans {start}..{stop} of {} points", points.len()),
            });
        }
        parts.push(points[start..stop].to_vec());
    }
    Ok(parts)
}

// ---------------------------------------------------------------------------
// Byte cursor
// ---------------------------------------------------------------------------

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self::with_base(buf, 0)
    }

    /// `base` is the offset of `buf` in the file, for error reporting.
    fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ShpError> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.buf.len());
        match end {
            Some(end) => {
                let slice = &self.buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ShpError::Truncated {
                offset: self.base + self.buf.len(),
            }),
        }
    }

    fn skip(&mut self, n: usize) -> Result<(), ShpError> {
        self.take(n).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ShpError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn i32_be(&mut self) -> Result<i32, ShpError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn i32_le(&mut self) -> Result<i32, ShpError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn f64_le(&mut self) -> Result<f64, ShpError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    fn point(&mut self) -> Result<[f64; 2], ShpError> {
        Ok([self.f64_le()?, self.f64_le()?])
    }

    fn points(&mut self, n: usize) -> Result<Vec<[f64; 2]>, ShpError> {
        let needed = n.checked_mul(16).unwrap_or(usize::MAX);
        if self.buf.len() - self.pos < needed {
            return Err(ShpError::Truncated {
                offset: self.base + self.buf.len(),
            });
        }
        (0..n).map(|_| self.point()).collect()
    }

    /// Little-endian count that must not be negative.
    fn count(&mut self, record: i32, what: &str) -> Result<usize, ShpError> {
        let v = self.i32_le()?;
        usize::try_from(v).map_err(|_| ShpError::MalformedRecord {
            record,
            reason: format!("negative {what} {v}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Write single-part PolyLine records to `shp_path` and its `.shx` index.
pub fn write_polylines(shp_path: &Path, lines: &[Vec<[f64; 2]>]) -> Result<(), ShpError> {
    let contents: Vec<Vec<u8>> = lines.iter().map(|l| polyline_content(l)).collect();
    let bbox = bounding_box(lines.iter().flatten());

    let shp_len = HEADER_LEN + contents.iter().map(|c| RECORD_HEADER_LEN + c.len()).sum::<usize>();
    let shx_len = HEADER_LEN + RECORD_HEADER_LEN * contents.len();

    let mut shp = BufWriter::new(File::create(shp_path)?);
    let mut shx = BufWriter::new(File::create(shp_path.with_extension("shx"))?);
    shp.write_all(&file_header(shp_len, ShapeType::PolyLine, bbox))?;
    shx.write_all(&file_header(shx_len, ShapeType::PolyLine, bbox))?;

    let mut offset = HEADER_LEN;
    for (i, content) in contents.iter().enumerate() {
        let words = (content.len() / 2) as i32;
        shp.write_all(&(i as i32 + 1).to_be_bytes())?;
        shp.write_all(&words.to_be_bytes())?;
        shp.write_all(content)?;

        shx.write_all(&((offset / 2) as i32).to_be_bytes())?;
        shx.write_all(&words.to_be_bytes())?;
        offset += RECORD_HEADER_LEN + content.len();
    }

    shp.flush()?;
    shx.flush()?;
    Ok(())
}

fn polyline_content(line: &[[f64; 2]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(48 + 16 * line.len());
    out.extend_from_slice(&ShapeType::PolyLine.code().to_le_bytes());
    for v in bounding_box(line.iter()) {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&1i32.to_le_bytes());
    out.extend_from_slice(&(line.len() as i32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    for [x, y] in line {
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
    }
    out
}

fn file_header(length: usize, shape_type: ShapeType, bbox: [f64; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN);
    out.extend_from_slice(&FILE_CODE.to_be_bytes());
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&((length / 2) as i32).to_be_bytes());
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&shape_type.code().to_le_bytes());
    for v in bbox {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&[0u8; 32]);
    out
}

fn bounding_box<'a>(points: impl Iterator<Item = &'a [f64; 2]>) -> [f64; 4] {
    points
        .fold(None, |acc: Option<[f64; 4]>, &[x, y]| {
            Some(match acc {
                None => [x, y, x, y],
                Some([x0, y0, x1, y1]) => [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
            })
        })
        .unwrap_or([0.0; 4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record_bytes(number: i32, content: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&number.to_be_bytes());
        out.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        out.extend_from_slice(content);
        out
    }

    fn file_bytes(shape_type: ShapeType, records: &[Vec<u8>]) -> Vec<u8> {
        let len = HEADER_LEN + records.iter().map(Vec::len).sum::<usize>();
        let mut out = file_header(len, shape_type, [0.0; 4]);
        for r in records {
            out.extend_from_slice(r);
        }
        out
    }

    fn polyline_z_content(points: &[[f64; 3]]) -> Vec<u8> {
        let mut c = Vec::new();
        c.extend_from_slice(&13i32.to_le_bytes());
        c.extend_from_slice(&[0u8; 32]);
        c.extend_from_slice(&1i32.to_le_bytes());
        c.extend_from_slice(&(points.len() as i32).to_le_bytes());
        c.extend_from_slice(&0i32.to_le_bytes());
        for p in points {
            c.extend_from_slice(&p[0].to_le_bytes());
            c.extend_from_slice(&p[1].to_le_bytes());
        }
        c.extend_from_slice(&[0u8; 16]);
        for p in points {
            c.extend_from_slice(&p[2].to_le_bytes());
        }
        c
    }

    #[test]
    fn test_write_then_read_polylines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BR_faults.shp");
        let lines = vec![
            vec![[0.0, 0.0], [10.0, 5.0], [20.0, 5.0]],
            vec![[-3.0, 7.5], [4.0, 1.0]],
        ];
        write_polylines(&path, &lines).unwrap();
        assert!(dir.path().join("BR_faults.shx").exists());

        let file = ShapeFile::open(&path).unwrap();
        assert_eq!(file.header.shape_type, ShapeType::PolyLine);
        assert_eq!(file.header.bbox, [-3.0, 0.0, 20.0, 7.5]);
        assert_eq!(file.records.len(), 2);
        assert_eq!(file.records[0].number, 1);
        assert_eq!(file.records[1].points(), lines[1]);
    }

    #[test]
    fn test_polyline_z_keeps_xy_and_skips_z_block() {
        let rec = record_bytes(1, &polyline_z_content(&[[1.0, 2.0, 9.0], [3.0, 4.0, 9.5]]));
        let bytes = file_bytes(ShapeType::PolyLineZ, &[rec]);

        let file = ShapeFile::parse(&bytes).unwrap();
        assert_eq!(file.records[0].shape_type, ShapeType::PolyLineZ);
        assert_eq!(file.records[0].points(), vec![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_multi_part_points_are_flattened() {
        let mut c = Vec::new();
        c.extend_from_slice(&3i32.to_le_bytes());
        c.extend_from_slice(&[0u8; 32]);
        c.extend_from_slice(&2i32.to_le_bytes());
        c.extend_from_slice(&3i32.to_le_bytes());
        c.extend_from_slice(&0i32.to_le_bytes());
        c.extend_from_slice(&2i32.to_le_bytes());
        for v in [0.0f64, 0.0, 1.0, 1.0, 5.0, 5.0] {
            c.extend_from_slice(&v.to_le_bytes());
        }
        let bytes = file_bytes(ShapeType::PolyLine, &[record_bytes(1, &c)]);

        let rec = &ShapeFile::parse(&bytes).unwrap().records[0];
        assert_eq!(rec.parts.len(), 2);
        assert_eq!(rec.points(), vec![[0.0, 0.0], [1.0, 1.0], [5.0, 5.0]]);
    }

    #[test]
    fn test_null_shape_has_no_points() {
        let bytes = file_bytes(ShapeType::PolyLine, &[record_bytes(1, &0i32.to_le_bytes())]);
        let file = ShapeFile::parse(&bytes).unwrap();
        assert!(file.records[0].points().is_empty());
    }

    #[test]
    fn test_bad_file_code() {
        let mut bytes = file_bytes(ShapeType::PolyLine, &[]);
        bytes[3] = 0;
        assert!(matches!(ShapeFile::parse(&bytes), Err(ShpError::BadFileCode(_))));
    }

    #[test]
    fn test_truncated_record() {
        let rec = record_bytes(1, &polyline_z_content(&[[1.0, 2.0, 0.0], [3.0, 4.0, 0.0]]));
        let mut bytes = file_bytes(ShapeType::PolyLineZ, &[rec]);
        let keep = bytes.len() - 20;
        bytes.truncate(keep);
        assert!(matches!(ShapeFile::parse(&bytes), Err(ShpError::Truncated { .. })));
    }

    #[test]
    fn test_multipatch_is_rejected() {
        let bytes = file_bytes(ShapeType::MultiPatch, &[record_bytes(4, &31i32.to_le_bytes())]);
        assert!(matches!(
            ShapeFile::parse(&bytes),
            Err(ShpError::UnsupportedShapeType {
                record: 4,
                shape_type: 31
            })
        ));
    }

    #[test]
    fn test_part_index_out_of_range() {
        let mut c = Vec::new();
        c.extend_from_slice(&3i32.to_le_bytes());
        c.extend_from_slice(&[0u8; 32]);
        c.extend_from_slice(&1i32.to_le_bytes());
        c.extend_from_slice(&1i32.to_le_bytes());
        c.extend_from_slice(&5i32.to_le_bytes());
        c.extend_from_slice(&[0u8; 16]);
        let bytes = file_bytes(ShapeType::PolyLine, &[record_bytes(1, &c)]);
        assert!(matches!(
            ShapeFile::parse(&bytes),
            Err(ShpError::MalformedRecord { record: 1, .. })
        ));
    }
}

//! Write a synthetic south-model survey: one CSV per unit plus a `BR` fault shapefile.
//!
//! Usage: `generate_sample [DIR]` (defaults to `sample_survey`).

use std::path::PathBuf;

use anyhow::{Context, Result};

use geotop_ingest::faults::shp::write_polylines;

/// Seeded splitmix64 stream; the sample survey is identical on every run.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * f64::EPSILON / 2.0
    }

    fn between(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit()
    }
}

/// Unit code and mean top elevation, youngest first.
const UNITS: [(&str, f64); 8] = [
    ("HL", 2.0),
    ("BX", -4.0),
    ("KR", -9.0),
    ("BE", -15.0),
    ("ST", -30.0),
    ("PZWA", -55.0),
    ("MS", -90.0),
    ("BR", -160.0),
];

const X_RANGE: (f64, f64) = (112_000.0, 212_000.0);
const Y_RANGE: (f64, f64) = (370_000.0, 417_000.0);
const POINTS_PER_UNIT: usize = 40;

fn main() -> Result<()> {
    env_logger::init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_survey"));
    let borehole_dir = dir.join("boreholes");
    let fault_dir = dir.join("faults");
    std::fs::create_dir_all(&borehole_dir).context("creating borehole folder")?;
    std::fs::create_dir_all(&fault_dir).context("creating fault folder")?;

    let mut rng = SampleRng(42);
    let mut rows = 0;

    for (unit, top) in UNITS {
        let path = borehole_dir.join(format!("{unit}_points.csv"));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        writer.write_record(["x", "y", "z", "id"])?;

        for i in 0..POINTS_PER_UNIT {
            let x = rng.between(X_RANGE.0, X_RANGE.1);
            let y = rng.between(Y_RANGE.0, Y_RANGE.1);
            let z = top + rng.between(-3.0, 3.0) + (x - X_RANGE.0) * 1e-4;
            // roughly one in twenty picks has no elevation
            let z = if rng.unit() < 0.05 {
                String::new()
            } else {
                format!("{z:.2}")
            };
            writer.write_record([
                format!("{x:.1}"),
                format!("{y:.1}"),
                z,
                format!("B{:05}", i),
            ])?;
            rows += 1;
        }
        writer.flush()?;
    }

    // NW-SE striking normal faults, each a gently bending trace
    let faults: Vec<Vec<[f64; 2]>> = (0..4)
        .map(|k| {
            let x0 = X_RANGE.0 + 15_000.0 + k as f64 * 22_000.0;
            (0..6)
                .map(|j| {
                    let t = j as f64 / 5.0;
                    [
                        x0 + t * 18_000.0 + rng.between(-500.0, 500.0),
                        Y_RANGE.1 - t * (Y_RANGE.1 - Y_RANGE.0),
                    ]
                })
                .collect()
        })
        .collect();
    let shp = fault_dir.join("BR_faults.shp");
    write_polylines(&shp, &faults).with_context(|| format!("writing {}", shp.display()))?;

    println!(
        "Wrote {rows} borehole picks in {} unit files and {} faults to {}",
        UNITS.len(),
        faults.len(),
        dir.display()
    );
    println!("BOREHOLES_SOUTH_FOLDER={}", borehole_dir.display());
    println!("FAULTS_SOUTH_FOLDER={}", fault_dir.display());
    Ok(())
}

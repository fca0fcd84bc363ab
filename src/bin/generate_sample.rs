//! Writes synthetic site datasets so the dashboard can be tried without the
//! measurement campaign files.
//!
//! ```text
//! cargo run --bin generate_sample [OUT_DIR] [--parquet]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use parquet::arrow::ArrowWriter;

const COLUMNS: [&str; 8] = ["GHI", "DNI", "DHI", "Tamb", "RH", "WS", "BP", "Cleaning"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Climate knobs per site.
struct SiteProfile {
    file_stem: &'static str,
    seed: u64,
    peak_ghi: f64,
    clearness: f64,
    base_temp: f64,
    base_rh: f64,
    pressure: f64,
}

const PROFILES: [SiteProfile; 3] = [
    SiteProfile {
        file_stem: "benin_clean",
        seed: 1,
        peak_ghi: 950.0,
        clearness: 0.75,
        base_temp: 27.0,
        base_rh: 70.0,
        pressure: 994.0,
    },
    SiteProfile {
        file_stem: "sierraleone_clean",
        seed: 2,
        peak_ghi: 820.0,
        clearness: 0.6,
        base_temp: 25.5,
        base_rh: 82.0,
        pressure: 1002.0,
    },
    SiteProfile {
        file_stem: "togo-dapaong_qc",
        seed: 3,
        peak_ghi: 1000.0,
        clearness: 0.8,
        base_temp: 28.5,
        base_rh: 55.0,
        pressure: 975.0,
    },
];

/// One row: timestamp plus the values of `COLUMNS`.
type Row = (NaiveDateTime, [f64; 8]);

fn generate_site(profile: &SiteProfile, start: NaiveDateTime, days: i64) -> Vec<Row> {
    let mut rng = SimpleRng::new(profile.seed);
    let step = Duration::minutes(10);
    let steps = days * 24 * 6;

    (0..steps)
        .map(|i| {
            let ts = start + step * i as i32;
            let hour = f64::from(ts.hour()) + f64::from(ts.minute()) / 60.0;
            // Sun up between 06:00 and 18:00.
            let elevation = ((hour - 6.0) / 12.0 * std::f64::consts::PI).sin().max(0.0);
            let cloud = rng.next_f64();

            let ghi = (profile.peak_ghi * elevation * (0.5 + 0.5 * cloud.max(profile.clearness))
                + rng.gauss(0.0, 8.0) * elevation)
                .max(0.0);
            let dni = (ghi * profile.clearness * (0.6 + 0.4 * cloud)).max(0.0);
            let dhi = (ghi - dni * elevation).max(0.0);
            let tamb = profile.base_temp + 6.0 * elevation + rng.gauss(0.0, 0.5);
            let rh = (profile.base_rh - 20.0 * elevation + rng.gauss(0.0, 2.0)).clamp(5.0, 100.0);
            let ws = rng.gauss(2.5, 1.0).abs();
            let bp = profile.pressure + rng.gauss(0.0, 1.5);
            let cleaning = if i % (6 * 24 * 7) == 0 { 1.0 } else { 0.0 };

            (ts, [ghi, dni, dhi, tamb, rh, ws, bp, cleaning])
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["Timestamp"];
    header.extend(COLUMNS);
    writer.write_record(&header)?;
    for (ts, values) in rows {
        let mut record = vec![ts.format("%Y-%m-%d %H:%M").to_string()];
        record.extend(values.iter().map(|v| format!("{v:.1}")));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<(), Box<dyn std::error::Error>> {
    let mut fields = vec![Field::new("Timestamp", DataType::Utf8, false)];
    fields.extend(COLUMNS.iter().map(|c| Field::new(*c, DataType::Float64, true)));
    let schema = Arc::new(Schema::new(fields));

    let timestamps = StringArray::from(
        rows.iter()
            .map(|(ts, _)| ts.format("%Y-%m-%d %H:%M").to_string())
            .collect::<Vec<_>>(),
    );
    let mut arrays: Vec<Arc<dyn arrow::array::Array>> = vec![Arc::new(timestamps)];
    for idx in 0..COLUMNS.len() {
        let values: Vec<f64> = rows.iter().map(|(_, v)| v[idx]).collect();
        arrays.push(Arc::new(Float64Array::from(values)));
    }

    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut out_dir = PathBuf::from("data");
    let mut parquet = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--parquet" => parquet = true,
            other => out_dir = PathBuf::from(other),
        }
    }
    std::fs::create_dir_all(&out_dir)?;

    let start = NaiveDate::from_ymd_opt(2021, 8, 9)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or("invalid start date")?;

    for profile in &PROFILES {
        let rows = generate_site(profile, start, 28);
        let path = if parquet {
            let path = out_dir.join(format!("{}.parquet", profile.file_stem));
            write_parquet(&path, &rows)?;
            path
        } else {
            let path = out_dir.join(format!("{}.csv", profile.file_stem));
            write_csv(&path, &rows)?;
            path
        };
        println!("Wrote {} rows to {}", rows.len(), path.display());
    }
    Ok(())
}

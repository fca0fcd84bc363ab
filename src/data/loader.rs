use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float64Array, StringArray, TimestampMillisecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::model::{NumericColumn, SITE, Site, SolarTable, TIMESTAMP};
use crate::config::DashboardConfig;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a site table could not be loaded. Never fatal: the caller reports it
/// and shows an empty state.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{site}: data file not found at {}", path.display())]
    NotFound { site: Site, path: PathBuf },
    #[error("{site}: cannot read {}: {reason}", path.display())]
    Unreadable {
        site: Site,
        path: PathBuf,
        reason: String,
    },
    #[error("{site}: malformed data in {}: {reason}", path.display())]
    Malformed {
        site: Site,
        path: PathBuf,
        reason: String,
    },
    #[error("{site}: unsupported file type for {}", path.display())]
    UnsupportedFormat { site: Site, path: PathBuf },
}

impl LoadError {
    pub fn site(&self) -> Site {
        match self {
            LoadError::NotFound { site, .. }
            | LoadError::Unreadable { site, .. }
            | LoadError::Malformed { site, .. }
            | LoadError::UnsupportedFormat { site, .. } => *site,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Parquet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<SourceFormat> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "parquet" | "pq" => Some(SourceFormat::Parquet),
            _ => None,
        }
    }
}

/// Load one site's table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row; `Timestamp` plus numeric columns
/// * `.parquet` – `Timestamp` as string / timestamp / date, numeric columns
///
/// Every row is tagged with `site`. Columns that are not numeric are dropped.
pub fn load_file(path: &Path, site: Site) -> Result<SolarTable> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Csv) => load_csv(path, site),
        Some(SourceFormat::Parquet) => load_parquet(path, site),
        None => bail!("Unsupported file extension: {}", path.display()),
    }
}

/// Parse a timestamp cell. Empty cells are missing timestamps.
pub fn parse_timestamp(s: &str) -> Result<Option<NaiveDateTime>> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nat") {
        return Ok(None);
    }
    for fmt in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Some(ts));
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(ts.naive_local()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0));
    }
    bail!("'{s}' is not a recognised date-time")
}

/// Cell texts read as a missing value (the usual spreadsheet and pandas
/// export spellings).
const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// `Some(None)` for a missing value, `None` when the cell is not numeric.
fn parse_numeric_cell(s: &str) -> Option<Option<f64>> {
    let s = s.trim();
    if MISSING_TOKENS.contains(&s) {
        return Some(None);
    }
    s.parse::<f64>().ok().map(Some)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, site: Site) -> Result<SolarTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let ts_idx = headers.iter().position(|h| h == TIMESTAMP);
    let mut timestamps: Option<Vec<Option<NaiveDateTime>>> = ts_idx.map(|_| Vec::new());

    // Columns stay numeric until a cell fails to parse.
    let mut values: Vec<Option<Vec<Option<f64>>>> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (Some(i) != ts_idx && h != SITE).then(Vec::new))
        .collect();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        if let (Some(idx), Some(ts)) = (ts_idx, timestamps.as_mut()) {
            let cell = record.get(idx).unwrap_or("");
            ts.push(parse_timestamp(cell).with_context(|| format!("CSV row {row_no}"))?);
        }

        for (col_idx, cell) in record.iter().enumerate() {
            let Some(slot) = values.get_mut(col_idx) else {
                continue;
            };
            if let Some(column) = slot {
                match parse_numeric_cell(cell) {
                    Some(v) => column.push(v),
                    None => {
                        log::warn!(
                            "{}: column '{}' dropped, row {row_no} holds non-numeric '{}'",
                            path.display(),
                            headers[col_idx],
                            cell.trim()
                        );
                        *slot = None;
                    }
                }
            }
        }
    }

    let columns = headers
        .iter()
        .zip(values)
        .filter_map(|(name, vals)| vals.map(|v| NumericColumn::new(name.clone(), v)))
        .collect();

    Ok(SolarTable::for_site(site, timestamps, columns)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of site measurements.
///
/// Expected schema:
/// - `Timestamp`: Utf8 / LargeUtf8 (parsed like CSV cells), Timestamp or Date
/// - numeric columns of any integer or float type
/// - other columns are ignored
fn load_parquet(path: &Path, site: Site) -> Result<SolarTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let has_timestamp = schema.index_of(TIMESTAMP).is_ok();
    let numeric_names: Vec<String> = schema
        .fields()
        .iter()
        .filter(|f| f.name() != TIMESTAMP && f.data_type().is_numeric())
        .map(|f| f.name().clone())
        .collect();

    let reader = builder.build().context("building parquet reader")?;

    let mut timestamps: Option<Vec<Option<NaiveDateTime>>> = has_timestamp.then(Vec::new);
    let mut columns: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        if let Some(ts) = timestamps.as_mut() {
            let col = batch
                .column_by_name(TIMESTAMP)
                .context("record batch missing 'Timestamp'")?;
            ts.extend(extract_timestamps(col).context("reading 'Timestamp'")?);
        }

        for name in &numeric_names {
            let col = batch
                .column_by_name(name)
                .with_context(|| format!("record batch missing '{name}'"))?;
            let as_f64 = cast(col, &DataType::Float64)
                .with_context(|| format!("casting '{name}' to Float64"))?;
            let arr = as_f64
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            columns.entry(name.clone()).or_default().extend(arr.iter());
        }
    }

    let columns = numeric_names
        .into_iter()
        .map(|name| {
            let values = columns.remove(&name).unwrap_or_default();
            NumericColumn::new(name, values)
        })
        .collect();

    Ok(SolarTable::for_site(site, timestamps, columns)?)
}

fn extract_timestamps(col: &Arc<dyn Array>) -> Result<Vec<Option<NaiveDateTime>>> {
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let as_utf8 = cast(col, &DataType::Utf8).context("casting to Utf8")?;
            let arr = as_utf8
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            arr.iter()
                .map(|cell| match cell {
                    Some(s) => parse_timestamp(s),
                    None => Ok(None),
                })
                .collect()
        }
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
            let as_ms = cast(col, &DataType::Timestamp(TimeUnit::Millisecond, None))
                .context("casting to Timestamp(ms)")?;
            let arr = as_ms
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .context("expected TimestampMillisecondArray")?;
            Ok((0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        None
                    } else {
                        arr.value_as_datetime(i)
                    }
                })
                .collect())
        }
        other => bail!("unsupported Timestamp type {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Per-site load cache
// ---------------------------------------------------------------------------

struct CacheEntry {
    modified: Option<SystemTime>,
    table: Arc<SolarTable>,
}

/// Result of loading every site.
#[derive(Debug, Default)]
pub struct MergedLoad {
    /// `None` when no site loaded.
    pub table: Option<SolarTable>,
    pub errors: Vec<LoadError>,
}

/// Memoizes loaded site tables. A table is read once and reused until its
/// source file's modification time changes; failures are not cached.
pub struct SiteCache {
    paths: BTreeMap<Site, PathBuf>,
    entries: HashMap<Site, CacheEntry>,
}

impl SiteCache {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            paths: Site::ALL.iter().map(|&s| (s, config.site_path(s))).collect(),
            entries: HashMap::new(),
        }
    }

    pub fn path(&self, site: Site) -> &Path {
        &self.paths[&site]
    }

    /// Load one site, from the cache when its file is unchanged.
    pub fn load(&mut self, site: Site) -> Result<Arc<SolarTable>, LoadError> {
        let path = self.path(site).to_path_buf();

        if SourceFormat::from_path(&path).is_none() {
            return Err(LoadError::UnsupportedFormat { site, path });
        }

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound { site, path });
            }
            Err(e) => {
                return Err(LoadError::Unreadable {
                    site,
                    path,
                    reason: e.to_string(),
                });
            }
        };
        let modified = metadata.modified().ok();

        if let Some(entry) = self.entries.get(&site) {
            if entry.modified == modified {
                log::debug!("Cache hit for {site}");
                return Ok(Arc::clone(&entry.table));
            }
            log::info!("{} changed on disk, reloading", path.display());
        }

        let table = match load_file(&path, site) {
            Ok(table) => Arc::new(table),
            Err(e) => {
                let reason = format!("{e:#}");
                let io_failure = e.chain().any(|c| c.is::<std::io::Error>());
                return Err(if io_failure {
                    LoadError::Unreadable { site, path, reason }
                } else {
                    LoadError::Malformed { site, path, reason }
                });
            }
        };

        log::info!(
            "Loaded {} rows for {site} with columns {:?}",
            table.len(),
            table.column_names()
        );
        self.entries.insert(
            site,
            CacheEntry {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Load every site in enumeration order and concatenate the successes.
    pub fn load_all(&mut self) -> MergedLoad {
        let mut tables = Vec::new();
        let mut errors = Vec::new();

        for site in Site::ALL {
            match self.load(site) {
                Ok(table) => tables.push(table),
                Err(e) => {
                    log::warn!("{e}");
                    errors.push(e);
                }
            }
        }

        MergedLoad {
            table: SolarTable::concat(tables.iter().map(|t| t.as_ref())),
            errors,
        }
    }
}

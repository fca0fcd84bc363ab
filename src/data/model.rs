use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const TIMESTAMP: &str = "Timestamp";
pub const SITE: &str = "Site";

pub const GHI: &str = "GHI";
pub const DNI: &str = "DNI";
pub const DHI: &str = "DHI";
pub const TAMB: &str = "Tamb";
pub const RH: &str = "RH";
pub const WS: &str = "WS";
pub const BP: &str = "BP";

/// Irradiance metrics, in the order the summary table iterates them.
pub const IRRADIANCE_COLUMNS: [&str; 3] = [GHI, DNI, DHI];

/// Environmental variables summarised on the environmental tab.
pub const ENVIRONMENT_COLUMNS: [&str; 4] = [TAMB, RH, WS, BP];

// ---------------------------------------------------------------------------
// Site – one of the fixed measurement locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Site {
    #[serde(rename = "Benin")]
    Benin,
    #[serde(rename = "Sierra Leone")]
    SierraLeone,
    #[serde(rename = "Togo")]
    Togo,
}

impl Site {
    /// Every known site, in load / concatenation order.
    pub const ALL: [Site; 3] = [Site::Benin, Site::SierraLeone, Site::Togo];

    pub fn label(self) -> &'static str {
        match self {
            Site::Benin => "Benin",
            Site::SierraLeone => "Sierra Leone",
            Site::Togo => "Togo",
        }
    }

    /// File name of the cleaned dataset inside the data directory.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Site::Benin => "benin_clean.csv",
            Site::SierraLeone => "sierraleone_clean.csv",
            Site::Togo => "togo-dapaong_qc.csv",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Metric – the selectable irradiance measure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Ghi,
    Dni,
    Dhi,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Ghi, Metric::Dni, Metric::Dhi];

    /// Column name of the metric in a [`SolarTable`].
    pub fn column(self) -> &'static str {
        match self {
            Metric::Ghi => GHI,
            Metric::Dni => DNI,
            Metric::Dhi => DHI,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::Ghi => "Global Horizontal Irradiance",
            Metric::Dni => "Direct Normal Irradiance",
            Metric::Dhi => "Diffuse Horizontal Irradiance",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// NumericColumn – one named column of optional floats
// ---------------------------------------------------------------------------

/// A numeric column. Missing cells (empty or NaN in the source) are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl NumericColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect(),
        }
    }

    /// The non-missing values, in row order.
    pub fn present(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// The non-missing values among the given rows.
    pub fn present_at(&self, rows: &[usize]) -> Vec<f64> {
        rows.iter().filter_map(|&i| self.values[i]).collect()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

// ---------------------------------------------------------------------------
// SolarTable – the in-memory record table
// ---------------------------------------------------------------------------

/// Columnar record table: a site tag per row, an optional timestamp column
/// and any number of numeric columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolarTable {
    /// `None` when the source had no `Timestamp` column.
    pub timestamps: Option<Vec<Option<NaiveDateTime>>>,
    pub sites: Vec<Site>,
    pub columns: Vec<NumericColumn>,
}

impl SolarTable {
    /// Build a single-site table, tagging every row with `site`.
    pub fn for_site(
        site: Site,
        timestamps: Option<Vec<Option<NaiveDateTime>>>,
        columns: Vec<NumericColumn>,
    ) -> Result<Self, TableError> {
        let len = match (&timestamps, columns.first()) {
            (Some(ts), _) => ts.len(),
            (None, Some(col)) => col.values.len(),
            (None, None) => 0,
        };
        Self::new(timestamps, vec![site; len], columns)
    }

    pub fn new(
        timestamps: Option<Vec<Option<NaiveDateTime>>>,
        sites: Vec<Site>,
        columns: Vec<NumericColumn>,
    ) -> Result<Self, TableError> {
        let expected = sites.len();
        if let Some(ts) = &timestamps {
            if ts.len() != expected {
                return Err(TableError::LengthMismatch {
                    column: TIMESTAMP.to_string(),
                    expected,
                    actual: ts.len(),
                });
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if col.values.len() != expected {
                return Err(TableError::LengthMismatch {
                    column: col.name.clone(),
                    expected,
                    actual: col.values.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self {
            timestamps,
            sites,
            columns,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamps.is_some()
    }

    pub fn column(&self, name: &str) -> Option<&NumericColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn timestamp(&self, row: usize) -> Option<NaiveDateTime> {
        self.timestamps.as_ref().and_then(|ts| ts[row])
    }

    /// Earliest and latest non-missing timestamp.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let ts = self.timestamps.as_ref()?;
        let mut iter = ts.iter().flatten().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    /// Row indices grouped by site, in order of first appearance.
    pub fn rows_by_site(&self) -> Vec<(Site, Vec<usize>)> {
        let mut groups: Vec<(Site, Vec<usize>)> = Vec::new();
        let mut slot: BTreeMap<Site, usize> = BTreeMap::new();
        for (row, &site) in self.sites.iter().enumerate() {
            let idx = *slot.entry(site).or_insert_with(|| {
                groups.push((site, Vec::new()));
                groups.len() - 1
            });
            groups[idx].1.push(row);
        }
        groups
    }

    /// New table holding the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> SolarTable {
        SolarTable {
            timestamps: self
                .timestamps
                .as_ref()
                .map(|ts| rows.iter().map(|&i| ts[i]).collect()),
            sites: rows.iter().map(|&i| self.sites[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| NumericColumn {
                    name: c.name.clone(),
                    values: rows.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        }
    }

    /// Row-wise concatenation. Columns are the union of the inputs' columns
    /// in first-seen order; rows from a table lacking a column get `None`.
    /// Returns `None` when there is nothing to concatenate.
    pub fn concat<'a, I>(tables: I) -> Option<SolarTable>
    where
        I: IntoIterator<Item = &'a SolarTable>,
    {
        let tables: Vec<&SolarTable> = tables.into_iter().collect();
        if tables.is_empty() {
            return None;
        }

        let mut names: Vec<&str> = Vec::new();
        for t in &tables {
            for c in &t.columns {
                if !names.contains(&c.name.as_str()) {
                    names.push(&c.name);
                }
            }
        }

        let any_timestamp = tables.iter().any(|t| t.has_timestamp());
        let timestamps = any_timestamp.then(|| {
            tables
                .iter()
                .flat_map(|t| match &t.timestamps {
                    Some(ts) => ts.clone(),
                    None => vec![None; t.len()],
                })
                .collect()
        });

        let sites = tables.iter().flat_map(|t| t.sites.iter().copied()).collect();

        let columns = names
            .iter()
            .map(|name| NumericColumn {
                name: name.to_string(),
                values: tables
                    .iter()
                    .flat_map(|t| match t.column(name) {
                        Some(c) => c.values.clone(),
                        None => vec![None; t.len()],
                    })
                    .collect(),
            })
            .collect();

        Some(SolarTable {
            timestamps,
            sites,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2021, 8, 9).and_then(|d| d.and_hms_opt(h, 0, 0))
    }

    #[test]
    fn nan_is_stored_as_missing() {
        let col = NumericColumn::new(GHI, vec![Some(1.0), Some(f64::NAN), None]);
        assert_eq!(col.values, vec![Some(1.0), None, None]);
        assert_eq!(col.present(), vec![1.0]);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = SolarTable::new(
            Some(vec![ts(0), ts(1)]),
            vec![Site::Benin; 2],
            vec![NumericColumn::new(GHI, vec![Some(1.0)])],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TableError::LengthMismatch {
                column: GHI.to_string(),
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn concat_unions_columns_and_keeps_site_tags() {
        let a = SolarTable::for_site(
            Site::Benin,
            Some(vec![ts(0), ts(1)]),
            vec![NumericColumn::new(GHI, vec![Some(1.0), Some(2.0)])],
        )
        .unwrap();
        let b = SolarTable::for_site(
            Site::Togo,
            None,
            vec![
                NumericColumn::new(DNI, vec![Some(5.0)]),
                NumericColumn::new(GHI, vec![Some(3.0)]),
            ],
        )
        .unwrap();

        let merged = SolarTable::concat([&a, &b]).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.sites, vec![Site::Benin, Site::Benin, Site::Togo]);
        assert_eq!(merged.column_names(), vec![GHI, DNI]);
        assert_eq!(merged.column(DNI).unwrap().values, vec![None, None, Some(5.0)]);
        assert_eq!(merged.timestamps.as_ref().unwrap()[2], None);
    }

    #[test]
    fn concat_of_nothing_is_none() {
        assert!(SolarTable::concat(std::iter::empty()).is_none());
    }

    #[test]
    fn rows_by_site_follows_first_appearance() {
        let table = SolarTable::new(
            None,
            vec![Site::Togo, Site::Benin, Site::Togo],
            vec![NumericColumn::new(GHI, vec![Some(1.0), Some(2.0), Some(3.0)])],
        )
        .unwrap();
        let groups = table.rows_by_site();
        assert_eq!(groups, vec![(Site::Togo, vec![0, 2]), (Site::Benin, vec![1])]);
    }

    #[test]
    fn site_labels_are_distinct() {
        let labels: std::collections::BTreeSet<_> = Site::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), Site::ALL.len());
        assert_eq!(Site::SierraLeone.to_string(), "Sierra Leone");
    }
}

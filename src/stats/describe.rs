use crate::data::model::{IRRADIANCE_COLUMNS, Site, SolarTable};

use super::summary;

// ---------------------------------------------------------------------------
// Describe – descriptive statistics of one metric
// ---------------------------------------------------------------------------

/// Descriptive statistics of one numeric column.
///
/// `count` is the number of rows in the table, including rows where the
/// metric is missing. The other fields only see present values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Describe {
    /// Label/value pairs in display order.
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("Mean", self.mean),
            ("Median", self.median),
            ("Std Dev", self.std_dev),
            ("Min", self.min),
            ("Max", self.max),
            ("Count", self.count as f64),
        ]
    }
}

/// Statistics of `metric`, or `None` when the column is absent or the table
/// has no rows.
pub fn describe(table: &SolarTable, metric: &str) -> Option<Describe> {
    if table.is_empty() {
        return None;
    }
    let values = table.column(metric)?.present();
    Some(Describe {
        mean: summary::mean(&values),
        median: summary::median(&values),
        std_dev: summary::sample_std_dev(&values),
        min: summary::min(&values),
        max: summary::max(&values),
        count: table.len(),
    })
}

// ---------------------------------------------------------------------------
// Per-site summary table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub site: Site,
    pub metric: &'static str,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub max: f64,
}

/// One row per (site, irradiance metric). Sites in order of first
/// appearance, metrics in `GHI, DNI, DHI` order, absent metrics skipped.
pub fn summary_table(table: &SolarTable) -> Vec<SummaryRow> {
    let metrics: Vec<_> = IRRADIANCE_COLUMNS
        .into_iter()
        .filter_map(|m| table.column(m).map(|c| (m, c)))
        .collect();

    let mut rows = Vec::new();
    for (site, indices) in table.rows_by_site() {
        for &(metric, column) in &metrics {
            let values = column.present_at(&indices);
            rows.push(SummaryRow {
                site,
                metric,
                mean: summary::mean(&values),
                median: summary::median(&values),
                std_dev: summary::sample_std_dev(&values),
                max: summary::max(&values),
            });
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Column summaries (environmental variables)
// ---------------------------------------------------------------------------

/// Eight-number summary of a column; `count` is the number of present values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

pub fn describe_columns(table: &SolarTable, columns: &[&str]) -> Vec<ColumnSummary> {
    columns
        .iter()
        .filter_map(|&name| table.column(name))
        .map(|col| {
            let sorted = summary::sorted(&col.present());
            ColumnSummary {
                column: col.name.clone(),
                count: sorted.len(),
                mean: summary::mean(&sorted),
                std_dev: summary::sample_std_dev(&sorted),
                min: summary::percentile_of_sorted(&sorted, 0.0),
                p25: summary::percentile_of_sorted(&sorted, 25.0),
                p50: summary::percentile_of_sorted(&sorted, 50.0),
                p75: summary::percentile_of_sorted(&sorted, 75.0),
                max: summary::percentile_of_sorted(&sorted, 100.0),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-site distributions (box plots)
// ---------------------------------------------------------------------------

/// Box-plot geometry for one site. Whiskers reach the most extreme values
/// within 1.5 IQR of the quartiles.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDistribution {
    pub site: Site,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

pub fn site_distributions(table: &SolarTable, metric: &str) -> Vec<SiteDistribution> {
    let Some(column) = table.column(metric) else {
        return Vec::new();
    };

    table
        .rows_by_site()
        .into_iter()
        .filter_map(|(site, indices)| {
            let sorted = summary::sorted(&column.present_at(&indices));
            let (&min, &max) = (sorted.first()?, sorted.last()?);
            let q1 = summary::percentile_of_sorted(&sorted, 25.0);
            let q3 = summary::percentile_of_sorted(&sorted, 75.0);
            let fence = 1.5 * (q3 - q1);
            let lower_whisker = sorted
                .iter()
                .copied()
                .find(|&v| v >= q1 - fence)
                .unwrap_or(min);
            let upper_whisker = sorted
                .iter()
                .rev()
                .copied()
                .find(|&v| v <= q3 + fence)
                .unwrap_or(max);
            Some(SiteDistribution {
                site,
                lower_whisker,
                q1,
                median: summary::percentile_of_sorted(&sorted, 50.0),
                q3,
                upper_whisker,
                min,
                max,
                count: sorted.len(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scatter sampling
// ---------------------------------------------------------------------------

/// Every `stride`-th row where both `x` and `y` are present.
pub fn scatter_points(table: &SolarTable, x: &str, y: &str, stride: usize) -> Vec<(Site, f64, f64)> {
    let (Some(xs), Some(ys)) = (table.column(x), table.column(y)) else {
        return Vec::new();
    };
    (0..table.len())
        .step_by(stride.max(1))
        .filter_map(|i| Some((table.sites[i], xs.values[i]?, ys.values[i]?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DHI, DNI, GHI, NumericColumn, RH, TAMB, WS};

    fn ghi_table(values: Vec<Option<f64>>) -> SolarTable {
        SolarTable::for_site(Site::Benin, None, vec![NumericColumn::new(GHI, values)]).unwrap()
    }

    #[test]
    fn describe_matches_reference_values() {
        let table = ghi_table(vec![Some(0.0), Some(100.0), Some(200.0), Some(300.0), Some(400.0)]);
        let d = describe(&table, GHI).unwrap();
        assert!((d.mean - 200.0).abs() < 1e-9);
        assert_eq!(d.median, 200.0);
        assert!((d.std_dev - 158.113_883).abs() < 1e-5);
        assert_eq!(d.min, 0.0);
        assert_eq!(d.max, 400.0);
        assert_eq!(d.count, 5);
    }

    // `count` follows the table length, not the number of present values.
    #[test]
    fn describe_count_includes_missing_values() {
        let table = ghi_table(vec![Some(1.0), None, Some(3.0), None]);
        let d = describe(&table, GHI).unwrap();
        assert_eq!(d.count, table.len());
        assert_eq!(d.count, 4);
        assert!((d.mean - 2.0).abs() < 1e-12);
    }

    #[test]
    fn describe_absent_metric_or_empty_table_is_none() {
        let table = ghi_table(vec![Some(1.0)]);
        assert!(describe(&table, DNI).is_none());
        assert!(describe(&table.take(&[]), GHI).is_none());
    }

    #[test]
    fn describe_all_missing_is_nan() {
        let d = describe(&ghi_table(vec![None, None]), GHI).unwrap();
        assert!(d.mean.is_nan());
        assert_eq!(d.count, 2);
    }

    #[test]
    fn summary_table_orders_sites_then_metrics() {
        let table = SolarTable::new(
            None,
            vec![Site::Togo, Site::Togo, Site::Benin],
            vec![
                NumericColumn::new(DHI, vec![Some(1.0), Some(3.0), Some(5.0)]),
                NumericColumn::new(GHI, vec![Some(10.0), Some(20.0), Some(50.0)]),
            ],
        )
        .unwrap();

        let rows = summary_table(&table);
        let keys: Vec<(Site, &str)> = rows.iter().map(|r| (r.site, r.metric)).collect();
        assert_eq!(
            keys,
            vec![(Site::Togo, GHI), (Site::Togo, DHI), (Site::Benin, GHI), (Site::Benin, DHI)]
        );
        assert!((rows[0].mean - 15.0).abs() < 1e-12);
        assert_eq!(rows[0].max, 20.0);
        assert!(rows[2].std_dev.is_nan());
    }

    #[test]
    fn describe_columns_skips_absent_variables() {
        let table = SolarTable::for_site(
            Site::Benin,
            None,
            vec![
                NumericColumn::new(TAMB, vec![Some(20.0), Some(22.0), None, Some(24.0), Some(26.0)]),
                NumericColumn::new(RH, vec![None; 5]),
            ],
        )
        .unwrap();

        let out = describe_columns(&table, &[TAMB, RH, WS]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].count, 4);
        assert!((out[0].mean - 23.0).abs() < 1e-12);
        assert_eq!(out[0].p25, 21.5);
        assert_eq!(out[0].max, 26.0);
        assert_eq!(out[1].count, 0);
        assert!(out[1].mean.is_nan());
    }

    #[test]
    fn whiskers_exclude_outliers() {
        let mut values: Vec<Option<f64>> = (1..=9).map(|v| Some(f64::from(v))).collect();
        values.push(Some(100.0));
        let dists = site_distributions(&ghi_table(values), GHI);
        assert_eq!(dists.len(), 1);
        let d = &dists[0];
        assert_eq!(d.lower_whisker, 1.0);
        assert_eq!(d.upper_whisker, 9.0);
        assert_eq!(d.max, 100.0);
        assert_eq!(d.count, 10);
    }

    #[test]
    fn scatter_samples_with_stride() {
        let table = SolarTable::for_site(
            Site::Togo,
            None,
            vec![
                NumericColumn::new(TAMB, (0..10).map(|v| Some(f64::from(v))).collect()),
                NumericColumn::new(GHI, (0..10).map(|v| (v != 4).then_some(f64::from(v) * 2.0)).collect()),
            ],
        )
        .unwrap();
        let pts = scatter_points(&table, TAMB, GHI, 2);
        assert_eq!(
            pts,
            vec![
                (Site::Togo, 0.0, 0.0),
                (Site::Togo, 2.0, 4.0),
                (Site::Togo, 6.0, 12.0),
                (Site::Togo, 8.0, 16.0)
            ]
        );
    }
}

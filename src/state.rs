use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::color::SiteColors;
use crate::config::DashboardConfig;
use crate::data::filter::{date_bounds, day_bounds, filter_by_date_range};
use crate::data::loader::{LoadError, SiteCache};
use crate::data::model::{ENVIRONMENT_COLUMNS, Metric, RH, Site, SolarTable, TAMB};
use crate::export;
use crate::stats::correlation::{CORRELATION_COLUMNS, CorrelationMatrix, correlation_matrix};
use crate::stats::describe::{
    ColumnSummary, Describe, SiteDistribution, SummaryRow, describe, describe_columns,
    scatter_points, site_distributions, summary_table,
};
use crate::stats::resample::{HourlyBucket, hourly_pattern, resample_hourly};
use crate::stats::significance::{SignificanceError, TestResult, anova_and_kruskal};

// ---------------------------------------------------------------------------
// Selections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    SingleSite,
    CompareAll,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::SingleSite => "Single Site",
            ViewMode::CompareAll => "Compare All Sites",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    TimeSeries,
    Comparison,
    Correlation,
    Environmental,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::TimeSeries, Tab::Comparison, Tab::Correlation, Tab::Environmental];

    pub fn label(self) -> &'static str {
        match self {
            Tab::TimeSeries => "📈 Time Series",
            Tab::Comparison => "📦 Comparison",
            Tab::Correlation => "🔗 Correlation",
            Tab::Environmental => "🌡 Environmental",
        }
    }
}

/// Optional calendar-day filter. `bounds` is the span of the loaded data.
#[derive(Debug, Clone, PartialEq)]
pub struct DateFilter {
    pub enabled: bool,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bounds: Option<(NaiveDate, NaiveDate)>,
}

impl Default for DateFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
            bounds: None,
        }
    }
}

impl DateFilter {
    /// Adopt the span of newly loaded data, resetting the selection to it
    /// when the span changed.
    fn set_bounds(&mut self, bounds: Option<(NaiveDate, NaiveDate)>) {
        if self.bounds != bounds {
            if let Some((lo, hi)) = bounds {
                self.start = lo;
                self.end = hi;
            }
            self.bounds = bounds;
        }
    }

    /// Keep the picked days inside the data span.
    pub fn clamp_to_bounds(&mut self) {
        if let Some((lo, hi)) = self.bounds {
            self.start = self.start.clamp(lo, hi);
            self.end = self.end.clamp(lo, hi);
        }
    }
}

// ---------------------------------------------------------------------------
// Derived results
// ---------------------------------------------------------------------------

/// Everything the panels draw for the current selection.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub describe: Option<Describe>,
    pub hourly: Option<Vec<HourlyBucket>>,
    pub hourly_pattern: Option<Vec<(u32, f64)>>,
    pub correlation: Option<CorrelationMatrix>,
    pub key_correlations: Option<Vec<(String, f64)>>,
    pub distributions: Vec<SiteDistribution>,
    pub summary: Vec<SummaryRow>,
    /// Only computed in the compare-all view with tests enabled.
    pub tests: Option<Result<Option<TestResult>, SignificanceError>>,
    pub environment: Vec<ColumnSummary>,
    pub scatter_tamb: Vec<(Site, f64, f64)>,
    pub scatter_rh: Vec<(Site, f64, f64)>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    cache: SiteCache,

    pub view_mode: ViewMode,
    pub site: Site,
    pub metric: Metric,
    pub date_filter: DateFilter,
    pub show_tests: bool,
    pub show_raw_data: bool,
    pub tab: Tab,

    /// Loaded data for the current view (None when nothing loaded).
    pub source: Option<Arc<SolarTable>>,
    /// `source` after the date filter.
    pub table: Option<SolarTable>,
    /// Derived results for `table` (None when there are no rows).
    pub analysis: Option<Analysis>,

    /// Per-site load failures from the last load.
    pub load_errors: Vec<LoadError>,
    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    pub site_colors: SiteColors,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = SiteCache::new(&config);
        let mut state = Self {
            config,
            cache,
            view_mode: ViewMode::SingleSite,
            site: Site::Benin,
            metric: Metric::default(),
            date_filter: DateFilter::default(),
            show_tests: false,
            show_raw_data: false,
            tab: Tab::default(),
            source: None,
            table: None,
            analysis: None,
            load_errors: Vec::new(),
            status_message: None,
            site_colors: SiteColors::default(),
        };
        state.reload();
        state
    }

    /// "Benin", … or "All Sites"; used in headings and export names.
    pub fn selection_label(&self) -> &'static str {
        match self.view_mode {
            ViewMode::SingleSite => self.site.label(),
            ViewMode::CompareAll => "All Sites",
        }
    }

    /// Load the data for the current view mode / site, then refilter.
    pub fn reload(&mut self) {
        self.load_errors.clear();
        self.source = match self.view_mode {
            ViewMode::SingleSite => match self.cache.load(self.site) {
                Ok(table) => Some(table),
                Err(e) => {
                    log::warn!("{e}");
                    self.load_errors.push(e);
                    None
                }
            },
            ViewMode::CompareAll => {
                let merged = self.cache.load_all();
                self.load_errors = merged.errors;
                merged.table.map(Arc::new)
            }
        };

        let bounds = self.source.as_deref().and_then(date_bounds);
        self.date_filter.set_bounds(bounds);
        self.refilter();
    }

    /// Apply the date filter to `source`, then recompute.
    pub fn refilter(&mut self) {
        self.table = self.source.as_deref().map(|source| {
            if self.date_filter.enabled {
                let (start, end) = day_bounds(self.date_filter.start, self.date_filter.end);
                filter_by_date_range(source, start, end)
            } else {
                source.clone()
            }
        });
        self.recompute();
    }

    /// Recompute every derived result for the current table and selection.
    pub fn recompute(&mut self) {
        let metric = self.metric.column();
        self.analysis = self
            .table
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|table| {
                let correlation = correlation_matrix(table, &CORRELATION_COLUMNS);
                let key_correlations = correlation
                    .as_ref()
                    .and_then(|m| m.correlations_with(metric));

                let tests = (self.view_mode == ViewMode::CompareAll && self.show_tests).then(|| {
                    let result = anova_and_kruskal(table, metric);
                    if let Err(e) = &result {
                        log::warn!("Significance tests for {metric} skipped: {e}");
                    }
                    result
                });

                let stride = self.config.scatter_stride;
                Analysis {
                    describe: describe(table, metric),
                    hourly: resample_hourly(table, metric),
                    hourly_pattern: hourly_pattern(table, metric),
                    correlation,
                    key_correlations,
                    distributions: site_distributions(table, metric),
                    summary: summary_table(table),
                    tests,
                    environment: describe_columns(table, &ENVIRONMENT_COLUMNS),
                    scatter_tamb: scatter_points(table, TAMB, metric, stride),
                    scatter_rh: scatter_points(table, RH, metric, stride),
                }
            });
    }

    // ---- Control setters: each triggers the minimal recomputation ----

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.reload();
        }
    }

    pub fn set_site(&mut self, site: Site) {
        if self.site != site {
            self.site = site;
            self.reload();
        }
    }

    pub fn set_metric(&mut self, metric: Metric) {
        if self.metric != metric {
            self.metric = metric;
            self.recompute();
        }
    }

    pub fn set_show_tests(&mut self, show: bool) {
        if self.show_tests != show {
            self.show_tests = show;
            self.recompute();
        }
    }

    pub fn set_date_filter(&mut self, filter: DateFilter) {
        if self.date_filter != filter {
            self.date_filter = filter;
            self.date_filter.clamp_to_bounds();
            self.refilter();
        }
    }

    // ---- Export ----

    pub fn export_file_name(&self, today: NaiveDate) -> String {
        export::export_file_name(self.selection_label(), today)
    }

    /// Write the filtered table's display columns to `path`.
    pub fn write_export(&self, path: &Path) -> Result<usize> {
        let table = self.table.as_ref().context("no data to export")?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        export::write_csv(table, std::io::BufWriter::new(file))?;
        Ok(table.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    fn write_site(dir: &Path, site: Site, offset: f64) {
        let mut text = String::from("Timestamp,GHI,DNI,DHI,Tamb,RH,WS,BP\n");
        for day in 1..=3 {
            for hour in 0..24 {
                let ghi = if (6..18).contains(&hour) {
                    offset + f64::from(hour) * 10.0
                } else {
                    0.0
                };
                writeln!(
                    text,
                    "2021-08-{day:02} {hour:02}:00,{ghi},{},{},{},{},2.0,1000",
                    ghi * 0.8,
                    ghi * 0.2,
                    24.0 + ghi / 100.0,
                    80.0 - ghi / 50.0
                )
                .unwrap();
            }
        }
        std::fs::write(dir.join(site.default_file_name()), text).unwrap();
    }

    fn state_with_all_sites() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path(), Site::Benin, 100.0);
        write_site(dir.path(), Site::SierraLeone, 50.0);
        write_site(dir.path(), Site::Togo, 80.0);
        let config = DashboardConfig {
            data_dir: dir.path().to_path_buf(),
            scatter_stride: 1,
            ..DashboardConfig::default()
        };
        (dir, AppState::new(config))
    }

    #[test]
    fn single_site_view_loads_and_analyses() {
        let (_dir, state) = state_with_all_sites();
        assert!(state.load_errors.is_empty());
        assert_eq!(state.table.as_ref().unwrap().len(), 72);
        let analysis = state.analysis.as_ref().unwrap();
        assert_eq!(analysis.describe.unwrap().count, 72);
        assert_eq!(analysis.hourly.as_ref().unwrap().len(), 72);
        assert_eq!(analysis.hourly_pattern.as_ref().unwrap().len(), 24);
        assert!(analysis.tests.is_none());
        assert_eq!(analysis.environment.len(), 4);
        assert_eq!(analysis.scatter_tamb.len(), 72);
        assert_eq!(state.date_filter.bounds, Some((
            NaiveDate::from_ymd_opt(2021, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 8, 3).unwrap(),
        )));
    }

    #[test]
    fn compare_view_merges_sites_and_runs_tests() {
        let (_dir, mut state) = state_with_all_sites();
        state.set_show_tests(true);
        state.set_view_mode(ViewMode::CompareAll);

        assert_eq!(state.table.as_ref().unwrap().len(), 216);
        let analysis = state.analysis.as_ref().unwrap();
        assert_eq!(analysis.distributions.len(), 3);
        assert_eq!(analysis.summary.len(), 9);
        let tests = analysis.tests.as_ref().unwrap().as_ref().unwrap().unwrap();
        assert!(tests.anova.p_value.is_finite());
        assert_eq!(state.selection_label(), "All Sites");
    }

    #[test]
    fn compare_view_with_one_site_reports_test_error() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path(), Site::Togo, 80.0);
        let config = DashboardConfig {
            data_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.set_show_tests(true);
        state.set_view_mode(ViewMode::CompareAll);

        let failed: Vec<Site> = state.load_errors.iter().map(LoadError::site).collect();
        assert_eq!(failed, vec![Site::Benin, Site::SierraLeone]);

        let snapshot = state.analysis.clone().unwrap();
        assert_eq!(
            snapshot.tests,
            Some(Err(SignificanceError::InsufficientGroups { found: 1 }))
        );
    }

    #[test]
    fn date_filter_narrows_to_whole_days() {
        let (_dir, mut state) = state_with_all_sites();
        let mut filter = state.date_filter.clone();
        filter.enabled = true;
        filter.start = NaiveDate::from_ymd_opt(2021, 8, 2).unwrap();
        filter.end = NaiveDate::from_ymd_opt(2021, 8, 2).unwrap();
        state.set_date_filter(filter);
        assert_eq!(state.table.as_ref().unwrap().len(), 24);
    }

    #[test]
    fn empty_date_range_clears_the_analysis() {
        let (_dir, mut state) = state_with_all_sites();
        let mut filter = state.date_filter.clone();
        filter.enabled = true;
        filter.start = NaiveDate::from_ymd_opt(2021, 8, 3).unwrap();
        filter.end = NaiveDate::from_ymd_opt(2021, 8, 1).unwrap();
        state.set_date_filter(filter);

        let table = state.table.as_ref().unwrap();
        assert!(table.is_empty());
        assert!(describe(table, GHI_COLUMN).is_none());
        assert!(state.analysis.is_none());
    }

    const GHI_COLUMN: &str = crate::data::model::GHI;

    #[test]
    fn missing_files_degrade_to_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            data_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        assert!(state.source.is_none());
        assert!(state.analysis.is_none());
        assert_eq!(state.load_errors.len(), 1);
        assert_eq!(state.load_errors[0].site(), Site::Benin);

        state.set_view_mode(ViewMode::CompareAll);
        assert!(state.source.is_none());
        let failed: Vec<Site> = state.load_errors.iter().map(LoadError::site).collect();
        assert_eq!(failed, Site::ALL.to_vec());
    }

    #[test]
    fn export_writes_filtered_rows() {
        let (dir, state) = state_with_all_sites();
        let path = dir.path().join("out.csv");
        assert_eq!(state.write_export(&path).unwrap(), 72);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Site,Timestamp,GHI,DNI,DHI,Tamb,RH,WS\n"));
        assert_eq!(text.lines().count(), 73);
    }
}

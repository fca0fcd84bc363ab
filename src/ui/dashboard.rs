use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{RH, TAMB};
use crate::export::{cell_text, display_columns};
use crate::state::{Analysis, AppState, Tab, ViewMode};
use crate::stats::significance::SIGNIFICANCE_LEVEL;

use super::{panels, plot};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the dashboard body: KPIs, analysis tabs and the raw data table.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let mut tab = state.tab;
    let mut export_requested = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            export_requested = body(ui, state, &mut tab);
        });

    state.tab = tab;
    if export_requested {
        panels::save_export_dialog(state);
    }
}

/// Returns whether the CSV download was requested.
fn body(ui: &mut Ui, state: &AppState, tab: &mut Tab) -> bool {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(RichText::new("☀ Solar Data Analysis Dashboard").size(28.0));
        ui.label(format!("Exploring solar radiation data: {}", state.selection_label()));
    });
    ui.add_space(8.0);

    if state.source.is_none() {
        load_failure(ui, state);
        return false;
    }

    for err in &state.load_errors {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(RichText::new("■").color(state.site_colors.color_for(err.site())));
            ui.label(RichText::new(format!("⚠ {err}")).color(Color32::YELLOW));
        });
    }

    let Some(analysis) = &state.analysis else {
        ui.label(RichText::new("No records in the selected date range.").color(Color32::YELLOW));
        return false;
    };

    kpi_row(ui, state, analysis);
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        for option in Tab::ALL {
            ui.selectable_value(tab, option, RichText::new(option.label()).strong());
        }
    });
    ui.separator();

    match *tab {
        Tab::TimeSeries => time_series_tab(ui, state, analysis),
        Tab::Comparison => comparison_tab(ui, state, analysis),
        Tab::Correlation => correlation_tab(ui, state, analysis),
        Tab::Environmental => environmental_tab(ui, state, analysis),
    }

    if state.show_raw_data {
        ui.separator();
        return raw_data(ui, state);
    }
    false
}

fn load_failure(ui: &mut Ui, state: &AppState) {
    ui.label(
        RichText::new("❌ Unable to load data. Please check that the data files exist.")
            .color(Color32::RED)
            .strong(),
    );
    for err in &state.load_errors {
        ui.label(RichText::new(err.to_string()).color(Color32::RED));
    }
    ui.add_space(4.0);
    ui.label("Expected files:");
    for path in state.config.expected_files() {
        ui.monospace(format!("  - {}", path.display()));
    }
}

// ---------------------------------------------------------------------------
// Key performance indicators
// ---------------------------------------------------------------------------

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn kpi(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(label);
        ui.heading(RichText::new(value).color(Color32::from_rgb(255, 107, 53)));
    });
}

fn kpi_row(ui: &mut Ui, state: &AppState, analysis: &Analysis) {
    ui.heading("📊 Key Performance Indicators");
    let metric = state.metric.column();
    let Some(d) = analysis.describe else {
        ui.label(format!("{metric} is not available in this dataset."));
        return;
    };
    ui.columns(4, |cols| {
        kpi(&mut cols[0], &format!("Average {metric}"), format!("{:.2} W/m²", d.mean));
        kpi(&mut cols[1], &format!("Peak {metric}"), format!("{:.2} W/m²", d.max));
        kpi(&mut cols[2], "Std Deviation", format!("{:.2} W/m²", d.std_dev));
        kpi(&mut cols[3], "Total Records", thousands(d.count));
    });
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

fn time_series_tab(ui: &mut Ui, state: &AppState, analysis: &Analysis) {
    let metric = state.metric.column();
    ui.heading(format!("Time Series Analysis - {metric}"));

    ui.columns(2, |cols| {
        match &analysis.hourly {
            Some(buckets) => plot::time_series_plot(&mut cols[0], metric, buckets),
            None => {
                cols[0].label("Time series needs a Timestamp column.");
            }
        }
        cols[1].strong("Average by Hour of Day");
        if let Some(pattern) = &analysis.hourly_pattern {
            plot::hourly_pattern_plot(&mut cols[1], metric, pattern);
        }
    });

    if let Some(d) = analysis.describe {
        ui.strong("Summary Statistics");
        egui::Grid::new("describe_grid").striped(true).show(ui, |ui: &mut Ui| {
            for (label, value) in d.entries() {
                ui.label(label);
                if label == "Count" {
                    ui.label(thousands(d.count));
                } else {
                    ui.label(format_value(value, 2));
                }
                ui.end_row();
            }
        });
    }
}

fn comparison_tab(ui: &mut Ui, state: &AppState, analysis: &Analysis) {
    let metric = state.metric.column();
    ui.heading(format!("Site Comparison - {metric}"));

    if state.view_mode != ViewMode::CompareAll {
        ui.label("ℹ Switch to 'Compare All Sites' view to see comparisons");
        return;
    }

    plot::comparison_box_plot(ui, metric, &analysis.distributions, &state.site_colors);

    ui.strong("Summary Statistics by Site");
    egui::Grid::new("summary_grid").striped(true).show(ui, |ui: &mut Ui| {
        for header in ["Site", "Metric", "Mean", "Median", "Std Dev", "Max"] {
            ui.strong(header);
        }
        ui.end_row();
        for row in analysis.summary.iter().filter(|r| r.metric == metric) {
            ui.label(row.site.label());
            ui.label(row.metric);
            for v in [row.mean, row.median, row.std_dev, row.max] {
                ui.label(format_value(v, 2));
            }
            ui.end_row();
        }
    });

    let Some(tests) = &analysis.tests else {
        return;
    };
    ui.separator();
    ui.strong("Statistical Tests");
    match tests {
        Ok(Some(result)) => {
            ui.columns(2, |cols| {
                cols[0].strong("ANOVA Test");
                cols[0].label(format!("F-statistic: {:.4}", result.anova.statistic));
                cols[0].label(format!("P-value: {:.6}", result.anova.p_value));
                cols[1].strong("Kruskal-Wallis Test");
                cols[1].label(format!("H-statistic: {:.4}", result.kruskal.statistic));
                cols[1].label(format!("P-value: {:.6}", result.kruskal.p_value));
            });
            if result.significant {
                ui.label(
                    RichText::new(format!(
                        "✅ Significant difference detected (p < {SIGNIFICANCE_LEVEL})"
                    ))
                    .color(Color32::GREEN),
                );
            } else {
                ui.label(format!(
                    "ℹ No significant difference detected (p ≥ {SIGNIFICANCE_LEVEL})"
                ));
            }
        }
        Ok(None) => {
            ui.label(format!("{metric} is not available for testing."));
        }
        Err(e) => {
            ui.label(RichText::new(format!("Tests unavailable: {e}")).color(Color32::YELLOW));
        }
    }
}

fn correlation_tab(ui: &mut Ui, state: &AppState, analysis: &Analysis) {
    ui.heading("Correlation Analysis");
    let Some(matrix) = &analysis.correlation else {
        ui.label("At least two numeric variables are needed for correlations.");
        return;
    };

    ui.columns(2, |cols| {
        plot::correlation_heatmap(&mut cols[0], matrix);

        cols[1].strong("Key Correlations");
        if let Some(ranked) = &analysis.key_correlations {
            egui::Grid::new("key_correlations").striped(true).show(&mut cols[1], |ui: &mut Ui| {
                ui.strong("Variable");
                ui.strong(format!("Correlation with {}", state.metric.column()));
                ui.end_row();
                for (name, r) in ranked {
                    ui.label(name);
                    ui.label(format_value(*r, 3));
                    ui.end_row();
                }
            });
        }
    });
}

fn environmental_tab(ui: &mut Ui, state: &AppState, analysis: &Analysis) {
    let metric = state.metric.column();
    ui.heading("Environmental Factors");

    let table = state.table.as_ref();
    let has = |col: &str| table.is_some_and(|t| t.has_column(col));

    ui.columns(2, |cols| {
        if has(TAMB) {
            plot::scatter_plot(&mut cols[0], TAMB, metric, &analysis.scatter_tamb, &state.site_colors);
        }
        if has(RH) {
            plot::scatter_plot(&mut cols[1], RH, metric, &analysis.scatter_rh, &state.site_colors);
        }
    });

    if analysis.environment.is_empty() {
        return;
    }
    ui.strong("Environmental Variables Summary");
    egui::Grid::new("environment_grid").striped(true).show(ui, |ui: &mut Ui| {
        for header in ["", "count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
            ui.strong(header);
        }
        ui.end_row();
        for s in &analysis.environment {
            ui.strong(&s.column);
            ui.label(thousands(s.count));
            for v in [s.mean, s.std_dev, s.min, s.p25, s.p50, s.p75, s.max] {
                ui.label(format_value(v, 2));
            }
            ui.end_row();
        }
    });
}

// ---------------------------------------------------------------------------
// Raw data
// ---------------------------------------------------------------------------

fn raw_data(ui: &mut Ui, state: &AppState) -> bool {
    ui.heading("📋 Raw Data");
    let Some(table) = &state.table else {
        return false;
    };

    let columns = display_columns(table);
    let rows = table.len().min(state.config.raw_preview_rows);
    ui.label(format!("Showing {} of {} records", thousands(rows), thousands(table.len())));

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(400.0)
        .columns(Column::auto().at_least(70.0), columns.len())
        .header(20.0, |mut header| {
            for name in &columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(*name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows, |mut row| {
                let i = row.index();
                for name in &columns {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell_text(table, name, i));
                    });
                }
            });
        });

    ui.button("📥 Download Data as CSV").clicked()
}

fn format_value(v: f64, decimals: usize) -> String {
    if v.is_nan() {
        "–".to_string()
    } else {
        format!("{v:.decimals$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(3_000_000), "3,000,000");
        assert_eq!(thousands(525_600), "525,600");
    }

    #[test]
    fn missing_values_render_as_dash() {
        assert_eq!(format_value(f64::NAN, 2), "–");
        assert_eq!(format_value(158.113_883, 2), "158.11");
    }
}

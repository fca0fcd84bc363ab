use chrono::{DateTime, NaiveDateTime};
use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, Vec2};
use egui_plot::{BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{SiteColors, correlation_color};
use crate::data::model::Site;
use crate::stats::correlation::CorrelationMatrix;
use crate::stats::describe::SiteDistribution;
use crate::stats::resample::HourlyBucket;

const PLOT_HEIGHT: f32 = 320.0;
const LINE_COLOR: Color32 = Color32::from_rgb(255, 107, 53);

fn to_x(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64
}

fn format_x(seconds: f64) -> String {
    DateTime::from_timestamp(seconds as i64, 0)
        .map(|d| d.naive_utc().format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// Hourly-resampled metric over time. Empty hours break the line.
pub fn time_series_plot(ui: &mut Ui, metric: &str, buckets: &[HourlyBucket]) {
    let mut segments: Vec<Vec<[f64; 2]>> = vec![Vec::new()];
    for bucket in buckets {
        match bucket.mean {
            Some(v) => {
                if let Some(seg) = segments.last_mut() {
                    seg.push([to_x(bucket.start), v]);
                }
            }
            None => {
                if segments.last().is_some_and(|s| !s.is_empty()) {
                    segments.push(Vec::new());
                }
            }
        }
    }

    Plot::new("time_series")
        .height(PLOT_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label(format!("{metric} (W/m²)"))
        .x_axis_formatter(|mark, _range| format_x(mark.value))
        .label_formatter(|_name, point| format!("{}\n{:.2}", format_x(point.x), point.y))
        .allow_boxed_zoom(true)
        .show(ui, |plot_ui| {
            for seg in segments.into_iter().filter(|s| !s.is_empty()) {
                plot_ui.line(
                    Line::new(PlotPoints::from(seg))
                        .color(LINE_COLOR)
                        .width(1.5),
                );
            }
        });
}

/// Mean metric by hour of day, with markers.
pub fn hourly_pattern_plot(ui: &mut Ui, metric: &str, pattern: &[(u32, f64)]) {
    let points: Vec<[f64; 2]> = pattern.iter().map(|&(h, v)| [f64::from(h), v]).collect();

    Plot::new("hourly_pattern")
        .height(PLOT_HEIGHT)
        .x_axis_label("Hour of Day")
        .y_axis_label(format!("{metric} (W/m²)"))
        .include_x(0.0)
        .include_x(23.0)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .color(LINE_COLOR)
                    .width(2.0),
            );
            plot_ui.points(Points::new(points).color(LINE_COLOR).radius(3.0));
        });
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// One box per site.
pub fn comparison_box_plot(
    ui: &mut Ui,
    metric: &str,
    distributions: &[SiteDistribution],
    colors: &SiteColors,
) {
    Plot::new("comparison_box")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(format!("{metric} (W/m²)"))
        .show_x(false)
        .show(ui, |plot_ui| {
            for (i, d) in distributions.iter().enumerate() {
                let color = colors.color_for(d.site);
                let elem = BoxElem::new(
                    i as f64,
                    BoxSpread::new(d.lower_whisker, d.q1, d.median, d.q3, d.upper_whisker),
                )
                .name(d.site.label())
                .box_width(0.6)
                .whisker_width(0.3)
                .fill(color.gamma_multiply(0.4))
                .stroke(Stroke::new(1.5, color));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(d.site.label()).color(color));
            }
        });
}

// ---------------------------------------------------------------------------
// Environmental
// ---------------------------------------------------------------------------

/// Scatter of `y` against `x`, coloured by site.
pub fn scatter_plot(
    ui: &mut Ui,
    x: &str,
    y: &str,
    points: &[(Site, f64, f64)],
    colors: &SiteColors,
) {
    Plot::new(format!("scatter_{x}_{y}"))
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(x)
        .y_axis_label(format!("{y} (W/m²)"))
        .show(ui, |plot_ui| {
            for site in Site::ALL {
                let pts: Vec<[f64; 2]> = points
                    .iter()
                    .filter(|p| p.0 == site)
                    .map(|&(_, px, py)| [px, py])
                    .collect();
                if pts.is_empty() {
                    continue;
                }
                plot_ui.points(
                    Points::new(pts)
                        .name(site.label())
                        .color(colors.color_for(site).gamma_multiply(0.6))
                        .radius(1.5),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

/// Grid of coloured cells, one per coefficient.
pub fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    let cell = Vec2::new(56.0, 28.0);

    egui::Grid::new("correlation_heatmap")
        .spacing(Vec2::new(2.0, 2.0))
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for name in &matrix.columns {
                ui.strong(name);
            }
            ui.end_row();

            for row_name in &matrix.columns {
                ui.strong(row_name);
                for col_name in &matrix.columns {
                    let r = matrix.get(row_name, col_name).unwrap_or(f64::NAN);
                    let (rect, response) = ui.allocate_exact_size(cell, Sense::hover());
                    let fill = correlation_color(r);
                    ui.painter().rect_filled(rect, 2.0, fill);
                    let text_color = if r.abs() > 0.6 { Color32::WHITE } else { Color32::BLACK };
                    let label = if r.is_nan() { "–".to_string() } else { format!("{r:.2}") };
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        label,
                        FontId::proportional(12.0),
                        text_color,
                    );
                    response.on_hover_text(format!("{row_name} × {col_name}: {r:.4}"));
                }
                ui.end_row();
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn axis_labels_round_trip_timestamps() {
        let ts = NaiveDate::from_ymd_opt(2021, 8, 9)
            .and_then(|d| d.and_hms_opt(14, 0, 0))
            .unwrap();
        assert_eq!(format_x(to_x(ts)), "2021-08-09 14:00");
    }
}

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::{Metric, Site};
use crate::state::{AppState, ViewMode};

// ---------------------------------------------------------------------------
// Left side panel – dashboard controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("☀ Dashboard Controls");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- View mode ----
            ui.strong("Select View");
            let mut mode = state.view_mode;
            for option in [ViewMode::SingleSite, ViewMode::CompareAll] {
                ui.radio_value(&mut mode, option, option.label());
            }
            state.set_view_mode(mode);

            // ---- Site ----
            if state.view_mode == ViewMode::SingleSite {
                ui.add_space(4.0);
                ui.strong("Select Site");
                let mut site = state.site;
                egui::ComboBox::from_id_salt("site")
                    .selected_text(site.label())
                    .show_ui(ui, |ui: &mut Ui| {
                        for option in Site::ALL {
                            ui.selectable_value(&mut site, option, option.label());
                        }
                    });
                state.set_site(site);
            }

            // ---- Metric ----
            ui.add_space(4.0);
            ui.strong("Select Solar Metric");
            let mut metric = state.metric;
            egui::ComboBox::from_id_salt("metric")
                .selected_text(metric.column())
                .show_ui(ui, |ui: &mut Ui| {
                    for option in Metric::ALL {
                        ui.selectable_value(&mut metric, option, option.column())
                            .on_hover_text(option.description());
                    }
                });
            state.set_metric(metric);
            ui.small(metric.description());

            ui.separator();
            date_filter(ui, state);

            ui.separator();
            let mut show_tests = state.show_tests;
            ui.checkbox(&mut show_tests, "Show Statistical Tests");
            state.set_show_tests(show_tests);
            ui.checkbox(&mut state.show_raw_data, "Show Raw Data Table");

            ui.separator();
            ui.strong("Sites");
            for (label, color) in state.site_colors.legend_entries() {
                ui.label(RichText::new(format!("■ {label}")).color(color));
            }
        });
}

fn date_filter(ui: &mut Ui, state: &mut AppState) {
    ui.strong("📅 Date Filter");

    if state.date_filter.bounds.is_none() {
        ui.label("No timestamps in the loaded data.");
        return;
    }

    let mut filter = state.date_filter.clone();
    ui.checkbox(&mut filter.enabled, "Enable Date Range Filter");

    if filter.enabled {
        egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
            ui.label("From");
            ui.add(DatePickerButton::new(&mut filter.start).id_salt("date_start"));
            ui.end_row();
            ui.label("To");
            ui.add(DatePickerButton::new(&mut filter.end).id_salt("date_end"));
            ui.end_row();
        });
    }

    state.set_date_filter(filter);

    if state.date_filter.enabled {
        ui.label(
            RichText::new(format!(
                "Filtered: {} to {}",
                state.date_filter.start, state.date_filter.end
            ))
            .color(Color32::DARK_GREEN),
        );
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Reload data").clicked() {
                state.reload();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.table.is_some(), egui::Button::new("Export CSV…"))
                .clicked()
            {
                save_export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        match (&state.source, &state.table) {
            (Some(source), Some(table)) => {
                ui.label(format!(
                    "{}: {} records loaded, {} in range",
                    state.selection_label(),
                    source.len(),
                    table.len()
                ));
            }
            _ => {
                ui.label(format!("{}: no data", state.selection_label()));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn save_export_dialog(state: &mut AppState) {
    let today = chrono::Local::now().date_naive();
    let file = rfd::FileDialog::new()
        .set_title("Download data as CSV")
        .set_file_name(state.export_file_name(today))
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match state.write_export(&path) {
            Ok(rows) => {
                log::info!("Exported {rows} rows to {}", path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

mod app;
mod color;
mod config;
mod data;
mod export;
mod state;
mod stats;
mod ui;

use app::SolarDashboardApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::discover();
    log::info!("Reading site data from {}", config.data_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Solar Data Analysis Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(SolarDashboardApp::new(config)))),
    )
}

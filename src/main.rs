mod app;
mod cli;
mod color;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use defect_dashboard::config::Config;
use defect_dashboard::state::AppState;
use eframe::egui;

use app::DefectDashboardApp;
use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let data_path = cli
        .data
        .clone()
        .unwrap_or_else(|| config.default_data_file.clone());
    let window_size = config.window_size;
    let mut state = AppState::new(config);

    if cli.headless() {
        return run_headless(&mut state, &data_path, &cli);
    }

    if data_path.exists() {
        state.open_path_reporting(&data_path);
    } else {
        log::warn!("No data file at {}", data_path.display());
        state.status_message = Some("No data file found. Please open a CSV file.".to_string());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(window_size)
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "QA Defect Analytics Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DefectDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}

/// Load, apply the initial filter, and print or export without a window.
fn run_headless(state: &mut AppState, data_path: &Path, cli: &Cli) -> Result<()> {
    state
        .open_path(data_path)
        .with_context(|| format!("loading {}", data_path.display()))?;

    if cli.summary {
        let json = serde_json::to_string_pretty(&state.views).context("serializing views")?;
        println!("{json}");
    }
    if let Some(out) = &cli.export {
        let written = state
            .export_filtered(out)
            .with_context(|| format!("exporting to {}", out.display()))?;
        eprintln!("Wrote {written} defects to {}", out.display());
    }
    Ok(())
}

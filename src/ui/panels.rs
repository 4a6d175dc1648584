use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use defect_dashboard::data::model::Dimension;
use defect_dashboard::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – data source, counters and filter widgets
// ---------------------------------------------------------------------------

/// A filter edit collected while drawing, applied once the widgets are done.
enum FilterAction {
    Toggle(Dimension, String),
    SelectAll(Dimension),
    Clear(Dimension),
}

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Source");
    match &state.source {
        Some(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            ui.label(format!("Loaded: {name}"));
        }
        None => {
            ui.label("No dataset loaded.");
        }
    }
    if ui.button("Open file…").clicked() {
        open_file_dialog(state);
    }
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(format!("Total records: {}", dataset.len())).strong());
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(format!("Filtered records: {}", state.visible_indices.len())).strong());
    });
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Filters");
        if ui.small_button("Reset").clicked() {
            state.reset_filters();
        }
    });

    let mut actions = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Per-dimension multi-selects (collapsible) ----
            for dim in Dimension::ALL {
                let all_values = dataset.unique_values(dim);
                let selected = state.filter.selected(dim);
                filter_section(ui, dim, &all_values, selected, &mut actions);
            }
            ui.separator();
            date_range_section(ui, state, &dataset);
        });

    for action in actions {
        match action {
            FilterAction::Toggle(dim, value) => state.toggle_filter_value(dim, &value),
            FilterAction::SelectAll(dim) => state.select_all(dim),
            FilterAction::Clear(dim) => state.clear_selection(dim),
        }
    }
}

fn filter_section(
    ui: &mut Ui,
    dim: Dimension,
    all_values: &BTreeSet<String>,
    selected: &BTreeSet<String>,
    actions: &mut Vec<FilterAction>,
) {
    // An empty selection filters nothing, so say so in the header.
    let header_text = if selected.is_empty() {
        format!("{}  (all)", dim.label())
    } else {
        format!("{}  ({}/{})", dim.label(), selected.len(), all_values.len())
    };

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(dim.label())
        .default_open(dim != Dimension::Module)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    actions.push(FilterAction::SelectAll(dim));
                }
                if ui.small_button("Clear").clicked() {
                    actions.push(FilterAction::Clear(dim));
                }
            });

            for val in all_values {
                let mut checked = selected.contains(val);
                let mut text = RichText::new(val);
                if dim == Dimension::Severity {
                    text = text.color(crate::color::severity_color(val));
                }
                if ui.checkbox(&mut checked, text).changed() {
                    actions.push(FilterAction::Toggle(dim, val.clone()));
                }
            }
        });
}

fn date_range_section(ui: &mut Ui, state: &mut AppState, dataset: &defect_dashboard::data::model::DefectDataset) {
    ui.strong("Reported Date Range");

    let Some(range) = state.filter.date_range else {
        ui.label("Any reported date");
        if let Some((lo, hi)) = dataset.reported_date_bounds() {
            if ui.small_button("Restrict…").clicked() {
                state.set_date_range(lo, hi);
            }
        }
        return;
    };

    let mut start = range.start;
    let mut end = range.end;
    let mut changed = false;

    egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt("date_start"))
            .changed();
        ui.end_row();
        ui.label("To");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt("date_end"))
            .changed();
        ui.end_row();
    });

    if start > end {
        ui.label(RichText::new("Start is after end: nothing matches.").color(Color32::YELLOW));
    }
    if changed {
        state.set_date_range(start, end);
    }
    if ui.small_button("Any date").clicked() {
        state.clear_date_range();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = !state.visible_indices.is_empty();
            if ui
                .add_enabled(can_export, egui::Button::new("Download filtered CSV…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.strong("QA Defect Analytics Dashboard");

        if let Some(ds) = &state.dataset {
            ui.separator();
            ui.label(format!(
                "{} defects loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
        if let Some(msg) = &state.notice {
            ui.separator();
            ui.label(msg);
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open defect data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.notice = None;
        state.open_path_reporting(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let today = chrono::Local::now().date_naive();
    let file = rfd::FileDialog::new()
        .set_title("Download filtered data")
        .set_file_name(state.export_file_name(today))
        .add_filter("CSV", &["csv"])
        .save_file();

    let Some(path) = file else {
        return;
    };
    match state.export_filtered(&path) {
        Ok(written) => {
            state.notice = Some(format!("Saved {written} defects to {}", path.display()));
        }
        Err(e) => {
            log::error!("Export failed: {e}");
            state.status_message = Some(format!("Export failed: {e}"));
        }
    }
}

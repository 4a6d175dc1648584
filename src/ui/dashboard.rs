use eframe::egui::{Color32, RichText, ScrollArea, Ui};

use defect_dashboard::data::aggregate::{DashboardViews, ModuleRisk, RiskClass, Summary};
use defect_dashboard::data::model::Dimension;
use defect_dashboard::state::AppState;

use crate::color::{self, ColorMap};
use crate::ui::{charts, panels, table};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render metrics, charts and the detail table for the current filter.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let (Some(views), Some(dataset)) = (state.views.clone(), state.dataset.clone()) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view defects  (File → Open…)");
        });
        return;
    };

    if views.is_empty() {
        ui.add_space(20.0);
        ui.label(
            RichText::new("⚠ No data matches the filters. Please adjust your filters.")
                .color(color::MAJOR_ORANGE)
                .heading(),
        );
        return;
    }

    let status_colors = ColorMap::new(&dataset.unique_values(Dimension::Status));

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Key Metrics");
            metrics_row(ui, &views.summary);
            ui.separator();

            ui.heading("Analytics & Visualizations");
            ui.columns(2, |cols| {
                charts::severity_chart(&mut cols[0], &views.severity);
                charts::status_chart(&mut cols[1], &views.status, &status_colors);
            });
            ui.add_space(8.0);
            ui.columns(2, |cols| {
                charts::timeline_chart(&mut cols[0], &views.timeline);
                charts::module_chart(&mut cols[1], &views.modules);
            });
            ui.separator();

            ui.heading("High-Risk Module Analysis");
            risk_section(ui, &views, state.config.risk_highlight_limit);
            ui.separator();

            ui.heading("Detailed Defect Data");
            ui.horizontal(|ui: &mut Ui| {
                ui.checkbox(&mut state.show_all_columns, "Show all columns");
                if ui.button("⬇ Download filtered data as CSV").clicked() {
                    panels::export_file_dialog(state);
                }
            });
            table::detail_table(ui, state);
        });
}

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: impl Into<String>, delta: Option<RichText>) {
    ui.group(|ui: &mut Ui| {
        ui.set_min_width(120.0);
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(label).small());
            ui.label(RichText::new(value).size(26.0).strong());
            if let Some(delta) = delta {
                ui.label(delta.small());
            }
        });
    });
}

/// "12.3 days", or "N/A" when no record has a resolution time.
fn format_mean_resolution(mean: Option<f64>) -> String {
    match mean {
        Some(days) => format!("{days:.1} days"),
        None => "N/A".to_string(),
    }
}

fn metrics_row(ui: &mut Ui, summary: &Summary) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        metric(ui, "Total Defects", summary.total.to_string(), None);
        metric(
            ui,
            "Open Defects",
            summary.open.to_string(),
            Some(RichText::new(format!("-{} closed", summary.closed)).color(Color32::GREEN)),
        );
        metric(
            ui,
            "Critical",
            summary.critical.to_string(),
            Some(RichText::new("High Priority").color(color::CRITICAL_RED)),
        );
        metric(ui, "Major", summary.major.to_string(), None);
        metric(ui, "Minor", summary.minor.to_string(), None);
        metric(
            ui,
            "Average Resolution Time",
            format_mean_resolution(summary.mean_resolution_days),
            None,
        );
    });
}

// ---------------------------------------------------------------------------
// Risk section
// ---------------------------------------------------------------------------

/// Callout line for one ranked module; the wording depends on its class.
fn risk_callout(risk: &ModuleRisk) -> (String, Color32) {
    match risk.class {
        RiskClass::Critical => (
            format!("{}: {} critical", risk.module, risk.critical_count),
            color::CRITICAL_RED,
        ),
        RiskClass::HighSeverity => (
            format!("{}: {} high severity", risk.module, risk.total_high_severity),
            color::MAJOR_ORANGE,
        ),
    }
}

fn risk_section(ui: &mut Ui, views: &DashboardViews, highlight_limit: usize) {
    if views.risk.is_empty() {
        ui.label("No high-severity defects found.");
        return;
    }

    ui.columns(2, |cols| {
        charts::risk_chart(&mut cols[0], &views.risk);

        let ui = &mut cols[1];
        ui.strong("Critical Modules:");
        for risk in views.risk.iter().take(highlight_limit) {
            let (text, fill) = risk_callout(risk);
            ui.label(
                RichText::new(text)
                    .strong()
                    .color(fill)
                    .background_color(fill.gamma_multiply(0.2)),
            );
            ui.add_space(4.0);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_resolution_formats_or_reports_unavailable() {
        assert_eq!(format_mean_resolution(Some(5.0)), "5.0 days");
        assert_eq!(format_mean_resolution(Some(12.345)), "12.3 days");
        assert_eq!(format_mean_resolution(None), "N/A");
    }

    #[test]
    fn callout_wording_follows_risk_class() {
        let critical = ModuleRisk {
            module: "Auth".into(),
            total_high_severity: 4,
            critical_count: 2,
            class: RiskClass::Critical,
        };
        let major_only = ModuleRisk {
            module: "Payments".into(),
            total_high_severity: 3,
            critical_count: 0,
            class: RiskClass::HighSeverity,
        };
        assert_eq!(risk_callout(&critical).0, "Auth: 2 critical");
        assert_eq!(risk_callout(&major_only).0, "Payments: 3 high severity");
    }
}

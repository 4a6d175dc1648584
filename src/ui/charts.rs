use std::ops::RangeInclusive;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use defect_dashboard::data::aggregate::{CategoryCount, ModuleRisk, MonthCount};

use crate::color::{self, ColorMap};

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Label for a category axis: the bar at position `i` gets `labels[i]`.
fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn category_bars(
    counts: &[CategoryCount],
    color_of: impl Fn(&CategoryCount, usize) -> Color32,
) -> Vec<Bar> {
    counts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Bar::new(i as f64, c.count as f64)
                .name(&c.value)
                .fill(color_of(c, i))
                .width(0.6)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Defects by severity, in severity display order.
pub fn severity_chart(ui: &mut Ui, counts: &[CategoryCount]) {
    ui.strong("Defects by Severity");
    let labels: Vec<String> = counts.iter().map(|c| c.value.clone()).collect();
    let bars = category_bars(counts, |c, _| color::severity_color(&c.value));

    // Categorical axes make no sense to pan or zoom.
    Plot::new("severity_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| category_label(&labels, mark.value))
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Defects"));
        });
}

/// Share of defects per status.
pub fn status_chart(ui: &mut Ui, counts: &[CategoryCount], colors: &ColorMap) {
    ui.strong("Defect Status Distribution");
    let total: usize = counts.iter().map(|c| c.count).sum();
    let labels: Vec<String> = counts
        .iter()
        .map(|c| {
            let pct = if total == 0 { 0.0 } else { 100.0 * c.count as f64 / total as f64 };
            format!("{} ({pct:.0}%)", c.value)
        })
        .collect();
    let bars = category_bars(counts, |c, _| colors.color_for(&c.value));

    Plot::new("status_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| category_label(&labels, mark.value))
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Status"));
        });
}

/// Defects reported per month.
pub fn timeline_chart(ui: &mut Ui, series: &[MonthCount]) {
    ui.strong("Defects Reported Over Time");
    let labels: Vec<String> = series.iter().map(|m| m.month.clone()).collect();
    let coords: Vec<[f64; 2]> = series
        .iter()
        .enumerate()
        .map(|(i, m)| [i as f64, m.count as f64])
        .collect();

    Plot::new("timeline_chart")
        .height(CHART_HEIGHT)
        .x_axis_label("Month")
        .y_axis_label("Number of Defects")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            let line_points: PlotPoints = coords.iter().copied().collect();
            let marker_points: PlotPoints = coords.iter().copied().collect();
            plot_ui.line(Line::new(line_points).color(color::TIMELINE_BLUE).width(2.0).name("Defects"));
            plot_ui.points(Points::new(marker_points).color(color::TIMELINE_BLUE).radius(4.0));
        });
}

/// Top modules by defect count, largest at the top.
pub fn module_chart(ui: &mut Ui, counts: &[CategoryCount]) {
    ui.strong("Top Modules with Most Defects");
    let n = counts.len();
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0).max(1) as f64;

    // Position 0 is the bottom row, so the ranking is laid out in reverse.
    let labels: Vec<String> = counts.iter().rev().map(|c| c.value.clone()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Bar::new((n - 1 - i) as f64, c.count as f64)
                .name(&c.value)
                .fill(color::heat_color(c.count as f64 / max))
                .width(0.6)
        })
        .collect();

    Plot::new("module_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| category_label(&labels, mark.value))
        .x_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().name("Defects"));
        });
}

/// Critical vs. all high-severity defects for each ranked module.
pub fn risk_chart(ui: &mut Ui, ranking: &[ModuleRisk]) {
    let labels: Vec<String> = ranking.iter().map(|r| r.module.clone()).collect();
    let critical: Vec<Bar> = ranking
        .iter()
        .enumerate()
        .map(|(i, r)| Bar::new(i as f64 - 0.2, r.critical_count as f64).width(0.4))
        .collect();
    let high: Vec<Bar> = ranking
        .iter()
        .enumerate()
        .map(|(i, r)| Bar::new(i as f64 + 0.2, r.total_high_severity as f64).width(0.4))
        .collect();

    Plot::new("risk_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .legend(Legend::default())
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| category_label(&labels, mark.value))
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(critical).name("Critical Count").color(color::CRITICAL_RED));
            plot_ui.bar_chart(BarChart::new(high).name("Total High Severity").color(color::MAJOR_ORANGE));
        });
}

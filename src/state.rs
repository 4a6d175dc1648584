use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::Config;
use crate::data::aggregate::DashboardViews;
use crate::data::cache::DatasetCache;
use crate::data::columns::{table_columns, Column};
use crate::data::export::{export_csv, export_file_name};
use crate::data::filter::{filtered_indices, init_filter_spec, DateRange, FilterSpec};
use crate::data::model::{DefectDataset, Dimension, Record};
use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
///
/// One per process: the immutable dataset, the current [`FilterSpec`], and
/// the views derived from them. Every filter change recomputes the views.
pub struct AppState {
    pub config: Config,

    /// Loaded dataset (None until a file loads).
    pub dataset: Option<Arc<DefectDataset>>,

    /// Where the dataset came from, for the status line.
    pub source: Option<PathBuf>,

    /// Current filter selections.
    pub filter: FilterSpec,

    /// Indices of records passing the current filter (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates over the visible records (cached).
    pub views: Option<DashboardViews>,

    /// Detail table display mode.
    pub show_all_columns: bool,

    /// Error message shown in the UI.
    pub status_message: Option<String>,

    /// Informational message (e.g. a finished export).
    pub notice: Option<String>,

    cache: DatasetCache,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            show_all_columns: config.show_all_columns,
            config,
            dataset: None,
            source: None,
            filter: FilterSpec::default(),
            visible_indices: Vec::new(),
            views: None,
            status_message: None,
            notice: None,
            cache: DatasetCache::new(),
        }
    }

    /// Load a file (through the content cache) and make it the session dataset.
    /// On failure the current dataset is kept and the error is returned.
    pub fn open_path(&mut self, path: &Path) -> Result<(), DatasetError> {
        let dataset = self.cache.load_file(path)?;
        self.set_dataset(dataset, Some(path.to_path_buf()));
        Ok(())
    }

    /// Like [`open_path`](Self::open_path), but records the error as the
    /// status message instead of returning it.
    pub fn open_path_reporting(&mut self, path: &Path) {
        if let Err(e) = self.open_path(path) {
            log::error!("Failed to load {}: {e}", path.display());
            self.status_message = Some(format!("Error loading {}: {e}", path.display()));
        }
    }

    /// Ingest a newly loaded dataset and initialise the filter.
    pub fn set_dataset(&mut self, dataset: Arc<DefectDataset>, source: Option<PathBuf>) {
        self.filter = init_filter_spec(&dataset);
        self.status_message = (!dataset.warnings().is_empty()).then(|| {
            format!("{} rows had unreadable values", dataset.warnings().len())
        });
        self.dataset = Some(dataset);
        self.source = source;
        self.refilter();
    }

    /// Recompute `visible_indices` and `views` after a filter change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            self.visible_indices.clear();
            self.views = None;
            return;
        };
        self.visible_indices = filtered_indices(ds.records(), &self.filter);
        let records = ds.records();
        let visible = self.visible_indices.iter().map(|&i| &records[i]);
        self.views = Some(DashboardViews::compute(visible, &self.config.views));
        log::debug!(
            "Filter matched {} of {} defects",
            self.visible_indices.len(),
            ds.len()
        );
    }

    /// Records passing the current filter, in dataset order.
    pub fn visible_records(&self) -> impl Iterator<Item = &Record> + Clone + '_ {
        let records = self.dataset.as_deref().map(DefectDataset::records).unwrap_or_default();
        self.visible_indices.iter().map(move |&i| &records[i])
    }

    pub fn total_records(&self) -> usize {
        self.dataset.as_ref().map_or(0, |ds| ds.len())
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        let selected = self.filter.selected_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every value of a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        if let Some(ds) = &self.dataset {
            *self.filter.selected_mut(dim) = ds.unique_values(dim);
            self.refilter();
        }
    }

    /// Clear a dimension's selection. An empty selection does not restrict.
    pub fn clear_selection(&mut self, dim: Dimension) {
        self.filter.selected_mut(dim).clear();
        self.refilter();
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.filter.date_range = Some(DateRange { start, end });
        self.refilter();
    }

    /// Drop the date restriction, which also brings back undated records.
    pub fn clear_date_range(&mut self) {
        self.filter.date_range = None;
        self.refilter();
    }

    /// Reset every dimension and the date range to the initial state.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filter = init_filter_spec(ds);
            self.refilter();
        }
    }

    /// Detail table columns for the current display mode.
    pub fn table_columns(&self) -> Vec<Column> {
        let extra = self.dataset.as_deref().map(DefectDataset::extra_columns).unwrap_or_default();
        table_columns(self.show_all_columns, extra)
    }

    /// Suggested name for the filtered download.
    pub fn export_file_name(&self, today: NaiveDate) -> String {
        export_file_name(today)
    }

    /// Write the visible records, derived columns included, to `path`.
    pub fn export_filtered(&self, path: &Path) -> Result<usize, DatasetError> {
        let extra = self.dataset.as_deref().map(DefectDataset::extra_columns).unwrap_or_default();
        export_csv(path, self.visible_records(), extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::record;

    fn state() -> AppState {
        let records = vec![
            record("DEF-0001", "X", "Critical", "Open", "2024-01-05", ""),
            record("DEF-0002", "Y", "Minor", "Closed", "2024-01-20", "2024-01-25"),
            record("DEF-0003", "Y", "Major", "Open", "", ""),
        ];
        let ds = DefectDataset::from_records(records, Vec::new(), Vec::new());
        let mut state = AppState::default();
        state.set_dataset(Arc::new(ds), None);
        state
    }

    #[test]
    fn new_dataset_starts_with_everything_selected_within_date_bounds() {
        let state = state();
        assert_eq!(state.filter.severity.len(), 3);
        assert_eq!(state.visible_indices, vec![0, 1]);
        let views = state.views.as_ref().expect("views");
        assert_eq!(views.summary.total, 2);
        assert_eq!(views.summary.mean_resolution_days, Some(5.0));
    }

    #[test]
    fn toggling_a_value_refilters() {
        let mut state = state();
        state.toggle_filter_value(Dimension::Severity, "Minor");
        assert_eq!(state.visible_indices, vec![0]);
        state.toggle_filter_value(Dimension::Severity, "Minor");
        assert_eq!(state.visible_indices, vec![0, 1]);
    }

    #[test]
    fn clearing_a_selection_shows_all_values() {
        let mut state = state();
        state.toggle_filter_value(Dimension::Module, "X");
        assert_eq!(state.visible_indices, vec![1]);
        state.clear_selection(Dimension::Module);
        assert_eq!(state.visible_indices, vec![0, 1]);
    }

    #[test]
    fn clearing_the_date_range_brings_back_undated() {
        let mut state = state();
        state.clear_date_range();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.visible_records().count(), 3);
    }

    #[test]
    fn empty_result_is_a_state_not_an_error() {
        let mut state = state();
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).expect("date");
        state.set_date_range(day, day);
        assert!(state.visible_indices.is_empty());
        assert!(state.views.as_ref().is_some_and(DashboardViews::is_empty));
    }

    #[test]
    fn failed_open_keeps_current_dataset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "defect_id,module\nDEF-1,X\n").expect("write");

        let mut state = state();
        state.open_path_reporting(&bad);
        assert_eq!(state.total_records(), 3);
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("missing required column")));
    }

    #[test]
    fn export_writes_visible_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut state = state();
        state.toggle_filter_value(Dimension::Severity, "Critical");
        let path = dir.path().join(state.export_file_name(NaiveDate::from_ymd_opt(2024, 2, 1).expect("date")));
        assert_eq!(state.export_filtered(&path).expect("export"), 1);
        assert!(path.ends_with("filtered_defects_20240201.csv"));
    }
}

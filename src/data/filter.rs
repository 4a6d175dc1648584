use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{DefectDataset, Dimension, Record};

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// Inclusive range of reported dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// User-chosen restriction over severity, status, module and reported date.
///
/// An empty value set means "no restriction" on that dimension, the same as
/// having every value selected. It never means "exclude everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub severity: BTreeSet<String>,
    pub status: BTreeSet<String>,
    pub module: BTreeSet<String>,
    /// When set, records without a reported date are dropped.
    pub date_range: Option<DateRange>,
}

impl FilterSpec {
    pub fn selected(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::Severity => &self.severity,
            Dimension::Status => &self.status,
            Dimension::Module => &self.module,
        }
    }

    pub fn selected_mut(&mut self, dim: Dimension) -> &mut BTreeSet<String> {
        match dim {
            Dimension::Severity => &mut self.severity,
            Dimension::Status => &mut self.status,
            Dimension::Module => &mut self.module,
        }
    }

    /// Builder-style helper: replace the value set of one dimension.
    pub fn with_values<I, S>(mut self, dim: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.selected_mut(dim) = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange { start, end });
        self
    }

    /// Whether a single record passes every active dimension.
    pub fn matches(&self, record: &Record) -> bool {
        let categorical = Dimension::ALL.iter().all(|&dim| {
            let selected = self.selected(dim);
            selected.is_empty() || selected.contains(dim.value(record))
        });
        if !categorical {
            return false;
        }
        match self.date_range {
            None => true,
            Some(range) => record
                .reported_at()
                .is_some_and(|d| range.contains(d.date())),
        }
    }
}

/// Initial filter: every distinct value selected, and the date range spanning
/// the dataset's reported dates (none if no record has one).
pub fn init_filter_spec(dataset: &DefectDataset) -> FilterSpec {
    FilterSpec {
        severity: dataset.unique_values(Dimension::Severity),
        status: dataset.unique_values(Dimension::Status),
        module: dataset.unique_values(Dimension::Module),
        date_range: dataset
            .reported_date_bounds()
            .map(|(start, end)| DateRange { start, end }),
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Records passing `spec`, in input order. An empty result is valid.
pub fn apply<'a>(records: impl IntoIterator<Item = &'a Record>, spec: &FilterSpec) -> Vec<&'a Record> {
    records.into_iter().filter(|r| spec.matches(r)).collect()
}

/// Indices into `records` of those passing `spec`, ascending.
pub fn filtered_indices(records: &[Record], spec: &FilterSpec) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| spec.matches(r))
        .map(|(i, _)| i)
        .collect()
}

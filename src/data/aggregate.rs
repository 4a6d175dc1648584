use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::model::{Dimension, Record};

/// Statuses counted as open work.
pub const OPEN_STATUSES: [&str; 3] = ["Open", "In Progress", "Reopened"];
/// Statuses counted as done.
pub const CLOSED_STATUSES: [&str; 2] = ["Resolved", "Closed"];
/// Display order for severity charts.
pub const SEVERITY_ORDER: [&str; 4] = ["Critical", "Major", "Minor", "Low"];

const CRITICAL: &str = "Critical";
const MAJOR: &str = "Major";
const MINOR: &str = "Minor";

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
    /// Mean of `resolution_days` over records that have one. `None` means
    /// "unavailable", which is distinct from a mean of zero days.
    pub mean_resolution_days: Option<f64>,
}

impl Summary {
    /// Records whose status is in neither the open nor the closed bucket.
    pub fn unbucketed(&self) -> usize {
        self.total - self.open - self.closed
    }
}

pub fn summarize<'a>(records: impl IntoIterator<Item = &'a Record>) -> Summary {
    let mut summary = Summary::default();
    let mut days_sum = 0i64;
    let mut days_n = 0usize;

    for rec in records {
        summary.total += 1;
        if OPEN_STATUSES.contains(&rec.status()) {
            summary.open += 1;
        } else if CLOSED_STATUSES.contains(&rec.status()) {
            summary.closed += 1;
        }
        match rec.severity() {
            CRITICAL => summary.critical += 1,
            MAJOR => summary.major += 1,
            MINOR => summary.minor += 1,
            _ => {}
        }
        if let Some(days) = rec.resolution_days() {
            days_sum += days;
            days_n += 1;
        }
    }

    summary.mean_resolution_days = (days_n > 0).then(|| days_sum as f64 / days_n as f64);
    summary
}

// ---------------------------------------------------------------------------
// Categorical counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Group by a dimension, ordered by count descending; ties keep the order in
/// which values first appear in `records`.
pub fn count_by<'a>(records: impl IntoIterator<Item = &'a Record>, dim: Dimension) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut slot: HashMap<&'a str, usize> = HashMap::new();

    for rec in records {
        let value = dim.value(rec);
        match slot.get(value) {
            Some(&i) => counts[i].count += 1,
            None => {
                slot.insert(value, counts.len());
                counts.push(CategoryCount {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort, so first-seen order survives among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Severity counts. With a display order, listed values come first in that
/// order and any others follow by count; without one, plain count order.
pub fn severity_counts<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    display_order: Option<&[&str]>,
) -> Vec<CategoryCount> {
    let counts = count_by(records, Dimension::Severity);
    let Some(order) = display_order else {
        return counts;
    };

    let (mut listed, unlisted): (Vec<_>, Vec<_>) = counts
        .into_iter()
        .partition(|c| order.contains(&c.value.as_str()));
    listed.sort_by_key(|c| order.iter().position(|o| *o == c.value));
    listed.extend(unlisted);
    listed
}

pub fn status_counts<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<CategoryCount> {
    count_by(records, Dimension::Status)
}

/// The `limit` modules with the most defects.
pub fn module_counts<'a>(records: impl IntoIterator<Item = &'a Record>, limit: usize) -> Vec<CategoryCount> {
    let mut counts = count_by(records, Dimension::Module);
    counts.truncate(limit);
    counts
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

/// Defects per reported month, ascending. Records without a month are skipped.
pub fn monthly_series<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<MonthCount> {
    let mut by_month: BTreeMap<&str, usize> = BTreeMap::new();
    for month in records.into_iter().filter_map(Record::reported_month) {
        *by_month.entry(month).or_default() += 1;
    }
    by_month
        .into_iter()
        .map(|(month, count)| MonthCount {
            month: month.to_string(),
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Risk ranking
// ---------------------------------------------------------------------------

/// How a ranked module should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    /// At least one critical defect.
    Critical,
    /// Major defects only.
    HighSeverity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRisk {
    pub module: String,
    pub total_high_severity: usize,
    pub critical_count: usize,
    pub class: RiskClass,
}

/// Modules ranked by critical defects, then by all Critical+Major defects,
/// then by name. At most `limit` entries.
pub fn risk_ranking<'a>(records: impl IntoIterator<Item = &'a Record>, limit: usize) -> Vec<ModuleRisk> {
    let mut by_module: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for rec in records {
        let severity = rec.severity();
        if severity != CRITICAL && severity != MAJOR {
            continue;
        }
        let entry = by_module.entry(rec.module()).or_default();
        entry.0 += 1;
        if severity == CRITICAL {
            entry.1 += 1;
        }
    }

    let mut ranking: Vec<ModuleRisk> = by_module
        .into_iter()
        .map(|(module, (total, critical))| ModuleRisk {
            module: module.to_string(),
            total_high_severity: total,
            critical_count: critical,
            class: if critical > 0 {
                RiskClass::Critical
            } else {
                RiskClass::HighSeverity
            },
        })
        .collect();

    // BTreeMap iteration is by name, and the sort is stable.
    ranking.sort_by(|a, b| {
        b.critical_count
            .cmp(&a.critical_count)
            .then(b.total_high_severity.cmp(&a.total_high_severity))
    });
    ranking.truncate(limit);
    ranking
}

// ---------------------------------------------------------------------------
// All views for one filtered set
// ---------------------------------------------------------------------------

/// Truncation limits for the display views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub module_limit: usize,
    pub risk_limit: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            module_limit: 8,
            risk_limit: 10,
        }
    }
}

/// Everything the dashboard renders, recomputed from scratch on each filter change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViews {
    pub summary: Summary,
    pub severity: Vec<CategoryCount>,
    pub status: Vec<CategoryCount>,
    pub modules: Vec<CategoryCount>,
    pub timeline: Vec<MonthCount>,
    pub risk: Vec<ModuleRisk>,
}

impl DashboardViews {
    pub fn compute<'a, I>(records: I, options: &ViewOptions) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
        I::IntoIter: Clone,
    {
        let records = records.into_iter();
        Self {
            summary: summarize(records.clone()),
            severity: severity_counts(records.clone(), Some(&SEVERITY_ORDER)),
            status: status_counts(records.clone()),
            modules: module_counts(records.clone(), options.module_limit),
            timeline: monthly_series(records.clone()),
            risk: risk_ranking(records, options.risk_limit),
        }
    }

    /// True when the filtered set had no records.
    pub fn is_empty(&self) -> bool {
        self.summary.total == 0
    }
}

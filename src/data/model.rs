use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::DatasetError;

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "defect_id",
    "module",
    "severity",
    "status",
    "reported_date",
    "resolved_date",
    "priority",
    "assigned_to",
];

/// Derived columns written on export. On load they are recomputed, never read.
pub const RESOLUTION_DAYS_COLUMN: &str = "resolution_days";
pub const REPORTED_MONTH_COLUMN: &str = "reported_month";

/// Older exports name the resolution column this way.
const LEGACY_RESOLUTION_COLUMN: &str = "resolution_time";

/// Returns true for column names the loader recomputes instead of passing through.
pub fn is_derived_column(name: &str) -> bool {
    name == RESOLUTION_DAYS_COLUMN
        || name == REPORTED_MONTH_COLUMN
        || name == LEGACY_RESOLUTION_COLUMN
}

/// One raw input row: column name → cell text.
pub type RawRow = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Parse an ISO-like date or datetime. Empty or unrecognised text yields `None`.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Whole days from `reported` to `resolved`, floored. Negative spans are kept.
fn days_between(reported: NaiveDateTime, resolved: NaiveDateTime) -> i64 {
    let delta = resolved - reported;
    // num_seconds truncates toward zero; a negative sub-second part means the
    // floor is one second lower.
    let mut secs = delta.num_seconds();
    if delta.subsec_nanos() < 0 {
        secs -= 1;
    }
    secs.div_euclid(86_400)
}

// ---------------------------------------------------------------------------
// Load warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    UnparseableDate { column: String, value: String },
    MissingReportedDate,
    DuplicateId { id: String },
}

/// A non-fatal problem found while loading. The affected record is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based data row (header excluded).
    pub row: usize,
    pub kind: WarningKind,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::UnparseableDate { column, value } => {
                write!(f, "row {}: cannot parse {column} '{value}', treated as empty", self.row)
            }
            WarningKind::MissingReportedDate => {
                write!(f, "row {}: reported_date is empty", self.row)
            }
            WarningKind::DuplicateId { id } => write!(f, "row {}: duplicate defect_id {id}", self.row),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one defect
// ---------------------------------------------------------------------------

/// One normalized defect. Immutable once built; derived fields are computed
/// in the constructor and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: String,
    module: String,
    severity: String,
    status: String,
    priority: String,
    assigned_to: String,
    reported_at: Option<NaiveDateTime>,
    resolved_at: Option<NaiveDateTime>,
    resolution_days: Option<i64>,
    reported_month: Option<String>,
    /// Columns outside the required schema, passed through untouched.
    extra: BTreeMap<String, String>,
}

impl Record {
    /// Normalize one raw row. Fails only when a required column is absent;
    /// bad date cells become `None` and are reported as warnings.
    pub fn from_row(row_no: usize, row: &RawRow) -> Result<(Self, Vec<ParseWarning>), DatasetError> {
        check_schema(row.keys().map(String::as_str))?;

        let mut warnings = Vec::new();
        let text = |name: &str| row.get(name).cloned().unwrap_or_default();

        let mut date = |column: &str| {
            let raw = text(column);
            let parsed = parse_date(&raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                warnings.push(ParseWarning {
                    row: row_no,
                    kind: WarningKind::UnparseableDate {
                        column: column.to_string(),
                        value: raw,
                    },
                });
            }
            parsed
        };
        let reported_at = date("reported_date");
        let resolved_at = date("resolved_date");

        if text("reported_date").trim().is_empty() {
            warnings.push(ParseWarning {
                row: row_no,
                kind: WarningKind::MissingReportedDate,
            });
        }

        let extra = row
            .iter()
            .filter(|(k, _)| !REQUIRED_COLUMNS.contains(&k.as_str()) && !is_derived_column(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let record = Self::new(
            RecordFields {
                id: text("defect_id"),
                module: text("module"),
                severity: text("severity"),
                status: text("status"),
                priority: text("priority"),
                assigned_to: text("assigned_to"),
                reported_at,
                resolved_at,
            },
            extra,
        );
        Ok((record, warnings))
    }

    /// Build a record from already-typed fields and compute the derived ones.
    pub fn new(fields: RecordFields, extra: BTreeMap<String, String>) -> Self {
        let resolution_days = match (fields.reported_at, fields.resolved_at) {
            (Some(reported), Some(resolved)) => Some(days_between(reported, resolved)),
            _ => None,
        };
        let reported_month = fields
            .reported_at
            .map(|d| d.format("%Y-%m").to_string());

        Self {
            id: fields.id,
            module: fields.module,
            severity: fields.severity,
            status: fields.status,
            priority: fields.priority,
            assigned_to: fields.assigned_to,
            reported_at: fields.reported_at,
            resolved_at: fields.resolved_at,
            resolution_days,
            reported_month,
            extra,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn severity(&self) -> &str {
        &self.severity
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn priority(&self) -> &str {
        &self.priority
    }

    pub fn assigned_to(&self) -> &str {
        &self.assigned_to
    }

    pub fn reported_at(&self) -> Option<NaiveDateTime> {
        self.reported_at
    }

    pub fn resolved_at(&self) -> Option<NaiveDateTime> {
        self.resolved_at
    }

    /// `resolved_at - reported_at` in whole days; `None` if either is missing.
    /// Negative when the input has the dates out of order.
    pub fn resolution_days(&self) -> Option<i64> {
        self.resolution_days
    }

    /// `YYYY-MM` of `reported_at`.
    pub fn reported_month(&self) -> Option<&str> {
        self.reported_month.as_deref()
    }

    pub fn extra(&self, column: &str) -> Option<&str> {
        self.extra.get(column).map(String::as_str)
    }
}

/// Typed inputs for [`Record::new`].
#[derive(Debug, Clone, Default)]
pub struct RecordFields {
    pub id: String,
    pub module: String,
    pub severity: String,
    pub status: String,
    pub priority: String,
    pub assigned_to: String,
    pub reported_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
}

/// Fail with [`DatasetError::Schema`] when any required column is absent.
pub fn check_schema<'a>(columns: impl IntoIterator<Item = &'a str>) -> Result<(), DatasetError> {
    let present: HashSet<&str> = columns.into_iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| (*c).to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DatasetError::Schema { missing })
    }
}

// ---------------------------------------------------------------------------
// Dimension – a categorical field users can filter and group by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Severity,
    Status,
    Module,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Severity, Dimension::Status, Dimension::Module];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Severity => "Severity",
            Dimension::Status => "Status",
            Dimension::Module => "Module/Component",
        }
    }

    pub fn value(self, record: &Record) -> &str {
        match self {
            Dimension::Severity => record.severity(),
            Dimension::Status => record.status(),
            Dimension::Module => record.module(),
        }
    }
}

// ---------------------------------------------------------------------------
// DefectDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed option lists for the filters.
#[derive(Debug, Clone)]
pub struct DefectDataset {
    records: Vec<Record>,
    /// Non-schema columns in input order.
    extra_columns: Vec<String>,
    warnings: Vec<ParseWarning>,
    /// Sorted distinct values per dimension.
    unique_values: BTreeMap<Dimension, BTreeSet<String>>,
}

impl DefectDataset {
    /// Build indices and flag duplicate ids (records are kept either way).
    pub fn from_records(
        records: Vec<Record>,
        extra_columns: Vec<String>,
        mut warnings: Vec<ParseWarning>,
    ) -> Self {
        let mut unique_values: BTreeMap<Dimension, BTreeSet<String>> = BTreeMap::new();
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for (i, rec) in records.iter().enumerate() {
            for dim in Dimension::ALL {
                unique_values
                    .entry(dim)
                    .or_default()
                    .insert(dim.value(rec).to_string());
            }
            if !seen_ids.insert(rec.id()) {
                warnings.push(ParseWarning {
                    row: i + 1,
                    kind: WarningKind::DuplicateId {
                        id: rec.id().to_string(),
                    },
                });
            }
        }
        warnings.sort_by_key(|w| w.row);

        DefectDataset {
            records,
            extra_columns,
            warnings,
            unique_values,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Sorted distinct values of a dimension (empty for an empty dataset).
    pub fn unique_values(&self, dim: Dimension) -> BTreeSet<String> {
        self.unique_values.get(&dim).cloned().unwrap_or_default()
    }

    /// Earliest and latest reported date, ignoring records without one.
    pub fn reported_date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(|r| r.reported_at()).map(|d| d.date());
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

use chrono::{NaiveDateTime, NaiveTime};

use super::model::{Record, REPORTED_MONTH_COLUMN, RESOLUTION_DAYS_COLUMN};

// ---------------------------------------------------------------------------
// Table / export columns
// ---------------------------------------------------------------------------

/// A column of the detail table or the CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    DefectId,
    Module,
    Severity,
    Status,
    ReportedDate,
    ResolvedDate,
    Priority,
    AssignedTo,
    /// A pass-through input column outside the required schema.
    Extra(String),
    ResolutionDays,
    ReportedMonth,
}

/// How date cells are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Always `YYYY-MM-DD`.
    Display,
    /// `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS[.fff]` when there is a time of
    /// day, so re-loading an export gives back the same instant.
    Export,
}

impl Column {
    pub fn header(&self) -> &str {
        match self {
            Column::DefectId => "defect_id",
            Column::Module => "module",
            Column::Severity => "severity",
            Column::Status => "status",
            Column::ReportedDate => "reported_date",
            Column::ResolvedDate => "resolved_date",
            Column::Priority => "priority",
            Column::AssignedTo => "assigned_to",
            Column::Extra(name) => name.as_str(),
            Column::ResolutionDays => RESOLUTION_DAYS_COLUMN,
            Column::ReportedMonth => REPORTED_MONTH_COLUMN,
        }
    }

    /// Cell text for `record`; missing values render as an empty string.
    pub fn cell(&self, record: &Record, style: DateStyle) -> String {
        match self {
            Column::DefectId => record.id().to_string(),
            Column::Module => record.module().to_string(),
            Column::Severity => record.severity().to_string(),
            Column::Status => record.status().to_string(),
            Column::ReportedDate => format_date(record.reported_at(), style),
            Column::ResolvedDate => format_date(record.resolved_at(), style),
            Column::Priority => record.priority().to_string(),
            Column::AssignedTo => record.assigned_to().to_string(),
            Column::Extra(name) => record.extra(name).unwrap_or_default().to_string(),
            Column::ResolutionDays => record
                .resolution_days()
                .map(|d| d.to_string())
                .unwrap_or_default(),
            Column::ReportedMonth => record.reported_month().unwrap_or_default().to_string(),
        }
    }
}

fn format_date(value: Option<NaiveDateTime>, style: DateStyle) -> String {
    match (value, style) {
        (None, _) => String::new(),
        (Some(dt), DateStyle::Export) if dt.time() != NaiveTime::MIN => {
            dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
        }
        (Some(dt), _) => dt.format("%Y-%m-%d").to_string(),
    }
}

/// Columns of the detail table in default mode.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::DefectId,
        Column::Module,
        Column::Severity,
        Column::Status,
        Column::ReportedDate,
        Column::Priority,
        Column::AssignedTo,
    ]
}

/// Every column: the schema, pass-through columns, then derived fields.
pub fn all_columns(extra_columns: &[String]) -> Vec<Column> {
    let mut columns = vec![
        Column::DefectId,
        Column::Module,
        Column::Severity,
        Column::Status,
        Column::ReportedDate,
        Column::ResolvedDate,
        Column::Priority,
        Column::AssignedTo,
    ];
    columns.extend(extra_columns.iter().cloned().map(Column::Extra));
    columns.push(Column::ResolutionDays);
    columns.push(Column::ReportedMonth);
    columns
}

/// Table columns for the "show all columns" toggle.
pub fn table_columns(show_all: bool, extra_columns: &[String]) -> Vec<Column> {
    if show_all {
        all_columns(extra_columns)
    } else {
        default_columns()
    }
}

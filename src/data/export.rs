use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use super::columns::{all_columns, DateStyle};
use super::model::Record;
use crate::error::DatasetError;

/// Download name for a filtered export made on `today`.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("filtered_defects_{}.csv", today.format("%Y%m%d"))
}

/// Serialize `records` as CSV with every column, derived ones included.
/// Returns the number of rows written.
pub fn write_csv<'a, W: Write>(
    writer: W,
    records: impl IntoIterator<Item = &'a Record>,
    extra_columns: &[String],
) -> Result<usize, DatasetError> {
    let columns = all_columns(extra_columns);
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(columns.iter().map(|c| c.header()))?;

    let mut written = 0;
    for rec in records {
        out.write_record(columns.iter().map(|c| c.cell(rec, DateStyle::Export)))?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

pub fn export_csv<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a Record>,
    extra_columns: &[String],
) -> Result<usize, DatasetError> {
    let file = std::fs::File::create(path)?;
    let written = write_csv(std::io::BufWriter::new(file), records, extra_columns)?;
    log::info!("Exported {written} defects to {}", path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_bytes, SourceFormat};

    #[test]
    fn file_name_carries_the_date() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 9).expect("date");
        assert_eq!(export_file_name(day), "filtered_defects_20260309.csv");
    }

    #[test]
    fn export_includes_derived_columns() {
        let csv = "\
defect_id,module,severity,status,reported_date,resolved_date,priority,assigned_to
DEF-0002,Y,Minor,Closed,2024-01-20,2024-01-25,Low,Jane Smith
";
        let ds = load_bytes(csv.as_bytes(), SourceFormat::Csv).expect("load");
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, ds.records(), ds.extra_columns()).expect("write");
        assert_eq!(n, 1);

        let text = String::from_utf8(buf).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("defect_id,module,severity,status,reported_date,resolved_date,priority,assigned_to,resolution_days,reported_month")
        );
        assert_eq!(
            lines.next(),
            Some("DEF-0002,Y,Minor,Closed,2024-01-20,2024-01-25,Low,Jane Smith,5,2024-01")
        );
    }

    #[test]
    fn export_then_reload_reproduces_records() {
        let csv = "\
defect_id,module,severity,status,reported_date,resolved_date,priority,assigned_to,browser
DEF-0001,X,Critical,Open,2024-01-05 08:30:00,,High,John Doe,\"Chrome, beta\"
DEF-0002,Y,Minor,Closed,2024-01-20,2024-01-25,Low,Jane Smith,Firefox
DEF-0003,Y,Major,Open,garbage,,Medium,Chris Lee,
DEF-0004,Z,Low,Resolved,2024-05-10,2024-05-01,Low,Lisa Anderson,Edge
";
        let original = load_bytes(csv.as_bytes(), SourceFormat::Csv).expect("load");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        export_csv(&path, original.records(), original.extra_columns()).expect("export");

        let reloaded = crate::data::loader::load_file(&path).expect("reload");
        assert_eq!(reloaded.records(), original.records());
        assert_eq!(reloaded.extra_columns(), original.extra_columns());
        assert_eq!(reloaded.records()[3].resolution_days(), Some(-9));
    }

    #[test]
    fn fractional_seconds_survive_export() {
        let csv = "\
defect_id,module,severity,status,reported_date,resolved_date,priority,assigned_to
DEF-0001,X,Minor,Closed,2024-01-05 10:00:00.500,2024-01-06 10:00:00,Low,Jane Smith
";
        let original = load_bytes(csv.as_bytes(), SourceFormat::Csv).expect("load");
        let mut buf = Vec::new();
        write_csv(&mut buf, original.records(), original.extra_columns()).expect("write");

        let text = String::from_utf8(buf.clone()).expect("utf8");
        assert!(text.contains("2024-01-05 10:00:00.500,2024-01-06 10:00:00,"), "{text}");

        let reloaded = load_bytes(&buf, SourceFormat::Csv).expect("reload");
        assert_eq!(reloaded.records(), original.records());
        assert_eq!(reloaded.records()[0].resolution_days(), Some(0));
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

use defect_dashboard::data::model::REQUIRED_COLUMNS;

const MODULES: [(&str, f64); 8] = [
    ("Authentication", 0.15),
    ("Payment Gateway", 0.20),
    ("User Dashboard", 0.12),
    ("Reporting", 0.10),
    ("API Service", 0.18),
    ("Database", 0.08),
    ("Notification System", 0.10),
    ("Admin Panel", 0.07),
];
const SEVERITIES: [(&str, f64); 4] = [("Critical", 0.15), ("Major", 0.30), ("Minor", 0.35), ("Low", 0.20)];
const STATUSES: [(&str, f64); 5] = [
    ("Open", 0.20),
    ("In Progress", 0.15),
    ("Resolved", 0.25),
    ("Closed", 0.35),
    ("Reopened", 0.05),
];
const PRIORITIES: [(&str, f64); 3] = [("High", 0.25), ("Medium", 0.50), ("Low", 0.25)];
const DEVELOPERS: [&str; 8] = [
    "John Doe",
    "Jane Smith",
    "Mike Johnson",
    "Sarah Wilson",
    "Chris Lee",
    "Emily Brown",
    "David Chen",
    "Lisa Anderson",
];

#[derive(Parser, Debug)]
#[command(name = "generate_sample", about = "Write a synthetic defect dataset")]
struct Args {
    /// Output file, `.csv` or `.parquet`
    #[arg(default_value = "defects.csv")]
    output: PathBuf,

    /// Number of defects
    #[arg(short = 'n', long, default_value_t = 200)]
    count: usize,

    /// RNG seed, for reproducible output
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Parquet,
}

fn output_format(path: &Path) -> Result<OutputFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "parquet" => Ok(OutputFormat::Parquet),
        other => bail!("unsupported output extension '.{other}', expected .csv or .parquet"),
    }
}

/// One generated row, in `REQUIRED_COLUMNS` order.
type Row = [String; 8];

/// Draw one value from a weighted vocabulary.
struct Weighted<'a> {
    values: Vec<&'a str>,
    index: WeightedIndex<f64>,
}

impl<'a> Weighted<'a> {
    fn new(table: &[(&'a str, f64)]) -> Result<Self> {
        let index = WeightedIndex::new(table.iter().map(|(_, w)| *w)).context("invalid weights")?;
        Ok(Self {
            values: table.iter().map(|(v, _)| *v).collect(),
            index,
        })
    }

    fn sample(&self, rng: &mut StdRng) -> &'a str {
        self.values[self.index.sample(rng)]
    }
}

fn generate(count: usize, seed: u64) -> Result<Vec<Row>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let modules = Weighted::new(&MODULES)?;
    let severities = Weighted::new(&SEVERITIES)?;
    let statuses = Weighted::new(&STATUSES)?;
    let priorities = Weighted::new(&PRIORITIES)?;

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("start date")?;
    let end = NaiveDate::from_ymd_opt(2024, 12, 27).context("end date")?;
    let span = (end - start).num_days();

    let mut rows: Vec<(NaiveDate, Row)> = (0..count)
        .map(|_| {
            let severity = severities.sample(&mut rng);
            let status = statuses.sample(&mut rng);
            let reported = start + Duration::days(rng.gen_range(0..span));

            // Only finished work has a resolution date; criticals close faster.
            let resolved = if status == "Resolved" || status == "Closed" {
                let max_days = if severity == "Critical" { 30 } else { 60 };
                let days = rng.gen_range(1..max_days);
                (reported + Duration::days(days)).format("%Y-%m-%d").to_string()
            } else {
                String::new()
            };

            let row = [
                String::new(),
                modules.sample(&mut rng).to_string(),
                severity.to_string(),
                status.to_string(),
                reported.format("%Y-%m-%d").to_string(),
                resolved,
                priorities.sample(&mut rng).to_string(),
                DEVELOPERS[rng.gen_range(0..DEVELOPERS.len())].to_string(),
            ];
            (reported, row)
        })
        .collect();

    // Ids follow generation order; the file is sorted by reported date.
    for (i, (_, row)) in rows.iter_mut().enumerate() {
        row[0] = format!("DEF-{:04}", i + 1);
    }
    rows.sort_by_key(|(reported, _)| *reported);
    Ok(rows.into_iter().map(|(_, row)| row).collect())
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(REQUIRED_COLUMNS)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(
        REQUIRED_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    // Empty date cells become nulls, as pandas would write them.
    let columns: Vec<ArrayRef> = (0..REQUIRED_COLUMNS.len())
        .map(|c| {
            let values: Vec<Option<&str>> = rows
                .iter()
                .map(|row| Some(row[c].as_str()).filter(|v| !v.is_empty()))
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating Parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let format = output_format(&args.output)?;
    let rows = generate(args.count, args.seed)?;
    match format {
        OutputFormat::Csv => write_csv(&args.output, &rows)?,
        OutputFormat::Parquet => write_parquet(&args.output, &rows)?,
    }

    log::info!("Wrote {} defects to {}", rows.len(), args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_reproducible_and_consistent() {
        let a = generate(50, 7).expect("generate");
        let b = generate(50, 7).expect("generate");
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);

        for row in &a {
            let finished = row[3] == "Resolved" || row[3] == "Closed";
            assert_eq!(finished, !row[5].is_empty(), "{row:?}");
        }
        let dates: Vec<&String> = a.iter().map(|r| &r[4]).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn output_format_follows_extension() {
        assert_eq!(output_format(Path::new("defects.csv")).ok(), Some(OutputFormat::Csv));
        assert_eq!(output_format(Path::new("out/Defects.PARQUET")).ok(), Some(OutputFormat::Parquet));
        let err = output_format(Path::new("defects.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"), "{err}");
        assert!(output_format(Path::new("defects")).is_err());
    }

    #[test]
    fn written_files_load_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rows = generate(20, 1).expect("generate");

        let csv_path = dir.path().join("defects.csv");
        write_csv(&csv_path, &rows).expect("write csv");
        let from_csv = defect_dashboard::data::loader::load_file(&csv_path).expect("load csv");

        let pq_path = dir.path().join("defects.parquet");
        write_parquet(&pq_path, &rows).expect("write parquet");
        let from_pq = defect_dashboard::data::loader::load_file(&pq_path).expect("load parquet");

        assert_eq!(from_csv.len(), 20);
        assert!(from_csv.warnings().is_empty());
        assert_eq!(from_csv.records(), from_pq.records());
    }
}

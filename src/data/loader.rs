use std::path::Path;

use arrow::array::Array;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{check_schema, is_derived_column, DefectDataset, ParseWarning, RawRow, Record, REQUIRED_COLUMNS};
use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
    Parquet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            "parquet" | "pq" => Ok(SourceFormat::Parquet),
            other => Err(DatasetError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Load a defect dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the required columns (primary format)
/// * `.json`    – `[{ "defect_id": "...", "module": "...", ... }, ...]`
/// * `.parquet` – one column per field; dates as strings, dates or timestamps
pub fn load_file(path: &Path) -> Result<DefectDataset, DatasetError> {
    match SourceFormat::from_path(path)? {
        SourceFormat::Parquet => load_parquet(path),
        format => {
            let bytes = std::fs::read(path)?;
            load_bytes(&bytes, format)
        }
    }
}

/// Parse an in-memory CSV or JSON payload. Parquet needs a seekable file,
/// see [`load_parquet`].
pub fn load_bytes(bytes: &[u8], format: SourceFormat) -> Result<DefectDataset, DatasetError> {
    match format {
        SourceFormat::Csv => load_csv(bytes),
        SourceFormat::Json => load_json(bytes),
        SourceFormat::Parquet => Err(DatasetError::UnsupportedFormat(
            "parquet (in-memory)".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Shared row → dataset assembly
// ---------------------------------------------------------------------------

/// Validate the header once, then normalize every row. A schema failure
/// aborts the whole load; no partial dataset is produced.
fn build_dataset(
    headers: &[String],
    rows: impl IntoIterator<Item = Result<RawRow, DatasetError>>,
) -> Result<DefectDataset, DatasetError> {
    check_schema(headers.iter().map(String::as_str))?;

    let extra_columns: Vec<String> = headers
        .iter()
        .filter(|h| !REQUIRED_COLUMNS.contains(&h.as_str()) && !is_derived_column(h))
        .cloned()
        .collect();

    let mut records = Vec::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        let (record, row_warnings) = Record::from_row(i + 1, &row?)?;
        records.push(record);
        warnings.extend(row_warnings);
    }

    let dataset = DefectDataset::from_records(records, extra_columns, warnings);
    for w in dataset.warnings() {
        log::warn!("{w}");
    }
    log::info!(
        "Loaded {} defects ({} warnings, extra columns {:?})",
        dataset.len(),
        dataset.warnings().len(),
        dataset.extra_columns()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: UTF-8, header row with column names. Columns beyond the
/// required set are kept as pass-through text.
fn load_csv(bytes: &[u8]) -> Result<DefectDataset, DatasetError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows = reader.records().map(|result| -> Result<RawRow, DatasetError> {
        let record = result?;
        Ok(headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect::<RawRow>())
    });

    build_dataset(&headers, rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "defect_id": "DEF-0001", "module": "Database", "reported_date": "2024-01-05", ... },
///   ...
/// ]
/// ```
///
/// The header is the union of keys in first-seen order; a key missing from a
/// row reads as an empty cell.
fn load_json(bytes: &[u8]) -> Result<DefectDataset, DatasetError> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let items = root
        .as_array()
        .ok_or_else(|| DatasetError::InvalidJson("expected a top-level array".into()))?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| DatasetError::InvalidJson(format!("row {} is not an object", i + 1)))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows: Vec<Result<RawRow, DatasetError>> = objects
        .into_iter()
        .map(|obj| {
            Ok(headers
                .iter()
                .map(|h| (h.clone(), obj.get(h).map(json_to_text).unwrap_or_default()))
                .collect())
        })
        .collect();

    build_dataset(&headers, rows)
}

fn json_to_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of defects.
///
/// Every column is rendered to text with Arrow's display formatter, so
/// `Utf8`, `Date32` and `Timestamp` date columns all reach the common date
/// parser. Works with files written by both **Pandas** (`df.to_parquet()`)
/// and **Polars** (`df.write_parquet()`).
pub fn load_parquet(path: &Path) -> Result<DefectDataset, DatasetError> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let options = FormatOptions::default();
    let mut rows: Vec<Result<RawRow, DatasetError>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let formatters = batch
            .columns()
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            let raw: RawRow = headers
                .iter()
                .zip(batch.columns().iter().zip(&formatters))
                .map(|(name, (col, fmt))| {
                    let text = if col.is_null(row) {
                        String::new()
                    } else {
                        fmt.value(row).to_string()
                    };
                    (name.clone(), text)
                })
                .collect();
            rows.push(Ok(raw));
        }
    }

    build_dataset(&headers, rows)
}

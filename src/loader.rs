use crate::record::{
    COL_BRAND, COL_CATEGORY, COL_PRODUCT, COL_QUANTITY, COL_REVENUE, COL_SALE_DATE, COL_STORE,
    COL_STORE_TYPE, Dataset, SalesRecord, excel_serial_to_date,
};
use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;

/// Why an ingestion attempt was rejected.
///
/// Every variant aborts the whole load; no partial dataset is ever returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("row {row}: `{value}` in column `{column}` is not a date")]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: `{value}` in column `{column}` cannot be converted to {target}")]
    TypeCoercion {
        row: usize,
        column: &'static str,
        value: String,
        target: &'static str,
    },

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    EmptyWorkbook,

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unsupported file extension: {0}")]
    UnsupportedFormat(String),
}

impl LoadError {
    /// Short machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Schema { .. } => "schema",
            LoadError::Parse { .. } => "parse",
            LoadError::TypeCoercion { .. } => "type_coercion",
            LoadError::Workbook(_) | LoadError::EmptyWorkbook => "workbook",
            LoadError::Csv(_) => "csv",
            LoadError::Io(_) => "io",
            LoadError::UnsupportedFormat(_) => "unsupported_format",
        }
    }
}

/// Load a dataset from a file on disk, choosing the reader by extension.
///
/// `.csv` goes through the CSV reader; every workbook format the spreadsheet reader
/// understands (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`) is read from its first sheet.
///
/// # Examples
/// ```no_run
/// use sales_dashboard::loader::load_dataset;
///
/// match load_dataset("Base Vendas.xlsx") {
///     Ok(dataset) => println!("loaded {} sales", dataset.len()),
///     Err(e) => eprintln!("could not load: {}", e),
/// }
/// ```
pub fn load_dataset(filepath: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let path = filepath.as_ref();
    match extension_of(path.to_str().unwrap_or_default()).as_deref() {
        Some("csv") => from_csv(path),
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "xlam" | "ods") => from_workbook(path),
        Some(ext) => Err(LoadError::UnsupportedFormat(ext.to_string())),
        None => Err(LoadError::UnsupportedFormat(String::new())),
    }
}

/// Load an uploaded file held in memory.
///
/// The file name is only used to recognise CSV uploads; anything else is handed to the
/// workbook reader, which detects the format from the content.
pub fn load_upload(filename: Option<&str>, bytes: Vec<u8>) -> Result<Dataset, LoadError> {
    match filename.and_then(extension_of).as_deref() {
        Some("csv") => from_csv_reader(Cursor::new(bytes)),
        _ => from_workbook_bytes(bytes),
    }
}

/// Read the first sheet of a workbook file.
pub fn from_workbook(filepath: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let workbook = open_workbook_auto(filepath)?;
    first_sheet(workbook)
}

/// Read the first sheet of a workbook held in memory.
pub fn from_workbook_bytes(bytes: Vec<u8>) -> Result<Dataset, LoadError> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    first_sheet(workbook)
}

/// Read a CSV file whose first line is the header row.
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let file = File::open(filepath)?;
    from_csv_reader(file)
}

/// Read CSV data whose first line is the header row.
///
/// Fields are handed to the same coercion rules as workbook cells, as text.
pub fn from_csv_reader<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<Vec<Data>> = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Data::Empty
                    } else {
                        Data::String(field.to_string())
                    }
                })
                .collect(),
        );
    }

    records_from_rows(rows.iter().map(Vec::as_slice), 1)
}

fn first_sheet<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<Dataset, LoadError> {
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::EmptyWorkbook)??;

    // Row numbers in errors are 1-based sheet rows, so offset by where the used range starts.
    let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    records_from_rows(range.rows(), first_row)
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Positions of the required columns in the header row.
struct ColumnMap {
    sale_date: usize,
    product: usize,
    brand: usize,
    store: usize,
    store_type: usize,
    category: usize,
    quantity: usize,
    revenue: usize,
}

impl ColumnMap {
    fn resolve(header: &[String]) -> Result<Self, LoadError> {
        let mut missing = Vec::new();
        let map = ColumnMap {
            sale_date: lookup(header, COL_SALE_DATE, &mut missing),
            product: lookup(header, COL_PRODUCT, &mut missing),
            brand: lookup(header, COL_BRAND, &mut missing),
            store: lookup(header, COL_STORE, &mut missing),
            store_type: lookup(header, COL_STORE_TYPE, &mut missing),
            category: lookup(header, COL_CATEGORY, &mut missing),
            quantity: lookup(header, COL_QUANTITY, &mut missing),
            revenue: lookup(header, COL_REVENUE, &mut missing),
        };

        if missing.is_empty() {
            Ok(map)
        } else {
            Err(LoadError::Schema { missing })
        }
    }
}

// First occurrence wins when a header repeats.
fn lookup(header: &[String], name: &'static str, missing: &mut Vec<String>) -> usize {
    header.iter().position(|h| h == name).unwrap_or_else(|| {
        missing.push(name.to_string());
        0
    })
}

fn records_from_rows<'a, I>(mut rows: I, first_row: usize) -> Result<Dataset, LoadError>
where
    I: Iterator<Item = &'a [Data]>,
{
    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(cell_to_string).collect())
        .unwrap_or_default();
    let columns = ColumnMap::resolve(&header)?;

    let mut records = Vec::new();
    for (offset, cells) in rows.enumerate() {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let row = first_row + offset + 1;
        records.push(SalesRecord {
            sale_date: coerce_date(cells.get(columns.sale_date), row)?,
            product: coerce_text(cells.get(columns.product)),
            brand: coerce_text(cells.get(columns.brand)),
            store: coerce_text(cells.get(columns.store)),
            store_type: coerce_text(cells.get(columns.store_type)),
            category: coerce_text(cells.get(columns.category)),
            quantity: coerce_quantity(cells.get(columns.quantity), row)?,
            revenue: coerce_revenue(cells.get(columns.revenue), row)?,
        });
    }

    debug!("parsed {} sales records", records.len());
    Ok(Dataset::new(records))
}

fn coerce_date(cell: Option<&Data>, row: usize) -> Result<NaiveDate, LoadError> {
    let parsed = match cell {
        Some(Data::DateTime(dt)) => excel_serial_to_date(dt.as_f64()),
        Some(Data::Float(f)) => excel_serial_to_date(*f),
        Some(Data::Int(i)) => excel_serial_to_date(*i as f64),
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => parse_date_text(s),
        _ => None,
    };

    parsed.ok_or_else(|| LoadError::Parse {
        row,
        column: COL_SALE_DATE,
        value: cell.map(cell_to_string).unwrap_or_default(),
    })
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a textual date. ISO dates come first. Slash dates are read month-first, falling
/// back to day-first when the first number cannot be a month.
fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn coerce_quantity(cell: Option<&Data>, row: usize) -> Result<i64, LoadError> {
    let value = match cell {
        Some(Data::Int(i)) => Some(*i),
        Some(Data::Float(f)) if f.is_finite() => Some(f.trunc() as i64),
        Some(Data::Bool(b)) => Some(i64::from(*b)),
        Some(Data::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    value.ok_or_else(|| LoadError::TypeCoercion {
        row,
        column: COL_QUANTITY,
        value: cell.map(cell_to_string).unwrap_or_default(),
        target: "integer",
    })
}

fn coerce_revenue(cell: Option<&Data>, row: usize) -> Result<f64, LoadError> {
    let value = match cell {
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Data::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::TypeCoercion {
            row,
            column: COL_REVENUE,
            value: cell.map(cell_to_string).unwrap_or_default(),
            target: "decimal",
        })
}

fn coerce_text(cell: Option<&Data>) -> String {
    cell.map(cell_to_string).unwrap_or_default()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

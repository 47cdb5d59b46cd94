use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Header names of the required columns, exactly as they appear in the workbook.
pub const COL_SALE_DATE: &str = "Data da Venda";
pub const COL_PRODUCT: &str = "Produto";
pub const COL_BRAND: &str = "Marca";
pub const COL_STORE: &str = "Loja";
pub const COL_STORE_TYPE: &str = "Tipo Loja";
pub const COL_CATEGORY: &str = "Categoria";
pub const COL_QUANTITY: &str = "Qtd Vendida";
pub const COL_REVENUE: &str = "Faturamento";

/// One row of the uploaded sales table, validated and typed at ingestion.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SalesRecord {
    pub sale_date: NaiveDate,
    pub product: String,
    pub brand: String,
    pub store: String,
    pub store_type: String,
    pub category: String,
    pub quantity: i64,
    pub revenue: f64,
}

/// Categorical columns of a [`SalesRecord`].
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Product,
    Brand,
    Store,
    StoreType,
    Category,
}

impl Dimension {
    /// The dimensions offered as filters. Store type is grouped on but never filtered.
    pub const FILTERABLE: [Dimension; 4] = [
        Dimension::Product,
        Dimension::Brand,
        Dimension::Store,
        Dimension::Category,
    ];

    pub fn value_of(self, record: &SalesRecord) -> &str {
        match self {
            Dimension::Product => &record.product,
            Dimension::Brand => &record.brand,
            Dimension::Store => &record.store,
            Dimension::StoreType => &record.store_type,
            Dimension::Category => &record.category,
        }
    }
}

/// Calendar month used as the key of the monthly revenue series.
///
/// Ordered chronologically; displayed and serialized as `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Month {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The immutable table produced by one successful ingestion.
///
/// Filtering never mutates a dataset; it produces a view (see [`crate::filter`]) that can be
/// materialized into a new `Dataset`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Dataset { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest sale date, or `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().map(|r| r.sale_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Distinct values of a dimension in the order they first appear.
    pub fn distinct(&self, dimension: Dimension) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| dimension.value_of(r))
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }
}

impl FromIterator<SalesRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = SalesRecord>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}

// Day zero of the 1900 date system, accounting for the phantom 1900-02-29.
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Convert an Excel serial day number to a calendar date, dropping any time-of-day fraction.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Beyond 1e8 days the result is outside chrono's range anyway.
    if !serial.is_finite() || !(0.0..1e8).contains(&serial) {
        return None;
    }
    excel_epoch().checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Excel serial day number for a calendar date.
pub fn date_to_excel_serial(date: NaiveDate) -> f64 {
    (date - excel_epoch()).num_days() as f64
}

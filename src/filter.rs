use crate::record::{Dataset, Dimension, SalesRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Choices available to the user for the currently loaded dataset.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FilterOptions {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub products: Vec<String>,
    pub brands: Vec<String>,
    pub stores: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let bounds = dataset.date_bounds();
        FilterOptions {
            min_date: bounds.map(|(lo, _)| lo),
            max_date: bounds.map(|(_, hi)| hi),
            products: dataset.distinct(Dimension::Product),
            brands: dataset.distinct(Dimension::Brand),
            stores: dataset.distinct(Dimension::Store),
            categories: dataset.distinct(Dimension::Category),
        }
    }
}

/// Date range plus allowed values per dimension.
///
/// Both ends of the range are inclusive. An empty set places no restriction on its dimension.
/// A range whose start falls after its end is accepted and simply matches nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCriteria {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub products: BTreeSet<String>,
    pub brands: BTreeSet<String>,
    pub stores: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        FilterCriteria {
            start,
            end,
            products: BTreeSet::new(),
            brands: BTreeSet::new(),
            stores: BTreeSet::new(),
            categories: BTreeSet::new(),
        }
    }

    /// Criteria that let every row of `dataset` through: its full date range, no value filters.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let (start, end) = dataset
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        FilterCriteria::new(start, end)
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_products<I: IntoIterator<Item = S>, S: Into<String>>(mut self, values: I) -> Self {
        self.products = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_brands<I: IntoIterator<Item = S>, S: Into<String>>(mut self, values: I) -> Self {
        self.brands = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stores<I: IntoIterator<Item = S>, S: Into<String>>(mut self, values: I) -> Self {
        self.stores = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        values: I,
    ) -> Self {
        self.categories = values.into_iter().map(Into::into).collect();
        self
    }

    fn allowed(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        match dimension {
            Dimension::Product => Some(&self.products),
            Dimension::Brand => Some(&self.brands),
            Dimension::Store => Some(&self.stores),
            Dimension::Category => Some(&self.categories),
            Dimension::StoreType => None,
        }
    }

    /// Whether a single record passes every test.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        if record.sale_date < self.start || record.sale_date > self.end {
            return false;
        }

        Dimension::FILTERABLE.iter().all(|&dimension| {
            match self.allowed(dimension) {
                Some(set) if !set.is_empty() => set.contains(dimension.value_of(record)),
                _ => true,
            }
        })
    }
}

/// Filter parameters as sent by the dashboard page.
///
/// Missing range ends fall back to the dataset's own bounds, which is what the date picker
/// shows before the user touches it.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterRequest {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub products: Vec<String>,
    pub brands: Vec<String>,
    pub stores: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterRequest {
    pub fn into_criteria(self, dataset: &Dataset) -> FilterCriteria {
        let defaults = FilterCriteria::for_dataset(dataset);
        FilterCriteria::new(
            self.start.unwrap_or(defaults.start),
            self.end.unwrap_or(defaults.end),
        )
        .with_products(self.products)
        .with_brands(self.brands)
        .with_stores(self.stores)
        .with_categories(self.categories)
    }
}

/// The rows of a dataset that passed a filter, in their original order.
#[derive(Clone, Debug)]
pub struct FilteredView<'a> {
    rows: Vec<&'a SalesRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn rows(&self) -> &[&'a SalesRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SalesRecord> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy the selected rows into a standalone dataset.
    pub fn materialize(&self) -> Dataset {
        self.iter().cloned().collect()
    }
}

/// Select the rows of `dataset` that satisfy `criteria`.
pub fn apply<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilteredView<'a> {
    FilteredView {
        rows: dataset
            .records()
            .iter()
            .filter(|record| criteria.matches(record))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::{date, sample_dataset};

    #[test]
    fn default_criteria_keep_everything() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds));
        assert_eq!(view.materialize(), ds);
    }

    #[test]
    fn date_range_is_inclusive() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::new(date(2024, 2, 1), date(2024, 2, 28));
        let view = apply(&ds, &criteria);
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows()[0].sale_date, date(2024, 2, 10));

        let edges = FilterCriteria::new(date(2024, 1, 5), date(2024, 1, 20));
        assert_eq!(apply(&ds, &edges).len(), 2);
    }

    #[test]
    fn product_filter_selects_matching_rows() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::for_dataset(&ds).with_products(["Prod B"]);
        let view = apply(&ds, &criteria);
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows()[0].sale_date, date(2024, 1, 20));
    }

    #[test]
    fn dimensions_combine_with_and() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::for_dataset(&ds)
            .with_brands(["BrandX", "BrandY"])
            .with_stores(["Store2"]);
        let view = apply(&ds, &criteria);
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows()[0].product, "Prod B");

        let none = FilterCriteria::for_dataset(&ds)
            .with_brands(["BrandX"])
            .with_categories(["Cat2"]);
        assert!(apply(&ds, &none).is_empty());
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::new(date(2024, 2, 28), date(2024, 1, 1));
        assert!(apply(&ds, &criteria).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::new(date(2024, 1, 1), date(2024, 1, 31)).with_products(["Prod A"]);
        let once = apply(&ds, &criteria).materialize();
        let twice = apply(&once, &criteria).materialize();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn options_list_distinct_values_and_bounds() {
        let options = FilterOptions::from_dataset(&sample_dataset());
        assert_eq!(options.min_date, Some(date(2024, 1, 5)));
        assert_eq!(options.max_date, Some(date(2024, 2, 10)));
        assert_eq!(options.stores, vec!["Store1", "Store2"]);
        assert_eq!(options.categories, vec!["Cat1", "Cat2"]);

        let empty = FilterOptions::from_dataset(&Dataset::default());
        assert_eq!(empty.min_date, None);
        assert!(empty.products.is_empty());
    }

    #[test]
    fn request_fills_missing_range_from_dataset() {
        let ds = sample_dataset();
        let request: FilterRequest =
            serde_json::from_str(r#"{"end": "2024-01-31", "brands": ["BrandY"]}"#).unwrap();
        let criteria = request.into_criteria(&ds);
        assert_eq!(criteria.start, date(2024, 1, 5));
        assert_eq!(criteria.end, date(2024, 1, 31));
        assert_eq!(apply(&ds, &criteria).len(), 1);
    }
}

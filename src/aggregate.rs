use crate::filter::FilteredView;
use crate::record::{COL_BRAND, COL_QUANTITY, COL_REVENUE, COL_STORE, COL_STORE_TYPE, Month};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Column label of the month key in [`monthly_revenue`].
pub const COL_MONTH: &str = "Mes";

/// One `(key, value)` pair of a chart series.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Point<K, V> {
    pub key: K,
    pub value: V,
}

/// Ordered data for one chart, with the column labels the chart should show.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Series<K, V> {
    pub key_label: &'static str,
    pub value_label: &'static str,
    pub points: Vec<Point<K, V>>,
}

impl<K, V> Series<K, V> {
    fn new(key_label: &'static str, value_label: &'static str, pairs: Vec<(K, V)>) -> Self {
        Series {
            key_label,
            value_label,
            points: pairs
                .into_iter()
                .map(|(key, value)| Point { key, value })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.points.iter().map(|p| &p.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.points.iter().map(|p| &p.value)
    }
}

/// Revenue summed per calendar month, oldest month first.
pub fn monthly_revenue(view: &FilteredView<'_>) -> Series<Month, f64> {
    let mut by_month: BTreeMap<Month, f64> = BTreeMap::new();
    for record in view.iter() {
        *by_month.entry(Month::of(record.sale_date)).or_default() += record.revenue;
    }
    Series::new(COL_MONTH, COL_REVENUE, by_month.into_iter().collect())
}

/// Revenue summed per store, highest first.
pub fn revenue_by_store(view: &FilteredView<'_>) -> Series<String, f64> {
    let mut pairs = group_first_seen(view.iter().map(|r| (r.store.as_str(), r.revenue)), |a, b| a + b);
    sort_descending(&mut pairs);
    Series::new(COL_STORE, COL_REVENUE, pairs)
}

/// Revenue summed per store type, ordered by store type name.
pub fn revenue_by_store_type(view: &FilteredView<'_>) -> Series<String, f64> {
    let mut by_type: BTreeMap<String, f64> = BTreeMap::new();
    for record in view.iter() {
        *by_type.entry(record.store_type.clone()).or_default() += record.revenue;
    }
    Series::new(COL_STORE_TYPE, COL_REVENUE, by_type.into_iter().collect())
}

/// Units sold per brand, highest first.
pub fn quantity_by_brand(view: &FilteredView<'_>) -> Series<String, i64> {
    let mut pairs = group_first_seen(
        view.iter().map(|r| (r.brand.as_str(), r.quantity)),
        i64::saturating_add,
    );
    sort_descending(&mut pairs);
    Series::new(COL_BRAND, COL_QUANTITY, pairs)
}

/// Fold values per key with `add`, keeping keys in the order they first appear.
fn group_first_seen<'a, V, I>(items: I, add: fn(V, V) -> V) -> Vec<(String, V)>
where
    V: Copy + Default,
    I: Iterator<Item = (&'a str, V)>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(String, V)> = Vec::new();
    for (key, value) in items {
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), V::default()));
            groups.len() - 1
        });
        groups[slot].1 = add(groups[slot].1, value);
    }
    groups
}

// Stable, so ties keep first-seen order.
fn sort_descending<V: PartialOrd>(pairs: &mut [(String, V)]) {
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterCriteria, apply};
    use crate::metrics::compute_kpis;
    use crate::record::Dataset;
    use crate::record::tests::{date, record, sample_dataset};

    fn pairs<K: Clone, V: Copy>(series: &Series<K, V>) -> Vec<(K, V)> {
        series.points.iter().map(|p| (p.key.clone(), p.value)).collect()
    }

    #[test]
    fn monthly_revenue_is_chronological() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds));
        let series = monthly_revenue(&view);
        let labels: Vec<String> = series.keys().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02"]);
        assert_eq!(series.values().copied().collect::<Vec<_>>(), vec![150.0, 150.0]);
        assert_eq!(series.key_label, "Mes");
    }

    #[test]
    fn revenue_by_store_is_descending() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds));
        assert_eq!(
            pairs(&revenue_by_store(&view)),
            vec![("Store1".to_string(), 250.0), ("Store2".to_string(), 50.0)]
        );
    }

    #[test]
    fn store_types_and_brands() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds));
        assert_eq!(
            pairs(&revenue_by_store_type(&view)),
            vec![("Online".to_string(), 50.0), ("Physical".to_string(), 250.0)]
        );
        assert_eq!(
            pairs(&quantity_by_brand(&view)),
            vec![("BrandX".to_string(), 5), ("BrandY".to_string(), 1)]
        );
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let ds = Dataset::new(vec![
            record(date(2024, 1, 1), "P", "Zeta", "Loja Z", "T", "C", 4, 10.0),
            record(date(2024, 1, 2), "P", "Alfa", "Loja A", "T", "C", 4, 10.0),
            record(date(2024, 1, 3), "P", "Beta", "Loja B", "T", "C", 9, 30.0),
        ]);
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds));
        let stores: Vec<String> = revenue_by_store(&view).keys().cloned().collect();
        assert_eq!(stores, vec!["Loja B", "Loja Z", "Loja A"]);
        let brands: Vec<String> = quantity_by_brand(&view).keys().cloned().collect();
        assert_eq!(brands, vec!["Beta", "Zeta", "Alfa"]);
    }

    #[test]
    fn series_totals_match_kpis() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::for_dataset(&ds).with_categories(["Cat1", "Cat2"]);
        let view = apply(&ds, &criteria);
        let kpis = compute_kpis(&view);

        assert_eq!(monthly_revenue(&view).values().sum::<f64>(), kpis.total_revenue);
        assert_eq!(revenue_by_store(&view).values().sum::<f64>(), kpis.total_revenue);
        assert_eq!(revenue_by_store_type(&view).values().sum::<f64>(), kpis.total_revenue);
        assert_eq!(quantity_by_brand(&view).values().sum::<i64>(), kpis.total_quantity);
    }

    #[test]
    fn brand_quantities_saturate() {
        let ds = Dataset::new(vec![
            record(date(2024, 1, 1), "P", "Big", "S", "T", "C", i64::MAX, 1.0),
            record(date(2024, 1, 2), "P", "Big", "S", "T", "C", i64::MAX, 1.0),
            record(date(2024, 1, 3), "P", "Small", "S", "T", "C", 1, 1.0),
        ]);
        let view = apply(&ds, &FilterCriteria::for_dataset(&ds));
        assert_eq!(
            pairs(&quantity_by_brand(&view)),
            vec![("Big".to_string(), i64::MAX), ("Small".to_string(), 1)]
        );
        assert_eq!(compute_kpis(&view).total_quantity, i64::MAX);
    }

    #[test]
    fn empty_view_gives_empty_series() {
        let ds = sample_dataset();
        let view = apply(&ds, &FilterCriteria::new(date(2030, 1, 1), date(2030, 12, 31)));
        assert!(monthly_revenue(&view).is_empty());
        assert!(revenue_by_store(&view).is_empty());
        assert!(revenue_by_store_type(&view).is_empty());
        assert!(quantity_by_brand(&view).is_empty());
    }
}

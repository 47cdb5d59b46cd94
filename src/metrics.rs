use crate::filter::FilteredView;
use serde::Serialize;

/// Summary figures shown above the charts.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq)]
pub struct KpiSet {
    pub total_revenue: f64,
    pub total_quantity: i64,
    /// Revenue per unit sold; zero when nothing was sold.
    pub average_unit_price: f64,
    pub transaction_count: usize,
}

pub fn compute_kpis(view: &FilteredView<'_>) -> KpiSet {
    let total_revenue: f64 = view.iter().map(|r| r.revenue).sum();
    // Saturates at the i64 bounds.
    let total_quantity = view.iter().map(|r| r.quantity).fold(0i64, i64::saturating_add);

    let average_unit_price = if total_quantity != 0 {
        total_revenue / total_quantity as f64
    } else {
        0.0
    };

    KpiSet {
        total_revenue,
        total_quantity,
        average_unit_price,
        transaction_count: view.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterCriteria, apply};
    use crate::record::Dataset;
    use crate::record::tests::{date, record, sample_dataset};

    #[test]
    fn totals_over_unfiltered_sample() {
        let ds = sample_dataset();
        let kpis = compute_kpis(&apply(&ds, &FilterCriteria::for_dataset(&ds)));
        assert_eq!(
            kpis,
            KpiSet {
                total_revenue: 300.0,
                total_quantity: 6,
                average_unit_price: 50.0,
                transaction_count: 3,
            }
        );
    }

    #[test]
    fn totals_follow_the_filter() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::new(date(2024, 2, 1), date(2024, 2, 28));
        let kpis = compute_kpis(&apply(&ds, &criteria));
        assert_eq!(kpis.total_revenue, 150.0);
        assert_eq!(kpis.transaction_count, 1);
    }

    #[test]
    fn empty_view_has_zero_average() {
        let ds = Dataset::default();
        let kpis = compute_kpis(&apply(&ds, &FilterCriteria::for_dataset(&ds)));
        assert_eq!(kpis, KpiSet::default());
    }

    #[test]
    fn quantity_total_saturates() {
        let ds = Dataset::new(vec![
            record(date(2024, 3, 1), "P", "B", "S", "T", "C", i64::MAX, 10.0),
            record(date(2024, 3, 2), "P", "B", "S", "T", "C", 5, 10.0),
            record(date(2024, 3, 3), "P", "B", "S", "T", "C", i64::MIN, 10.0),
            record(date(2024, 3, 4), "P", "B", "S", "T", "C", i64::MIN, 10.0),
        ]);
        let kpis = compute_kpis(&apply(&ds, &FilterCriteria::for_dataset(&ds)));
        assert_eq!(kpis.total_quantity, i64::MIN);
        assert_eq!(kpis.transaction_count, 4);

        let kpis = compute_kpis(&apply(&ds, &FilterCriteria::new(date(2024, 3, 1), date(2024, 3, 2))));
        assert_eq!(kpis.total_quantity, i64::MAX);
    }

    #[test]
    fn zero_quantity_does_not_divide() {
        let ds = Dataset::new(vec![record(date(2024, 3, 1), "P", "B", "S", "T", "C", 0, 80.0)]);
        let kpis = compute_kpis(&apply(&ds, &FilterCriteria::for_dataset(&ds)));
        assert_eq!(kpis.total_revenue, 80.0);
        assert_eq!(kpis.total_quantity, 0);
        assert_eq!(kpis.average_unit_price, 0.0);
        assert_eq!(kpis.transaction_count, 1);
    }
}

use crate::aggregate::{
    Series, monthly_revenue, quantity_by_brand, revenue_by_store, revenue_by_store_type,
};
use crate::filter::{FilterCriteria, apply};
use crate::metrics::{KpiSet, compute_kpis};
use crate::record::{Dataset, Month};
use log::debug;
use serde::Serialize;

/// Everything the dashboard renders for one set of filter choices.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DashboardView {
    pub kpis: KpiSet,
    pub monthly_revenue: Series<Month, f64>,
    pub revenue_by_store: Series<String, f64>,
    pub revenue_by_store_type: Series<String, f64>,
    pub quantity_by_brand: Series<String, i64>,
}

/// Filter `dataset` and derive the KPIs and the four chart series from the result.
///
/// Pure: recomputed from the full dataset on every call.
pub fn compute_view(dataset: &Dataset, criteria: &FilterCriteria) -> DashboardView {
    let filtered = apply(dataset, criteria);
    debug!(
        "view over {} of {} rows ({} to {})",
        filtered.len(),
        dataset.len(),
        criteria.start,
        criteria.end
    );

    DashboardView {
        kpis: compute_kpis(&filtered),
        monthly_revenue: monthly_revenue(&filtered),
        revenue_by_store: revenue_by_store(&filtered),
        revenue_by_store_type: revenue_by_store_type(&filtered),
        quantity_by_brand: quantity_by_brand(&filtered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_dataset;

    #[test]
    fn view_bundles_kpis_and_series() {
        let ds = sample_dataset();
        let view = compute_view(&ds, &FilterCriteria::for_dataset(&ds).with_products(["Prod B"]));
        assert_eq!(view.kpis.transaction_count, 1);
        assert_eq!(view.kpis.total_revenue, 50.0);
        assert_eq!(view.revenue_by_store.points[0].key, "Store2");
        assert_eq!(view.quantity_by_brand.points[0].value, 1);
    }

    #[test]
    fn serializes_with_stable_names() {
        let ds = sample_dataset();
        let view = compute_view(&ds, &FilterCriteria::for_dataset(&ds));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kpis"]["total_quantity"], 6);
        assert_eq!(json["monthly_revenue"]["points"][0]["key"], "2024-01");
        assert_eq!(json["monthly_revenue"]["value_label"], "Faturamento");
        assert_eq!(json["quantity_by_brand"]["key_label"], "Marca");
    }
}

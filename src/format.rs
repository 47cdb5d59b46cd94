use crate::metrics::KpiSet;
use num_format::{Locale, ToFormattedString};
use serde::Serialize;

pub const CURRENCY_PREFIX: &str = "R$";

/// KPI labels and values as the dashboard prints them.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct KpiDisplay {
    pub total_revenue: Metric,
    pub total_quantity: Metric,
    pub average_unit_price: Metric,
    pub transaction_count: Metric,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

impl KpiDisplay {
    pub fn from_kpis(kpis: &KpiSet) -> Self {
        KpiDisplay {
            total_revenue: Metric {
                label: "Faturamento Total",
                value: format_currency(kpis.total_revenue),
            },
            total_quantity: Metric {
                label: "Qtd. Vendida",
                value: format_integer(kpis.total_quantity),
            },
            average_unit_price: Metric {
                label: "Ticket Médio",
                value: format_currency(kpis.average_unit_price),
            },
            transaction_count: Metric {
                label: "Total de Vendas",
                value: format_integer(kpis.transaction_count as i64),
            },
        }
    }

    pub fn metrics(&self) -> [&Metric; 4] {
        [
            &self.total_revenue,
            &self.total_quantity,
            &self.average_unit_price,
            &self.transaction_count,
        ]
    }
}

/// `R$ 1,234.56`: comma thousands separator, two decimals.
pub fn format_currency(amount: f64) -> String {
    format!("{} {}", CURRENCY_PREFIX, format_decimal(amount, 2))
}

/// `1,234`.
pub fn format_integer(value: i64) -> String {
    value.to_formatted_string(&Locale::en)
}

/// Fixed-point rendering with grouped thousands.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    // Rounding can turn a tiny negative into zero; never print "-0.00".
    let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    let grouped = match int_part.parse::<u128>() {
        Ok(whole) => whole.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

const SI_SUFFIXES: [&str; 5] = ["", "k", "M", "G", "T"];

/// Two significant digits with an SI suffix: `1.2k`, `77`, `3.4M`.
pub fn format_compact(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let mut scaled = value.abs();
    let mut tier = 0;
    while tier + 1 < SI_SUFFIXES.len() && round_significant(scaled) >= 1000.0 {
        scaled /= 1000.0;
        tier += 1;
    }

    let rounded = round_significant(scaled);
    let digits = if rounded >= 10.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    };
    if rounded == 0.0 {
        return digits;
    }
    format!("{}{}{}", sign, digits, SI_SUFFIXES[tier])
}

fn round_significant(value: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32 - 1);
    (value / magnitude).round() * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(300.0), "R$ 300.00");
        assert_eq!(format_currency(1234567.891), "R$ 1,234,567.89");
        assert_eq!(format_currency(0.0), "R$ 0.00");
        assert_eq!(format_currency(-1500.5), "R$ -1,500.50");
        assert_eq!(format_currency(-0.001), "R$ 0.00");
    }

    #[test]
    fn integers_group_thousands() {
        assert_eq!(format_integer(6), "6");
        assert_eq!(format_integer(1000), "1,000");
        assert_eq!(format_integer(123456789), "123,456,789");
        assert_eq!(format_integer(-4200), "-4,200");
    }

    #[test]
    fn decimals_keep_their_places() {
        assert_eq!(format_decimal(1234.5, 0), "1,234");
        assert_eq!(format_decimal(999999.999, 2), "1,000,000.00");
        assert_eq!(format_decimal(-0.4, 0), "0");
    }

    #[test]
    fn compact_uses_two_significant_digits() {
        assert_eq!(format_compact(1234.0), "1.2k");
        assert_eq!(format_compact(77.0), "77");
        assert_eq!(format_compact(250.0), "250");
        assert_eq!(format_compact(5.0), "5.0");
        assert_eq!(format_compact(1_500_000.0), "1.5M");
        assert_eq!(format_compact(999_600.0), "1.0M");
        assert_eq!(format_compact(-45_000.0), "-45k");
        assert_eq!(format_compact(0.0), "0.0");
    }

    #[test]
    fn kpi_display_labels() {
        let display = KpiDisplay::from_kpis(&KpiSet {
            total_revenue: 300.0,
            total_quantity: 6,
            average_unit_price: 50.0,
            transaction_count: 3,
        });
        let rendered: Vec<(&str, &str)> = display
            .metrics()
            .into_iter()
            .map(|m| (m.label, m.value.as_str()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("Faturamento Total", "R$ 300.00"),
                ("Qtd. Vendida", "6"),
                ("Ticket Médio", "R$ 50.00"),
                ("Total de Vendas", "3"),
            ]
        );
    }
}

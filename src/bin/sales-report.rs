//! Sales report CLI - dashboard figures for a sales file, without the browser
//!
//! Usage:
//!   sales-report <FILE> [--from DATE] [--to DATE] [--product P]... [--brand B]...
//!                [--store S]... [--category C]... [--json] [--charts DIR]
//!
//! Examples:
//!   sales-report "Base Vendas.xlsx"
//!   sales-report vendas.csv --from 2024-01-01 --to 2024-03-31 --store "Loja Centro"
//!   sales-report vendas.xlsx --brand BrandX --brand BrandY --charts out/

use chrono::NaiveDate;
use clap::Parser;
use log::info;
use sales_dashboard::aggregate::Series;
use sales_dashboard::filter::FilterRequest;
use sales_dashboard::format::{KpiDisplay, format_currency, format_integer};
use sales_dashboard::{compute_view, load_dataset};
use serde_json::json;
use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sales-report")]
#[command(about = "Print the sales dashboard KPIs and chart data for a workbook or CSV file")]
#[command(version)]
struct Cli {
    /// Path to the sales workbook (.xlsx, .xls, .ods) or .csv file
    file: PathBuf,

    /// First sale date to include (YYYY-MM-DD); defaults to the earliest in the file
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last sale date to include (YYYY-MM-DD); defaults to the latest in the file
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Keep only these products (repeatable)
    #[arg(long = "product")]
    products: Vec<String>,

    /// Keep only these brands (repeatable)
    #[arg(long = "brand")]
    brands: Vec<String>,

    /// Keep only these stores (repeatable)
    #[arg(long = "store")]
    stores: Vec<String>,

    /// Keep only these categories (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Print the view as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also write the four charts as SVG files into this directory
    #[arg(long, value_name = "DIR")]
    charts: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load_dataset(&cli.file)?;
    info!("loaded {} rows from {}", dataset.len(), cli.file.display());

    let request = FilterRequest {
        start: cli.from,
        end: cli.to,
        products: cli.products,
        brands: cli.brands,
        stores: cli.stores,
        categories: cli.categories,
    };
    let view = compute_view(&dataset, &request.into_criteria(&dataset));
    let display = KpiDisplay::from_kpis(&view.kpis);

    if cli.json {
        let output = json!({ "display": &display, "view": &view });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for metric in display.metrics() {
            println!("{:<20}{}", metric.label, metric.value);
        }
        print_series(&view.monthly_revenue, |v| format_currency(*v));
        print_series(&view.revenue_by_store, |v| format_currency(*v));
        print_series(&view.revenue_by_store_type, |v| format_currency(*v));
        print_series(&view.quantity_by_brand, |v| format_integer(*v));
    }

    if let Some(dir) = cli.charts {
        write_charts(&view, &dir)?;
    }

    Ok(())
}

fn print_series<K: Display, V>(series: &Series<K, V>, format_value: impl Fn(&V) -> String) {
    println!();
    println!("{} x {}", series.value_label, series.key_label);
    if series.is_empty() {
        println!("  (sem dados)");
    }
    for point in &series.points {
        println!("  {:<30}{:>20}", point.key, format_value(&point.value));
    }
}

#[cfg(feature = "web")]
fn write_charts(
    view: &sales_dashboard::DashboardView,
    dir: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    use sales_dashboard::config::DashboardConfig;
    use sales_dashboard::graph::save_all_charts;

    let config = DashboardConfig::default();
    for (kind, path) in save_all_charts(view, dir, config.chart_width, config.chart_height)? {
        eprintln!("{}: {}", kind.title(), path.display());
    }
    Ok(())
}

#[cfg(not(feature = "web"))]
fn write_charts(
    _view: &sales_dashboard::DashboardView,
    _dir: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("chart output needs the `web` feature".into())
}

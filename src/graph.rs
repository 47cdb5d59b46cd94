#![cfg(feature = "web")]
use crate::aggregate::Series;
use crate::format::{format_compact, format_decimal, format_integer};
use crate::view::DashboardView;
use plotters::coord::ranged1d::SegmentValue;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Chart shapes the dashboard draws
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphType {
    /// Line graph with a marker on every point, for values over time
    Line,

    /// Vertical bars, one per category
    Bar,

    /// Pie slices proportional to each category's share of the total
    Pie,
}

/// The four charts on the dashboard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartKind {
    MonthlyRevenue,
    RevenueByStore,
    RevenueByStoreType,
    QuantityByBrand,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::MonthlyRevenue,
        ChartKind::RevenueByStore,
        ChartKind::RevenueByStoreType,
        ChartKind::QuantityByBrand,
    ];

    /// Name used in URLs and output file names
    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::MonthlyRevenue => "monthly-revenue",
            ChartKind::RevenueByStore => "revenue-by-store",
            ChartKind::RevenueByStoreType => "revenue-by-store-type",
            ChartKind::QuantityByBrand => "quantity-by-brand",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        ChartKind::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::MonthlyRevenue => "Faturamento por Mês",
            ChartKind::RevenueByStore => "Faturamento por Loja",
            ChartKind::RevenueByStoreType => "Faturamento por Tipo de Loja",
            ChartKind::QuantityByBrand => "Quantidade Vendida por Marca",
        }
    }

    pub fn graph_type(self) -> GraphType {
        match self {
            ChartKind::MonthlyRevenue => GraphType::Line,
            ChartKind::RevenueByStore | ChartKind::QuantityByBrand => GraphType::Bar,
            ChartKind::RevenueByStoreType => GraphType::Pie,
        }
    }
}

/// Configuration options for graph generation
///
/// This structure contains all the customizable properties for generating
/// the dashboard charts.
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the graph
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,

    /// Type of graph to generate
    pub graph_type: GraphType,

    /// Formatter for the value printed above each bar; no labels when `None`
    pub value_labels: Option<fn(f64) -> String>,
}

impl GraphOptions {
    /// Options for one of the dashboard charts, with axis labels taken from its series
    pub fn for_chart<K, V>(kind: ChartKind, series: &Series<K, V>, width: u32, height: u32) -> Self {
        Self {
            title: kind.title().to_string(),
            x_label: series.key_label.to_string(),
            y_label: series.value_label.to_string(),
            width,
            height,
            graph_type: kind.graph_type(),
            value_labels: match kind {
                ChartKind::RevenueByStore => Some(format_compact as fn(f64) -> String),
                ChartKind::QuantityByBrand => Some(integer_label as fn(f64) -> String),
                _ => None,
            },
        }
    }
}

/// Renders one dashboard chart as an SVG document
///
/// # Arguments
/// * `view` - The computed dashboard view holding the four series
/// * `kind` - Which chart to draw
/// * `width`, `height` - Size of the image in pixels
///
/// # Returns
/// * A Result containing the SVG markup or an error
///
/// # Examples
/// ```
/// use sales_dashboard::filter::FilterCriteria;
/// use sales_dashboard::graph::{ChartKind, render_chart};
/// use sales_dashboard::record::Dataset;
/// use sales_dashboard::view::compute_view;
///
/// let dataset = Dataset::default();
/// let view = compute_view(&dataset, &FilterCriteria::for_dataset(&dataset));
/// let svg = render_chart(&view, ChartKind::RevenueByStore, 640, 360).unwrap();
/// assert!(svg.starts_with("<svg"));
/// ```
pub fn render_chart(
    view: &DashboardView,
    kind: ChartKind,
    width: u32,
    height: u32,
) -> Result<String, Box<dyn Error>> {
    match kind {
        ChartKind::MonthlyRevenue => {
            let options = GraphOptions::for_chart(kind, &view.monthly_revenue, width, height);
            create_graph(&labelled(&view.monthly_revenue, |v| v), &options)
        }
        ChartKind::RevenueByStore => {
            let options = GraphOptions::for_chart(kind, &view.revenue_by_store, width, height);
            create_graph(&labelled(&view.revenue_by_store, |v| v), &options)
        }
        ChartKind::RevenueByStoreType => {
            let options = GraphOptions::for_chart(kind, &view.revenue_by_store_type, width, height);
            create_graph(&labelled(&view.revenue_by_store_type, |v| v), &options)
        }
        ChartKind::QuantityByBrand => {
            let options = GraphOptions::for_chart(kind, &view.quantity_by_brand, width, height);
            create_graph(&labelled(&view.quantity_by_brand, |v| v as f64), &options)
        }
    }
}

/// Draws labelled values with the shape selected in `options`
///
/// # Arguments
/// * `data` - Category labels with their values, in display order
/// * `options` - Graph styling and type options
///
/// # Returns
/// * A Result containing the SVG markup or an error
pub fn create_graph(data: &[(String, f64)], options: &GraphOptions) -> Result<String, Box<dyn Error>> {
    match options.graph_type {
        GraphType::Line => create_line_graph(data, options),
        GraphType::Bar => create_bar_graph(data, options),
        GraphType::Pie => create_pie_graph(data, options),
    }
}

/// Writes every dashboard chart into `output_dir` as `<slug>.svg`
///
/// # Returns
/// * The chart kinds with the paths they were written to
///
/// # Implementation Notes
/// * Creates `output_dir` if it doesn't exist
pub fn save_all_charts(
    view: &DashboardView,
    output_dir: &Path,
    width: u32,
    height: u32,
) -> Result<Vec<(ChartKind, PathBuf)>, Box<dyn Error>> {
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(ChartKind::ALL.len());
    for kind in ChartKind::ALL {
        let svg = render_chart(view, kind, width, height)?;
        let path = output_dir.join(format!("{}.svg", kind.slug()));
        fs::write(&path, svg)?;
        written.push((kind, path));
    }
    Ok(written)
}

fn integer_label(value: f64) -> String {
    format_integer(value as i64)
}

fn labelled<K: ToString, V: Copy>(series: &Series<K, V>, to_f64: impl Fn(V) -> f64) -> Vec<(String, f64)> {
    series
        .points
        .iter()
        .map(|p| (p.key.to_string(), to_f64(p.value)))
        .collect()
}

/// Creates a line graph from labelled points
///
/// Points are spaced evenly along the X axis in the order given and labelled with
/// their keys.
///
/// # Implementation Notes
/// * Marks every point with a filled circle
/// * The Y axis always includes zero
fn create_line_graph(data: &[(String, f64)], options: &GraphOptions) -> Result<String, Box<dyn Error>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let (min_y, max_y) = value_bounds(data);
        let last_x = data.len().saturating_sub(1).max(1) as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..last_x, min_y..max_y)?;

        let label_at = |x: &f64| {
            let i = x.round();
            if (x - i).abs() < 1e-9 && i >= 0.0 {
                data.get(i as usize).map(|(k, _)| k.clone()).unwrap_or_default()
            } else {
                String::new()
            }
        };
        let value_label = |y: &f64| format_decimal(*y, 0);

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(data.len().max(2))
            .x_label_formatter(&label_at)
            .y_label_formatter(&value_label)
            .draw()?;

        chart.draw_series(LineSeries::new(
            data.iter().enumerate().map(|(i, (_, y))| (i as f64, *y)),
            &BLUE,
        ))?;
        chart.draw_series(
            data.iter()
                .enumerate()
                .map(|(i, (_, y))| Circle::new((i as f64, *y), 4, BLUE.filled())),
        )?;

        root.present()?;
    }
    Ok(svg)
}

/// Creates a bar graph from labelled values
///
/// One bar per entry, left to right in the order given.
fn create_bar_graph(data: &[(String, f64)], options: &GraphOptions) -> Result<String, Box<dyn Error>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let (min_y, max_y) = value_bounds(data);
        let slots = data.len().max(1);

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0..slots).into_segmented(), min_y..max_y)?;

        let label_at = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => data.get(*i).map(|(k, _)| k.clone()).unwrap_or_default(),
            _ => String::new(),
        };
        let value_label = |y: &f64| format_decimal(*y, 0);

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(slots)
            .x_label_formatter(&label_at)
            .y_label_formatter(&value_label)
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.filled())
                .margin(10)
                .data(data.iter().enumerate().map(|(i, (_, y))| (i, *y))),
        )?;

        if let Some(format_value) = options.value_labels {
            let style = ("sans-serif", 14)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            chart.draw_series(data.iter().enumerate().map(|(i, (_, y))| {
                Text::new(format_value(*y), (SegmentValue::CenterOf(i), *y), style.clone())
            }))?;
        }

        root.present()?;
    }
    Ok(svg)
}

/// Creates a pie chart from labelled values
///
/// # Implementation Notes
/// * Slices start at twelve o'clock and carry their percentage
/// * Nothing is drawn under the title when the values have no positive total or any
///   negative entry, since slices cannot represent either
fn create_pie_graph(data: &[(String, f64)], options: &GraphOptions) -> Result<String, Box<dyn Error>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(&options.title, ("sans-serif", 30))?;

        let total: f64 = data.iter().map(|(_, v)| *v).sum();
        if total > 0.0 && data.iter().all(|(_, v)| *v >= 0.0) {
            let (w, h) = area.dim_in_pixel();
            let center = ((w / 2) as i32, (h / 2) as i32);
            let radius = f64::from(w.min(h)) * 0.35;
            let sizes: Vec<f64> = data.iter().map(|(_, v)| *v).collect();
            let labels: Vec<&str> = data.iter().map(|(k, _)| k.as_str()).collect();
            let colors: Vec<RGBColor> = (0..data.len()).map(palette_color).collect();

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.start_angle(-90.0);
            pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
            pie.percentages(("sans-serif", 14).into_font().color(&WHITE));
            area.draw(&pie)?;
        }

        root.present()?;
    }
    Ok(svg)
}

// Y range with zero included and some headroom above the tallest value.
fn value_bounds(data: &[(String, f64)]) -> (f64, f64) {
    let min = data.iter().map(|(_, v)| *v).fold(0.0, f64::min);
    let max = data.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let top = if max > 0.0 { max * 1.1 } else { 1.0 };
    let bottom = if min < 0.0 { min * 1.1 } else { 0.0 };
    (bottom, top)
}

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(23, 190, 207),
];

fn palette_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

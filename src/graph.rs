#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]
use crate::analysis::{Budget, DashboardViews, PricePoint};
use crate::listing::Listing;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;

/// The six charts the dashboard can draw, one per view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DashboardView {
    TopMileage,
    Cheapest,
    BestUnderBudget,
    BrandAverage,
    PriceVsMileage,
    TopRange,
}

impl DashboardView {
    pub const ALL: [DashboardView; 6] = [
        DashboardView::TopMileage,
        DashboardView::Cheapest,
        DashboardView::BestUnderBudget,
        DashboardView::BrandAverage,
        DashboardView::PriceVsMileage,
        DashboardView::TopRange,
    ];

    /// Path segment used by `/api/chart/:view`.
    pub fn slug(self) -> &'static str {
        match self {
            DashboardView::TopMileage => "top_mileage",
            DashboardView::Cheapest => "cheapest",
            DashboardView::BestUnderBudget => "budget",
            DashboardView::BrandAverage => "brand_average",
            DashboardView::PriceVsMileage => "price_vs_mileage",
            DashboardView::TopRange => "top_range",
        }
    }

    pub fn title(self, budget: Budget) -> String {
        match self {
            DashboardView::TopMileage => "Top Mileage Models".to_string(),
            DashboardView::Cheapest => "Lowest On-Road Prices".to_string(),
            DashboardView::BestUnderBudget => format!("Best Mileage under ₹{}", budget.amount()),
            DashboardView::BrandAverage => "Brand-wise Average Mileage".to_string(),
            DashboardView::PriceVsMileage => "On-Road Price vs Mileage".to_string(),
            DashboardView::TopRange => "Top Total Range Performers".to_string(),
        }
    }

    fn axis_labels(self) -> (&'static str, &'static str) {
        match self {
            DashboardView::TopMileage | DashboardView::BestUnderBudget => {
                ("Model", "Mileage (kmpl)")
            }
            DashboardView::Cheapest => ("Model", "On-road price (₹)"),
            DashboardView::BrandAverage => ("Brand", "Average mileage (kmpl)"),
            DashboardView::PriceVsMileage => ("On-road price (₹)", "Mileage (kmpl)"),
            DashboardView::TopRange => ("Model", "Range (km)"),
        }
    }
}

impl FromStr for DashboardView {
    type Err = String;

    fn from_str(slug: &str) -> Result<Self, Self::Err> {
        DashboardView::ALL
            .into_iter()
            .find(|view| view.slug() == slug)
            .ok_or_else(|| format!("unknown view: {}", slug))
    }
}

/// Available graph types supported by the dashboard
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphType {
    /// One bar per row, coloured by brand
    Bar,

    /// One point per listing, coloured by brand
    Scatter,
}

/// Configuration options for graph generation
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
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Graph".to_string(),
            x_label: "X Axis".to_string(),
            y_label: "Y Axis".to_string(),
            width: 800,
            height: 600,
            graph_type: GraphType::Bar,
        }
    }
}

impl GraphOptions {
    pub fn for_view(view: DashboardView, budget: Budget) -> Self {
        let (x_label, y_label) = view.axis_labels();
        Self {
            title: view.title(budget),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            graph_type: match view {
                DashboardView::PriceVsMileage => GraphType::Scatter,
                _ => GraphType::Bar,
            },
            ..Self::default()
        }
    }
}

/// Assigns every brand of an upload a fixed colour, so a brand keeps its colour
/// across charts and across brand selections.
#[derive(Clone, Debug, Default)]
pub struct BrandPalette {
    brands: Vec<String>,
}

impl BrandPalette {
    /// `brands` must be sorted, as returned by `brand_options`.
    pub fn new(brands: Vec<String>) -> Self {
        Self { brands }
    }

    pub fn color(&self, brand: &str) -> RGBAColor {
        let index = self
            .brands
            .binary_search_by(|known| known.as_str().cmp(brand))
            .unwrap_or_else(|insert_at| insert_at);
        Palette99::pick(index).to_rgba()
    }
}

/// A single bar: its axis label, its height and the brand that colours it.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub brand: String,
}

/// Bars for one of the bar-chart views; `None` for the scatter view.
pub fn bars_for_view(view: DashboardView, views: &DashboardViews) -> Option<Vec<Bar>> {
    match view {
        DashboardView::TopMileage => Some(ranked(&views.top_mileage, |l| l.mileage_kmpl)),
        DashboardView::Cheapest => Some(ranked(&views.cheapest, |l| l.on_road_price as f64)),
        DashboardView::BestUnderBudget => {
            Some(ranked(&views.best_under_budget, |l| l.mileage_kmpl))
        }
        DashboardView::BrandAverage => Some(
            views
                .brand_average
                .iter()
                .map(|average| Bar {
                    label: average.brand.clone(),
                    value: average.mileage_kmpl,
                    brand: average.brand.clone(),
                })
                .collect(),
        ),
        DashboardView::TopRange => Some(
            views
                .top_range
                .iter()
                .map(|entry| Bar {
                    label: entry.listing.model.clone(),
                    value: entry.total_range,
                    brand: entry.listing.brand.clone(),
                })
                .collect(),
        ),
        DashboardView::PriceVsMileage => None,
    }
}

fn ranked(rows: &[&Listing], value: fn(&Listing) -> f64) -> Vec<Bar> {
    rows.iter()
        .map(|listing| Bar {
            label: listing.model.clone(),
            value: value(listing),
            brand: listing.brand.clone(),
        })
        .collect()
}

/// Renders one dashboard view as an SVG document.
///
/// # Examples
/// ```
/// use wheeldash::analysis::{analyze, brand_options, BrandSelection, Budget};
/// use wheeldash::graph::{render_view, BrandPalette, DashboardView};
/// use wheeldash::listing::{CleanedTable, Listing};
///
/// let table = CleanedTable::new(vec![Listing {
///     row_id: None,
///     brand: "Hero".to_string(),
///     model: "Splendor".to_string(),
///     mode_price: None,
///     ex_showroom_price: None,
///     on_road_price: 75_000,
///     insurance_price: None,
///     color_option: None,
///     mileage_kmpl: 70.0,
///     fuel_capacity_ltr: 9.8,
///     meter_type: None,
///     gear_type: None,
/// }]);
/// let analysis = analyze(&table, &BrandSelection::All, Budget::default());
/// let palette = BrandPalette::new(brand_options(&table));
/// let svg = render_view(DashboardView::TopMileage, analysis.views().unwrap(), &palette).unwrap();
/// assert!(svg.contains("<svg"));
/// ```
pub fn render_view(
    view: DashboardView,
    views: &DashboardViews,
    palette: &BrandPalette,
) -> Result<String, Box<dyn Error>> {
    let options = GraphOptions::for_view(view, views.budget);
    match options.graph_type {
        GraphType::Bar => {
            let bars = bars_for_view(view, views).unwrap_or_default();
            create_bar_graph(&bars, &options, palette)
        }
        GraphType::Scatter => create_scatter_graph(&views.price_vs_mileage, &options, palette),
    }
}

/// Creates a bar graph with one category per bar
///
/// The x axis is segmented so that each bar owns a slot labelled with its model
/// (or brand, for the average view). An empty view still draws its axes.
pub fn create_bar_graph(
    bars: &[Bar],
    options: &GraphOptions,
    palette: &BrandPalette,
) -> Result<String, Box<dyn Error>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let slots = bars.len().max(1) as u32;
        let max_y = bars.iter().map(|bar| bar.value).fold(0.0, f64::max);
        let y_top = if max_y > 0.0 { max_y * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..slots).into_segmented(), 0.0..y_top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len() + 1)
            .x_label_formatter(&|value| match value {
                SegmentValue::CenterOf(index) => bars
                    .get(*index as usize)
                    .map(|bar| bar.label.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(index, bar)| {
            let index = index as u32;
            Rectangle::new(
                [
                    (SegmentValue::Exact(index), 0.0),
                    (SegmentValue::Exact(index + 1), bar.value),
                ],
                palette.color(&bar.brand).filled(),
            )
        }))?;

        root.present()?;
    }

    Ok(svg)
}

/// Creates a scatter plot of on-road price against mileage
///
/// Points are grouped into one series per brand so the legend lists each brand
/// once.
pub fn create_scatter_graph(
    points: &[PricePoint],
    options: &GraphOptions,
    palette: &BrandPalette,
) -> Result<String, Box<dyn Error>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let prices = points.iter().map(|p| p.on_road_price as f64);
        let min_x = prices.clone().fold(f64::INFINITY, f64::min);
        let max_x = prices.fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.mileage_kmpl).fold(0.0, f64::max);

        let (min_x, max_x) = if min_x.is_finite() && max_x > min_x {
            let pad = (max_x - min_x) * 0.05;
            (min_x - pad, max_x + pad)
        } else if min_x.is_finite() {
            (min_x - 1.0, min_x + 1.0)
        } else {
            (0.0, 1.0)
        };
        let y_top = if max_y > 0.0 { max_y * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(min_x..max_x, 0.0..y_top)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        let mut by_brand: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        for point in points {
            by_brand
                .entry(point.brand)
                .or_default()
                .push((point.on_road_price as f64, point.mileage_kmpl));
        }

        for (brand, series) in by_brand {
            let color = palette.color(brand);
            chart
                .draw_series(
                    series
                        .into_iter()
                        .map(move |(x, y)| Circle::new((x, y), 5, color.filled())),
                )?
                .label(brand)
                .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(svg)
}

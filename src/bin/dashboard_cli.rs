#![cfg(not(tarpaulin_include))]

use std::env;
use std::error::Error;

use wheeldash::analysis::{Analysis, BrandSelection, Budget, DashboardViews, analyze};
use wheeldash::listing::Listing;
use wheeldash::loader::load_table;

fn print_listings(title: &str, listings: &[&Listing]) {
    println!("\n== {} ==", title);
    if listings.is_empty() {
        println!("(no listings)");
        return;
    }
    println!(
        "{:<14} {:<28} {:>12} {:>10} {:>10}",
        "Brand", "Model", "On-road", "Mileage", "Fuel (L)"
    );
    for listing in listings {
        println!(
            "{:<14} {:<28} {:>12} {:>10.1} {:>10.1}",
            listing.brand,
            listing.model,
            listing.on_road_price,
            listing.mileage_kmpl,
            listing.fuel_capacity_ltr
        );
    }
}

fn print_views(views: &DashboardViews) {
    println!("{} listings match the selection", views.filtered_rows);

    print_listings("Top 5 Bikes by Mileage", &views.top_mileage);
    print_listings("Top 5 Cheapest Bikes", &views.cheapest);
    print_listings(
        &format!("Best Mileage Under ₹{}", views.budget.amount()),
        &views.best_under_budget,
    );

    println!("\n== Average Mileage by Brand ==");
    for average in &views.brand_average {
        println!(
            "{:<14} {:>8.2} kmpl over {} listing(s)",
            average.brand, average.mileage_kmpl, average.listings
        );
    }

    println!("\n== Price vs Mileage ==");
    for point in &views.price_vs_mileage {
        println!(
            "{:<14} {:<28} {:>12} {:>10.1}",
            point.brand, point.model, point.on_road_price, point.mileage_kmpl
        );
    }

    println!("\n== Top 5 Bikes by Range ==");
    for entry in &views.top_range {
        println!(
            "{:<14} {:<28} {:>10.1} km",
            entry.listing.brand, entry.listing.model, entry.total_range
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!("Usage: {} <file> [budget] [brand,brand,...]", args[0]);
        return Ok(());
    }

    let budget = match args.get(2) {
        Some(raw) => Budget::new(raw.parse()?)?,
        None => Budget::default(),
    };
    let selection = match args.get(3) {
        Some(list) => BrandSelection::only(list.split(',').filter(|brand| !brand.is_empty())),
        None => BrandSelection::All,
    };

    let (table, report) = load_table(&args[1])?;
    println!("{}", report.message());

    match analyze(&table, &selection, budget) {
        Analysis::NoData => {
            println!("No data available for selected brand(s). Please choose a different brand.")
        }
        Analysis::Views(views) => print_views(&views),
    }

    Ok(())
}

//! The six dashboard views.
//!
//! Everything in this module is a pure function over a borrowed `CleanedTable`.
//! `analyze` is called afresh for every change of brand selection or budget; the
//! table itself is never touched.

use crate::listing::{CleanedTable, Listing};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// How many rows each ranking view keeps.
pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("budget {0} is outside {min}..={max}", min = Budget::MIN, max = Budget::MAX)]
    OutOfRange(i64),
    #[error("budget {0} is not a multiple of {step}", step = Budget::STEP)]
    OffStep(i64),
}

/// Upper bound on the on-road price for the best-mileage-under-budget view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct Budget(u64);

impl Budget {
    pub const MIN: u64 = 20_000;
    pub const MAX: u64 = 250_000;
    pub const STEP: u64 = 5_000;
    pub const DEFAULT: Budget = Budget(100_000);

    /// Accepts a slider position: inside `MIN..=MAX` and on a `STEP` boundary.
    pub fn new(amount: i64) -> Result<Self, BudgetError> {
        if amount < Self::MIN as i64 || amount > Self::MAX as i64 {
            return Err(BudgetError::OutOfRange(amount));
        }
        if (amount as u64 - Self::MIN) % Self::STEP != 0 {
            return Err(BudgetError::OffStep(amount));
        }
        Ok(Budget(amount as u64))
    }

    /// Snaps any amount onto the nearest slider position.
    pub fn clamped(amount: i64) -> Self {
        let bounded = amount.clamp(Self::MIN as i64, Self::MAX as i64) as u64;
        let steps = (bounded - Self::MIN + Self::STEP / 2) / Self::STEP;
        Budget((Self::MIN + steps * Self::STEP).min(Self::MAX))
    }

    pub fn amount(self) -> u64 {
        self.0
    }
}

impl Default for Budget {
    fn default() -> Self {
        Budget::DEFAULT
    }
}

impl TryFrom<i64> for Budget {
    type Error = BudgetError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        Budget::new(amount)
    }
}

impl From<Budget> for u64 {
    fn from(budget: Budget) -> Self {
        budget.0
    }
}

/// The brands a user has chosen to look at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BrandSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl BrandSelection {
    pub fn only<I, S>(brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BrandSelection::Only(brands.into_iter().map(Into::into).collect())
    }

    /// Exact, case-sensitive match.
    pub fn includes(&self, brand: &str) -> bool {
        match self {
            BrandSelection::All => true,
            BrandSelection::Only(brands) => brands.contains(brand),
        }
    }
}

/// Distinct brands of the table, sorted for display.
pub fn brand_options(table: &CleanedTable) -> Vec<String> {
    table
        .listings()
        .iter()
        .map(|listing| listing.brand.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Listings whose brand is selected, in table order.
pub fn filter_by_brand<'a>(table: &'a CleanedTable, selection: &BrandSelection) -> Vec<&'a Listing> {
    table
        .listings()
        .iter()
        .filter(|listing| selection.includes(&listing.brand))
        .collect()
}

/// Stable sort, then the first `TOP_N`. Equal keys keep their input order.
fn top_by<'a, F>(mut rows: Vec<&'a Listing>, compare: F) -> Vec<&'a Listing>
where
    F: FnMut(&&'a Listing, &&'a Listing) -> Ordering,
{
    rows.sort_by(compare);
    rows.truncate(TOP_N);
    rows
}

/// Top listings by mileage, best first
///
/// # Arguments
/// * `rows` - The brand-filtered listings, in sheet order
///
/// # Returns
/// * `Vec<&Listing>` - At most `TOP_N` listings. Equal mileages keep sheet order
pub fn top_mileage<'a>(rows: &[&'a Listing]) -> Vec<&'a Listing> {
    top_by(rows.to_vec(), |a, b| b.mileage_kmpl.total_cmp(&a.mileage_kmpl))
}

/// Cheapest listings by on-road price, lowest first
///
/// # Arguments
/// * `rows` - The brand-filtered listings, in sheet order
///
/// # Returns
/// * `Vec<&Listing>` - At most `TOP_N` listings. Equal prices keep sheet order
pub fn cheapest<'a>(rows: &[&'a Listing]) -> Vec<&'a Listing> {
    top_by(rows.to_vec(), |a, b| a.on_road_price.cmp(&b.on_road_price))
}

/// Listings affordable within `budget`, before ranking.
pub fn within_budget<'a>(rows: &[&'a Listing], budget: Budget) -> Vec<&'a Listing> {
    rows.iter()
        .copied()
        .filter(|listing| listing.on_road_price <= budget.amount())
        .collect()
}

/// Best mileage among listings whose on-road price is at most `budget`.
pub fn best_mileage_under_budget<'a>(rows: &[&'a Listing], budget: Budget) -> Vec<&'a Listing> {
    top_mileage(&within_budget(rows, budget))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RangeEntry<'a> {
    pub listing: &'a Listing,
    pub total_range: f64,
}

/// Top listings by `mileage_kmpl * fuel_capacity_ltr`. Ties keep sheet order.
pub fn top_range<'a>(rows: &[&'a Listing]) -> Vec<RangeEntry<'a>> {
    let mut entries: Vec<RangeEntry<'a>> = rows
        .iter()
        .map(|listing| RangeEntry {
            listing,
            total_range: listing.total_range(),
        })
        .collect();
    entries.sort_by(|a, b| b.total_range.total_cmp(&a.total_range));
    entries.truncate(TOP_N);
    entries
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BrandAverage {
    pub brand: String,
    pub mileage_kmpl: f64,
    pub listings: usize,
}

/// Mean mileage per brand, best first. Brands with equal means stay in name order.
pub fn average_mileage_by_brand(rows: &[&Listing]) -> Vec<BrandAverage> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for listing in rows {
        let group = groups.entry(listing.brand.as_str()).or_insert((0.0, 0));
        group.0 += listing.mileage_kmpl;
        group.1 += 1;
    }

    let mut averages: Vec<BrandAverage> = groups
        .into_iter()
        .map(|(brand, (sum, count))| BrandAverage {
            brand: brand.to_string(),
            mileage_kmpl: sum / count as f64,
            listings: count,
        })
        .collect();
    averages.sort_by(|a, b| b.mileage_kmpl.total_cmp(&a.mileage_kmpl));
    averages
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricePoint<'a> {
    pub on_road_price: u64,
    pub mileage_kmpl: f64,
    pub brand: &'a str,
    pub model: &'a str,
}

/// One point per listing, unsampled.
pub fn price_vs_mileage<'a>(rows: &[&'a Listing]) -> Vec<PricePoint<'a>> {
    rows.iter()
        .map(|listing| PricePoint {
            on_road_price: listing.on_road_price,
            mileage_kmpl: listing.mileage_kmpl,
            brand: &listing.brand,
            model: &listing.model,
        })
        .collect()
}

/// All six views for one brand selection and budget.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardViews<'a> {
    pub filtered_rows: usize,
    pub budget: Budget,
    pub top_mileage: Vec<&'a Listing>,
    pub cheapest: Vec<&'a Listing>,
    pub best_under_budget: Vec<&'a Listing>,
    pub brand_average: Vec<BrandAverage>,
    pub price_vs_mileage: Vec<PricePoint<'a>>,
    pub top_range: Vec<RangeEntry<'a>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Analysis<'a> {
    /// Nothing matches the selection; no view was computed.
    NoData,
    Views(DashboardViews<'a>),
}

impl<'a> Analysis<'a> {
    pub fn views(&self) -> Option<&DashboardViews<'a>> {
        match self {
            Analysis::Views(views) => Some(views),
            Analysis::NoData => None,
        }
    }
}

/// Builds every dashboard view for one brand selection and budget
///
/// Called afresh whenever the selection or the budget changes.
///
/// # Arguments
/// * `table` - The cleaned table of the current upload
/// * `selection` - Brands to keep; `BrandSelection::All` keeps every row
/// * `budget` - Price cap for the best-mileage-under-budget view
///
/// # Returns
/// * `Analysis::NoData` - No listing matches the selection
/// * `Analysis::Views` - All six views over the matching listings
///
/// # Examples
/// ```
/// use wheeldash::analysis::{analyze, Analysis, BrandSelection, Budget};
/// use wheeldash::listing::CleanedTable;
///
/// let table = CleanedTable::default();
/// assert_eq!(analyze(&table, &BrandSelection::All, Budget::default()), Analysis::NoData);
/// ```
pub fn analyze<'a>(table: &'a CleanedTable, selection: &BrandSelection, budget: Budget) -> Analysis<'a> {
    let rows = filter_by_brand(table, selection);
    if rows.is_empty() {
        return Analysis::NoData;
    }

    Analysis::Views(DashboardViews {
        filtered_rows: rows.len(),
        budget,
        top_mileage: top_mileage(&rows),
        cheapest: cheapest(&rows),
        best_under_budget: best_mileage_under_budget(&rows, budget),
        brand_average: average_mileage_by_brand(&rows),
        price_vs_mileage: price_vs_mileage(&rows),
        top_range: top_range(&rows),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(brand: &str, model: &str, price: u64, mileage: f64, fuel: f64) -> Listing {
        Listing {
            row_id: None,
            brand: brand.to_string(),
            model: model.to_string(),
            mode_price: None,
            ex_showroom_price: None,
            on_road_price: price,
            insurance_price: None,
            color_option: None,
            mileage_kmpl: mileage,
            fuel_capacity_ltr: fuel,
            meter_type: None,
            gear_type: None,
        }
    }

    fn showroom() -> CleanedTable {
        CleanedTable::new(vec![
            listing("Honda", "Shine", 82_000, 55.0, 10.5),
            listing("Hero", "Splendor", 75_000, 70.0, 9.8),
            listing("TVS", "Jupiter", 90_000, 50.0, 6.0),
            listing("Bajaj", "Platina", 68_000, 70.0, 11.0),
            listing("Royal Enfield", "Classic 350", 220_000, 35.0, 13.0),
            listing("Hero", "HF Deluxe", 62_000, 65.0, 9.6),
            listing("Honda", "Activa", 85_000, 50.0, 5.3),
            listing("Yamaha", "FZ", 130_000, 45.0, 13.0),
        ])
    }

    fn models<'a>(rows: &[&'a Listing]) -> Vec<&'a str> {
        rows.iter().map(|l| l.model.as_str()).collect()
    }

    #[test]
    fn budget_accepts_only_slider_positions() {
        assert_eq!(Budget::new(100_000).unwrap().amount(), 100_000);
        assert_eq!(Budget::new(20_000).unwrap().amount(), 20_000);
        assert_eq!(Budget::new(250_000).unwrap().amount(), 250_000);
        assert_eq!(Budget::new(15_000), Err(BudgetError::OutOfRange(15_000)));
        assert_eq!(Budget::new(255_000), Err(BudgetError::OutOfRange(255_000)));
        assert_eq!(Budget::new(101_000), Err(BudgetError::OffStep(101_000)));
        assert_eq!(Budget::default().amount(), 100_000);
    }

    #[test]
    fn clamped_budget_snaps_to_the_grid() {
        assert_eq!(Budget::clamped(0).amount(), 20_000);
        assert_eq!(Budget::clamped(1_000_000).amount(), 250_000);
        assert_eq!(Budget::clamped(101_000).amount(), 100_000);
        assert_eq!(Budget::clamped(103_000).amount(), 105_000);
    }

    #[test]
    fn brand_options_are_distinct_and_sorted() {
        assert_eq!(
            brand_options(&showroom()),
            vec!["Bajaj", "Hero", "Honda", "Royal Enfield", "TVS", "Yamaha"]
        );
    }

    #[test]
    fn brand_filter_matches_exactly() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::only(["Honda", "hero"]));
        assert_eq!(models(&rows), vec!["Shine", "Activa"]);

        assert!(filter_by_brand(&table, &BrandSelection::only(Vec::<String>::new())).is_empty());
    }

    #[test]
    fn selecting_every_brand_returns_the_whole_table() {
        let table = showroom();
        let every = BrandSelection::only(brand_options(&table));
        let rows = filter_by_brand(&table, &every);
        assert_eq!(rows.len(), table.len());
        assert!(rows.iter().zip(table.listings()).all(|(a, b)| *a == b));
    }

    #[test]
    fn top_mileage_breaks_ties_by_sheet_order() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::All);
        assert_eq!(
            models(&top_mileage(&rows)),
            vec!["Splendor", "Platina", "HF Deluxe", "Shine", "Jupiter"]
        );
    }

    #[test]
    fn cheapest_is_ascending_by_on_road_price() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::All);
        assert_eq!(
            models(&cheapest(&rows)),
            vec!["HF Deluxe", "Platina", "Splendor", "Shine", "Activa"]
        );
    }

    #[test]
    fn ranking_views_shrink_to_the_qualifying_rows() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::only(["Honda"]));
        assert_eq!(top_mileage(&rows).len(), 2);
        assert_eq!(cheapest(&rows).len(), 2);
        assert_eq!(top_range(&rows).len(), 2);
    }

    #[test]
    fn budget_view_respects_the_cap() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::All);
        let budget = Budget::new(80_000).unwrap();
        let best = best_mileage_under_budget(&rows, budget);
        assert_eq!(models(&best), vec!["Splendor", "Platina", "HF Deluxe"]);
        assert!(best.iter().all(|l| l.on_road_price <= 80_000));
    }

    #[test]
    fn raising_the_budget_never_shrinks_the_pool() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::All);
        let mut previous: Vec<&Listing> = Vec::new();
        for amount in (Budget::MIN..=Budget::MAX).step_by(Budget::STEP as usize) {
            let pool = within_budget(&rows, Budget::new(amount as i64).unwrap());
            assert!(previous.iter().all(|l| pool.contains(l)), "pool shrank at {amount}");
            previous = pool;
        }
        assert_eq!(previous.len(), rows.len());
    }

    #[test]
    fn range_is_mileage_times_capacity() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::All);
        let ranked = top_range(&rows);
        let summary: Vec<(&str, f64)> = ranked
            .iter()
            .map(|e| (e.listing.model.as_str(), e.total_range))
            .collect();
        assert_eq!(summary[0], ("Platina", 770.0));
        assert_eq!(summary[1].0, "Splendor");
        assert_eq!(summary.len(), TOP_N);
        assert!(ranked.windows(2).all(|w| w[0].total_range >= w[1].total_range));
    }

    #[test]
    fn brand_average_reproduces_brand_totals() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::All);
        let averages = average_mileage_by_brand(&rows);

        for average in &averages {
            let total: f64 = rows
                .iter()
                .filter(|l| l.brand == average.brand)
                .map(|l| l.mileage_kmpl)
                .sum();
            assert!((average.mileage_kmpl * average.listings as f64 - total).abs() < 1e-9);
        }

        let order: Vec<&str> = averages.iter().map(|a| a.brand.as_str()).collect();
        assert_eq!(order, vec!["Bajaj", "Hero", "Honda", "TVS", "Yamaha", "Royal Enfield"]);
        assert_eq!(averages[1].mileage_kmpl, 67.5);
    }

    #[test]
    fn single_listing_brand_averages_to_itself() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::only(["Yamaha"]));
        assert_eq!(
            average_mileage_by_brand(&rows),
            vec![BrandAverage {
                brand: "Yamaha".to_string(),
                mileage_kmpl: 45.0,
                listings: 1
            }]
        );
    }

    #[test]
    fn scatter_keeps_every_row_once() {
        let table = showroom();
        let rows = filter_by_brand(&table, &BrandSelection::All);
        let points = price_vs_mileage(&rows);
        assert_eq!(points.len(), table.len());
        assert_eq!(
            points[4],
            PricePoint {
                on_road_price: 220_000,
                mileage_kmpl: 35.0,
                brand: "Royal Enfield",
                model: "Classic 350"
            }
        );
    }

    #[test]
    fn two_row_budget_scenario() {
        let table = CleanedTable::new(vec![
            listing("A", "X", 50_000, 60.0, 5.0),
            listing("A", "Y", 80_000, 40.0, 10.0),
        ]);
        let analysis = analyze(&table, &BrandSelection::All, Budget::new(60_000).unwrap());
        let views = analysis.views().unwrap();
        assert_eq!(models(&views.best_under_budget), vec!["X"]);
        assert_eq!(views.top_range[0].listing.model, "Y");
        assert_eq!(views.top_range[0].total_range, 400.0);
    }

    #[test]
    fn price_equal_to_budget_is_kept() {
        let table = CleanedTable::new(vec![
            listing("Hero", "At Cap", 100_000, 50.0, 10.0),
            listing("Hero", "Over Cap", 100_001, 90.0, 10.0),
            listing("Hero", "Under Cap", 99_999, 40.0, 10.0),
        ]);
        let rows = filter_by_brand(&table, &BrandSelection::All);
        let best = best_mileage_under_budget(&rows, Budget::new(100_000).unwrap());
        assert_eq!(models(&best), vec!["At Cap", "Under Cap"]);
    }

    #[test]
    fn cheapest_breaks_ties_by_sheet_order() {
        let table = CleanedTable::new(vec![
            listing("TVS", "Sport", 70_000, 60.0, 10.0),
            listing("Hero", "Passion", 65_000, 60.0, 10.0),
            listing("Bajaj", "CT 110", 70_000, 70.0, 11.0),
            listing("Honda", "Livo", 70_000, 60.0, 9.0),
        ]);
        let rows = filter_by_brand(&table, &BrandSelection::All);
        assert_eq!(
            models(&cheapest(&rows)),
            vec!["Passion", "Sport", "CT 110", "Livo"]
        );
    }

    #[test]
    fn top_range_breaks_ties_by_sheet_order() {
        let table = CleanedTable::new(vec![
            listing("TVS", "Radeon", 70_000, 50.0, 10.0),
            listing("Hero", "Glamour", 80_000, 100.0, 5.0),
            listing("Bajaj", "Avenger", 120_000, 40.0, 13.0),
            listing("Honda", "SP 125", 90_000, 62.5, 8.0),
        ]);
        let rows = filter_by_brand(&table, &BrandSelection::All);
        let order: Vec<&str> = top_range(&rows)
            .iter()
            .map(|e| e.listing.model.as_str())
            .collect();
        assert_eq!(order, vec!["Avenger", "Radeon", "Glamour", "SP 125"]);
    }

    #[test]
    fn negative_zero_mileage_ties_with_zero() {
        use crate::cell::RawCell;
        use crate::listing::{RawRow, clean_rows};

        let row = |model: &str, mileage: &str| {
            RawRow::from_cells(
                ["", "Hero", model, "", "", "70000", "", mileage, "10", "", "", ""]
                    .into_iter()
                    .map(RawCell::from),
            )
        };
        let (table, _) = clean_rows(vec![row("first", "-0"), row("second", "0")]);
        let rows = filter_by_brand(&table, &BrandSelection::All);
        assert_eq!(models(&top_mileage(&rows)), vec!["first", "second"]);
        assert_eq!(
            top_range(&rows)
                .iter()
                .map(|e| e.listing.model.as_str())
                .collect::<Vec<_>>(),
            vec!["first", "second"]
        );
    }

    #[test]
    fn empty_selection_is_no_data() {
        let table = showroom();
        let none = BrandSelection::only(Vec::<String>::new());
        assert_eq!(analyze(&table, &none, Budget::default()), Analysis::NoData);
        assert_eq!(
            analyze(&CleanedTable::default(), &BrandSelection::All, Budget::default()),
            Analysis::NoData
        );
    }

    #[test]
    fn analysis_serializes_with_a_state_tag() {
        let table = showroom();
        let json = serde_json::to_value(analyze(&table, &BrandSelection::All, Budget::default())).unwrap();
        assert_eq!(json["state"], "views");
        assert_eq!(json["budget"], 100_000);
        assert_eq!(json["filtered_rows"], 8);

        let json = serde_json::to_value(Analysis::NoData).unwrap();
        assert_eq!(json["state"], "no_data");
    }
}

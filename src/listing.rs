use crate::cell::RawCell;
use crate::normalize::{clean_measurement, clean_price};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Number of positional columns a listing sheet carries.
pub const COLUMN_COUNT: usize = 12;

/// Canonical column names, in the order the sheet is expected to provide them.
///
/// Columns are renamed by position only. A sheet with reordered columns is not
/// detected and its fields land in the wrong place.
pub const COLUMN_NAMES: [&str; COLUMN_COUNT] = [
    "row_id",
    "brand",
    "model",
    "mode_price",
    "ex_showroom_price",
    "on_road_price",
    "color_option",
    "mileage_kmpl",
    "fuel_capacity_ltr",
    "meter_type",
    "gear_type",
    "insurance_price",
];

const ROW_ID: usize = 0;
const BRAND: usize = 1;
const MODEL: usize = 2;
const MODE_PRICE: usize = 3;
const EX_SHOWROOM_PRICE: usize = 4;
const ON_ROAD_PRICE: usize = 5;
const COLOR_OPTION: usize = 6;
const MILEAGE_KMPL: usize = 7;
const FUEL_CAPACITY_LTR: usize = 8;
const METER_TYPE: usize = 9;
const GEAR_TYPE: usize = 10;
const INSURANCE_PRICE: usize = 11;

/// One uploaded row, exactly `COLUMN_COUNT` cells wide.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    cells: [RawCell; COLUMN_COUNT],
}

impl RawRow {
    /// Lays source cells onto the canonical positions.
    ///
    /// Short rows are padded with blanks; cells past the last canonical column are
    /// ignored.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = RawCell>,
    {
        let mut slots: [RawCell; COLUMN_COUNT] = std::array::from_fn(|_| RawCell::Missing);
        for (slot, cell) in slots.iter_mut().zip(cells) {
            *slot = cell;
        }
        RawRow { cells: slots }
    }

    pub fn cell(&self, column: usize) -> &RawCell {
        &self.cells[column]
    }
}

/// A listing after normalization. The fields the dashboard cannot do without are
/// not optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub row_id: Option<String>,
    pub brand: String,
    pub model: String,
    pub mode_price: Option<u64>,
    pub ex_showroom_price: Option<u64>,
    pub on_road_price: u64,
    pub insurance_price: Option<u64>,
    pub color_option: Option<String>,
    pub mileage_kmpl: f64,
    pub fuel_capacity_ltr: f64,
    pub meter_type: Option<String>,
    pub gear_type: Option<String>,
}

impl Listing {
    pub fn total_range(&self) -> f64 {
        self.mileage_kmpl * self.fuel_capacity_ltr
    }
}

/// A row with every field normalized, before the completeness check.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct NormalizedRow {
    pub row_id: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub mode_price: Option<u64>,
    pub ex_showroom_price: Option<u64>,
    pub on_road_price: Option<u64>,
    pub insurance_price: Option<u64>,
    pub color_option: Option<String>,
    pub mileage_kmpl: Option<f64>,
    pub fuel_capacity_ltr: Option<f64>,
    pub meter_type: Option<String>,
    pub gear_type: Option<String>,
}

impl NormalizedRow {
    pub fn from_raw(raw: &RawRow) -> Self {
        NormalizedRow {
            row_id: raw.cell(ROW_ID).label(),
            brand: raw.cell(BRAND).label(),
            model: raw.cell(MODEL).label(),
            mode_price: clean_price(raw.cell(MODE_PRICE)),
            ex_showroom_price: clean_price(raw.cell(EX_SHOWROOM_PRICE)),
            on_road_price: clean_price(raw.cell(ON_ROAD_PRICE)),
            insurance_price: clean_price(raw.cell(INSURANCE_PRICE)),
            color_option: raw.cell(COLOR_OPTION).label(),
            mileage_kmpl: clean_measurement(raw.cell(MILEAGE_KMPL)),
            fuel_capacity_ltr: clean_measurement(raw.cell(FUEL_CAPACITY_LTR)),
            meter_type: raw.cell(METER_TYPE).label(),
            gear_type: raw.cell(GEAR_TYPE).label(),
        }
    }

    /// Brand, model, on-road price, mileage and fuel capacity are all present.
    pub fn is_complete(&self) -> bool {
        self.brand.is_some()
            && self.model.is_some()
            && self.on_road_price.is_some()
            && self.mileage_kmpl.is_some()
            && self.fuel_capacity_ltr.is_some()
    }

    /// Promotes a complete row to a `Listing`; incomplete rows yield `None`.
    pub fn into_listing(self) -> Option<Listing> {
        Some(Listing {
            row_id: self.row_id,
            brand: self.brand?,
            model: self.model?,
            mode_price: self.mode_price,
            ex_showroom_price: self.ex_showroom_price,
            on_road_price: self.on_road_price?,
            insurance_price: self.insurance_price,
            color_option: self.color_option,
            mileage_kmpl: self.mileage_kmpl?,
            fuel_capacity_ltr: self.fuel_capacity_ltr?,
            meter_type: self.meter_type,
            gear_type: self.gear_type,
        })
    }
}

impl From<Listing> for NormalizedRow {
    fn from(listing: Listing) -> Self {
        NormalizedRow {
            row_id: listing.row_id,
            brand: Some(listing.brand),
            model: Some(listing.model),
            mode_price: listing.mode_price,
            ex_showroom_price: listing.ex_showroom_price,
            on_road_price: Some(listing.on_road_price),
            insurance_price: listing.insurance_price,
            color_option: listing.color_option,
            mileage_kmpl: Some(listing.mileage_kmpl),
            fuel_capacity_ltr: Some(listing.fuel_capacity_ltr),
            meter_type: listing.meter_type,
            gear_type: listing.gear_type,
        }
    }
}

/// Aggregate outcome of a cleaning pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub rows_retained: usize,
    pub rows_dropped: usize,
}

impl CleaningReport {
    pub fn message(&self) -> String {
        format!(
            "Data cleaned successfully! {} of {} rows retained",
            self.rows_retained, self.rows_read
        )
    }
}

/// The cleaned listings of one upload, in sheet order.
///
/// Built once per upload and never modified afterwards; analysis borrows it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CleanedTable {
    listings: Vec<Listing>,
}

impl CleanedTable {
    pub fn new(listings: Vec<Listing>) -> Self {
        CleanedTable { listings }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Keeps the complete rows of `rows`, in order.
    pub fn retain_complete<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = NormalizedRow>,
    {
        CleanedTable {
            listings: rows
                .into_iter()
                .filter(NormalizedRow::is_complete)
                .filter_map(NormalizedRow::into_listing)
                .collect(),
        }
    }
}

/// Normalizes every raw row and drops the incomplete ones.
pub fn clean_rows<I>(raw_rows: I) -> (CleanedTable, CleaningReport)
where
    I: IntoIterator<Item = RawRow>,
{
    let normalized: Vec<NormalizedRow> = raw_rows
        .into_iter()
        .map(|raw| NormalizedRow::from_raw(&raw))
        .collect();
    let rows_read = normalized.len();

    let table = CleanedTable::retain_complete(normalized);
    let report = CleaningReport {
        rows_read,
        rows_retained: table.len(),
        rows_dropped: rows_read - table.len(),
    };

    if report.rows_dropped > 0 {
        debug!("dropped {} incomplete rows", report.rows_dropped);
    }
    info!(
        "cleaned {} rows, {} retained",
        report.rows_read, report.rows_retained
    );

    (table, report)
}

#![cfg(not(tarpaulin_include))]

#[cfg(feature = "web")]
use crate::analysis::DashboardViews;
use crate::listing::{COLUMN_NAMES, CleanedTable, Listing};
use std::error::Error;

/// Convert the cleaned table to CSV
///
/// The header row carries the canonical column names. Absent optional fields are
/// written as empty fields, so the output loads straight back through
/// `loader::rows_from_csv`.
///
/// # Examples
/// ```
/// use wheeldash::downloader::to_csv;
/// use wheeldash::listing::CleanedTable;
///
/// let csv = to_csv(&CleanedTable::default()).unwrap();
/// assert!(csv.starts_with("row_id,brand,model"));
/// ```
pub fn to_csv(table: &CleanedTable) -> Result<String, Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMN_NAMES)?;
    for listing in table.listings() {
        writer.write_record(listing_record(listing))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// A listing laid out in canonical column order.
fn listing_record(listing: &Listing) -> [String; 12] {
    fn opt<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    [
        opt(&listing.row_id),
        listing.brand.clone(),
        listing.model.clone(),
        opt(&listing.mode_price),
        opt(&listing.ex_showroom_price),
        listing.on_road_price.to_string(),
        opt(&listing.color_option),
        listing.mileage_kmpl.to_string(),
        listing.fuel_capacity_ltr.to_string(),
        opt(&listing.meter_type),
        opt(&listing.gear_type),
        opt(&listing.insurance_price),
    ]
}

#[cfg(feature = "web")]
enum SheetValue<'a> {
    Text(&'a str),
    Number(f64),
}

#[cfg(feature = "web")]
fn write_sheet(
    workbook: &mut rust_xlsxwriter::Workbook,
    name: &str,
    headers: &[&str],
    rows: Vec<Vec<SheetValue>>,
) -> Result<(), Box<dyn Error>> {
    use rust_xlsxwriter::{Format, Worksheet};

    let mut worksheet = Worksheet::new();
    worksheet.set_name(name)?;

    let bold = Format::new().set_bold();
    for (c, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, *header, &bold)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            match value {
                SheetValue::Text(text) => worksheet.write_string(r, c as u16, *text)?,
                SheetValue::Number(n) => worksheet.write_number(r, c as u16, *n)?,
            };
        }
    }

    workbook.push_worksheet(worksheet);
    Ok(())
}

/// Convert the six views to an XLSX workbook
///
/// Each view gets its own worksheet holding the same columns the dashboard shows
/// in its table.
#[cfg(feature = "web")]
pub fn to_xlsx(views: &DashboardViews) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::Workbook;
    use SheetValue::{Number, Text};

    let mut workbook = Workbook::new();

    write_sheet(
        &mut workbook,
        "Top Mileage",
        &["brand", "model", "mileage_kmpl"],
        views
            .top_mileage
            .iter()
            .map(|l| vec![Text(&l.brand), Text(&l.model), Number(l.mileage_kmpl)])
            .collect(),
    )?;

    write_sheet(
        &mut workbook,
        "Cheapest",
        &["brand", "model", "on_road_price"],
        views
            .cheapest
            .iter()
            .map(|l| vec![Text(&l.brand), Text(&l.model), Number(l.on_road_price as f64)])
            .collect(),
    )?;

    write_sheet(
        &mut workbook,
        "Under Budget",
        &["brand", "model", "on_road_price", "mileage_kmpl"],
        views
            .best_under_budget
            .iter()
            .map(|l| {
                vec![
                    Text(&l.brand),
                    Text(&l.model),
                    Number(l.on_road_price as f64),
                    Number(l.mileage_kmpl),
                ]
            })
            .collect(),
    )?;

    write_sheet(
        &mut workbook,
        "Brand Average",
        &["brand", "mileage_kmpl"],
        views
            .brand_average
            .iter()
            .map(|a| vec![Text(&a.brand), Number(a.mileage_kmpl)])
            .collect(),
    )?;

    write_sheet(
        &mut workbook,
        "Price vs Mileage",
        &["on_road_price", "mileage_kmpl", "brand", "model"],
        views
            .price_vs_mileage
            .iter()
            .map(|p| {
                vec![
                    Number(p.on_road_price as f64),
                    Number(p.mileage_kmpl),
                    Text(p.brand),
                    Text(p.model),
                ]
            })
            .collect(),
    )?;

    write_sheet(
        &mut workbook,
        "Top Range",
        &["brand", "model", "mileage_kmpl", "fuel_capacity_ltr", "total_range"],
        views
            .top_range
            .iter()
            .map(|e| {
                vec![
                    Text(&e.listing.brand),
                    Text(&e.listing.model),
                    Number(e.listing.mileage_kmpl),
                    Number(e.listing.fuel_capacity_ltr),
                    Number(e.total_range),
                ]
            })
            .collect(),
    )?;

    Ok(workbook.save_to_buffer()?)
}

/*!
# Two-Wheeler Listing Dashboard

A browser-based dashboard for spreadsheets of two-wheeler vehicle listings, built in Rust.

## Overview

A user uploads a spreadsheet (XLSX or CSV) of vehicle listings. The upload is cleaned
once, and the cleaned table then feeds six descriptive views that are recomputed every
time the brand filter or the budget slider changes.

## Architecture

The crate is split into a pure core and an optional web layer (the `web` feature).

### Core
- **Ingestion**: reads the first worksheet (or CSV), discards the header row and lays
  each row onto twelve canonical columns by position
- **Cleaning**: normalizes price and measurement cells and drops rows missing any of
  brand, model, on-road price, mileage or fuel capacity
- **Analysis**: `analyze(table, brands, budget)` builds all six views, or reports that
  nothing matches the selection

### Web Layer
- **Server**: axum routes for upload, analysis, charts and exports
- **Sessions**: one immutable cleaned table per browser, keyed by cookie
- **Charts**: SVG bar and scatter charts drawn with plotters
- **Exports**: the six views as an XLSX workbook and the cleaned table as CSV

## Views

1. Top 5 listings by mileage
2. Top 5 cheapest listings by on-road price
3. Top 5 by mileage among listings within the budget
4. Average mileage per brand
5. On-road price against mileage, one point per listing
6. Top 5 by range (mileage × fuel capacity)

Ranking ties keep sheet order.

## Known Fragility

Columns are mapped by position, not by header name. A sheet whose columns are
reordered is not rejected; its values land in the wrong fields and the affected rows
usually fail cleaning.

## REST API Endpoints

- `POST /api/upload` - Upload and clean a listing sheet
- `GET /api/brands` - Brands of the current upload
- `GET /api/analysis?brands=&budget=` - All six views
- `GET /api/chart/{view}` - One view as SVG
- `GET /api/export/xlsx`, `GET /api/export/csv` - Downloads
*/

pub mod analysis;
pub mod cell;
pub mod config;
pub mod downloader;
pub mod listing;
pub mod loader;
pub mod normalize;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "web")]
pub mod session;

pub use analysis::{Analysis, BrandSelection, Budget, DashboardViews, analyze, brand_options};
pub use cell::RawCell;
pub use listing::{CleanedTable, CleaningReport, Listing, RawRow, clean_rows};
pub use loader::{LoadError, load_table, load_table_from_bytes};
pub use normalize::{ParseError, clean_measurement, clean_price};

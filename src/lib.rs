/*!
# Sales Dashboard

An interactive sales dashboard, built in Rust.

## Overview

A user uploads a spreadsheet of sales transactions, narrows it down by date range and by
product, brand, store and category, and reads four headline figures and four charts computed
from whatever rows survive the filters.

## Architecture

### Core (synchronous, pure)
- **record**: `SalesRecord`, `Dataset`, column names, Excel date serials
- **loader**: reads the first sheet of a workbook (or a CSV file) into a `Dataset`
- **filter**: filter options offered to the user, `FilterCriteria`, and `apply`
- **metrics**: the four KPIs over a filtered view
- **aggregate**: the four chart series over a filtered view
- **view**: `compute_view`, the single entry point bundling KPIs and series
- **format**: Brazilian-real currency and integer display strings

### Presentation (feature `web`)
- **graph**: SVG charts with plotters
- **downloader**: CSV and XLSX export of the filtered rows
- **session**: per-browser session store holding the uploaded dataset
- **app**: axum routing and handlers
- **config**: server settings and command-line arguments

## Binaries

- `dashboard`: the HTTP server
- `sales-report`: one-shot command line report over a file

## REST API Endpoints

- `GET /` - The dashboard page
- `POST /api/upload` - Ingests a workbook (multipart field `file`)
- `GET /api/options` - Filter choices for the uploaded data
- `POST /api/view` - KPIs and chart series for a filter selection
- `POST /api/chart/{kind}` - One chart as SVG
- `POST /api/export?format=csv|xlsx` - The filtered rows as a download
*/

pub mod aggregate;
pub mod config;
pub mod downloader;
pub mod filter;
pub mod format;
pub mod loader;
pub mod metrics;
pub mod record;
pub mod view;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "web")]
pub mod session;

pub use filter::{FilterCriteria, FilterOptions, FilterRequest, FilteredView, apply};
pub use loader::{LoadError, load_dataset};
pub use metrics::{KpiSet, compute_kpis};
pub use record::{Dataset, SalesRecord};
pub use view::{DashboardView, compute_view};

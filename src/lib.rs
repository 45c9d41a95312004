/*!
# Asset Dashboard

A browser-based cost dashboard for road maintenance assets, built in Rust.

## Overview

The project has two parts. The `extract` tool copies a fixed label/value
window out of a large cost workbook into a small intermediate workbook. The
dashboard server reads that intermediate workbook and shows, per visitor,
two factor-adjusted cost sections and a depreciation timeline.

## Architecture

### Offline Layer
- **Technologies**: Rust, calamine, rust_xlsxwriter
- **Key Components**:
  - Extractor - Copies `Onderhoud!D4:E28` into sheet `Copied Data`, columns A and B

### Computation Layer
- **Core Components**:
  - Numeric Normalizer - Turns spreadsheet cells into numbers, reporting bad cells
  - Data Loader - Reads the intermediate workbook into ordered records
  - Section Processor - Seeds factors, computes results, totals and charts
  - Timeline Projector - Seeds depreciation periods and projects them onto years
  - Session - Holds the factor and timeline tables of one visitor

### Web Layer
- **Technologies**: axum, handlebars, tower-http
- Renders the dashboard page and accepts grid edits per session

## Error Reporting

Each fallible stage has a `try_*` form returning a typed error and a plain
form that degrades and records a [`notice::Notice`]. Notices are shown on
the page and written to the log.

## Modules

- **cell**: Spreadsheet cell values and column letters
- **normalize**: Cell to number conversion
- **format**: Euro, period and factor formatting
- **extractor**: Range copy between workbooks
- **loader**: Record loading from the intermediate workbook
- **factors**: Seeded factor tables and grid edits
- **section**: Factor-adjusted cost sections
- **chart**: SVG bar and pie charts
- **timeline**: Depreciation timeline
- **session**: Per-visitor dashboard state
- **dashboard**: Full page computation
- **config**: Server configuration
- **app**: Routing and handlers (feature `web`)

## REST API Endpoints

- `GET /api/dashboard` - The computed dashboard for the current session
- `POST /api/sections/{section}/factors` - Edits the factor grid of a section
- `POST /api/timeline` - Edits the depreciation periods
*/

pub mod cell;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod extractor;
pub mod factors;
pub mod format;
pub mod loader;
pub mod normalize;
pub mod notice;
pub mod section;
pub mod session;
pub mod timeline;

#[cfg(feature = "web")]
pub mod app;

pub use config::DashboardConfig;
pub use dashboard::{DashboardView, render_dashboard};
pub use loader::{LoadedRecords, Record, RecordSet, load_records};
pub use notice::{Level, Notice, Notices};
pub use session::DashboardSession;

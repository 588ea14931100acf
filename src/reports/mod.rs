//! Yearly reports of logged income and expenses with charts.

mod charts;
mod core;
mod reports_page;

pub use reports_page::get_reports_page;

//! The dashboard page and the financial summary it shares with the assistant.

mod dashboard_page;
mod summary;

pub use dashboard_page::get_dashboard_page;
pub use summary::{FinancialSummary, get_financial_summary};

#[cfg(test)]
pub use dashboard_page::DashboardState;

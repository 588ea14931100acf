//! Monthly budgets: setting a spending ceiling per month and comparing it with
//! the month's expenses.

mod budgets_page;
mod core;
mod delete_endpoint;
mod set_endpoint;

pub use budgets_page::{get_budgets_page, progress_bar};
pub use core::{BudgetStatus, create_budget_table, get_budget_status_for_month, set_budget};
pub use delete_endpoint::delete_budget_endpoint;
pub use set_endpoint::set_budget_endpoint;

#[cfg(test)]
pub use core::{Budget, delete_budget, get_budget_statuses};

//! The savings goal: a single target per user with a running savings total.

mod core;
mod endpoints;
mod goal_page;

pub use core::{FinancialGoal, add_savings, create_goal_table, get_goal, set_goal_target};
pub use endpoints::{add_savings_endpoint, reset_goal_endpoint, set_goal_endpoint};
pub use goal_page::{get_goal_page, goal_progress_view};

#[cfg(test)]
pub use core::reset_goal;

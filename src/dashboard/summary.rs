//! Aggregates a user's figures for the dashboard and the assistant's prompt.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    budget::{BudgetStatus, get_budget_status_for_month},
    goal::{FinancialGoal, get_goal},
    month::{first_of_month, first_of_next_month},
    profile::get_profile_or_default,
    transaction::{Category, get_expenses_by_category, get_totals},
};

/// A snapshot of a user's finances.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSummary {
    /// The regular income from the user's profile.
    pub base_income: f64,
    /// The sum of all income transactions.
    pub logged_income: f64,
    /// Base income plus logged income.
    pub total_income: f64,
    /// The sum of all expense transactions.
    pub expenses: f64,
    /// The sum of all cash withdrawals.
    pub cash: f64,
    /// Total income minus expenses.
    pub net: f64,
    /// The first day of the current month.
    pub current_month: Date,
    /// The sum of the expenses in the current month.
    pub month_expenses: f64,
    /// The budget for the current month, if one is set.
    pub budget: Option<BudgetStatus>,
    pub goal: Option<FinancialGoal>,
    /// The current month's expenses per category.
    pub expenses_by_category: Vec<(Category, f64)>,
}

/// Collect the figures for `user_id` with `today` determining the current month.
pub fn get_financial_summary(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<FinancialSummary, Error> {
    let profile = get_profile_or_default(user_id, connection)?;
    let totals = get_totals(user_id, None, connection)?;

    let month_start = first_of_month(today);
    let month_end = first_of_next_month(today);
    let month_totals = get_totals(user_id, Some((month_start, month_end)), connection)?;
    let expenses_by_category =
        get_expenses_by_category(user_id, month_start, month_end, connection)?;

    let total_income = profile.income + totals.income;

    Ok(FinancialSummary {
        base_income: profile.income,
        logged_income: totals.income,
        total_income,
        expenses: totals.expense,
        cash: totals.cash,
        net: total_income - totals.expense,
        current_month: month_start,
        month_expenses: month_totals.expense,
        budget: get_budget_status_for_month(user_id, month_start, connection)?,
        goal: get_goal(user_id, connection)?,
        expenses_by_category,
    })
}

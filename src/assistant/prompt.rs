//! Builds the system prompt that gives the assistant the user's figures.

use crate::{dashboard::FinancialSummary, month::format_month_label};

/// Used when the administrator has not added a system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are FinDice, a friendly personal finance assistant. \
    Give practical, concise advice about budgeting, saving and spending based on the user's \
    figures below. You are not a licensed financial advisor and should say so when asked \
    for investment advice.";

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Append the user's figures from `summary` to `instructions`.
pub fn build_system_prompt(instructions: &str, summary: &FinancialSummary) -> String {
    let month = format_month_label(summary.current_month);

    let mut lines = vec![
        format!("- Base income: {}", money(summary.base_income)),
        format!("- Logged income: {}", money(summary.logged_income)),
        format!("- Total income: {}", money(summary.total_income)),
        format!("- Total expenses: {}", money(summary.expenses)),
        format!("- Cash withdrawals: {}", money(summary.cash)),
        format!("- Net (total income minus expenses): {}", money(summary.net)),
    ];

    lines.push(match &summary.budget {
        Some(status) => format!(
            "- Budget for {month}: {}, spent {} ({:.0}% used){}",
            money(status.budget.amount),
            money(status.spent),
            status.percentage_used(),
            if status.is_over_budget() {
                ", over budget"
            } else {
                ""
            }
        ),
        None => format!(
            "- No budget set for {month}, spent {} so far",
            money(summary.month_expenses)
        ),
    });

    lines.push(match &summary.goal {
        Some(goal) => format!(
            "- Savings goal: {} target, {} saved ({:.0}% complete)",
            money(goal.target_amount),
            money(goal.current_savings),
            goal.progress_percentage()
        ),
        None => "- No savings goal set".to_owned(),
    });

    lines.push(format!("- Expenses by category for {month}:"));
    lines.extend(
        summary
            .expenses_by_category
            .iter()
            .map(|(category, total)| format!("  - {}: {}", category.label(), money(*total))),
    );

    format!(
        "{}\n\nThe user's finances:\n{}\n",
        instructions.trim(),
        lines.join("\n")
    )
}

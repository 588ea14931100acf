//! The dashboard: the user's totals, this month's budget, goal progress and
//! their most recent transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::progress_bar,
    dashboard::summary::{FinancialSummary, get_financial_summary},
    endpoints,
    goal::goal_progress_view,
    html::{
        CARD_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    month::format_month_label,
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{Transaction, get_recent_transactions},
};

/// The number of transactions listed on the dashboard.
const RECENT_TRANSACTION_COUNT: u64 = 10;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn figure_card(id: &str, label: &str, amount: f64) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p id=(id) class="text-2xl font-semibold" { (format_currency(amount)) }
        }
    }
}

fn budget_card(summary: &FinancialSummary) -> Markup {
    let month = format_month_label(summary.current_month);

    html! {
        section class={ (CARD_STYLE) " space-y-2" }
        {
            h2 class="text-lg font-semibold" { "Budget for " (month) }

            @if let Some(status) = &summary.budget {
                div class="flex justify-between text-sm"
                {
                    span { (format_currency(status.spent)) " of " (format_currency(status.budget.amount)) " spent" }
                    span { (format!("{:.0}%", status.percentage_used())) }
                }

                (progress_bar(status.percentage_used(), status.is_over_budget()))

                @if status.is_over_budget() {
                    p class="text-sm font-semibold text-red-600 dark:text-red-400"
                    {
                        "Over budget by " (format_currency(-status.remaining()))
                    }
                } @else {
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        (format_currency(status.remaining())) " remaining"
                    }
                }
            } @else {
                p class="text-sm"
                {
                    (format_currency(summary.month_expenses)) " spent this month. "
                    a href=(endpoints::BUDGETS_VIEW) class=(LINK_STYLE) { "Set a budget" }
                }
            }
        }
    }
}

fn goal_card(summary: &FinancialSummary) -> Markup {
    html! {
        section class={ (CARD_STYLE) " space-y-2" }
        {
            h2 class="text-lg font-semibold" { "Savings goal" }

            @if let Some(goal) = &summary.goal {
                (goal_progress_view(goal))
            } @else {
                p class="text-sm"
                {
                    "No savings goal yet. "
                    a href=(endpoints::GOAL_VIEW) class=(LINK_STYLE) { "Set a goal" }
                }
            }
        }
    }
}

fn recent_transactions_table(transactions: &[Transaction]) -> Markup {
    html! {
        section class="w-full space-y-2"
        {
            div class="flex justify-between items-baseline"
            {
                h2 class="text-lg font-semibold" { "Recent transactions" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
            }

            div class="overflow-x-auto dark:bg-gray-800"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        }
                    }

                    tbody id="recent-transactions"
                    {
                        @for transaction in transactions {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (transaction.transaction_type.label())
                                    @if let Some(category) = transaction.category {
                                        " "
                                        span class=(CATEGORY_BADGE_STYLE) { (category.label()) }
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(transaction.amount)) }
                            }
                        }

                        @if transactions.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="4" class={ (TABLE_CELL_STYLE) " text-center" }
                                {
                                    "No transactions yet. "
                                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add one" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn dashboard_view(summary: &FinancialSummary, recent_transactions: &[Transaction]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                div class="grid grid-cols-2 lg:grid-cols-3 gap-4"
                {
                    (figure_card("base-income", "Base income", summary.base_income))
                    (figure_card("logged-income", "Logged income", summary.logged_income))
                    (figure_card("total-income", "Total income", summary.total_income))
                    (figure_card("expenses", "Expenses", summary.expenses))
                    (figure_card("cash", "Cash", summary.cash))
                    (figure_card("net", "Net", summary.net))
                }

                div class="grid grid-cols-1 md:grid-cols-2 gap-4"
                {
                    (budget_card(summary))
                    (goal_card(summary))
                }

                (recent_transactions_table(recent_transactions))
            }
        }
    };

    base("Dashboard", &[], &content)
}

/// Display the user's financial summary.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;

    let (summary, recent_transactions) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_financial_summary(user_id, today, &connection)?,
            get_recent_transactions(user_id, RECENT_TRANSACTION_COUNT, &connection)?,
        )
    };

    Ok(dashboard_view(&summary, &recent_transactions).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use scraper::{Html, Selector};
    use time::{Duration, OffsetDateTime};

    use crate::{
        dashboard::{DashboardState, get_dashboard_page},
        profile::create_profile,
        test_utils::{
            assert_status_ok, assert_valid_html, create_test_user, get_test_connection,
            parse_html_document,
        },
        transaction::{Category, NewTransaction, TransactionType, create_transaction},
    };

    fn text_of(document: &Html, selector: &str) -> String {
        document
            .select(&Selector::parse(selector).unwrap())
            .next()
            .unwrap_or_else(|| panic!("no element matches {selector}"))
            .text()
            .collect()
    }

    #[tokio::test]
    async fn shows_totals_and_recent_transactions() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        create_profile(user.id, 900.5, &connection).unwrap();
        let today = OffsetDateTime::now_utc().date();
        for i in 0..12 {
            let transaction = NewTransaction::new(
                10.0,
                TransactionType::Expense,
                Some(Category::Food),
                &format!("meal {i}"),
                today - Duration::days(i),
            )
            .unwrap();
            create_transaction(user.id, transaction, &connection).unwrap();
        }
        let income =
            NewTransaction::new(45.25, TransactionType::Income, None, "bonus", today).unwrap();
        create_transaction(user.id, income, &connection).unwrap();
        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_dashboard_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(text_of(&document, "#base-income"), "$900.50");
        assert_eq!(text_of(&document, "#logged-income"), "$45.25");
        assert_eq!(text_of(&document, "#total-income"), "$945.75");
        assert_eq!(text_of(&document, "#net"), "$825.75");
        let rows = document
            .select(&Selector::parse("#recent-transactions tr").unwrap())
            .count();
        assert_eq!(rows, 10);
    }
}

//! The page for setting monthly budgets and tracking spending against them.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::core::{BudgetStatus, get_budget_statuses},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, dollar_input_styles, format_currency, loading_spinner,
    },
    month::{format_month_label, format_month_value},
    navigation::NavBar,
    timezone::get_local_date,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A horizontal bar showing `percentage` of a whole, capped at 100%.
pub fn progress_bar(percentage: f64, is_over: bool) -> Markup {
    let width = percentage.clamp(0.0, 100.0);
    let colour = if is_over { "bg-red-600" } else { "bg-blue-600" };

    html! {
        div class="w-full h-2.5 bg-gray-200 rounded-full dark:bg-gray-700"
        {
            div class={ "h-2.5 rounded-full " (colour) } style={ "width: " (format!("{width:.0}")) "%" } {}
        }
    }
}

fn budget_row_view(status: &BudgetStatus) -> Markup {
    let month_label = format_month_label(status.budget.month);
    let over_budget = status.is_over_budget();

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (month_label) }
            td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(status.budget.amount)) }
            td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(status.spent)) }
            td class={ (TABLE_CELL_STYLE) " text-right" }
            {
                @if over_budget {
                    span class="text-red-600 dark:text-red-400" { (format_currency(status.remaining())) }
                } @else {
                    (format_currency(status.remaining()))
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex items-center gap-2 min-w-32"
                {
                    (progress_bar(status.percentage_used(), over_budget))
                    span class="text-xs" { (format!("{:.0}%", status.percentage_used())) }
                }
                @if over_budget {
                    span class="text-xs font-semibold text-red-600 dark:text-red-400" { "Over budget" }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(format_endpoint(endpoints::BUDGET, status.budget.id))
                    hx-confirm={ "Are you sure you want to delete the budget for " (month_label) "?" }
                    hx-target="closest tr"
                    hx-target-error="#alert-container"
                    hx-swap="delete"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn budgets_view(statuses: &[BudgetStatus], current_month: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Budgets" }

                form
                    hx-post=(endpoints::BUDGETS_API)
                    hx-target-error="#alert-container"
                    class={ (CARD_STYLE) " grid grid-cols-1 sm:grid-cols-3 gap-4 items-end" }
                {
                    div
                    {
                        label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                        input
                            type="month"
                            name="month"
                            id="month"
                            value=(format_month_value(current_month))
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                        div class="input-wrapper w-full"
                        {
                            input
                                type="number"
                                name="amount"
                                id="amount"
                                step="0.01"
                                min="0"
                                placeholder="0.00"
                                required
                                class=(FORM_TEXT_INPUT_STYLE);
                        }
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                        " Save Budget"
                    }
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Budget" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Spent" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Remaining" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Used" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for status in statuses {
                                (budget_row_view(status))
                            }

                            @if statuses.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="6" class={ (TABLE_CELL_STYLE) " text-center" }
                                    {
                                        "No budgets yet. Set one for this month above."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Budgets", &[dollar_input_styles()], &content)
}

/// Renders the user's budgets, newest month first.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;

    let statuses = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_budget_statuses(user_id, &connection)?
    };

    Ok(budgets_view(&statuses, today).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        budget::{budgets_page::BudgetsPageState, get_budgets_page, set_budget},
        endpoints,
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_status_ok, assert_valid_html,
            create_test_user, get_test_connection, must_get_form, parse_html_document,
        },
        transaction::{Category, NewTransaction, TransactionType, create_transaction},
    };

    #[tokio::test]
    async fn shows_form_and_budget_rows() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        set_budget(user.id, date!(2025 - 01 - 01), 100.0, &connection).unwrap();
        set_budget(user.id, date!(2025 - 02 - 01), 100.0, &connection).unwrap();
        let expense = NewTransaction::new(
            150.25,
            TransactionType::Expense,
            Some(Category::Rent),
            "",
            date!(2025 - 02 - 10),
        )
        .unwrap();
        create_transaction(user.id, expense, &connection).unwrap();
        let state = BudgetsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_budgets_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::BUDGETS_API, "hx-post");
        assert_form_input(&form, "month", "month");
        assert_form_input(&form, "amount", "number");

        let rows = document
            .select(&Selector::parse("tbody tr").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("February 2025"), "got {:?}", rows[0]);
        assert!(rows[0].contains("Over budget"));
        assert!(rows[0].contains("-$50.25"));
        assert!(rows[1].contains("January 2025"));
        assert!(!rows[1].contains("Over budget"));
    }
}

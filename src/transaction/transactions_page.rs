//! The page listing a user's transactions with filters and pagination.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, create_pagination_indicators, pagination_view},
    transaction::{
        core::{Category, Transaction, TransactionType},
        query::{TransactionFilter, TransactionFilterQuery, count_transactions, query_transactions},
    },
};

/// The largest page size a client may request.
const MAX_PAGE_SIZE: u64 = 100;

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

fn transaction_row_view(transaction: &Transaction) -> Markup {
    let amount_class = match transaction.transaction_type {
        TransactionType::Income => "text-green-600 dark:text-green-400",
        TransactionType::Expense => "text-red-600 dark:text-red-400",
        TransactionType::Cash => "",
    };
    let confirm_message = format!(
        "Are you sure you want to delete the transaction '{}'? This cannot be undone.",
        transaction.description
    );

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            td class=(TABLE_CELL_STYLE) { (transaction.transaction_type.label()) }
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(category) = transaction.category {
                    span class=(CATEGORY_BADGE_STYLE) { (category.label()) }
                }
            }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class={ (TABLE_CELL_STYLE) " text-right " (amount_class) }
            {
                (format_currency(transaction.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                    hx-confirm=(confirm_message)
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

fn filter_form_view(filter: &TransactionFilter) -> Markup {
    let from = filter.from.map(|date| date.to_string());
    let to = filter.to.map(|date| date.to_string());

    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="grid grid-cols-2 lg:grid-cols-6 gap-4 items-end w-full"
        {
            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select name="type" id="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }
                    @for transaction_type in TransactionType::ALL {
                        option
                            value=(transaction_type.as_str())
                            selected[filter.transaction_type == Some(transaction_type)]
                        { (transaction_type.label()) }
                    }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }
                    @for category in Category::ALL {
                        option
                            value=(category.as_str())
                            selected[filter.category == Some(category)]
                        { (category.label()) }
                    }
                }
            }

            div
            {
                label for="from" class=(FORM_LABEL_STYLE) { "From" }
                input type="date" name="from" id="from" value=[from] class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="to" class=(FORM_LABEL_STYLE) { "To" }
                input type="date" name="to" id="to" value=[to] class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }
                input
                    type="search"
                    name="search"
                    id="search"
                    placeholder="Description"
                    value=[filter.search.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex gap-4 items-center"
            {
                button type="submit" class=(LINK_STYLE) { "Filter" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Clear" }
            }
        }
    }
}

fn transactions_view(
    transactions: &[Transaction],
    filter: &TransactionFilter,
    page: u64,
    page_count: u64,
    per_page: u64,
    max_pages: u64,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let filter_query = filter.to_query_string();
    let export_url = if filter_query.is_empty() {
        endpoints::EXPORT_TRANSACTIONS.to_owned()
    } else {
        format!("{}?{filter_query}", endpoints::EXPORT_TRANSACTIONS)
    };
    let page_href = |page: u64| {
        let mut url = format!(
            "{}?page={page}&per_page={per_page}",
            endpoints::TRANSACTIONS_VIEW
        );
        if !filter_query.is_empty() {
            url.push('&');
            url.push_str(&filter_query);
        }
        url
    };
    let indicators = create_pagination_indicators(page, page_count, max_pages);

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="relative w-full max-w-5xl space-y-4"
            {
                div class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    div class="flex gap-4"
                    {
                        a href=(export_url) class=(LINK_STYLE) { "Export CSV" }
                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                        {
                            "Add Transaction"
                        }
                    }
                }

                (filter_form_view(filter))

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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (transaction_row_view(transaction))
                            }

                            @if transactions.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="6" class={ (TABLE_CELL_STYLE) " text-center" }
                                    {
                                        "No transactions found."
                                    }
                                }
                            }
                        }
                    }
                }

                @if page_count > 1 {
                    (pagination_view(&indicators, page_href))
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

/// Renders a page of the user's transactions, newest first.
///
/// The query string may set `page`, `per_page` and the filters `type`,
/// `category`, `from`, `to` and `search`.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionFilterQuery>,
) -> Result<Response, Error> {
    let config = &state.pagination_config;
    let filter = TransactionFilter::from_query(&query);
    let per_page = query
        .per_page
        .unwrap_or(config.default_page_size)
        .clamp(1, MAX_PAGE_SIZE);

    let (transactions, page, page_count) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transaction_count = count_transactions(user_id, &filter, &connection)?;
        let page_count = transaction_count.div_ceil(per_page).max(1);
        let page = query
            .page
            .unwrap_or(config.default_page)
            .clamp(1, page_count);
        let offset = (page - 1) * per_page;

        let transactions =
            query_transactions(user_id, &filter, Some(per_page), offset, &connection)?;

        (transactions, page, page_count)
    };

    Ok(transactions_view(
        &transactions,
        &filter,
        page,
        page_count,
        per_page,
        config.max_pages,
    )
    .into_response())
}

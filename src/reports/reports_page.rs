//! The reports page: charts and a monthly table for a selectable year.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    month::format_month_label,
    navigation::NavBar,
    reports::{
        charts::{charts_script, charts_view, report_charts},
        core::{MonthlyFigures, YearReport, get_report_years, get_year_report},
    },
    timezone::get_local_date,
};

/// The state needed for the reports page.
#[derive(Debug, Clone)]
pub struct ReportsState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters of the reports page.
#[derive(Debug, Default, Deserialize)]
pub struct ReportsQuery {
    /// The year to report on, defaults to the current year.
    pub year: Option<String>,
}

/// Years outside this range are ignored in favour of the current year.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=9998;

fn parse_year(raw_year: Option<&str>) -> Option<i32> {
    raw_year
        .and_then(|year| year.trim().parse::<i32>().ok())
        .filter(|year| YEAR_RANGE.contains(year))
}

fn month_row_view(figures: &MonthlyFigures) -> Markup {
    let net = figures.net();

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (format_month_label(figures.month)) }
            td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(figures.income)) }
            td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(figures.expenses)) }
            td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(figures.cash)) }
            td class={ (TABLE_CELL_STYLE) " text-right" }
            {
                @if net < 0.0 {
                    span class="text-red-600 dark:text-red-400" { (format_currency(net)) }
                } @else {
                    (format_currency(net))
                }
            }
        }
    }
}

fn monthly_table_view(report: &YearReport) -> Markup {
    html! {
        div class="overflow-x-auto dark:bg-gray-800"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Income" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Expenses" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Cash" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Net" }
                    }
                }

                tbody id="monthly-figures"
                {
                    @for figures in &report.months {
                        (month_row_view(figures))
                    }
                }

                tfoot
                {
                    tr class="font-semibold text-gray-900 dark:text-white"
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                        td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(report.total_income())) }
                        td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(report.total_expenses())) }
                        td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(report.total_cash())) }
                        td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(report.total_net())) }
                    }
                }
            }
        }
    }
}

fn reports_view(report: &YearReport, years: &[i32]) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let charts = report_charts(report);

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-6xl space-y-6"
            {
                div class="flex flex-wrap items-end justify-between gap-4"
                {
                    h1 class="text-xl font-bold" { "Reports for " (report.year) }

                    form method="get" action=(endpoints::REPORTS_VIEW) class="flex items-end gap-2"
                    {
                        div
                        {
                            label for="year" class=(FORM_LABEL_STYLE) { "Year" }
                            select
                                name="year"
                                id="year"
                                onchange="this.form.submit()"
                                class=(FORM_TEXT_INPUT_STYLE)
                            {
                                @for year in years {
                                    option value=(year) selected[*year == report.year] { (year) }
                                }
                            }
                        }

                        button type="submit" class="px-4 py-2.5 text-sm" { "Show" }
                    }
                }

                @if report.is_empty() {
                    p id="no-data" class="text-gray-500 dark:text-gray-400"
                    {
                        "No transactions were logged in " (report.year) "."
                    }
                } @else {
                    (charts_view(&charts))
                }

                (monthly_table_view(report))
            }
        }
    };

    let head_elements = if report.is_empty() {
        vec![]
    } else {
        vec![
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            charts_script(&charts),
        ]
    };

    base("Reports", &head_elements, &content)
}

/// Renders the reports page for the year in the query, or the current year.
pub async fn get_reports_page(
    State(state): State<ReportsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportsQuery>,
) -> Result<Response, Error> {
    let current_year = get_local_date(&state.local_timezone)?.year();
    let year = parse_year(query.year.as_deref()).unwrap_or(current_year);

    let (report, mut years) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_year_report(user_id, year, &connection)?,
            get_report_years(user_id, &connection)?,
        )
    };

    for extra_year in [current_year, year] {
        if !years.contains(&extra_year) {
            years.push(extra_year);
        }
    }
    years.sort_unstable_by(|a, b| b.cmp(a));

    Ok(reports_view(&report, &years).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use axum_extra::extract::Query;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        reports::reports_page::{ReportsQuery, ReportsState, get_reports_page, parse_year},
        test_utils::{
            assert_status_ok, assert_valid_html, create_test_user, get_test_connection,
            parse_html_document,
        },
        transaction::{Category, NewTransaction, TransactionType, create_transaction},
    };

    #[test]
    fn parse_year_ignores_invalid_years() {
        assert_eq!(parse_year(Some("2024")), Some(2024));
        assert_eq!(parse_year(Some(" 2023 ")), Some(2023));
        assert_eq!(parse_year(Some("")), None);
        assert_eq!(parse_year(Some("twenty")), None);
        assert_eq!(parse_year(Some("-5")), None);
        assert_eq!(parse_year(None), None);
    }

    #[tokio::test]
    async fn shows_charts_and_monthly_table_for_selected_year() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let expense = NewTransaction::new(
            12.5,
            TransactionType::Expense,
            Some(Category::Food),
            "lunch",
            date!(2023 - 04 - 10),
        )
        .unwrap();
        create_transaction(user.id, expense, &connection).unwrap();
        let state = ReportsState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_reports_page(
            State(state),
            Extension(user.id),
            Query(ReportsQuery {
                year: Some("2023".to_owned()),
            }),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        for id in ["#income-expenses-chart", "#net-income-chart", "#category-chart"] {
            assert!(
                document.select(&Selector::parse(id).unwrap()).next().is_some(),
                "want chart container {id}"
            );
        }

        let rows = document
            .select(&Selector::parse("#monthly-figures tr").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(rows.len(), 12);
        assert!(rows[3].contains("April 2023"), "got {:?}", rows[3]);
        assert!(rows[3].contains("$12.50"));

        let selected_year = document
            .select(&Selector::parse("select[name=year] option[selected]").unwrap())
            .next()
            .expect("want a selected year")
            .value()
            .attr("value");
        assert_eq!(selected_year, Some("2023"));
    }

    #[tokio::test]
    async fn empty_year_shows_message_instead_of_charts() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let state = ReportsState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_reports_page(
            State(state),
            Extension(user.id),
            Query(ReportsQuery::default()),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert!(
            document
                .select(&Selector::parse("#no-data").unwrap())
                .next()
                .is_some()
        );
        assert!(
            document
                .select(&Selector::parse("#charts").unwrap())
                .next()
                .is_none()
        );
    }
}

//! Per-month income and expense figures for the reports page.

use rusqlite::Connection;
use time::{Date, Month};

use crate::{
    Error,
    auth::UserID,
    month::first_of_next_month,
    transaction::{Category, TransactionType, get_expenses_by_category},
};

/// The logged transaction totals of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyFigures {
    /// The first day of the month.
    pub month: Date,
    pub income: f64,
    pub expenses: f64,
    pub cash: f64,
}

impl MonthlyFigures {
    fn empty(month: Date) -> Self {
        Self {
            month,
            income: 0.0,
            expenses: 0.0,
            cash: 0.0,
        }
    }

    /// Logged income minus expenses.
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

/// The figures for a whole year of reports.
#[derive(Debug, Clone, PartialEq)]
pub struct YearReport {
    pub year: i32,
    /// One entry per month from January to December.
    pub months: Vec<MonthlyFigures>,
    /// The year's expenses per category.
    pub expenses_by_category: Vec<(Category, f64)>,
}

impl YearReport {
    pub fn total_income(&self) -> f64 {
        self.months.iter().map(|figures| figures.income).sum()
    }

    pub fn total_expenses(&self) -> f64 {
        self.months.iter().map(|figures| figures.expenses).sum()
    }

    pub fn total_cash(&self) -> f64 {
        self.months.iter().map(|figures| figures.cash).sum()
    }

    pub fn total_net(&self) -> f64 {
        self.total_income() - self.total_expenses()
    }

    /// Whether the user logged no transactions in the year.
    pub fn is_empty(&self) -> bool {
        self.total_income() == 0.0 && self.total_expenses() == 0.0 && self.total_cash() == 0.0
    }
}

fn start_of_year(year: i32) -> Result<Date, Error> {
    Date::from_calendar_date(year, Month::January, 1)
        .map_err(|_| Error::InvalidDate(format!("{year}-01-01")))
}

/// Get the logged income, expenses and cash of `user_id` for each month of `year`.
///
/// Months without transactions are included with zero totals.
pub fn get_monthly_figures(
    user_id: UserID,
    year: i32,
    connection: &Connection,
) -> Result<Vec<MonthlyFigures>, Error> {
    let start = start_of_year(year)?;

    let mut months = Vec::with_capacity(12);
    let mut month = start;
    for _ in 0..12 {
        months.push(MonthlyFigures::empty(month));
        month = first_of_next_month(month);
    }
    let end = month;

    let mut statement = connection.prepare(
        "SELECT CAST(strftime('%m', date) AS INTEGER) AS month_number, type, SUM(amount)
         FROM \"transaction\"
         WHERE user_id = ?1 AND date >= ?2 AND date < ?3
         GROUP BY month_number, type",
    )?;

    let rows = statement.query_map((user_id.as_i64(), start, end), |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, TransactionType>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    for row in rows {
        let (month_number, transaction_type, total) = row?;

        let Some(figures) = (month_number as usize)
            .checked_sub(1)
            .and_then(|index| months.get_mut(index))
        else {
            tracing::warn!("skipping totals for unexpected month number {month_number}");
            continue;
        };

        match transaction_type {
            TransactionType::Income => figures.income = total,
            TransactionType::Expense => figures.expenses = total,
            TransactionType::Cash => figures.cash = total,
        }
    }

    Ok(months)
}

/// Build the report of `user_id` for `year`.
pub fn get_year_report(
    user_id: UserID,
    year: i32,
    connection: &Connection,
) -> Result<YearReport, Error> {
    let months = get_monthly_figures(user_id, year, connection)?;
    let start = start_of_year(year)?;
    let end = start_of_year(year + 1)?;
    let expenses_by_category = get_expenses_by_category(user_id, start, end, connection)?;

    Ok(YearReport {
        year,
        months,
        expenses_by_category,
    })
}

/// The years in which `user_id` has transactions, newest first.
pub fn get_report_years(user_id: UserID, connection: &Connection) -> Result<Vec<i32>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT CAST(strftime('%Y', date) AS INTEGER) AS year
             FROM \"transaction\" WHERE user_id = ?1 ORDER BY year DESC",
        )?
        .query_map([user_id.as_i64()], |row| row.get(0))?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        auth::UserID,
        reports::core::{get_monthly_figures, get_report_years, get_year_report},
        test_utils::{create_test_user, create_test_user_with_username, get_test_connection},
        transaction::{Category, NewTransaction, TransactionType, create_transaction},
    };

    fn insert(
        user_id: UserID,
        amount: f64,
        transaction_type: TransactionType,
        date: Date,
        connection: &Connection,
    ) {
        let category = (transaction_type == TransactionType::Expense).then_some(Category::Food);
        let transaction =
            NewTransaction::new(amount, transaction_type, category, "", date).unwrap();
        create_transaction(user_id, transaction, connection).unwrap();
    }

    #[test]
    fn monthly_figures_cover_every_month() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        insert(user.id, 100.0, TransactionType::Income, date!(2024 - 01 - 05), &connection);
        insert(user.id, 40.0, TransactionType::Expense, date!(2024 - 01 - 31), &connection);
        insert(user.id, 25.0, TransactionType::Cash, date!(2024 - 03 - 01), &connection);
        insert(user.id, 60.0, TransactionType::Expense, date!(2024 - 12 - 31), &connection);
        insert(user.id, 999.0, TransactionType::Income, date!(2025 - 01 - 01), &connection);

        let months = get_monthly_figures(user.id, 2024, &connection).unwrap();

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, date!(2024 - 01 - 01));
        assert_eq!(months[0].income, 100.0);
        assert_eq!(months[0].expenses, 40.0);
        assert_eq!(months[0].net(), 60.0);
        assert_eq!(months[1].income, 0.0);
        assert_eq!(months[2].cash, 25.0);
        assert_eq!(months[11].month, date!(2024 - 12 - 01));
        assert_eq!(months[11].expenses, 60.0);
        assert_eq!(months[11].net(), -60.0);
    }

    #[test]
    fn year_report_totals() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        insert(user.id, 100.0, TransactionType::Income, date!(2024 - 02 - 05), &connection);
        insert(user.id, 30.0, TransactionType::Expense, date!(2024 - 02 - 06), &connection);
        insert(user.id, 20.0, TransactionType::Expense, date!(2024 - 05 - 06), &connection);

        let report = get_year_report(user.id, 2024, &connection).unwrap();

        assert_eq!(report.total_income(), 100.0);
        assert_eq!(report.total_expenses(), 50.0);
        assert_eq!(report.total_net(), 50.0);
        assert!(!report.is_empty());
        assert_eq!(report.expenses_by_category[0], (Category::Food, 50.0));
    }

    #[test]
    fn empty_year_report() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        let report = get_year_report(user.id, 2024, &connection).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.months.len(), 12);
    }

    #[test]
    fn report_years_are_distinct_and_scoped_to_user() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = create_test_user_with_username("other", &connection);
        insert(user.id, 1.0, TransactionType::Income, date!(2023 - 06 - 01), &connection);
        insert(user.id, 1.0, TransactionType::Income, date!(2025 - 06 - 01), &connection);
        insert(user.id, 1.0, TransactionType::Cash, date!(2025 - 07 - 01), &connection);
        insert(other.id, 1.0, TransactionType::Cash, date!(2020 - 07 - 01), &connection);

        let years = get_report_years(user.id, &connection).unwrap();

        assert_eq!(years, [2025, 2023]);
    }
}

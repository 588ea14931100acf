//! Database query helpers for listing, exporting and totalling transactions.

use rusqlite::{Connection, ToSql};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    month::parse_date,
    transaction::core::{
        Category, Transaction, TransactionType, map_transaction_row, transaction_columns,
    },
};

/// The raw filter and paging fields from the transactions page query string.
///
/// Every field is optional and empty strings are treated as missing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionFilterQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub search: Option<String>,
    /// The page number, starting from 1.
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Restricts which of a user's transactions a query returns.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub category: Option<Category>,
    /// The earliest date to include.
    pub from: Option<Date>,
    /// The latest date to include.
    pub to: Option<Date>,
    /// Text that must appear in the description.
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Build a filter from the query string, ignoring values that cannot be parsed.
    pub fn from_query(query: &TransactionFilterQuery) -> Self {
        let transaction_type = non_empty(&query.transaction_type).and_then(|value| {
            TransactionType::ALL
                .into_iter()
                .find(|kind| kind.as_str() == value)
        });
        let category = non_empty(&query.category).and_then(|value| {
            Category::ALL
                .into_iter()
                .find(|category| category.as_str() == value)
        });
        let from = non_empty(&query.from).and_then(|value| parse_date(value).ok());
        let to = non_empty(&query.to).and_then(|value| parse_date(value).ok());
        let search = non_empty(&query.search).map(str::to_owned);

        Self {
            transaction_type,
            category,
            from,
            to,
            search,
        }
    }

    /// The filter as query string parameters, e.g. "type=expense&category=food".
    ///
    /// Returns an empty string when no filters are set.
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();

        if let Some(transaction_type) = self.transaction_type {
            params.push(("type", transaction_type.as_str().to_owned()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.as_str().to_owned()));
        }
        if let Some(from) = self.from {
            params.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            params.push(("to", to.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }

        serde_urlencoded::to_string(params).unwrap_or_default()
    }

    /// Build the SQL where clause and its parameters, starting at parameter `?1`
    /// which is always the user ID.
    fn where_clause(&self, user_id: UserID) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions = vec!["user_id = ?1".to_owned()];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.as_i64())];

        if let Some(transaction_type) = self.transaction_type {
            params.push(Box::new(transaction_type));
            conditions.push(format!("type = ?{}", params.len()));
        }
        if let Some(category) = self.category {
            params.push(Box::new(category));
            conditions.push(format!("category = ?{}", params.len()));
        }
        if let Some(from) = self.from {
            params.push(Box::new(from));
            conditions.push(format!("date >= ?{}", params.len()));
        }
        if let Some(to) = self.to {
            params.push(Box::new(to));
            conditions.push(format!("date <= ?{}", params.len()));
        }
        if let Some(search) = &self.search {
            params.push(Box::new(format!("%{search}%")));
            conditions.push(format!("description LIKE ?{}", params.len()));
        }

        (conditions.join(" AND "), params)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Get the user's transactions matching `filter`, newest first.
///
/// Pass `None` for `limit` to get every matching transaction.
pub fn query_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    limit: Option<u64>,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, params) = filter.where_clause(user_id);
    // SQLite treats a negative limit as no limit.
    let limit = limit.map(|limit| limit as i64).unwrap_or(-1);

    let query = format!(
        "SELECT {} FROM \"transaction\" WHERE {where_clause} \
        ORDER BY date DESC, id DESC LIMIT {limit} OFFSET {offset}",
        transaction_columns()
    );

    connection
        .prepare(&query)?
        .query_map(
            rusqlite::params_from_iter(params.iter()),
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Get the user's `count` most recent transactions.
pub fn get_recent_transactions(
    user_id: UserID,
    count: u64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_transactions(
        user_id,
        &TransactionFilter::default(),
        Some(count),
        0,
        connection,
    )
}

/// Count the user's transactions matching `filter`.
pub fn count_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = filter.where_clause(user_id);

    connection
        .query_row(
            &format!("SELECT COUNT(id) FROM \"transaction\" WHERE {where_clause}"),
            rusqlite::params_from_iter(params.iter()),
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as u64)
        .map_err(|error| error.into())
}

/// The sum of a user's transaction amounts per transaction type.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TransactionTotals {
    /// Logged income, not including the profile's base income.
    pub income: f64,
    pub expense: f64,
    pub cash: f64,
}

/// Sum the user's transactions by type.
///
/// If `range` is given, only transactions with `start <= date < end` are included.
pub fn get_totals(
    user_id: UserID,
    range: Option<(Date, Date)>,
    connection: &Connection,
) -> Result<TransactionTotals, Error> {
    let mut statement = connection.prepare(
        "SELECT type, COALESCE(SUM(amount), 0) FROM \"transaction\"
         WHERE user_id = ?1 AND (?2 IS NULL OR date >= ?2) AND (?3 IS NULL OR date < ?3)
         GROUP BY type",
    )?;

    let (start, end) = match range {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    };

    let rows = statement.query_map((user_id.as_i64(), start, end), |row| {
        Ok((row.get::<_, TransactionType>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut totals = TransactionTotals::default();

    for row in rows {
        let (transaction_type, total) = row?;

        match transaction_type {
            TransactionType::Income => totals.income = total,
            TransactionType::Expense => totals.expense = total,
            TransactionType::Cash => totals.cash = total,
        }
    }

    Ok(totals)
}

/// Sum the user's expenses by category for `start <= date < end`.
///
/// Every category is included, with zero for categories without expenses.
/// Expenses without a category count as [Category::Other].
pub fn get_expenses_by_category(
    user_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<(Category, f64)>, Error> {
    let mut statement = connection.prepare(
        "SELECT COALESCE(category, 'other') AS expense_category, SUM(amount)
         FROM \"transaction\"
         WHERE user_id = ?1 AND type = 'expense' AND date >= ?2 AND date < ?3
         GROUP BY expense_category",
    )?;

    let rows = statement
        .query_map((user_id.as_i64(), start, end), |row| {
            Ok((row.get::<_, Category>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Category::ALL
        .into_iter()
        .map(|category| {
            let total = rows
                .iter()
                .find(|(row_category, _)| *row_category == category)
                .map(|(_, total)| *total)
                .unwrap_or(0.0);

            (category, total)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        auth::UserID,
        test_utils::{create_test_user, create_test_user_with_username, get_test_connection},
        transaction::{
            Category, NewTransaction, TransactionType, create_transaction,
            query::{
                TransactionFilter, TransactionFilterQuery, TransactionTotals, count_transactions,
                get_expenses_by_category, get_recent_transactions, get_totals, query_transactions,
            },
        },
    };

    fn insert(
        user_id: UserID,
        amount: f64,
        transaction_type: TransactionType,
        category: Option<Category>,
        description: &str,
        date: Date,
        connection: &Connection,
    ) {
        let transaction =
            NewTransaction::new(amount, transaction_type, category, description, date).unwrap();
        create_transaction(user_id, transaction, connection).unwrap();
    }

    fn insert_sample_data(user_id: UserID, connection: &Connection) {
        insert(user_id, 1000.0, TransactionType::Income, None, "Salary", date!(2025 - 01 - 01), connection);
        insert(user_id, 50.0, TransactionType::Expense, Some(Category::Food), "Groceries", date!(2025 - 01 - 05), connection);
        insert(user_id, 400.0, TransactionType::Expense, Some(Category::Rent), "Rent", date!(2025 - 01 - 07), connection);
        insert(user_id, 20.0, TransactionType::Cash, None, "ATM", date!(2025 - 02 - 01), connection);
        insert(user_id, 30.0, TransactionType::Expense, Some(Category::Food), "Takeaway food", date!(2025 - 02 - 03), connection);
    }

    #[test]
    fn lists_newest_first() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        insert_sample_data(user.id, &connection);

        let got = query_transactions(user.id, &TransactionFilter::default(), None, 0, &connection)
            .unwrap();

        let descriptions: Vec<_> = got.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(
            descriptions,
            ["Takeaway food", "ATM", "Rent", "Groceries", "Salary"]
        );
    }

    #[test]
    fn same_day_transactions_are_ordered_by_id() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let day = date!(2025 - 01 - 01);
        insert(user.id, 1.0, TransactionType::Cash, None, "first", day, &connection);
        insert(user.id, 2.0, TransactionType::Cash, None, "second", day, &connection);

        let got = get_recent_transactions(user.id, 10, &connection).unwrap();

        assert_eq!(got[0].description, "second");
        assert_eq!(got[1].description, "first");
    }

    #[test]
    fn paginates_with_limit_and_offset() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        insert_sample_data(user.id, &connection);

        let got = query_transactions(user.id, &TransactionFilter::default(), Some(2), 2, &connection)
            .unwrap();

        let descriptions: Vec<_> = got.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["Rent", "Groceries"]);
    }

    #[test]
    fn filters_by_type_category_dates_and_search() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        insert_sample_data(user.id, &connection);

        let filter = TransactionFilter {
            transaction_type: Some(TransactionType::Expense),
            category: Some(Category::Food),
            from: Some(date!(2025 - 01 - 01)),
            to: Some(date!(2025 - 01 - 31)),
            search: Some("grocer".to_owned()),
        };

        let got = query_transactions(user.id, &filter, None, 0, &connection).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].description, "Groceries");
        assert_eq!(count_transactions(user.id, &filter, &connection), Ok(1));
    }

    #[test]
    fn date_range_is_inclusive() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        insert_sample_data(user.id, &connection);

        let filter = TransactionFilter {
            from: Some(date!(2025 - 01 - 05)),
            to: Some(date!(2025 - 02 - 01)),
            ..Default::default()
        };

        assert_eq!(count_transactions(user.id, &filter, &connection), Ok(3));
    }

    #[test]
    fn only_returns_own_transactions() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = create_test_user_with_username("other", &connection);
        insert_sample_data(other.id, &connection);

        let got = query_transactions(user.id, &TransactionFilter::default(), None, 0, &connection)
            .unwrap();

        assert!(got.is_empty());
        assert_eq!(get_totals(user.id, None, &connection), Ok(TransactionTotals::default()));
    }

    #[test]
    fn totals_by_type() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        insert_sample_data(user.id, &connection);

        assert_eq!(
            get_totals(user.id, None, &connection),
            Ok(TransactionTotals {
                income: 1000.0,
                expense: 480.0,
                cash: 20.0
            })
        );
        assert_eq!(
            get_totals(
                user.id,
                Some((date!(2025 - 02 - 01), date!(2025 - 03 - 01))),
                &connection
            ),
            Ok(TransactionTotals {
                income: 0.0,
                expense: 30.0,
                cash: 20.0
            })
        );
    }

    #[test]
    fn expenses_by_category_includes_every_category() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        insert_sample_data(user.id, &connection);

        let got = get_expenses_by_category(
            user.id,
            date!(2025 - 01 - 01),
            date!(2025 - 02 - 01),
            &connection,
        )
        .unwrap();

        assert_eq!(
            got,
            vec![
                (Category::Food, 50.0),
                (Category::Rent, 400.0),
                (Category::Entertainment, 0.0),
                (Category::Other, 0.0),
            ]
        );
    }

    #[test]
    fn filter_from_query_ignores_invalid_values() {
        let query = TransactionFilterQuery {
            transaction_type: Some("expense".to_owned()),
            category: Some("cars".to_owned()),
            from: Some("2025-13-01".to_owned()),
            to: Some("2025-01-31".to_owned()),
            search: Some("  ".to_owned()),
            ..Default::default()
        };

        let filter = TransactionFilter::from_query(&query);

        assert_eq!(
            filter,
            TransactionFilter {
                transaction_type: Some(TransactionType::Expense),
                category: None,
                from: None,
                to: Some(date!(2025 - 01 - 31)),
                search: None,
            }
        );
        assert_eq!(filter.to_query_string(), "type=expense&to=2025-01-31");
    }

    #[test]
    fn query_string_with_empty_fields_decodes_to_filter() {
        let query: TransactionFilterQuery =
            serde_html_form::from_str("type=income&category=&from=&search=rent&page=2").unwrap();

        let filter = TransactionFilter::from_query(&query);

        assert_eq!(query.page, Some(2));
        assert_eq!(
            filter,
            TransactionFilter {
                transaction_type: Some(TransactionType::Income),
                search: Some("rent".to_owned()),
                ..Default::default()
            }
        );
    }
}

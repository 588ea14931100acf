//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/budgets/{budget_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The CSV download of the user's transactions.
pub const EXPORT_TRANSACTIONS: &str = "/transactions/export.csv";
/// The page for managing monthly budgets.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page for managing the savings goal.
pub const GOAL_VIEW: &str = "/goal";
/// The page with charts of the user's finances.
pub const REPORTS_VIEW: &str = "/reports";
/// The page for chatting with the finance assistant.
pub const ASSISTANT_VIEW: &str = "/assistant";
/// The page for editing the user's profile and bank link.
pub const ACCOUNT_VIEW: &str = "/account";
/// The financial literacy page.
pub const LEARN_VIEW: &str = "/learn";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for instructions for resetting the user's password.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to access users.
pub const USERS: &str = "/api/users";
/// The route to update the current user's profile.
pub const PROFILE_API: &str = "/api/profile";
/// The route to access transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create or update budgets.
pub const BUDGETS_API: &str = "/api/budgets";
/// The route to delete a budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to set or reset the savings goal.
pub const GOAL_API: &str = "/api/goal";
/// The route to add to the savings goal.
pub const GOAL_SAVINGS_API: &str = "/api/goal/savings";
/// The route to send or clear assistant messages.
pub const CHAT_API: &str = "/api/chat";
/// The route to create a link token for the bank link widget.
pub const BANK_LINK_TOKEN: &str = "/api/bank/link_token";
/// The route to exchange a public token for an access token.
pub const BANK_EXCHANGE: &str = "/api/bank/exchange";
/// The route to import the latest bank transactions.
pub const BANK_IMPORT: &str = "/api/bank/import";
/// The route to forget the linked bank account.
pub const BANK_UNLINK: &str = "/api/bank/unlink";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

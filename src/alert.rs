//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element of the base page.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// A dismissable message shown after a form submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An operation succeeded and there is more to say about it.
    Success { message: String, details: String },
    /// An operation succeeded.
    SuccessSimple { message: String },
    /// An operation failed and the user can do something about it.
    Error { message: String, details: String },
    /// An operation failed.
    ErrorSimple { message: String },
}

const SUCCESS_STYLE: &str = "flex items-start p-4 mb-4 text-green-800 border \
    border-green-300 rounded-lg bg-green-50 dark:bg-gray-800 dark:text-green-400 \
    dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start p-4 mb-4 text-red-800 border \
    border-red-300 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400 \
    dark:border-red-800";

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
            Alert::ErrorSimple { message } => (ERROR_STYLE, message, None),
        };

        // Template adapted from https://flowbite.com/docs/components/alerts/
        html! {
            div class=(style) role="alert"
            {
                div class="flex-1"
                {
                    p class="font-semibold" { (message) }

                    @if let Some(details) = details {
                        @if !details.is_empty() {
                            p class="mt-1 text-sm" { (details) }
                        }
                    }
                }

                button
                    type="button"
                    class="ms-3 -mt-1 text-lg leading-none bg-transparent"
                    aria-label="Dismiss"
                    onclick="this.parentElement.remove()"
                {
                    "×"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    fn render(alert: Alert) -> Html {
        Html::parse_fragment(&alert.into_html().into_string())
    }

    #[test]
    fn error_alert_shows_message_and_details() {
        let html = render(Alert::Error {
            message: "Could not save".to_owned(),
            details: "Try again".to_owned(),
        });

        let paragraphs = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();

        assert_eq!(paragraphs, vec!["Could not save", "Try again"]);
        let alert = html
            .select(&Selector::parse("div[role=alert]").unwrap())
            .next()
            .expect("No alert found");
        assert!(alert.value().attr("class").unwrap().contains("text-red-800"));
    }

    #[test]
    fn simple_success_alert_has_no_details() {
        let html = render(Alert::SuccessSimple {
            message: "Saved".to_owned(),
        });

        let paragraphs = html.select(&Selector::parse("p").unwrap()).count();

        assert_eq!(paragraphs, 1);
    }
}

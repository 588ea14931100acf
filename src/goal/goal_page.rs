//! The page for setting a savings goal and tracking progress towards it.

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
    endpoints,
    goal::core::{FinancialGoal, get_goal},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, dollar_input_styles, format_currency,
    },
    navigation::NavBar,
};

/// The state needed for the goal page and its endpoints.
#[derive(Debug, Clone)]
pub struct GoalState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn amount_form(endpoint: &str, id: &str, label: &str, button: &str, value: Option<f64>) -> Markup {
    let value = value.map(|value| format!("{value:.2}"));

    html! {
        form
            hx-post=(endpoint)
            hx-target-error="#alert-container"
            class="flex flex-col sm:flex-row gap-4 items-end"
        {
            div class="w-full"
            {
                label for=(id) class=(FORM_LABEL_STYLE) { (label) }
                div class="input-wrapper w-full"
                {
                    input
                        type="number"
                        name="amount"
                        id=(id)
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        value=[value]
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            button type="submit" class={ (BUTTON_PRIMARY_STYLE) " sm:w-auto whitespace-nowrap" }
            {
                (button)
            }
        }
    }
}

/// A summary of the goal's progress, shared with the dashboard.
pub fn goal_progress_view(goal: &FinancialGoal) -> Markup {
    html! {
        div class="space-y-2"
        {
            div class="flex justify-between text-sm"
            {
                span { (format_currency(goal.current_savings)) " of " (format_currency(goal.target_amount)) }
                span id="goal-percentage" { (format!("{:.0}%", goal.display_percentage())) }
            }

            (progress_bar(goal.display_percentage(), false))

            @if goal.is_complete() {
                p class="text-sm font-semibold text-green-600 dark:text-green-400" { "Goal reached!" }
            } @else {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    (format_currency(goal.remaining())) " to go"
                }
            }
        }
    }
}

fn goal_view(goal: Option<&FinancialGoal>) -> Markup {
    let nav_bar = NavBar::new(endpoints::GOAL_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-6"
            {
                h1 class="text-xl font-bold" { "Savings Goal" }

                @if let Some(goal) = goal {
                    section class={ (CARD_STYLE) " space-y-4" }
                    {
                        (goal_progress_view(goal))

                        (amount_form(endpoints::GOAL_SAVINGS_API, "savings", "Add to savings", "Add", None))
                    }
                }

                section class={ (CARD_STYLE) " space-y-4" }
                {
                    (amount_form(
                        endpoints::GOAL_API,
                        "target",
                        "Savings target",
                        "Set target",
                        goal.map(|goal| goal.target_amount),
                    ))

                    @if goal.is_some() {
                        button
                            hx-delete=(endpoints::GOAL_API)
                            hx-confirm="Are you sure you want to reset your goal? Your savings progress will be lost."
                            hx-target-error="#alert-container"
                            class=(BUTTON_DELETE_STYLE)
                        {
                            "Reset goal"
                        }
                    }
                }
            }
        }
    };

    base("Savings Goal", &[dollar_input_styles()], &content)
}

/// Renders the savings goal page.
pub async fn get_goal_page(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let goal = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_goal(user_id, &connection)?
    };

    Ok(goal_view(goal.as_ref()).into_response())
}

//! The account settings page: profile details, base income and the bank link.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    amount::parse_amount,
    auth::{UserID, get_user_by_id, update_user_details, validate_name},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE,
        HeadElement, base, loading_spinner, text_input,
    },
    navigation::NavBar,
    profile::core::{Profile, get_profile_or_default, update_income},
};

/// The script that powers the "Link bank account" button.
///
/// It requests a link token, opens the aggregator's Link widget and posts the
/// resulting public token back to the server.
fn bank_link_script() -> String {
    format!(
        r##"
        async function linkBankAccount() {{
            const response = await fetch("{link_token}", {{ method: "POST" }});
            if (!response.ok) {{
                document.getElementById("alert-container").innerHTML = await response.text();
                return;
            }}
            const {{ link_token }} = await response.json();
            const handler = Plaid.create({{
                token: link_token,
                onSuccess: (public_token) => {{
                    htmx.ajax("POST", "{exchange}", {{
                        values: {{ public_token }},
                        target: "#alert-container",
                    }});
                }},
            }});
            handler.open();
        }}
        "##,
        link_token = endpoints::BANK_LINK_TOKEN,
        exchange = endpoints::BANK_EXCHANGE,
    )
}

/// The fields of the profile form.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub income: String,
}

/// Error messages for each field of the profile form.
#[derive(Debug, Default, PartialEq)]
struct ProfileFormErrors {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    income: Option<String>,
}

impl ProfileFormErrors {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn profile_form(form: &ProfileForm, errors: &ProfileFormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::PROFILE_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "Profile" }

            div class="grid grid-cols-2 gap-4"
            {
                (text_input("first_name", "First name", "text", &form.first_name, errors.first_name.as_deref()))
                (text_input("last_name", "Last name", "text", &form.last_name, errors.last_name.as_deref()))
            }

            (text_input("email", "Email", "email", &form.email, errors.email.as_deref()))
            (text_input("income", "Base income", "text", &form.income, errors.income.as_deref()))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                " Save"
            }
        }
    }
}

fn bank_section(profile: &Profile) -> Markup {
    html! {
        section class={ (CARD_STYLE) " w-full space-y-4" }
        {
            h2 class="text-xl font-bold" { "Bank account" }

            @if profile.is_bank_linked() {
                p id="bank-status" { "Linked" }

                @if let Some(last_import) = profile.bank_last_import {
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Last import: " (last_import)
                    }
                } @else {
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "No transactions have been imported yet."
                    }
                }

                button
                    type="button"
                    hx-post=(endpoints::BANK_IMPORT)
                    hx-target="#alert-container"
                    hx-target-error="#alert-container"
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    "Import transactions"
                }

                button
                    type="button"
                    hx-post=(endpoints::BANK_UNLINK)
                    hx-confirm="Unlink your bank account? Imported transactions are kept."
                    hx-target-error="#alert-container"
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Unlink bank account"
                }
            } @else {
                p id="bank-status" { "Not linked" }

                button
                    type="button"
                    onclick="linkBankAccount()"
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    "Link bank account"
                }
            }
        }
    }
}

fn account_view(form: &ProfileForm, profile: &Profile) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class={ (FORM_CONTAINER_STYLE) " space-y-8" }
        {
            h1 class="text-2xl font-bold self-start" { "Account" }

            (profile_form(form, &ProfileFormErrors::default()))

            (bank_section(profile))
        }
    };

    base(
        "Account",
        &[
            HeadElement::ScriptLink(
                "https://cdn.plaid.com/link/v2/stable/link-initialize.js".to_owned(),
            ),
            HeadElement::ScriptSource(PreEscaped(bank_link_script())),
        ],
        &content,
    )
}

/// The state needed for the account page and profile updates.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the account settings page.
pub async fn get_account_page(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let (user, profile) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_user_by_id(user_id, &connection)?,
            get_profile_or_default(user_id, &connection)?,
        )
    };

    let form = ProfileForm {
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        income: format!("{:.2}", profile.income),
    };

    Ok(account_view(&form, &profile).into_response())
}

struct ValidProfile {
    email: String,
    income: f64,
}

fn validate_profile(form: &ProfileForm) -> Result<ValidProfile, ProfileFormErrors> {
    let mut errors = ProfileFormErrors::default();

    if let Err(message) = validate_name(&form.first_name, "First name") {
        errors.first_name = Some(message);
    }

    if let Err(message) = validate_name(&form.last_name, "Last name") {
        errors.last_name = Some(message);
    }

    let email = match EmailAddress::from_str(form.email.trim()) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.email = Some("Enter a valid email address.".to_owned());
            None
        }
    };

    let income = match parse_amount(&form.income) {
        Ok(income) => Some(income),
        Err(Error::InvalidAmount(message)) => {
            errors.income = Some(message);
            None
        }
        Err(error) => {
            errors.income = Some(error.to_string());
            None
        }
    };

    match (email, income) {
        (Some(email), Some(income)) if errors.is_empty() => Ok(ValidProfile {
            email: email.to_string(),
            income,
        }),
        _ => Err(errors),
    }
}

/// Update the user's name, email and base income.
///
/// Invalid fields are reported by returning the form with an error message
/// under each offending input.
pub async fn update_profile_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let profile = match validate_profile(&form) {
        Ok(profile) => profile,
        Err(errors) => return profile_form(&form, &errors).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = connection
        .unchecked_transaction()
        .map_err(Error::from)
        .and_then(|transaction| {
            update_user_details(
                user_id,
                &form.first_name,
                &form.last_name,
                &profile.email,
                &transaction,
            )?;
            update_income(user_id, profile.income, &transaction)?;
            transaction.commit().map_err(Error::from)
        });

    if let Err(error) = result {
        tracing::error!("could not update profile for user {user_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::ACCOUNT_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use scraper::Selector;

    use crate::{
        auth::get_user_by_id,
        endpoints,
        profile::{
            account_page::{AccountState, ProfileForm, get_account_page, update_profile_endpoint},
            create_profile, get_profile, set_bank_access_token,
        },
        test_utils::{
            assert_form_error_message, assert_form_input_with_value, assert_hx_endpoint,
            assert_hx_redirect, assert_valid_html, create_test_user, get_test_connection,
            must_get_form, parse_html_document, parse_html_fragment,
        },
    };

    fn valid_form() -> ProfileForm {
        ProfileForm {
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            email: "jane@example.com".to_owned(),
            income: "2500.50".to_owned(),
        }
    }

    #[tokio::test]
    async fn page_shows_profile_and_unlinked_bank() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        create_profile(user.id, 1234.5, &connection).unwrap();
        let state = AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_account_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::PROFILE_API, "hx-post");
        assert_form_input_with_value(&form, "first_name", "text", "Test");
        assert_form_input_with_value(&form, "email", "email", "testuser@example.com");
        assert_form_input_with_value(&form, "income", "text", "1234.50");
        let status = document
            .select(&Selector::parse("#bank-status").unwrap())
            .next()
            .unwrap();
        assert_eq!(status.text().collect::<String>(), "Not linked");
    }

    #[tokio::test]
    async fn page_shows_linked_bank() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        set_bank_access_token(user.id, Some("access-token"), &connection).unwrap();
        let state = AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_account_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        let status = document
            .select(&Selector::parse("#bank-status").unwrap())
            .next()
            .unwrap();
        assert_eq!(status.text().collect::<String>(), "Linked");
        let import_button = Selector::parse(&format!(
            "button[hx-post=\"{}\"]",
            endpoints::BANK_IMPORT
        ))
        .unwrap();
        assert!(document.select(&import_button).next().is_some());
    }

    #[tokio::test]
    async fn page_includes_bank_link_script() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let state = AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_account_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        let script = document
            .select(&Selector::parse("head script:not([src])").unwrap())
            .map(|script| script.text().collect::<String>())
            .find(|text| text.contains("linkBankAccount"))
            .expect("Could not find the bank link script");
        assert!(script.contains(&format!("fetch(\"{}\"", endpoints::BANK_LINK_TOKEN)));
        assert!(script.contains(&format!("htmx.ajax(\"POST\", \"{}\"", endpoints::BANK_EXCHANGE)));
        assert!(script.contains("target: \"#alert-container\""));
    }

    #[tokio::test]
    async fn updates_profile() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let state = AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            update_profile_endpoint(State(state.clone()), Extension(user.id), Form(valid_form()))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ACCOUNT_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let updated = get_user_by_id(user.id, &connection).unwrap();
        assert_eq!(updated.first_name, "Jane");
        assert_eq!(updated.email, "jane@example.com");
        assert_eq!(get_profile(user.id, &connection).unwrap().income, 2500.5);
    }

    #[tokio::test]
    async fn invalid_income_returns_form_with_error() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let state = AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = update_profile_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(ProfileForm {
                income: "12.345".to_owned(),
                ..valid_form()
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Amounts can have at most two decimal places.");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_user_by_id(user.id, &connection).unwrap().first_name, "Test");
    }
}

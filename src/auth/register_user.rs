//! The registration page and the endpoint for creating a new user account.
use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    amount::parse_amount,
    auth::{
        NewUser, PasswordHash, ValidatedPassword, create_user, set_auth_cookie, validate_name,
        validate_username,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input, text_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    profile::create_profile,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

/// Error messages for each field of the registration form.
#[derive(Debug, Default, PartialEq)]
struct RegisterFormErrors {
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    income: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
}

impl RegisterFormErrors {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn registration_form(form: &RegisterForm, errors: &RegisterFormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", "text", &form.username, errors.username.as_deref()))
            (text_input("email", "Email", "email", &form.email, errors.email.as_deref()))

            div class="grid grid-cols-2 gap-4"
            {
                (text_input("first_name", "First name", "text", &form.first_name, errors.first_name.as_deref()))
                (text_input("last_name", "Last name", "text", &form.last_name, errors.last_name.as_deref()))
            }

            (text_input("income", "Base income", "text", &form.income, errors.income.as_deref()))

            (password_input(&form.password, PASSWORD_INPUT_MIN_LENGTH, false, errors.password.as_deref()))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password.as_deref()))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form =
        registration_form(&RegisterForm::default(), &RegisterFormErrors::default());
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used to hash new passwords.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
            password_hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub income: String,
    pub password: String,
    pub confirm_password: String,
}

/// The fields of [RegisterForm] after validation.
struct ValidRegistration {
    username: String,
    email: String,
    income: f64,
    password: ValidatedPassword,
}

fn validate_registration(
    form: &RegisterForm,
) -> Result<ValidRegistration, RegisterFormErrors> {
    let mut errors = RegisterFormErrors::default();

    let username = form.username.trim();
    if let Err(message) = validate_username(username) {
        errors.username = Some(message);
    }

    let email = match EmailAddress::from_str(form.email.trim()) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.email = Some("Enter a valid email address.".to_owned());
            None
        }
    };

    if let Err(message) = validate_name(&form.first_name, "First name") {
        errors.first_name = Some(message);
    }

    if let Err(message) = validate_name(&form.last_name, "Last name") {
        errors.last_name = Some(message);
    }

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

    let password = match ValidatedPassword::new(&form.password) {
        Ok(password) => Some(password),
        Err(error) => {
            errors.password = Some(error.to_string());
            None
        }
    };

    if form.password != form.confirm_password {
        errors.confirm_password = Some("Passwords do not match".to_owned());
    }

    match (email, income, password) {
        (Some(email), Some(income), Some(password)) if errors.is_empty() => {
            Ok(ValidRegistration {
                username: username.to_owned(),
                email: email.to_string(),
                income,
                password,
            })
        }
        _ => Err(errors),
    }
}

/// Create a user and their profile, log them in and redirect to the dashboard.
///
/// Invalid fields are reported by returning the form with an error message
/// under each offending input.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = match validate_registration(&form) {
        Ok(registration) => registration,
        Err(errors) => return registration_form(&form, &errors).into_response(),
    };

    let password_hash = match PasswordHash::new(registration.password, state.password_hash_cost)
    {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    let new_user = NewUser {
        username: registration.username,
        email: registration.email,
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        password_hash,
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return get_internal_server_error_redirect();
            }
        };

        create_user_with_profile(new_user, registration.income, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::DuplicateUsername) => {
            let errors = RegisterFormErrors {
                username: Some("That username is already taken.".to_owned()),
                ..Default::default()
            };

            return registration_form(&form, &errors).into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");

            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("An error occurred while setting the auth cookie: {e}");

            get_internal_server_error_redirect()
        }
    }
}

fn create_user_with_profile(
    new_user: NewUser,
    income: f64,
    connection: &Connection,
) -> Result<crate::auth::User, Error> {
    let transaction = connection.unchecked_transaction()?;
    let user = create_user(new_user, &transaction)?;
    create_profile(user.id, income, &transaction)?;
    transaction.commit()?;

    Ok(user)
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::post};
    use axum_test::TestServer;

    use crate::{
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, get_user_by_username},
        endpoints,
        profile::get_profile,
        test_utils::{TEST_PASSWORD, create_test_user, get_test_connection},
    };

    use super::{RegisterForm, RegistrationState, register_user};

    fn get_test_state() -> RegistrationState {
        RegistrationState {
            cookie_key: create_cookie_key("42"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            password_hash_cost: 4,
        }
    }

    fn get_test_server(state: RegistrationState) -> TestServer {
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "jane.doe".to_owned(),
            email: "jane@example.com".to_owned(),
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            income: "4500.50".to_owned(),
            password: TEST_PASSWORD.to_owned(),
            confirm_password: TEST_PASSWORD.to_owned(),
        }
    }

    async fn get_error_messages(server: &TestServer, form: &RegisterForm) -> Vec<String> {
        let text = server.post(endpoints::USERS).form(form).await.text();
        let fragment = scraper::Html::parse_fragment(&text);
        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();

        fragment
            .select(&p_selector)
            .map(|paragraph| paragraph.text().collect::<String>().to_lowercase())
            .collect()
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server.post(endpoints::USERS).form(&valid_form()).await;

        response.assert_status_see_other();
        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
        let _ = response.cookie(COOKIE_TOKEN);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_username("jane.doe", &connection).unwrap();
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.email, "jane@example.com");
        assert!(user.password_hash.verify(TEST_PASSWORD).unwrap());
        assert_eq!(get_profile(user.id, &connection).unwrap().income, 4500.5);
    }

    #[tokio::test]
    async fn create_user_fails_with_taken_username() {
        let state = get_test_state();
        let existing_user = create_test_user(&state.db_connection.lock().unwrap());
        let server = get_test_server(state);
        let form = RegisterForm {
            username: existing_user.username,
            ..valid_form()
        };

        let messages = get_error_messages(&server, &form).await;

        assert_eq!(messages, vec!["that username is already taken.".to_owned()]);
    }

    #[tokio::test]
    async fn create_user_fails_when_password_is_weak() {
        let server = get_test_server(get_test_state());
        let form = RegisterForm {
            password: "foo".to_owned(),
            confirm_password: "foo".to_owned(),
            ..valid_form()
        };

        let messages = get_error_messages(&server, &form).await;

        assert_eq!(messages.len(), 1, "want 1 error, got {messages:?}");
        assert!(
            messages[0].contains("password is too weak"),
            "'{}' does not contain the text 'password is too weak'",
            messages[0]
        );
    }

    #[tokio::test]
    async fn create_user_fails_when_passwords_do_not_match() {
        let server = get_test_server(get_test_state());
        let form = RegisterForm {
            confirm_password: "thisisadifferentpassword".to_owned(),
            ..valid_form()
        };

        let messages = get_error_messages(&server, &form).await;

        assert_eq!(messages, vec!["passwords do not match".to_owned()]);
    }

    #[tokio::test]
    async fn create_user_reports_every_invalid_field() {
        let server = get_test_server(get_test_state());
        let form = RegisterForm {
            username: "jane doe".to_owned(),
            email: "not-an-email".to_owned(),
            first_name: "".to_owned(),
            last_name: "a".repeat(31),
            income: "12.345".to_owned(),
            ..valid_form()
        };

        let messages = get_error_messages(&server, &form).await;

        assert_eq!(messages.len(), 5, "want 5 errors, got {messages:?}");
        assert!(messages[0].contains("username"));
        assert!(messages[1].contains("email"));
        assert!(messages[2].contains("first name"));
        assert!(messages[3].contains("last name"));
        assert!(messages[4].contains("two decimal places"));
    }
}

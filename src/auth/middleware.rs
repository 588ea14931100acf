//! Route guards that require a valid auth cookie and keep the session alive.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        build_log_in_redirect_url,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::build_log_in_redirect_url_from_target,
    },
    endpoints,
};

/// The state needed for the auth guards.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// The minimum time left on a session after an authenticated request.
const SESSION_EXTENSION: Duration = Duration::minutes(5);

/// How a guard sends an unauthenticated user to the log-in page.
#[derive(Clone, Copy)]
enum Rejection {
    /// A 303 redirect for full page loads.
    Redirect,
    /// An `HX-Redirect` header for requests made by htmx.
    HxRedirect,
}

impl Rejection {
    fn respond(self, log_in_url: String) -> Response {
        match self {
            Rejection::Redirect => Redirect::to(&log_in_url).into_response(),
            Rejection::HxRedirect => (HxRedirect(log_in_url), StatusCode::OK).into_response(),
        }
    }
}

/// The log-in URL that brings the user back to where they were going.
fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        tracing::warn!(
            "Could not build a redirect URL for {}, falling back to the dashboard.",
            request.uri().path()
        );

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

async fn guard(state: AuthState, request: Request, next: Next, rejection: Rejection) -> Response {
    let log_in_url = log_in_url_for(&request);

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not get the cookie jar: {error:?}");
            return rejection.respond(log_in_url);
        }
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected auth cookie: {error}");
            return rejection.respond(log_in_url);
        }
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = extend_auth_cookie_duration_if_needed(jar.clone(), SESSION_EXTENSION)
        .unwrap_or_else(|error| {
            tracing::error!("Could not extend the auth cookie, keeping the old one: {error}");
            jar
        });
    let cookie_headers = jar.into_response();

    let (mut parts, body) = response.into_parts();
    for cookie in cookie_headers.headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, cookie.clone());
    }

    Response::from_parts(parts, body)
}

/// Only let requests with a valid auth cookie through to page routes.
///
/// The user's [crate::auth::UserID] is added to the request extensions, so
/// handlers can take `Extension<UserID>`. Requests without a valid cookie are
/// redirected to the log-in page with a `redirect_url` back to the page.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, Rejection::Redirect).await
}

/// Like [auth_guard], but for routes called by htmx.
///
/// Rejected requests get an `HX-Redirect` to the log-in page that returns the
/// user to the page the request was made from.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, Rejection::HxRedirect).await
}

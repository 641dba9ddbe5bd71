//! Auth routes
//!
//! ```text
//! GET  /api/auth/{provider}/login     302 to the provider (+ verifier cookie, direct flow)
//! GET  /api/auth/{provider}/callback  direct: exchange + 302 entry page
//!                                     relayed: state/code cookies + 302 /complete
//! GET  /api/auth/{provider}/complete  bridge: verifier by state, exchange + 302 entry page
//! POST /api/auth/{provider}/token     {code, codeVerifier} -> {auth}, nothing committed
//! GET  /api/auth/{provider}/session   session snapshot
//! POST /api/auth/{provider}/logout    204
//! GET  /health
//! ```

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, SecondsFormat, Utc};
use moodmix_core::auth::callback::CallbackParams;
use moodmix_core::auth::error::AuthError;
use moodmix_core::{AuthController, SessionSnapshot};
use moodmix_domain::{AuthRecord, CallbackFlow, Profile, Provider};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::cookies::{
    read_cookie, relay_code_cookie, relay_state_cookie, verifier_cookie, CookiePolicy,
};

/// Shared state of every route
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<AuthController>,
}

impl AppState {
    /// State routing every request to `controller`
    pub const fn new(controller: Arc<AuthController>) -> Self {
        Self { controller }
    }

    fn cookies(&self) -> CookiePolicy {
        let config = self.controller.config();
        CookiePolicy::for_app_url(&config.app_url, config.pkce_ttl.as_secs())
    }
}

/// Router serving the auth routes and `/health`
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/{provider}/login", get(login))
        .route("/api/auth/{provider}/callback", get(callback))
        .route("/api/auth/{provider}/complete", get(complete))
        .route("/api/auth/{provider}/token", post(token))
        .route("/api/auth/{provider}/session", get(session))
        .route("/api/auth/{provider}/logout", post(logout))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", app: "moodmix", version: env!("CARGO_PKG_VERSION") })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { message: message.into() })).into_response()
}

fn parse_provider(raw: &str) -> Result<Provider, Response> {
    raw.parse::<Provider>()
        .map_err(|_| error_response(StatusCode::NOT_FOUND, format!("Unknown provider: {raw}")))
}

/// `302 Found` to `location` carrying the cookies changed in `jar`
fn found(location: &str, jar: CookieJar) -> Response {
    (StatusCode::FOUND, jar, [(LOCATION, location.to_string())]).into_response()
}

fn log_outcome(provider: Provider, step: &str, outcome: &Result<(), AuthError>) {
    if let Err(err) = outcome {
        warn!(%provider, step, error = %err, "login step failed");
    }
}

async fn login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Response {
    let provider = match parse_provider(&provider) {
        Ok(provider) => provider,
        Err(response) => return response,
    };

    match state.controller.begin_login(provider).await {
        Ok(redirect) => {
            let jar = match provider.callback_flow() {
                CallbackFlow::Direct => {
                    state.cookies().set(jar, &verifier_cookie(provider), &redirect.code_verifier)
                }
                CallbackFlow::StateRelayed => jar,
            };
            found(&redirect.authorization_url, jar)
        }
        Err(err) => {
            let outcome = Err(err);
            log_outcome(provider, "login", &outcome);
            found(&state.controller.entry_redirect(provider, &outcome), jar)
        }
    }
}

async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Response {
    let provider = match parse_provider(&provider) {
        Ok(provider) => provider,
        Err(response) => return response,
    };
    let cookies = state.cookies();

    match provider.callback_flow() {
        CallbackFlow::Direct => {
            let verifier = read_cookie(&jar, &verifier_cookie(provider));
            let outcome = state
                .controller
                .handle_direct_callback(provider, &params, verifier.as_deref())
                .await;
            log_outcome(provider, "callback", &outcome);

            found(
                &state.controller.entry_redirect(provider, &outcome),
                cookies.clear(jar, &verifier_cookie(provider)),
            )
        }
        CallbackFlow::StateRelayed => match state.controller.relay_callback(provider, &params) {
            Ok(ticket) => {
                info!(%provider, state = %ticket.state, "relaying callback to bridge step");
                let complete = format!(
                    "{}/api/auth/{provider}/complete",
                    state.controller.app_url().trim_end_matches('/')
                );
                let jar = cookies.set(jar, &relay_state_cookie(provider), &ticket.state);
                found(&complete, cookies.set(jar, &relay_code_cookie(provider), &ticket.code))
            }
            Err(err) => {
                let outcome = Err(err);
                log_outcome(provider, "callback", &outcome);
                found(&state.controller.entry_redirect(provider, &outcome), jar)
            }
        },
    }
}

async fn complete(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Response {
    let provider = match parse_provider(&provider) {
        Ok(provider) => provider,
        Err(response) => return response,
    };
    let relay_state = read_cookie(&jar, &relay_state_cookie(provider));
    let relay_code = read_cookie(&jar, &relay_code_cookie(provider));

    let outcome = state
        .controller
        .complete_relayed(provider, relay_state.as_deref(), relay_code.as_deref())
        .await;
    log_outcome(provider, "complete", &outcome);

    let cookies = state.cookies();
    let jar = cookies.clear(jar, &relay_state_cookie(provider));
    found(
        &state.controller.entry_redirect(provider, &outcome),
        cookies.clear(jar, &relay_code_cookie(provider)),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    code_verifier: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    auth: AuthRecord,
}

async fn token(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Response {
    let provider = match parse_provider(&provider) {
        Ok(provider) => provider,
        Err(response) => return response,
    };
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(%provider, error = %rejection, "rejected token request body");
            TokenRequest::default()
        }
    };

    let (Some(code), Some(code_verifier)) = (
        request.code.filter(|code| !code.is_empty()),
        request.code_verifier.filter(|verifier| !verifier.is_empty()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required parameters");
    };

    match state.controller.exchange_for_bridge(provider, &code, &code_verifier).await {
        Ok(auth) => Json(TokenResponse { auth }).into_response(),
        Err(err) => {
            warn!(%provider, error = %err, "bridge token exchange failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    #[serde(flatten)]
    session: SessionSnapshot,
    authenticated: bool,
    /// RFC 3339 expiry of the current access token
    expires_at: Option<String>,
    profile: Option<Profile>,
}

fn expiry_timestamp(expires_at_ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(expires_at_ms)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

async fn session(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    let provider = match parse_provider(&provider) {
        Ok(provider) => provider,
        Err(response) => return response,
    };
    let record = state.controller.auth_record(provider);

    Json(SessionResponse {
        session: state.controller.session(provider),
        authenticated: record.is_some(),
        expires_at: record.as_ref().and_then(|record| expiry_timestamp(record.expires_at)),
        profile: record.map(|record| record.profile),
    })
    .into_response()
}

async fn logout(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    let provider = match parse_provider(&provider) {
        Ok(provider) => provider,
        Err(response) => return response,
    };

    match state.controller.logout(provider).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            warn!(%provider, error = %err, "logout failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_rfc3339_utc() {
        assert_eq!(expiry_timestamp(1_700_000_000_000).as_deref(), Some("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn unknown_provider_is_not_found() {
        let response = parse_provider("soundcloud").unwrap_err();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(parse_provider("YouTube").unwrap(), Provider::YouTube);
    }
}

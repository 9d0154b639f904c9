//! Auth endpoints
//!
//! POST /auth/register, POST /auth/login, GET /auth/me
//!
//! Successful register/login responses carry the signed session token
//! both in the JSON body and as a session cookie.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::AppState;
use crate::api::converters::account_to_response;
use crate::api::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::auth::{CurrentUser, Session, create_session_token};
use crate::data::models::Account;
use crate::error::{AppError, Result};
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::AccountService;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

fn issue_session(state: &AppState, account: &Account) -> Result<(String, Cookie<'static>)> {
    let session = Session::new(
        account.id.clone(),
        account.username.clone(),
        account.role(),
        state.config.auth.session_max_age,
    );
    let token = create_session_token(&session, &state.config.auth.session_secret)?;

    // Expiry is enforced by the signed token itself.
    let cookie = Cookie::build(("session", token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .build();

    Ok((token, cookie))
}

async fn auth_response(state: &AppState, account: Account, token: String) -> Result<AuthResponse> {
    let followers = state.db.get_follower_ids(&account.id).await?.len() as i64;
    let following = state.db.get_following_ids(&account.id).await?.len() as i64;

    Ok(AuthResponse {
        token,
        account: account_to_response(account, followers, following, &state.storage),
    })
}

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/auth/register"])
        .start_timer();

    let service = AccountService::new(state.db.clone(), state.storage.clone());
    let account = service
        .register(&req.username, req.email, &req.password, req.display_name)
        .await?;

    let (token, cookie) = issue_session(&state, &account)?;
    let response = auth_response(&state, account, token).await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/v1/auth/register", "200"])
        .inc();

    Ok((jar.add(cookie), Json(response)))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/auth/login"])
        .start_timer();

    let service = AccountService::new(state.db.clone(), state.storage.clone());
    let account = service.login(&req.identifier, &req.password).await?;

    let (token, cookie) = issue_session(&state, &account)?;
    let response = auth_response(&state, account, token).await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/v1/auth/login", "200"])
        .inc();

    Ok((jar.add(cookie), Json(response)))
}

/// GET /auth/me
async fn me(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<crate::api::dto::AccountResponse>> {
    let account = state
        .db
        .get_account(&session.account_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let followers = state.db.get_follower_ids(&account.id).await?.len() as i64;
    let following = state.db.get_following_ids(&account.id).await?.len() as i64;

    Ok(Json(account_to_response(
        account,
        followers,
        following,
        &state.storage,
    )))
}

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    auth::SESSION_COOKIE,
    domain::User,
    error::Result,
    service::account_service::SignupRequest,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub user: User,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let ctx = &state.service_context;
    let (user, token) = ctx.account_service.signup(request).await?;
    let cookie = ctx.auth_service.session_cookie(&token);

    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(SessionResponse {
            message: "Registration successful".to_string(),
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let ctx = &state.service_context;
    let (user, token) = ctx.account_service.login(&req.email, &req.password).await?;
    let cookie = ctx.auth_service.session_cookie(&token);

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    let ctx = &state.service_context;

    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = ctx.account_service.logout(session_cookie.value()).await {
            tracing::warn!("Failed to invalidate session on logout: {}", e);
        }
    }

    let jar = jar.add(ctx.auth_service.logout_cookie());

    Ok((jar, StatusCode::NO_CONTENT))
}

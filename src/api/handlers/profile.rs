use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{UpdateProfileRequest, User},
    error::Result,
    service::account_service::ChangePasswordRequest,
};

pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.user)
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    let user = state.service_context.account_service
        .update_profile(current.user.id, request)
        .await?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    state.service_context.account_service
        .change_password(current.user.id, request)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

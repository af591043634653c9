use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Extension, Json,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::Result,
    payments::paymongo::SIGNATURE_HEADER,
    service::payment_service::{CheckoutRequest, CheckoutResponse, RetryRequest},
};

/// Book a slot and open a hosted checkout for it.
#[utoipa::path(
    post,
    path = "/api/payments/checkout",
    tag = "payments",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout session opened", body = CheckoutResponse),
        (status = 400, description = "Invalid amount, service or slot"),
        (status = 401, description = "No session"),
        (status = 403, description = "Body names another user"),
        (status = 409, description = "Slot already booked or held"),
        (status = 500, description = "Unexpected failure, written to the error log"),
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let response = state.service_context.payment_service
        .checkout(&current.user, request)
        .await?;
    Ok(Json(response))
}

/// Open a new checkout for an appointment that is still awaiting payment.
#[utoipa::path(
    post,
    path = "/api/payments/retry",
    tag = "payments",
    request_body = RetryRequest,
    responses(
        (status = 200, description = "Checkout session opened", body = CheckoutResponse),
        (status = 403, description = "Appointment belongs to someone else"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment is no longer pending"),
    )
)]
pub async fn retry(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<RetryRequest>,
) -> Result<Json<CheckoutResponse>> {
    let response = state.service_context.payment_service
        .retry(&current.user, request)
        .await?;
    Ok(Json(response))
}

/// Receive payment events from the provider.
#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    tag = "payments",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = String),
        (status = 401, description = "Signature missing or invalid"),
        (status = 500, description = "Database update failed; the provider will redeliver"),
    )
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    state.service_context.payment_service
        .handle_webhook(&body, signature)
        .await?;

    Ok("OK")
}

pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    Router,
    routing::{get, post, put, delete},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Settings,
    domain::{InspirationImage, PaymentMethod},
    service::{
        ServiceContext,
        payment_service::{BookingData, CheckoutRequest, CheckoutResponse, RetryRequest},
    },
    uploads,
};
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::payments::checkout,
        handlers::payments::retry,
        handlers::payments::webhook,
    ),
    components(schemas(
        CheckoutRequest,
        RetryRequest,
        CheckoutResponse,
        BookingData,
        PaymentMethod,
        InspirationImage,
    )),
    tags((name = "payments", description = "Hosted checkout and provider webhooks"))
)]
pub struct ApiDoc;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let uploads_dir = settings.uploads.dir.clone();
    let app_state = AppState::new(service_context, settings);

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .route("/api", get(handlers::root::api_info))

        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))

        .nest("/api", api_routes(app_state.clone()))
        .nest("/public", public_routes())
        .nest("/admin", admin_routes(app_state.clone()))

        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service(uploads::PUBLIC_PREFIX, ServeDir::new(uploads_dir))

        .with_state(app_state)

        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/me", get(handlers::profile::me))
        .route("/me", put(handlers::profile::update_profile))
        .route("/me/password", put(handlers::profile::change_password))
        .route("/appointments", get(handlers::appointments::list_mine))
        .route("/appointments/:id", get(handlers::appointments::get_mine))
        .route(
            "/uploads/inspiration",
            post(handlers::uploads::upload_inspiration)
                .layer(DefaultBodyLimit::max(uploads::MAX_FILE_SIZE + 64 * 1024)),
        )
        .route("/payments/checkout", post(handlers::payments::checkout))
        .route("/payments/retry", post(handlers::payments::retry))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ));

    Router::new()
        // The provider authenticates with a signature, not a session
        .route("/payments/webhook", post(handlers::payments::webhook))
        .merge(authenticated)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/appointment-types", get(handlers::public::list_appointment_types))
        .route("/faqs", get(handlers::public::list_faqs))
        .route("/reminders", get(handlers::public::list_reminders))
        .route("/calendar", get(handlers::public::calendar))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/appointments", get(handlers::admin::list_appointments))
        .route("/appointments/:id", get(handlers::admin::get_appointment))
        .route("/appointments/:id/status", put(handlers::admin::update_appointment_status))
        .route("/error-logs", get(handlers::admin::error_logs))
        .nest("/appointment-types", appointment_type_routes())
        .nest("/faqs", faq_routes())
        .nest("/reminders", reminder_routes())
        .nest("/schedule-slots", schedule_slot_routes())
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}

fn appointment_type_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::appointment_types::list))
        .route("/", post(handlers::appointment_types::create))
        .route("/reorder", post(handlers::appointment_types::reorder))
        .route("/seed", post(handlers::appointment_types::seed))
        .route("/slug/:slug", get(handlers::appointment_types::get_by_slug))
        .route("/:id", get(handlers::appointment_types::get))
        .route("/:id", put(handlers::appointment_types::update))
        .route("/:id", delete(handlers::appointment_types::delete))
}

fn faq_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::content::list_faqs))
        .route("/", post(handlers::content::create_faq))
        .route("/reorder", post(handlers::content::reorder_faqs))
        .route("/:id", get(handlers::content::get_faq))
        .route("/:id", put(handlers::content::update_faq))
        .route("/:id", delete(handlers::content::delete_faq))
}

fn reminder_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::content::list_reminders))
        .route("/", post(handlers::content::create_reminder))
        .route("/reorder", post(handlers::content::reorder_reminders))
        .route("/:id", get(handlers::content::get_reminder))
        .route("/:id", put(handlers::content::update_reminder))
        .route("/:id", delete(handlers::content::delete_reminder))
}

fn schedule_slot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::schedule_slots::list))
        .route("/", post(handlers::schedule_slots::create))
        .route("/seed", post(handlers::schedule_slots::seed))
        .route("/:id", put(handlers::schedule_slots::update))
        .route("/:id", delete(handlers::schedule_slots::delete))
}

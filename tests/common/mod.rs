#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower::ServiceExt;

use lacquer::{
    api,
    config::Settings,
    domain::{AppointmentType, CreateUserRequest, SlotState, UserRole},
    error::{AppError, Result},
    payments::{CheckoutSession, CheckoutSessionRequest, PaymentGateway},
    service::ServiceContext,
};

/// Stand-in for the provider: hands out numbered sessions, or fails with a
/// configured status and payload.
#[derive(Default)]
pub struct FakeGateway {
    calls: AtomicUsize,
    failure: Mutex<Option<(u16, Value)>>,
    requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl FakeGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, status: u16, body: Value) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some((status, body));
        }
    }

    pub fn last_request(&self) -> Option<CheckoutSessionRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<CheckoutSession> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let failure = self.failure.lock().ok().and_then(|f| f.clone());
        if let Some((status, body)) = failure {
            return Err(AppError::Upstream { status, body });
        }

        Ok(CheckoutSession {
            session_id: format!("cs_test_{}", n),
            checkout_url: format!("https://checkout.test/cs_test_{}", n),
            payment_intent_id: format!("pi_test_{}", n),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub ctx: Arc<ServiceContext>,
    pub gateway: Arc<FakeGateway>,
    pub pool: SqlitePool,
}

pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    // One connection, so every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

impl TestApp {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_settings(Settings::default()).await
    }

    pub async fn with_settings(settings: Settings) -> anyhow::Result<Self> {
        let pool = test_pool().await?;
        let gateway = Arc::new(FakeGateway::default());
        let ctx = Arc::new(ServiceContext::new(pool.clone(), &settings, gateway.clone())?);
        let router = api::create_app(ctx.clone(), Arc::new(settings));

        Ok(Self { router, ctx, gateway, pool })
    }

    /// Default services and weekly slots, returning the first service.
    pub async fn seed_catalog(&self) -> anyhow::Result<AppointmentType> {
        self.ctx.appointment_type_service.seed_defaults().await?;
        self.ctx.booking_service.seed_default_slots().await?;
        let types = self.ctx.appointment_type_service.list(false).await?;
        types
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no appointment types seeded"))
    }

    /// Start of the first open slot from tomorrow on, skipping `skip` of them.
    pub async fn open_slot(&self, skip: usize) -> anyhow::Result<DateTime<Utc>> {
        let rules = self.ctx.booking_service.rules();
        let from = rules.local_date(Utc::now() + Duration::days(1));
        let to = from + Duration::days(13);
        let days = self.ctx.booking_service.calendar(from, to).await?;

        days.iter()
            .flat_map(|d| d.slots.iter())
            .filter(|s| s.state == SlotState::Available)
            .nth(skip)
            .map(|s| s.starts_at)
            .ok_or_else(|| anyhow::anyhow!("no open slot in the next two weeks"))
    }

    pub async fn send(&self, request: Request<Body>) -> anyhow::Result<(StatusCode, Value, Option<String>)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok((status, body, cookie))
    }

    pub async fn post_json(
        &self,
        uri: &str,
        cookie: Option<&str>,
        body: Value,
    ) -> anyhow::Result<(StatusCode, Value, Option<String>)> {
        self.send(json_request("POST", uri, cookie, body)?).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let (status, body, _) = self.send(builder.body(Body::empty())?).await?;
        Ok((status, body))
    }

    /// Sign up a customer and return their session cookie.
    pub async fn signup(&self, email: &str) -> anyhow::Result<String> {
        let (status, body, cookie) = self
            .post_json(
                "/auth/signup",
                None,
                json!({
                    "email": email,
                    "password": "polish-and-shine",
                    "full_name": "Test Client",
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {} {}", status, body);
        cookie.ok_or_else(|| anyhow::anyhow!("signup set no session cookie"))
    }

    /// Create an administrator directly and log them in.
    pub async fn admin(&self) -> anyhow::Result<String> {
        self.ctx
            .user_repo
            .create(CreateUserRequest {
                email: "owner@lacquer.test".to_string(),
                full_name: "Salon Owner".to_string(),
                phone: None,
                password: "owner-password".to_string(),
                role: UserRole::Admin,
            })
            .await?;

        let (status, _, cookie) = self
            .post_json(
                "/auth/login",
                None,
                json!({ "email": "owner@lacquer.test", "password": "owner-password" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "admin login failed: {}", status);
        cookie.ok_or_else(|| anyhow::anyhow!("login set no session cookie"))
    }

    pub async fn count(&self, table: &str) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Value,
) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::from(serde_json::to_vec(&body)?))?)
}

pub fn checkout_body(appointment_type: &AppointmentType, at: DateTime<Utc>) -> Value {
    json!({
        "amount": 650.0,
        "method": "gcash",
        "bookingData": {
            "appointmentTypeId": appointment_type.id,
            "fullName": "Test Client",
            "phone": "09171234567",
            "notes": "Short almond, nude base",
        },
        "inspoData": [{
            "file_name": "almond.png",
            "path": "/uploads/almond.png",
            "content_type": "image/png",
            "size": 1024,
        }],
        "combinedDateAndTime": at.to_rfc3339(),
    })
}

pub fn paid_event(payment_intent_id: &str, appointment_id: &str) -> Value {
    json!({
        "data": {
            "id": "evt_paid",
            "attributes": {
                "type": "payment.paid",
                "data": {
                    "id": "pay_live_1",
                    "attributes": {
                        "payment_intent_id": payment_intent_id,
                        "paid_at": 1_700_000_000,
                        "metadata": { "appointmentId": appointment_id },
                    }
                }
            }
        }
    })
}

pub fn failed_event(payment_intent_id: &str, message: Option<&str>, code: Option<&str>) -> Value {
    json!({
        "data": {
            "id": "evt_failed",
            "attributes": {
                "type": "payment.failed",
                "data": {
                    "id": "pay_failed_1",
                    "attributes": {
                        "payment_intent_id": payment_intent_id,
                        "failed_message": message,
                        "failed_code": code,
                    }
                }
            }
        }
    })
}

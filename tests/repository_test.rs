mod common;

use chrono::{Duration, NaiveTime, Utc};
use uuid::Uuid;

use common::test_pool;
use lacquer::{
    auth::AuthService,
    domain::{
        AppointmentStatus, CreateAppointmentTypeRequest, CreateFaqRequest,
        CreateScheduleSlotRequest, CreateUserRequest, ErrorContext, NewAppointment, NewPayment,
        PaidOutcome, PaymentMethod, PaymentStatus, UpdateScheduleSlotRequest, UserRole,
    },
    error::AppError,
    repository::*,
};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
async fn test_user_crud() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    let user = repo
        .create(CreateUserRequest {
            email: "nails@example.com".to_string(),
            full_name: "Nail Client".to_string(),
            phone: Some("09170000000".to_string()),
            password: "secure_password123".to_string(),
            role: UserRole::Customer,
        })
        .await?;
    assert_eq!(user.role, UserRole::Customer);

    let found = repo.find_by_email("nails@example.com").await?;
    assert_eq!(found.map(|u| u.id), Some(user.id));

    let (_, hash) = repo.find_credentials("nails@example.com").await?.unwrap();
    assert_ne!(hash, "secure_password123");
    assert!(lacquer::auth::verify_password("secure_password123", &hash)?);

    let admin = repo.set_role(user.id, UserRole::Admin).await?;
    assert!(admin.is_admin());
    assert_eq!(repo.list(10, 0).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_sessions_expire_and_invalidate() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let users = SqliteUserRepository::new(pool.clone());
    let user = users
        .create(CreateUserRequest {
            email: "session@example.com".to_string(),
            full_name: "Session User".to_string(),
            phone: None,
            password: "secure_password123".to_string(),
            role: UserRole::Customer,
        })
        .await?;

    let auth = AuthService::new(pool.clone(), 24, false);
    let (session, token) = auth.create_session(user.id).await?;
    assert_eq!(session.user_id, user.id);
    assert!(auth.validate_session(&token).await?.is_some());
    assert!(auth.validate_session("not-a-token").await?.is_none());

    auth.invalidate_user_sessions(user.id).await?;
    assert!(auth.validate_session(&token).await?.is_none());

    let expired = AuthService::new(pool.clone(), -1, false);
    let (_, stale) = expired.create_session(user.id).await?;
    assert!(expired.validate_session(&stale).await?.is_none());
    assert_eq!(expired.cleanup_expired_sessions().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_schedule_slots_are_unique_per_start() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteScheduleSlotRepository::new(pool.clone());

    let slot = repo
        .create(CreateScheduleSlotRequest { weekday: 2, start_time: time(10, 0), end_time: time(12, 0) })
        .await?;
    assert_eq!(slot.weekday, 2);
    assert!(slot.is_active);

    let duplicate = repo
        .create(CreateScheduleSlotRequest { weekday: 2, start_time: time(10, 0), end_time: time(11, 0) })
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let updated = repo
        .update(slot.id, UpdateScheduleSlotRequest { is_active: Some(false), ..Default::default() })
        .await?;
    assert!(!updated.is_active);
    assert!(repo.list(false).await?.is_empty());
    assert_eq!(repo.list(true).await?.len(), 1);

    repo.delete(slot.id).await?;
    assert!(matches!(repo.delete(slot.id).await, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_faq_reorder() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteFaqRepository::new(pool.clone());

    let a = repo.create(CreateFaqRequest { question: "A?".into(), answer: "a".into() }).await?;
    let b = repo.create(CreateFaqRequest { question: "B?".into(), answer: "b".into() }).await?;
    let c = repo.create(CreateFaqRequest { question: "C?".into(), answer: "c".into() }).await?;

    repo.reorder(&[c.id, a.id, b.id]).await?;
    let order: Vec<Uuid> = repo.list(false).await?.into_iter().map(|f| f.id).collect();
    assert_eq!(order, vec![c.id, a.id, b.id]);
    Ok(())
}

#[tokio::test]
async fn test_paid_payment_schedules_in_one_step() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let users = SqliteUserRepository::new(pool.clone());
    let types = SqliteAppointmentTypeRepository::new(pool.clone());
    let appointments = SqliteAppointmentRepository::new(pool.clone());
    let payments = SqlitePaymentRepository::new(pool.clone());

    let user = users
        .create(CreateUserRequest {
            email: "paid@example.com".to_string(),
            full_name: "Paid Client".to_string(),
            phone: None,
            password: "secure_password123".to_string(),
            role: UserRole::Customer,
        })
        .await?;
    let gel = types
        .create(CreateAppointmentTypeRequest {
            name: "Gel Manicure".to_string(),
            slug: Some("gel-manicure".to_string()),
            description: None,
            price_cents: 55_000,
            duration_minutes: 60,
        })
        .await?;

    let at = (Utc::now() + Duration::days(3))
        .date_naive()
        .and_time(time(2, 0))
        .and_utc();
    let appointment = appointments
        .create_in_free_slot(
            NewAppointment {
                user_id: user.id,
                appointment_type_id: gel.id,
                scheduled_at: at,
                full_name: "Paid Client".to_string(),
                phone: None,
                notes: None,
                inspirations: vec![],
            },
            Utc::now() - Duration::minutes(30),
        )
        .await?;

    payments
        .create(NewPayment {
            appointment_id: appointment.id,
            checkout_session_id: "cs_1".to_string(),
            payment_intent_id: "pi_1".to_string(),
            amount_cents: 55_000,
            currency: "PHP".to_string(),
            method: PaymentMethod::Card,
        })
        .await?;

    assert!(payments.mark_paid("pi_missing", "pay_x", Utc::now()).await?.is_none());

    let (paid, outcome) = payments.mark_paid("pi_1", "pay_1", Utc::now()).await?.unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(outcome, PaidOutcome::Confirmed);

    let (_, again) = payments.mark_paid("pi_1", "pay_1", Utc::now()).await?.unwrap();
    assert_eq!(again, PaidOutcome::AlreadyPaid);
    assert_eq!(
        appointments.find_by_id(appointment.id).await?.unwrap().status,
        AppointmentStatus::Scheduled
    );

    let late_failure = payments.mark_failed("pi_1", None, "Declined").await?.unwrap();
    assert_eq!(late_failure.status, PaymentStatus::Paid);

    // The confirmed booking now blocks the slot regardless of hold age
    let second = appointments
        .create_in_free_slot(
            NewAppointment {
                user_id: user.id,
                appointment_type_id: gel.id,
                scheduled_at: at,
                full_name: "Someone Else".to_string(),
                phone: None,
                notes: None,
                inspirations: vec![],
            },
            Utc::now() + Duration::days(1),
        )
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    assert_eq!(appointments.count_by_type(gel.id).await?, 1);
    Ok(())
}

struct Booked {
    appointments: SqliteAppointmentRepository,
    payments: SqlitePaymentRepository,
    first: Uuid,
    second: Uuid,
}

/// Two pending bookings on one slot, each with its own pending payment
/// (`pi_1` and `pi_2`). The second took the slot after the first's hold lapsed.
async fn lapsed_hold_pair() -> anyhow::Result<Booked> {
    let pool = test_pool().await?;
    let users = SqliteUserRepository::new(pool.clone());
    let types = SqliteAppointmentTypeRepository::new(pool.clone());
    let appointments = SqliteAppointmentRepository::new(pool.clone());
    let payments = SqlitePaymentRepository::new(pool.clone());

    let user = users
        .create(CreateUserRequest {
            email: "slot@example.com".to_string(),
            full_name: "Slot Client".to_string(),
            phone: None,
            password: "secure_password123".to_string(),
            role: UserRole::Customer,
        })
        .await?;
    let gel = types
        .create(CreateAppointmentTypeRequest {
            name: "Gel Manicure".to_string(),
            slug: Some("gel-manicure".to_string()),
            description: None,
            price_cents: 55_000,
            duration_minutes: 60,
        })
        .await?;

    let at = (Utc::now() + Duration::days(3))
        .date_naive()
        .and_time(time(2, 0))
        .and_utc();
    let new = |name: &str| NewAppointment {
        user_id: user.id,
        appointment_type_id: gel.id,
        scheduled_at: at,
        full_name: name.to_string(),
        phone: None,
        notes: None,
        inspirations: vec![],
    };

    let first = appointments.create_in_free_slot(new("First"), Utc::now() - Duration::minutes(30)).await?;
    // A cutoff in the future treats the first hold as lapsed
    let second = appointments.create_in_free_slot(new("Second"), Utc::now() + Duration::minutes(1)).await?;

    for (appointment, n) in [(&first, 1), (&second, 2)] {
        payments
            .create(NewPayment {
                appointment_id: appointment.id,
                checkout_session_id: format!("cs_{}", n),
                payment_intent_id: format!("pi_{}", n),
                amount_cents: 55_000,
                currency: "PHP".to_string(),
                method: PaymentMethod::Gcash,
            })
            .await?;
    }

    Ok(Booked { appointments, payments, first: first.id, second: second.id })
}

#[tokio::test]
async fn test_paid_never_double_books_a_slot() -> anyhow::Result<()> {
    let booked = lapsed_hold_pair().await?;

    let (_, outcome) = booked.payments.mark_paid("pi_2", "pay_2", Utc::now()).await?.unwrap();
    assert_eq!(outcome, PaidOutcome::Confirmed);

    let (late, outcome) = booked.payments.mark_paid("pi_1", "pay_1", Utc::now()).await?.unwrap();
    assert_eq!(late.status, PaymentStatus::Paid);
    assert!(matches!(outcome, PaidOutcome::NotScheduled { .. }));

    let first = booked.appointments.find_by_id(booked.first).await?.unwrap();
    let second = booked.appointments.find_by_id(booked.second).await?.unwrap();
    assert_eq!(first.status, AppointmentStatus::Pending);
    assert_eq!(second.status, AppointmentStatus::Scheduled);

    // Confirming the loser by hand is refused as well
    let forced = booked.appointments.update_status(booked.first, AppointmentStatus::Scheduled).await;
    assert!(matches!(forced, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn test_paid_after_failed_still_schedules() -> anyhow::Result<()> {
    let booked = lapsed_hold_pair().await?;

    let failed = booked.payments.mark_failed("pi_2", Some("card_declined"), "Declined").await?.unwrap();
    assert_eq!(failed.status, PaymentStatus::Failed);

    let (paid, outcome) = booked.payments.mark_paid("pi_2", "pay_2", Utc::now()).await?.unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(paid.external_payment_id.as_deref(), Some("pay_2"));
    assert_eq!(outcome, PaidOutcome::Confirmed);
    assert_eq!(
        booked.appointments.find_by_id(booked.second).await?.unwrap().status,
        AppointmentStatus::Scheduled
    );
    Ok(())
}

#[tokio::test]
async fn test_error_log_records_context() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteErrorLogRepository::new(pool.clone());

    let user_id = Uuid::new_v4();
    repo.record(
        "Database error: disk full",
        &ErrorContext::new("/api/payments/checkout", "checkout").with_user(user_id, "a@example.com"),
    )
    .await?;
    repo.record("later", &ErrorContext::new("/api/payments/webhook", "handle_webhook"))
        .await?;

    let logs = repo.list(10, 0).await?;
    assert_eq!(logs.len(), 2);
    let checkout = logs.iter().find(|l| l.function_name == "checkout").unwrap();
    assert_eq!(checkout.url, "/api/payments/checkout");
    assert_eq!(checkout.user_id, Some(user_id));
    assert_eq!(checkout.user_email.as_deref(), Some("a@example.com"));
    Ok(())
}

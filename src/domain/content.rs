use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFaqRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateFaqRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// A notice shown to clients before they book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReminderRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateReminderRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

pub fn default_faqs() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "How long does a gel manicure last?",
            "Two to three weeks with proper care.",
        ),
        (
            "Can I reschedule my appointment?",
            "Yes, message us at least 24 hours before your slot.",
        ),
    ]
}

pub fn default_reminders() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Arrive early",
            "Please arrive 10 minutes before your appointment.",
        ),
        (
            "Down payment",
            "Slots are only confirmed once the online payment goes through.",
        ),
    ]
}

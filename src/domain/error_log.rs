use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLog {
    pub id: Uuid,
    pub message: String,
    pub url: String,
    pub function_name: String,
    pub user_email: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Where an error happened and on whose behalf.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub url: String,
    pub function_name: String,
    pub user_email: Option<String>,
    pub user_id: Option<Uuid>,
}

impl ErrorContext {
    pub fn new(url: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            function_name: function_name.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: Uuid, user_email: impl Into<String>) -> Self {
        self.user_id = Some(user_id);
        self.user_email = Some(user_email.into());
        self
    }
}

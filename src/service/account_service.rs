use std::sync::Arc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{self, AuthService},
    domain::{CreateUserRequest, UpdateProfileRequest, User, UserRole},
    error::{AppError, Result},
    repository::UserRepository,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

pub struct AccountService {
    user_repo: Arc<dyn UserRepository>,
    auth_service: Arc<AuthService>,
}

impl AccountService {
    pub fn new(user_repo: Arc<dyn UserRepository>, auth_service: Arc<AuthService>) -> Self {
        Self { user_repo, auth_service }
    }

    /// Register a customer and open their first session.
    pub async fn signup(&self, request: SignupRequest) -> Result<(User, String)> {
        request.validate()?;

        let email = request.email.trim().to_string();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = self.user_repo
            .create(CreateUserRequest {
                email,
                full_name: request.full_name.trim().to_string(),
                phone: request.phone.filter(|p| !p.trim().is_empty()),
                password: request.password,
                role: UserRole::Customer,
            })
            .await?;

        let (_session, token) = self.auth_service.create_session(user.id).await?;
        tracing::info!("New customer signed up: {}", user.email);

        Ok((user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let (user, password_hash) = self.user_repo
            .find_credentials(email.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !auth::verify_password(password, &password_hash)? {
            tracing::debug!("Rejected login for {}", user.email);
            return Err(AppError::Unauthorized);
        }

        let (_session, token) = self.auth_service.create_session(user.id).await?;
        Ok((user, token))
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.auth_service.invalidate_session(token).await
    }

    /// The user behind a session token, if the session is live.
    pub async fn current_user(&self, token: &str) -> Result<Option<User>> {
        let Some(session) = self.auth_service.validate_session(token).await? else {
            return Ok(None);
        };
        self.user_repo.find_by_id(session.user_id).await
    }

    pub async fn update_profile(&self, user_id: Uuid, mut update: UpdateProfileRequest) -> Result<User> {
        if let Some(ref name) = update.full_name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("Full name cannot be empty".to_string()));
            }
            update.full_name = Some(name.trim().to_string());
        }
        self.user_repo.update_profile(user_id, update).await
    }

    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let current_hash = self.user_repo
            .password_hash(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !auth::verify_password(&request.current_password, &current_hash)? {
            return Err(AppError::Unauthorized);
        }

        self.user_repo.update_password(user_id, &request.new_password).await
    }
}

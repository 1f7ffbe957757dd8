//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use signalhub_common::{AppError, AppResult, IdGenerator};
use signalhub_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};
use validator::Validate;

use super::subscription::SubscriptionService;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    subscription_service: SubscriptionService,
    id_gen: IdGenerator,
}

const MAX_USERNAME_LEN: usize = 150;

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    /// Defaults to the email address when missing or blank.
    #[validate(length(max = 150))]
    pub username: Option<String>,

    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 255))]
    pub name: Option<String>,

    #[validate(url, length(max = 1024))]
    pub avatar_url: Option<String>,

    #[serde(default = "default_role")]
    pub role: UserRole,
}

const fn default_role() -> UserRole {
    UserRole::Trader
}

/// Input for updating the caller's profile. Email and role are fixed.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,

    #[validate(length(max = 255))]
    pub name: Option<String>,

    #[validate(url, length(max = 1024))]
    pub avatar_url: Option<String>,
}

/// Input for changing the caller's password.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordInput {
    pub old_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,

    pub new_password2: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, subscription_service: SubscriptionService) -> Self {
        Self {
            user_repo,
            subscription_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a user and start their free trial.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let email = normalize_email(&input.email);
        let username = signup_username(input.username.as_deref(), &email)?;

        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username),
            email: Set(email),
            name: Set(input.name),
            avatar_url: Set(input.avatar_url),
            role: Set(input.role),
            is_active: Set(true),
            is_subscribed: Set(false),
            is_verified: Set(false),
            token: Set(Some(self.id_gen.generate_token())),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let mut user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, role = ?user.role, "User created");

        let trial = self.subscription_service.create_free_trial(&user.id).await?;
        user.is_subscribed = trial.is_active_at(Utc::now().fixed_offset());

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Authenticate a user by token. Deactivated accounts are rejected.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by email and password.
    ///
    /// Accounts created without a token get one here.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Wrong password");
            return Err(AppError::Unauthorized);
        }

        if !user.is_active {
            return Err(AppError::Forbidden("User account is disabled.".to_string()));
        }

        if user.token.is_some() {
            tracing::info!(user_id = %user.id, "User signed in");
            return Ok(user);
        }

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        active.updated_at = Set(Some(Utc::now().into()));

        let user = self.user_repo.update(active).await?;
        tracing::info!(user_id = %user.id, "User signed in, token issued");
        Ok(user)
    }

    /// Update a user's profile.
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;

        if let Some(username) = input.username.as_deref()
            && username != user.username
            && self.user_repo.find_by_username(username).await?.is_some()
        {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        let mut active: user::ActiveModel = user.into();

        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(name) = input.name {
            active.name = Set(Some(name));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }

        active.updated_at = Set(Some(Utc::now().into()));

        let user = self.user_repo.update(active).await?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Change a user's password after checking the current one.
    pub async fn change_password(&self, id: &str, input: ChangePasswordInput) -> AppResult<()> {
        input.validate()?;

        if input.new_password != input.new_password2 {
            return Err(AppError::Validation(
                "Password fields didn't match.".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(id).await?;

        if !verify_password(&input.old_password, &user.password_hash)? {
            return Err(AppError::BadRequest("Old password is incorrect.".to_string()));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&input.new_password)?);
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await?;
        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Username for a new account, falling back to the email.
fn signup_username(requested: Option<&str>, email: &str) -> AppResult<String> {
    let username = requested
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(email);

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }

    Ok(username.to_string())
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

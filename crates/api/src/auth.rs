use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use entity::{user, user_identity, user_secret};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use sea_orm::{
    prelude::DateTimeWithTimeZone, ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbErr,
    EntityTrait, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "directory_session";
pub use entity::user_identity::LOCAL_PROVIDER;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_DISPLAY_NAME_LEN: usize = 100;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
    pub registration_enabled: bool,
}

impl AuthConfig {
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

/// The signed-in user attached to a request. Its presence is the only thing
/// the directory checks before serving employee data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
}

impl From<&user::Model> for CurrentUser {
    fn from(model: &user::Model) -> Self {
        Self {
            user_id: model.id,
            email: model.email.clone(),
            display_name: model.display_name.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account disabled")]
    AccountDisabled,
    #[error("Registration is disabled")]
    RegistrationDisabled,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters")]
    WeakPassword,
    #[error("displayName must be between 1 and 100 characters")]
    InvalidDisplayName,
    #[error("password hashing failed")]
    Hash,
    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

pub fn issue_token(user: &CurrentUser, config: &AuthConfig) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = SessionClaims {
        sub: user.user_id,
        email: user.email.clone(),
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(token: &str, config: &AuthConfig) -> jsonwebtoken::errors::Result<SessionClaims> {
    jsonwebtoken::decode::<SessionClaims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn normalize_email(value: &str) -> Result<String, AuthError> {
    let trimmed = value.trim().to_lowercase();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(trimmed),
        _ => Err(AuthError::InvalidEmail),
    }
}

/// Creates a local email/password account.
pub async fn register_local_user(
    db: &DatabaseConnection,
    config: &AuthConfig,
    email: &str,
    password: &str,
    display_name: Option<&str>,
) -> Result<user::Model, AuthError> {
    if !config.registration_enabled {
        return Err(AuthError::RegistrationDisabled);
    }
    let email = normalize_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    let display_name = match display_name.map(str::trim) {
        Some(name) if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LEN => {
            return Err(AuthError::InvalidDisplayName)
        }
        Some(name) => name.to_string(),
        None => email.split('@').next().unwrap_or_default().to_string(),
    };

    let existing = user_identity::Entity::find_local(&email).one(db).await?;
    if existing.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let password_hash = hash_password(password)?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let user_id = Uuid::new_v4();
    let txn = db.begin().await?;
    let model = user::ActiveModel {
        id: Set(user_id),
        email: Set(email.clone()),
        display_name: Set(display_name),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    user_identity::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        provider: Set(LOCAL_PROVIDER.into()),
        subject: Set(email),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;
    user_secret::ActiveModel {
        user_id: Set(user_id),
        password_hash: Set(password_hash),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    Ok(model)
}

/// Checks local credentials. Unknown emails and wrong passwords look the same
/// to the caller.
pub async fn authenticate_local(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model, AuthError> {
    let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
    let identity = user_identity::Entity::find_local(&email)
        .one(db)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    let user = user::Entity::find_by_id(identity.user_id)
        .one(db)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if !user.is_active {
        return Err(AuthError::AccountDisabled);
    }
    let secret = user_secret::Entity::find_by_id(user.id)
        .one(db)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(password, &secret.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user)
}

pub async fn load_current_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Option<CurrentUser>, DbErr> {
    let user = user::Entity::find_by_id(user_id).one(db).await?;
    Ok(user
        .filter(|model| model.is_active)
        .map(|model| CurrentUser::from(&model)))
}

/// Resolves a bearer token to an active user. Invalid or expired tokens and
/// deactivated accounts all resolve to `None`.
pub async fn current_user_from_token(
    db: &DatabaseConnection,
    token: &str,
    config: &AuthConfig,
) -> Option<CurrentUser> {
    let claims = decode_token(token, config).ok()?;
    load_current_user(db, claims.sub).await.ok()?
}

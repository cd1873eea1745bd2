use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{account_queries, user_queries};
use crate::errors::AppError;
use crate::models::{Account, AuthToken, LoginUser, RegisterUser, Role, User};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email pattern"));

/// E.164: a plus sign, no leading zero, 8 to 15 digits.
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("Invalid phone pattern"));
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

/// Signs and checks bearer tokens; hashes and verifies passwords.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(secret: &str, expire_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl: chrono::Duration::hours(expire_hours),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// `Ok(false)` on a wrong password; `Err` only when the stored hash is
    /// unusable.
    pub fn verify_password(&self, candidate: &str, stored_hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AppError::Internal(format!("Invalid stored password hash: {}", e)))?;
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(format!("Password verification failed: {}", e))),
        }
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.token_ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn validate_token(&self, token: &str) -> Result<Uuid, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            AppError::Unauthorized
        })?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::Unauthorized)
    }
}

/// Trims and checks a registration payload.
pub fn validate_registration(input: &RegisterUser) -> Result<RegisterUser, AppError> {
    let fullname = input.fullname.trim().to_string();
    let email = input.email.trim().to_lowercase();
    let phone = input.phone.trim().replace(' ', "");

    if fullname.is_empty() {
        return Err(AppError::Validation("Please add a fullname".to_string()));
    }
    if !EMAIL_REGEX.is_match(&email) {
        return Err(AppError::Validation("Please add a valid email".to_string()));
    }
    if !PHONE_REGEX.is_match(&phone) {
        return Err(AppError::Validation(
            "Please add a valid phone number in international format".to_string(),
        ));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(RegisterUser {
        fullname,
        email,
        phone,
        password: input.password.clone(),
    })
}

/// Creates the user and its default account in one transaction.
pub async fn register(pool: &PgPool, auth: &AuthService, input: RegisterUser) -> Result<AuthToken, AppError> {
    let input = validate_registration(&input)?;
    if user_queries::email_or_phone_taken(pool, &input.email, &input.phone).await? {
        return Err(AppError::Conflict("Email or phone is already registered".to_string()));
    }

    let password_hash = auth.hash_password(&input.password)?;

    let mut tx = pool.begin().await?;
    let user = user_queries::insert(
        &mut *tx,
        &input.fullname,
        &input.email,
        &input.phone,
        Role::default(),
        &password_hash,
    )
    .await?;
    account_queries::insert(&mut *tx, &Account::new(user.id, None)).await?;
    tx.commit().await?;

    info!("👤 Registered user {}", user.id);
    let token = auth.issue_token(user.id)?;
    Ok(AuthToken { token, user })
}

pub async fn login(pool: &PgPool, auth: &AuthService, input: LoginUser) -> Result<AuthToken, AppError> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || input.password.is_empty() {
        return Err(AppError::Validation("Please provide an email and password".to_string()));
    }

    let user = user_queries::fetch_by_email(pool, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !auth.verify_password(&input.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let token = auth.issue_token(user.id)?;
    Ok(AuthToken { token, user })
}

pub async fn me(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    user_queries::fetch_one(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))
}

//! Account registration, login and bearer-token authentication
//!
//! Passwords are stored as Argon2id PHC strings with an embedded salt. Tokens
//! are HS256 JWTs whose `sub` claim is the numeric user id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{User, UserProfile};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const EMAIL_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 40;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
  pub username: String,
  pub email: String,
  pub password: String,
}

/// `login` accepts either the username or the email address
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
  #[serde(alias = "username", alias = "email")]
  pub login: String,
  pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
  pub token: String,
  pub token_type: String,
  pub expires_in: i64,
  pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String,
  pub username: String,
  pub iat: i64,
  pub exp: i64,
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

pub fn hash_password(password: &str) -> AppResult<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// A malformed stored hash counts as a mismatch
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
  match PasswordHash::new(stored_hash) {
    Ok(parsed) => Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok(),
    Err(e) => {
      tracing::warn!(error = %e, "Stored password hash could not be parsed");
      false
    }
  }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn issue_token(user: &User, secret: &str, ttl_secs: i64) -> AppResult<String> {
  let now = Utc::now().timestamp();
  let claims = Claims {
    sub: user.id.to_string(),
    username: user.username.clone(),
    iat: now,
    exp: now + ttl_secs,
  };

  encode(
    &Header::new(Algorithm::HS256),
    &claims,
    &EncodingKey::from_secret(secret.as_bytes()),
  )
  .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
  decode::<Claims>(
    token,
    &DecodingKey::from_secret(secret.as_bytes()),
    &Validation::new(Algorithm::HS256),
  )
  .map(|data| data.claims)
  .map_err(|e| {
    tracing::debug!(error = %e, "Rejected bearer token");
    AppError::Unauthorized("Invalid or expired token".to_string())
  })
}

// ---------------------------------------------------------------------------
// Registration and login
// ---------------------------------------------------------------------------

fn validate_registration(req: &RegisterRequest) -> AppResult<()> {
  let username_len = req.username.trim().chars().count();
  if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username_len) {
    return Err(AppError::Validation(format!(
      "Username must be between {} and {} characters",
      USERNAME_MIN_LEN, USERNAME_MAX_LEN
    )));
  }

  let email = req.email.trim();
  if email.is_empty() || email.chars().count() > EMAIL_MAX_LEN || !email.contains('@') {
    return Err(AppError::Validation(format!(
      "Email must be a valid address of at most {} characters",
      EMAIL_MAX_LEN
    )));
  }

  let password_len = req.password.chars().count();
  if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&password_len) {
    return Err(AppError::Validation(format!(
      "Password must be between {} and {} characters",
      PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
    )));
  }

  Ok(())
}

pub async fn register(pool: &SqlitePool, req: &RegisterRequest) -> AppResult<UserProfile> {
  validate_registration(req)?;
  let username = req.username.trim();
  let email = req.email.trim();

  let username_taken: bool =
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)")
      .bind(username)
      .fetch_one(pool)
      .await?;
  if username_taken {
    return Err(AppError::IntegrityConflict(
      "Username is already taken".to_string(),
    ));
  }

  let email_taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)")
    .bind(email)
    .fetch_one(pool)
    .await?;
  if email_taken {
    return Err(AppError::IntegrityConflict(
      "Email is already in use".to_string(),
    ));
  }

  let password_hash = hash_password(&req.password)?;

  let user = sqlx::query_as::<_, User>(
    r#"
    INSERT INTO users (username, email, password_hash, created_at)
    VALUES (?1, ?2, ?3, ?4)
    RETURNING *
    "#,
  )
  .bind(username)
  .bind(email)
  .bind(&password_hash)
  .bind(Utc::now())
  .fetch_one(pool)
  .await?;

  tracing::info!(user_id = user.id, username = %user.username, "User registered");
  Ok(user.into())
}

pub async fn login(pool: &SqlitePool, req: &LoginRequest, secret: &str, ttl_secs: i64) -> AppResult<AuthResponse> {
  let login = req.login.trim();
  let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1 OR email = ?1")
    .bind(login)
    .fetch_optional(pool)
    .await?;

  let user = match user {
    Some(user) if verify_password(&req.password, &user.password_hash) => user,
    _ => {
      tracing::debug!(login = %login, "Failed login attempt");
      return Err(AppError::Unauthorized(
        "Invalid username or password".to_string(),
      ));
    }
  };

  let token = issue_token(&user, secret, ttl_secs)?;
  tracing::info!(user_id = user.id, "User logged in");

  Ok(AuthResponse {
    token,
    token_type: "Bearer".to_string(),
    expires_in: ttl_secs,
    user: user.into(),
  })
}

// ---------------------------------------------------------------------------
// Request principal
// ---------------------------------------------------------------------------

/// Authenticated caller, resolved from the `Authorization: Bearer` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
  pub user_id: i64,
  pub username: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
  type Rejection = AppError;

  async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
    let header = parts
      .headers
      .get(AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let token = header
      .strip_prefix("Bearer ")
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let claims = verify_token(token, &state.config.jwt_secret)?;
    let user_id: i64 = claims
      .sub
      .parse()
      .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    // Tokens outlive deleted accounts
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
      .bind(user_id)
      .fetch_one(&state.db)
      .await?;
    if !exists {
      return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
    }

    Ok(AuthUser {
      user_id,
      username: claims.username,
    })
  }
}

//! Account directory: user records and their token lifecycles
//!
//! Every function takes the current time explicitly so expiry rules are
//! deterministic under test.

use chrono::{DateTime, Duration, Utc};
use studiodesk_core::{Role, UserId};

use crate::crypto::{generate_token, normalize_email, validate_password, PasswordHasher};
use crate::error::DeskError;
use crate::store::{NewUser, User, UserStore};

/// Lifetime of verification and password reset tokens
pub const TOKEN_TTL_HOURS: i64 = 24;

fn token_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(TOKEN_TTL_HOURS)
}

fn validate_email(email: &str) -> Result<String, DeskError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(DeskError::validation("Email is required"));
    }
    if !email.contains('@') {
        return Err(DeskError::validation("Invalid email address"));
    }
    Ok(email)
}

/// Link embedded in the verification email
pub fn verification_link(base_url: &str, token: &str) -> String {
    format!("{}/verify-email?token={}", base_url, token)
}

/// Link embedded in the password reset email
pub fn reset_link(base_url: &str, token: &str) -> String {
    format!("{}/reset-password?resetToken={}", base_url, token)
}

/// Register a new account.
///
/// The account always starts as an unverified `user` carrying a fresh
/// verification token.
pub fn create_user<U: UserStore>(
    users: &U,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<User, DeskError> {
    let email = validate_email(email)?;
    validate_password(password)?;

    if users.get_user_by_email(&email)?.is_some() {
        return Err(DeskError::DuplicateAccount);
    }

    let user = users.create_user(NewUser {
        email,
        password_hash: hasher.hash(password)?,
        role: Role::User,
        email_verified: false,
        verification_token: Some(generate_token()),
        verification_token_expires_at: Some(token_expiry(now)),
        created_at: now,
    })?;

    tracing::info!(user_id = %user.id, email = %user.email, "User created");
    Ok(user)
}

/// Create a pre-verified admin. Only reachable from operator tooling.
pub fn provision_admin<U: UserStore>(
    users: &U,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<User, DeskError> {
    let email = validate_email(email)?;
    validate_password(password)?;

    let user = users.create_user(NewUser {
        email,
        password_hash: hasher.hash(password)?,
        role: Role::Admin,
        email_verified: true,
        verification_token: None,
        verification_token_expires_at: None,
        created_at: now,
    })?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin provisioned");
    Ok(user)
}

pub fn find_user_by_email<U: UserStore>(users: &U, email: &str) -> Result<Option<User>, DeskError> {
    users.get_user_by_email(&normalize_email(email))
}

pub fn find_user_by_id<U: UserStore>(users: &U, id: UserId) -> Result<Option<User>, DeskError> {
    users.get_user(id)
}

/// Like [`find_user_by_email`], but a missing account is an error
pub fn require_user<U: UserStore>(users: &U, email: &str) -> Result<User, DeskError> {
    find_user_by_email(users, email)?.ok_or(DeskError::NotFound("User"))
}

/// Redeem a verification token. At most one caller succeeds per token.
pub fn verify_email<U: UserStore>(
    users: &U,
    token: &str,
    now: DateTime<Utc>,
) -> Result<User, DeskError> {
    if token.is_empty() {
        return Err(DeskError::InvalidOrExpiredToken);
    }

    let user = users
        .redeem_verification_token(token, now)?
        .ok_or(DeskError::InvalidOrExpiredToken)?;

    tracing::info!(user_id = %user.id, email = %user.email, "Email verified");
    Ok(user)
}

/// Issue a reset token if the account exists.
///
/// Callers must answer identically whether or not this returns `Some`.
pub fn begin_password_reset<U: UserStore>(
    users: &U,
    email: &str,
    now: DateTime<Utc>,
) -> Result<Option<(User, String)>, DeskError> {
    let Some(user) = find_user_by_email(users, email)? else {
        tracing::debug!(email = %email, "Password reset requested for unknown email");
        return Ok(None);
    };

    let token = generate_token();
    users.set_reset_token(user.id, &token, token_expiry(now))?;

    tracing::info!(user_id = %user.id, "Password reset requested");
    Ok(Some((user, token)))
}

pub fn complete_password_reset<U: UserStore>(
    users: &U,
    hasher: &PasswordHasher,
    token: &str,
    new_password: &str,
    now: DateTime<Utc>,
) -> Result<User, DeskError> {
    if token.is_empty() {
        return Err(DeskError::InvalidOrExpiredToken);
    }
    validate_password(new_password)?;

    let password_hash = hasher.hash(new_password)?;
    let user = users
        .redeem_reset_token(token, &password_hash, now)?
        .ok_or(DeskError::InvalidOrExpiredToken)?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(user)
}

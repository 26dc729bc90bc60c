//! Session gate: login, signed session cookies, and identity resolution
//!
//! Sessions are self-contained signed claims. Nothing is stored server-side,
//! so logout only clears the client's cookie.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use studiodesk_core::{CurrentUser, Identity, Role, UserId};
use tower_cookies::cookie::{time, SameSite};
use tower_cookies::{Cookie, Cookies, Key};

use crate::crypto::{normalize_email, VerifyPassword};
use crate::error::DeskError;
use crate::store::{StoreResult, UserStore};

pub const SESSION_COOKIE: &str = "studiodesk_session";

/// Session lifetime in days
pub const SESSION_TTL_DAYS: i64 = 7;

/// Claims carried inside the signed cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SessionClaims {
    id: UserId,
    email: String,
    role: Role,
    /// Expiry as a unix timestamp
    exp: i64,
}

impl SessionClaims {
    fn encode(&self) -> Result<String, DeskError> {
        let json = serde_json::to_vec(self).map_err(DeskError::internal)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(value: &str) -> Option<Self> {
        let json = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

/// Issues and validates session cookies
#[derive(Clone)]
pub struct SessionGate {
    key: Key,
    secure: bool,
}

impl SessionGate {
    /// Build a gate from the signing secret. An empty secret is refused.
    pub fn new(secret: &str, secure: bool) -> Result<Self, DeskError> {
        if secret.trim().is_empty() {
            return Err(DeskError::internal("session signing secret is empty"));
        }

        // Key::from needs at least 64 bytes
        let digest = Sha512::digest(secret.as_bytes());
        Ok(Self {
            key: Key::from(digest.as_slice()),
            secure,
        })
    }

    /// Check credentials and return the claims for a new session.
    ///
    /// Unknown email and wrong password fail identically and both pay for a
    /// password check. The verification check only runs once the password has
    /// matched.
    pub fn login<U: UserStore, H: VerifyPassword>(
        &self,
        users: &U,
        hasher: &H,
        username: &str,
        password: &str,
    ) -> Result<Identity, DeskError> {
        let email = normalize_email(username);
        if email.is_empty() || password.is_empty() {
            return Err(DeskError::validation("Email and password are required"));
        }

        let Some(user) = users.get_user_by_email(&email)? else {
            hasher.verify(password, &hasher.decoy_hash());
            tracing::warn!("Login rejected: unknown email");
            return Err(DeskError::InvalidCredentials);
        };

        if !hasher.verify(password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(DeskError::InvalidCredentials);
        }

        if !user.email_verified {
            tracing::warn!(user_id = %user.id, "Login rejected: email not verified");
            return Err(DeskError::EmailNotVerified);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user.identity())
    }

    /// Set the signed session cookie
    pub fn issue(
        &self,
        cookies: &Cookies,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<(), DeskError> {
        let claims = SessionClaims {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        };

        let cookie = Cookie::build((SESSION_COOKIE, claims.encode()?))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .max_age(time::Duration::days(SESSION_TTL_DAYS))
            .build();
        cookies.signed(&self.key).add(cookie);
        Ok(())
    }

    /// Claims from a valid, unexpired cookie
    pub fn read_claims(&self, cookies: &Cookies, now: DateTime<Utc>) -> Option<Identity> {
        let cookie = cookies.signed(&self.key).get(SESSION_COOKIE)?;
        let claims = SessionClaims::decode(cookie.value())?;

        if claims.exp <= now.timestamp() {
            tracing::debug!(user_id = %claims.id, "Session cookie expired");
            return None;
        }

        Some(Identity {
            id: claims.id,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Remove the session cookie
    pub fn clear(&self, cookies: &Cookies) {
        cookies.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    }

    /// Resolve the caller of a request. A missing or invalid cookie is
    /// anonymous, never an error.
    pub fn current_user<U: UserStore>(
        &self,
        users: &U,
        cookies: &Cookies,
        now: DateTime<Utc>,
    ) -> StoreResult<CurrentUser> {
        resolve_current_user(users, self.read_claims(cookies, now))
    }
}

/// Reload session claims against the account directory so deleted users and
/// role changes take effect immediately.
pub fn resolve_current_user<U: UserStore>(
    users: &U,
    claims: Option<Identity>,
) -> StoreResult<CurrentUser> {
    let Some(claims) = claims else {
        return Ok(CurrentUser::Anonymous);
    };

    Ok(users
        .get_user(claims.id)?
        .map(|user| CurrentUser::User(user.identity()))
        .unwrap_or_default())
}

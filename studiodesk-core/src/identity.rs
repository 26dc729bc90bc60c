//! Identities resolved from a session
//!
//! A request is either anonymous or carries the minimal claims of a signed-in
//! user. Every authorization decision takes a [`CurrentUser`] explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0.to_string())
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Minimal claims carried by an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The caller of an operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CurrentUser {
    #[default]
    Anonymous,
    User(Identity),
}

impl CurrentUser {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            CurrentUser::Anonymous => None,
            CurrentUser::User(identity) => Some(identity),
        }
    }

    pub fn id(&self) -> Option<UserId> {
        self.identity().map(|i| i.id)
    }

    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(Identity::is_admin)
    }

    /// Require a signed-in caller, optionally holding one of `roles`.
    ///
    /// An empty `roles` slice accepts any authenticated user.
    pub fn require_auth(&self, roles: &[Role]) -> Result<&Identity> {
        let identity = self.identity().ok_or(Error::NotAuthenticated)?;

        if !roles.is_empty() && !roles.contains(&identity.role) {
            return Err(Error::NotAuthorized);
        }

        Ok(identity)
    }

    /// Shorthand for `require_auth(&[Role::Admin])`
    pub fn require_admin(&self) -> Result<&Identity> {
        self.require_auth(&[Role::Admin])
    }
}

impl From<Identity> for CurrentUser {
    fn from(identity: Identity) -> Self {
        CurrentUser::User(identity)
    }
}

impl From<Option<Identity>> for CurrentUser {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(CurrentUser::Anonymous, CurrentUser::User)
    }
}

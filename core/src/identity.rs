//! Identity collaborator and authorization predicates.
//!
//! Authentication itself (login, sessions, password reset) lives outside this
//! crate. Operations only need to know whether the caller is logged in, who
//! they are, and whether they are an admin. Every admin-only operation goes
//! through [`require_admin`].

use crate::error::{OrderError, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an authenticated actor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer
    User,
    /// Back-office administrator
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// What the session/identity layer knows about the caller.
pub trait Identity: Send + Sync {
    /// Whether the caller is logged in.
    fn is_authenticated(&self) -> bool;

    /// The caller's user ID, if logged in.
    fn current_actor_id(&self) -> Option<UserId>;

    /// The caller's role, if logged in.
    fn role(&self) -> Option<Role>;

    /// Whether the caller is an admin.
    fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}

/// The caller of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Actor {
    /// Not logged in
    Anonymous,
    /// Logged in
    Authenticated {
        /// User ID
        id: UserId,
        /// Role
        role: Role,
    },
}

impl Actor {
    /// A logged-in customer
    #[must_use]
    pub const fn user(id: UserId) -> Self {
        Self::Authenticated {
            id,
            role: Role::User,
        }
    }

    /// A logged-in administrator
    #[must_use]
    pub const fn admin(id: UserId) -> Self {
        Self::Authenticated {
            id,
            role: Role::Admin,
        }
    }
}

impl Identity for Actor {
    fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    fn current_actor_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { id, .. } => Some(*id),
        }
    }

    fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { role, .. } => Some(*role),
        }
    }
}

/// Requires a logged-in caller.
///
/// # Errors
///
/// Returns [`OrderError::Unauthenticated`] if the caller is anonymous.
pub fn require_authenticated(identity: &impl Identity) -> Result<UserId> {
    if !identity.is_authenticated() {
        return Err(OrderError::Unauthenticated);
    }
    identity
        .current_actor_id()
        .ok_or(OrderError::Unauthenticated)
}

/// Requires a logged-in admin. The single gate for every admin operation.
///
/// # Errors
///
/// Returns [`OrderError::Unauthenticated`] for anonymous callers and
/// [`OrderError::Unauthorized`] for non-admins.
pub fn require_admin(identity: &impl Identity) -> Result<UserId> {
    let user_id = require_authenticated(identity)?;
    if !identity.is_admin() {
        tracing::warn!(user_id = %user_id, "Admin operation attempted by non-admin");
        return Err(OrderError::Unauthorized(
            "admin role required".to_string(),
        ));
    }
    Ok(user_id)
}

/// Requires the caller to be `owner` or an admin.
///
/// # Errors
///
/// Returns [`OrderError::Unauthenticated`] for anonymous callers and
/// [`OrderError::Unauthorized`] for anyone else.
pub fn require_owner_or_admin(identity: &impl Identity, owner: UserId) -> Result<UserId> {
    let user_id = require_authenticated(identity)?;
    if user_id != owner && !identity.is_admin() {
        return Err(OrderError::Unauthorized(
            "order belongs to another user".to_string(),
        ));
    }
    Ok(user_id)
}

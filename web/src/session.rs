//! Bearer-token sessions.
//!
//! Tokens resolve to an [`Actor`] through a static [`SessionDirectory`]
//! built from configuration. Handlers take a [`CurrentActor`] and hand it to
//! the workflow, which decides whether an anonymous caller is acceptable.
//!
//! ```text
//! Authorization: Bearer <token>   → Actor::Authenticated { id, role }
//! (no header)                     → Actor::Anonymous
//! unknown / malformed token       → 401
//! ```

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use boxoffice_core::{Actor, Role, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Error parsing a session table entry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid session entry '{entry}': {reason}")]
pub struct SessionParseError {
    entry: String,
    reason: String,
}

/// Token → actor table.
#[derive(Debug, Clone, Default)]
pub struct SessionDirectory {
    sessions: HashMap<String, Actor>,
}

impl SessionDirectory {
    /// Parse a `token:user-uuid:role` list separated by commas.
    ///
    /// # Errors
    ///
    /// Returns [`SessionParseError`] for entries with a missing part, an
    /// invalid UUID or an unknown role.
    pub fn parse(table: &str) -> Result<Self, SessionParseError> {
        let mut directory = Self::default();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let invalid = |reason: String| SessionParseError {
                entry: entry.to_string(),
                reason,
            };

            let mut parts = entry.splitn(3, ':');
            let (Some(token), Some(user), Some(role)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(invalid("expected token:user-id:role".to_string()));
            };
            if token.is_empty() {
                return Err(invalid("empty token".to_string()));
            }
            let id = Uuid::parse_str(user).map_err(|e| invalid(e.to_string()))?;
            let role: Role = role.parse().map_err(invalid)?;

            directory.insert(
                token,
                Actor::Authenticated {
                    id: UserId::from_uuid(id),
                    role,
                },
            );
        }
        Ok(directory)
    }

    /// Register a token.
    pub fn insert(&mut self, token: impl Into<String>, actor: Actor) {
        self.sessions.insert(token.into(), actor);
    }

    /// Look up a token.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<Actor> {
        self.sessions.get(token).copied()
    }

    /// Number of registered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no tokens are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// The caller of the current request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    Arc<SessionDirectory>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(Actor::Anonymous));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?;

        let sessions = Arc::<SessionDirectory>::from_ref(state);
        sessions.resolve(token).map(Self).ok_or_else(|| {
            tracing::debug!("Rejected unknown session token");
            AppError::unauthorized("Invalid or expired session")
        })
    }
}

//! Per-request identity resolution.
//!
//! The bearer token only names a subject; the authorities always come from
//! the user's current role in the directory, so a role change applies to
//! tokens that were issued before it. The resolved [`Identity`] travels in
//! the request extensions to the access gate and the handlers.

use std::collections::BTreeSet;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::{jwt::JwtKeys, permissions::authorities_for};
use crate::{
    errors::AppError,
    state::AppState,
    users::{repo::UserDirectory, repo_types::UserRecord},
};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated {
        principal: String,
        authorities: BTreeSet<String>,
    },
}

impl Identity {
    /// Projects a stored user into an authenticated identity.
    pub fn from_user(user: &UserRecord) -> Self {
        Identity::Authenticated {
            principal: user.email.clone(),
            authorities: authorities_for(user.role),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    pub fn principal(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { principal, .. } => Some(principal),
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        match self {
            Identity::Anonymous => false,
            Identity::Authenticated { authorities, .. } => authorities.contains(authority),
        }
    }
}

/// Missing or non-bearer header -> anonymous; bad token or vanished subject -> `InvalidToken`.
pub async fn resolve(
    headers: &HeaderMap,
    keys: &JwtKeys,
    directory: &dyn UserDirectory,
) -> Result<Identity, AppError> {
    let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
    else {
        return Ok(Identity::Anonymous);
    };

    let claims = keys.decode(token.trim())?;
    let user = directory.find_by_email(&claims.sub).await?.ok_or_else(|| {
        warn!(subject = %claims.sub, "token subject no longer exists");
        AppError::InvalidToken
    })?;

    debug!(principal = %user.email, role = %user.role, "request authenticated");
    Ok(Identity::from_user(&user))
}

pub async fn resolve_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve(req.headers(), &state.keys, state.directory.as_ref()).await?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

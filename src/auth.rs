//! Caller identity and capability
//!
//! Sessions are issued elsewhere; this server only resolves a bearer token
//! to the profile that owns it.

use std::fmt;
use std::str::FromStr;

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};

/// Profile role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    /// Managers and admins may run fleet-wide reports
    pub fn has_elevated_access(&self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub full_name: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            full_name: full_name.into(),
            role,
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve the caller of a request, or fail with `Unauthorized`
pub async fn authenticate(profiles: &ProfileRepository<'_>, headers: &HeaderMap) -> Result<Caller> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;

    match profiles.find_by_token(token).await? {
        Some(caller) => Ok(caller),
        None => {
            tracing::debug!("Rejected unknown or expired token");
            Err(AppError::Unauthorized)
        }
    }
}

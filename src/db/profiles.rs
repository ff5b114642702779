//! Profile and token lookups

use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::auth::{Caller, Role};
use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProfileRow {
    id: String,
    full_name: String,
    role: String,
}

/// Profile repository
pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve an unexpired bearer token to its owner
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Caller>> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT p.id, p.full_name, p.role
            FROM api_tokens t
            JOIN profiles p ON p.id = t.profile_id
            WHERE t.token = ? AND (t.expires_at IS NULL OR t.expires_at > ?)
            "#,
        )
        .bind(token)
        .bind(&now)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|row| {
            let role = row.role.parse().unwrap_or_else(|e| {
                tracing::warn!(profile_id = %row.id, "{}, treating as employee", e);
                Role::Employee
            });
            Caller::new(row.id, row.full_name, role)
        }))
    }
}

//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL)
        .execute(pool)
        .await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Vehicle categories (drive template selection)
CREATE TABLE IF NOT EXISTS vehicle_categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Fleet vehicles
CREATE TABLE IF NOT EXISTS vehicles (
    id TEXT PRIMARY KEY,
    reg_number TEXT NOT NULL UNIQUE,
    vehicle_type TEXT,
    category_id TEXT REFERENCES vehicle_categories(id),
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- User profiles
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'employee',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Bearer tokens issued to profiles
CREATE TABLE IF NOT EXISTS api_tokens (
    token TEXT PRIMARY KEY,
    profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    expires_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_api_tokens_profile ON api_tokens(profile_id);

-- Vehicle inspections
CREATE TABLE IF NOT EXISTS vehicle_inspections (
    id TEXT PRIMARY KEY,
    vehicle_id TEXT NOT NULL REFERENCES vehicles(id),
    user_id TEXT REFERENCES profiles(id),
    inspection_date TEXT NOT NULL,
    inspection_end_date TEXT,
    status TEXT NOT NULL DEFAULT 'draft',
    mileage INTEGER,
    comments TEXT,
    submitted_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_inspections_date ON vehicle_inspections(inspection_date);
CREATE INDEX IF NOT EXISTS idx_inspections_status ON vehicle_inspections(status);

-- Checklist rows of an inspection
CREATE TABLE IF NOT EXISTS inspection_items (
    id TEXT PRIMARY KEY,
    inspection_id TEXT NOT NULL REFERENCES vehicle_inspections(id) ON DELETE CASCADE,
    item_number INTEGER NOT NULL,
    day_of_week INTEGER,
    description TEXT NOT NULL,
    status TEXT NOT NULL,
    comments TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_inspection ON inspection_items(inspection_id, item_number);
"#;

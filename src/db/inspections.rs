//! Inspection queries for the export pipeline

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::export::{DateRange, InspectionItem, InspectionRecord, InspectionSource, InspectionStatus, ItemStatus};

/// Inspection joined with its vehicle, category and submitter
#[derive(Debug, Clone, sqlx::FromRow)]
struct InspectionRow {
    id: String,
    inspection_date: String,
    inspection_end_date: Option<String>,
    status: String,
    mileage: Option<i64>,
    comments: Option<String>,
    vehicle_reg: String,
    category_name: Option<String>,
    vehicle_type: Option<String>,
    inspector_name: String,
}

impl TryFrom<InspectionRow> for InspectionRecord {
    type Error = AppError;

    fn try_from(row: InspectionRow) -> Result<Self> {
        let status = InspectionStatus::from_db(&row.status);
        if let InspectionStatus::Other(value) = &status {
            tracing::warn!(inspection_id = %row.id, status = %value, "Unrecognised inspection status, exporting as-is");
        }
        let inspection_date = parse_date(&row.id, &row.inspection_date)?;
        let inspection_end_date = row
            .inspection_end_date
            .as_deref()
            .map(|d| parse_date(&row.id, d))
            .transpose()?;

        Ok(InspectionRecord {
            id: row.id,
            inspection_date,
            inspection_end_date,
            status,
            mileage: row.mileage,
            comments: row.comments,
            vehicle_reg: row.vehicle_reg,
            vehicle_category: row.category_name,
            vehicle_type: row.vehicle_type,
            inspector_name: row.inspector_name,
        })
    }
}

fn parse_date(id: &str, value: &str) -> Result<NaiveDate> {
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| AppError::FetchFailure(format!("inspection {} has invalid date {:?}: {}", id, value, e)))
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ItemRow {
    item_number: i64,
    day_of_week: Option<i64>,
    description: String,
    status: String,
    comments: Option<String>,
}

impl From<ItemRow> for InspectionItem {
    fn from(row: ItemRow) -> Self {
        InspectionItem {
            item_number: row.item_number,
            day_of_week: row.day_of_week,
            description: row.description,
            status: ItemStatus::from_db(&row.status),
            comments: row.comments,
        }
    }
}

/// Inspection repository
#[derive(Clone)]
pub struct InspectionRepository {
    pool: SqlitePool,
}

impl InspectionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InspectionSource for InspectionRepository {
    async fn eligible_in_range(&self, range: &DateRange) -> Result<Vec<InspectionRecord>> {
        let rows = sqlx::query_as::<_, InspectionRow>(
            r#"
            SELECT i.id, i.inspection_date, i.inspection_end_date, i.status,
                   i.mileage, i.comments,
                   v.reg_number AS vehicle_reg,
                   c.name AS category_name,
                   v.vehicle_type,
                   COALESCE(p.full_name, 'Unknown') AS inspector_name
            FROM vehicle_inspections i
            JOIN vehicles v ON v.id = i.vehicle_id
            LEFT JOIN vehicle_categories c ON c.id = v.category_id
            LEFT JOIN profiles p ON p.id = i.user_id
            WHERE i.inspection_date >= ? AND i.inspection_date < ?
              AND i.status <> 'draft'
            ORDER BY i.inspection_date ASC, i.id ASC
            "#,
        )
        .bind(range.from.format("%Y-%m-%d").to_string())
        // Dates may carry a time part; the day after `to` is an exclusive bound
        .bind(range.to.succ_opt().unwrap_or(NaiveDate::MAX).format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::FetchFailure(e.to_string()))?;

        rows.into_iter().map(InspectionRecord::try_from).collect()
    }

    async fn items_for(&self, inspection_id: &str) -> Result<Vec<InspectionItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT item_number, day_of_week, description, status, comments
            FROM inspection_items
            WHERE inspection_id = ?
            ORDER BY item_number ASC, day_of_week ASC, id ASC
            "#,
        )
        .bind(inspection_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::FetchFailure(e.to_string()))?;

        Ok(rows.into_iter().map(InspectionItem::from).collect())
    }
}

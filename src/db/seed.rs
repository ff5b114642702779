//! Demo data seeding
//!
//! Populates an empty database with a small fleet, three profiles with
//! bearer tokens and a quarter of inspections. The insert helpers are also
//! used by the integration tests to build fixtures.

use chrono::{DateTime, Days, NaiveDate, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::Role;
use crate::error::Result;
use crate::export::{InspectionStatus, ItemStatus};

/// Daily walk-round checks for heavy vehicles
const HGV_CHECKS: &[&str] = &[
    "Fuel/oil/fluid leaks",
    "Battery security and condition",
    "Tyres and wheel fixings",
    "Spray suppression",
    "Steering",
    "Brakes and air build-up",
    "Lights and indicators",
    "Mirrors and glass",
    "Horn",
    "Wipers and washers",
    "Seat belts",
    "Security of load",
    "Coupling security",
    "Excessive engine exhaust smoke",
];

/// Weekly checks for vans, recorded per working day
const VAN_CHECKS: &[&str] = &[
    "Tyres and wheels",
    "Lights",
    "Mirrors",
    "Windscreen and wipers",
    "Oil and coolant levels",
    "Bodywork damage",
];

/// A checklist row to insert
#[derive(Debug, Clone)]
pub struct NewItem {
    pub item_number: i64,
    pub day_of_week: Option<i64>,
    pub description: String,
    pub status: ItemStatus,
    pub comments: Option<String>,
}

/// An inspection to insert
#[derive(Debug, Clone)]
pub struct NewInspection {
    pub vehicle_id: String,
    pub user_id: Option<String>,
    pub inspection_date: NaiveDate,
    pub inspection_end_date: Option<NaiveDate>,
    pub status: InspectionStatus,
    pub mileage: Option<i64>,
    pub comments: Option<String>,
    pub items: Vec<NewItem>,
}

/// Counts of what `seed_demo_data` created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub vehicles: usize,
    pub profiles: usize,
    pub inspections: usize,
}

/// Fixture writer
pub struct Seeder<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Seeder<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_category(&self, name: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO vehicle_categories (id, name) VALUES (?, ?)")
            .bind(&id)
            .bind(name)
            .execute(self.pool)
            .await?;
        Ok(id)
    }

    pub async fn insert_vehicle(
        &self,
        reg_number: &str,
        vehicle_type: Option<&str>,
        category_id: Option<&str>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO vehicles (id, reg_number, vehicle_type, category_id) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(reg_number)
            .bind(vehicle_type)
            .bind(category_id)
            .execute(self.pool)
            .await?;
        Ok(id)
    }

    pub async fn insert_profile(&self, full_name: &str, role: Role) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO profiles (id, full_name, role) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(full_name)
            .bind(role.as_str())
            .execute(self.pool)
            .await?;
        Ok(id)
    }

    /// Issue a bearer token; `None` never expires.
    ///
    /// Expiry is stored as second-precision UTC so it compares as text.
    pub async fn issue_token(
        &self,
        profile_id: &str,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO api_tokens (token, profile_id, expires_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(profile_id)
            .bind(expires_at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Insert an inspection and its items in one transaction
    pub async fn insert_inspection(&self, inspection: &NewInspection) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let submitted_at = inspection
            .status
            .is_exportable()
            .then(|| Utc::now().to_rfc3339());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO vehicle_inspections
                (id, vehicle_id, user_id, inspection_date, inspection_end_date,
                 status, mileage, comments, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&inspection.vehicle_id)
        .bind(&inspection.user_id)
        .bind(inspection.inspection_date.format("%Y-%m-%d").to_string())
        .bind(inspection.inspection_end_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(inspection.status.as_str())
        .bind(inspection.mileage)
        .bind(&inspection.comments)
        .bind(submitted_at)
        .execute(&mut *tx)
        .await?;

        for item in &inspection.items {
            sqlx::query(
                r#"
                INSERT INTO inspection_items
                    (id, inspection_id, item_number, day_of_week, description, status, comments)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(item.item_number)
            .bind(item.day_of_week)
            .bind(&item.description)
            .bind(item.status.as_db_str())
            .bind(&item.comments)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn is_empty(&self) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(self.pool)
            .await?;
        Ok(count == 0)
    }
}

/// Standard heavy-vehicle checklist; `defect_every` marks every n-th item as a defect
pub fn hgv_checklist(defect_every: usize) -> Vec<NewItem> {
    HGV_CHECKS
        .iter()
        .enumerate()
        .map(|(index, check)| {
            let defect = defect_every > 0 && (index + 1) % defect_every == 0;
            NewItem {
                item_number: index as i64 + 1,
                day_of_week: None,
                description: check.to_string(),
                status: if defect { ItemStatus::Defect } else { ItemStatus::Ok },
                comments: defect.then(|| "Reported to workshop".to_string()),
            }
        })
        .collect()
}

/// Van weekly checklist, Monday to Friday
pub fn van_checklist() -> Vec<NewItem> {
    VAN_CHECKS
        .iter()
        .enumerate()
        .flat_map(|(index, check)| {
            (1..=5).map(move |day| NewItem {
                item_number: index as i64 + 1,
                day_of_week: Some(day),
                description: check.to_string(),
                status: ItemStatus::Ok,
                comments: None,
            })
        })
        .collect()
}

/// Seed a demo fleet unless the database already has profiles
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<SeedSummary> {
    let seeder = Seeder::new(pool);
    if !seeder.is_empty().await? {
        tracing::info!("Database already populated, skipping demo seed");
        return Ok(SeedSummary::default());
    }

    let hgv = seeder.insert_category("HGV").await?;
    let van = seeder.insert_category("Van").await?;

    let admin = seeder.insert_profile("Avery Admin", Role::Admin).await?;
    let manager = seeder.insert_profile("Morgan Manager", Role::Manager).await?;
    let driver = seeder.insert_profile("Drew Driver", Role::Employee).await?;
    seeder.issue_token(&admin, "demo-admin-token", None).await?;
    seeder.issue_token(&manager, "demo-manager-token", None).await?;
    seeder.issue_token(&driver, "demo-employee-token", None).await?;

    let vehicles = [
        (seeder.insert_vehicle("HX21 ABC", Some("Rigid HGV"), Some(&hgv)).await?, false),
        (seeder.insert_vehicle("HX21 ABD", Some("Artic Tractor"), Some(&hgv)).await?, false),
        (seeder.insert_vehicle("VN70 XYZ", Some("Panel Van"), Some(&van)).await?, true),
        (seeder.insert_vehicle("VN70 XZA", Some("Crew Van"), Some(&van)).await?, true),
    ];

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let mut inspections = 0;
    for week in 0..13u64 {
        let monday = start + Days::new(week * 7);
        for (index, (vehicle_id, is_van)) in vehicles.iter().enumerate() {
            let (items, end_date) = if *is_van {
                (van_checklist(), Some(monday + Days::new(4)))
            } else {
                (hgv_checklist(index + 5), None)
            };
            // Leave the latest week of one vehicle unsubmitted
            let status = if week == 12 && index == 0 {
                InspectionStatus::Draft
            } else if week % 4 == 0 {
                InspectionStatus::Approved
            } else {
                InspectionStatus::Submitted
            };

            seeder
                .insert_inspection(&NewInspection {
                    vehicle_id: vehicle_id.clone(),
                    user_id: Some(driver.clone()),
                    inspection_date: monday,
                    inspection_end_date: end_date,
                    status,
                    mileage: Some(40_000 + (week as i64) * 850 + (index as i64) * 10_000),
                    comments: None,
                    items,
                })
                .await?;
            inspections += 1;
        }
    }

    let summary = SeedSummary {
        vehicles: vehicles.len(),
        profiles: 3,
        inspections,
    };
    tracing::info!(?summary, "Seeded demo data");
    Ok(summary)
}

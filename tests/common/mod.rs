//! Shared fixtures for the HTTP tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{Days, NaiveDate, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;

use fleet_reports_server::auth::Role;
use fleet_reports_server::config::Config;
use fleet_reports_server::db::seed::{hgv_checklist, van_checklist, NewInspection, Seeder};
use fleet_reports_server::db::{self, InspectionRepository};
use fleet_reports_server::error::{AppError, Result};
use fleet_reports_server::export::{
    DateRange, InspectionItem, InspectionRecord, InspectionSource, InspectionStatus, PdfRenderer,
};
use fleet_reports_server::state::AppState;

pub const MANAGER_TOKEN: &str = "manager-token";
pub const EMPLOYEE_TOKEN: &str = "employee-token";
pub const EXPIRED_TOKEN: &str = "expired-token";

pub struct TestApp {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub fleet: Fleet,
    pub source: Arc<CountingSource>,
    _dir: TempDir,
}

pub struct Fleet {
    pub driver_id: String,
    pub hgv_id: String,
    pub van_id: String,
}

/// Wraps the SQLite repository, counts range queries and can fail them on demand
pub struct CountingSource {
    inner: InspectionRepository,
    range_calls: AtomicUsize,
    fail_range: AtomicBool,
}

impl CountingSource {
    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }

    pub fn fail_range_queries(&self) {
        self.fail_range.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl InspectionSource for CountingSource {
    async fn eligible_in_range(&self, range: &DateRange) -> Result<Vec<InspectionRecord>> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_range.load(Ordering::SeqCst) {
            return Err(AppError::FetchFailure("database is unavailable".to_string()));
        }
        self.inner.eligible_in_range(range).await
    }

    async fn items_for(&self, inspection_id: &str) -> Result<Vec<InspectionItem>> {
        self.inner.items_for(inspection_id).await
    }
}

pub async fn spawn_app(chunk_size: usize) -> TestApp {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("fleet.db").display());
    let pool = db::create_pool(&url, 1).await.unwrap();

    let fleet = seed_fleet(&pool).await;

    let mut config = Config::default();
    config.export.chunk_size = chunk_size;

    let source = Arc::new(CountingSource {
        inner: InspectionRepository::new(pool.clone()),
        range_calls: AtomicUsize::new(0),
        fail_range: AtomicBool::new(false),
    });
    let state = AppState::with_components(
        config,
        pool.clone(),
        source.clone(),
        Arc::new(PdfRenderer::new()),
    );
    let server = TestServer::new(fleet_reports_server::app(state)).unwrap();

    TestApp {
        server,
        pool,
        fleet,
        source,
        _dir: dir,
    }
}

async fn seed_fleet(pool: &SqlitePool) -> Fleet {
    let seeder = Seeder::new(pool);

    let hgv_category = seeder.insert_category("HGV").await.unwrap();
    let van_category = seeder.insert_category("Van").await.unwrap();
    let hgv_id = seeder
        .insert_vehicle("HX21 ABC", Some("Rigid HGV"), Some(&hgv_category))
        .await
        .unwrap();
    let van_id = seeder
        .insert_vehicle("VN70 XYZ", Some("Panel Van"), Some(&van_category))
        .await
        .unwrap();

    let manager = seeder.insert_profile("Morgan Manager", Role::Manager).await.unwrap();
    let driver_id = seeder.insert_profile("Drew Driver", Role::Employee).await.unwrap();
    seeder.issue_token(&manager, MANAGER_TOKEN, None).await.unwrap();
    seeder.issue_token(&driver_id, EMPLOYEE_TOKEN, None).await.unwrap();
    seeder
        .issue_token(&manager, EXPIRED_TOKEN, Some(Utc::now() - chrono::Duration::hours(1)))
        .await
        .unwrap();

    Fleet {
        driver_id,
        hgv_id,
        van_id,
    }
}

pub fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset)
}

impl TestApp {
    /// Insert `count` submitted HGV inspections on consecutive days from 2024-01-01.
    /// Inspections whose 1-based position is in `without_items` get no checklist.
    pub async fn add_inspections(&self, count: usize, without_items: &[usize]) {
        let seeder = Seeder::new(&self.pool);
        for i in 0..count {
            let items = if without_items.contains(&(i + 1)) {
                Vec::new()
            } else {
                hgv_checklist(0)
            };
            seeder
                .insert_inspection(&NewInspection {
                    vehicle_id: self.fleet.hgv_id.clone(),
                    user_id: Some(self.fleet.driver_id.clone()),
                    inspection_date: day(i as u64),
                    inspection_end_date: None,
                    status: InspectionStatus::Submitted,
                    mileage: Some(10_000 + i as i64),
                    comments: None,
                    items,
                })
                .await
                .unwrap();
        }
    }

    pub async fn add_van_inspection(&self, date: NaiveDate, status: InspectionStatus) {
        Seeder::new(&self.pool)
            .insert_inspection(&NewInspection {
                vehicle_id: self.fleet.van_id.clone(),
                user_id: Some(self.fleet.driver_id.clone()),
                inspection_date: date,
                inspection_end_date: Some(date + Days::new(4)),
                status,
                mileage: None,
                comments: Some("Weekly check".into()),
                items: van_checklist(),
            })
            .await
            .unwrap();
    }
}

impl TestApp {
    /// Overwrite a stored inspection column for every inspection on `date`
    pub async fn set_inspection_column(&self, date: NaiveDate, column: &str, value: &str) {
        sqlx::query(&format!(
            "UPDATE vehicle_inspections SET {} = ? WHERE inspection_date = ?",
            column
        ))
        .bind(value)
        .bind(date.format("%Y-%m-%d").to_string())
        .execute(&self.pool)
        .await
        .unwrap();
    }
}

pub fn bearer(token: &str) -> (axum::http::HeaderName, axum::http::HeaderValue) {
    (
        axum::http::header::AUTHORIZATION,
        axum::http::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

pub fn page_count(pdf: &[u8]) -> usize {
    lopdf::Document::load_mem(pdf).unwrap().get_pages().len()
}

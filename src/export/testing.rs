//! In-memory record source for pipeline tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use super::source::InspectionSource;
use super::types::{DateRange, InspectionItem, InspectionRecord, InspectionStatus, ItemStatus};
use crate::error::{AppError, Result};

pub fn record(id: &str, day: u32) -> InspectionRecord {
    InspectionRecord {
        id: id.to_string(),
        inspection_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        inspection_end_date: None,
        status: InspectionStatus::Submitted,
        mileage: Some(42_000),
        comments: None,
        vehicle_reg: format!("TST {}", id),
        vehicle_category: Some(if day % 2 == 0 { "Van" } else { "HGV" }.to_string()),
        vehicle_type: None,
        inspector_name: "Taylor Tester".to_string(),
    }
}

pub fn items(count: usize) -> Vec<InspectionItem> {
    (1..=count)
        .map(|n| InspectionItem {
            item_number: n as i64,
            day_of_week: Some(1),
            description: format!("Check {}", n),
            status: ItemStatus::Ok,
            comments: None,
        })
        .collect()
}

/// Counts every call so tests can assert on data access
#[derive(Default)]
pub struct MemorySource {
    records: Vec<InspectionRecord>,
    items: HashMap<String, Vec<InspectionItem>>,
    failing: HashSet<String>,
    fail_range: bool,
    item_delay: Option<Duration>,
    range_calls: AtomicUsize,
    item_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(records: Vec<InspectionRecord>) -> Self {
        let items = records.iter().map(|r| (r.id.clone(), items(3))).collect();
        Self {
            records,
            items,
            ..Self::default()
        }
    }

    /// `count` submitted inspections, one per day from 2024-01-01, ids insp-001..
    pub fn with_records(count: usize) -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = (0..count)
            .map(|i| {
                let mut r = record(&format!("insp-{:03}", i + 1), 1);
                r.inspection_date = start + Days::new(i as u64);
                r
            })
            .collect();
        Self::new(records)
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = Some(delay);
        self
    }

    pub fn clear_items(&mut self, id: &str) {
        self.items.insert(id.to_string(), Vec::new());
    }

    pub fn fail_items(&mut self, id: &str) {
        self.failing.insert(id.to_string());
    }

    /// Make the batch query itself fail
    pub fn fail_range(&mut self) {
        self.fail_range = true;
    }

    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }

    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InspectionSource for MemorySource {
    async fn eligible_in_range(&self, range: &DateRange) -> Result<Vec<InspectionRecord>> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_range {
            return Err(AppError::FetchFailure("inspection query failed".to_string()));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| range.contains(r.inspection_date))
            .cloned()
            .collect())
    }

    async fn items_for(&self, inspection_id: &str) -> Result<Vec<InspectionItem>> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.item_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(inspection_id) {
            return Err(AppError::FetchFailure(format!("items for {} unavailable", inspection_id)));
        }
        Ok(self.items.get(inspection_id).cloned().unwrap_or_default())
    }
}

//! Record source abstraction
//!
//! The pipeline only reads from the data store. Keeping the queries behind
//! a trait lets tests substitute an in-memory source and count calls.

use async_trait::async_trait;

use super::types::{DateRange, InspectionItem, InspectionRecord};
use crate::error::Result;

/// Read-only access to exportable inspections
#[async_trait]
pub trait InspectionSource: Send + Sync {
    /// Non-draft inspections dated within `range` (inclusive), ordered by
    /// date ascending with ties broken by id.
    async fn eligible_in_range(&self, range: &DateRange) -> Result<Vec<InspectionRecord>>;

    /// Checklist items of one inspection, ordered by item number
    async fn items_for(&self, inspection_id: &str) -> Result<Vec<InspectionItem>>;
}

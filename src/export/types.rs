//! Types shared by the bulk export pipeline

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

// ============================================================================
// Request
// ============================================================================

/// Export request as received from either the query string or a JSON body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ExportRequest {
    pub fn new(date_from: impl Into<String>, date_to: impl Into<String>) -> Self {
        Self {
            date_from: Some(date_from.into()),
            date_to: Some(date_to.into()),
        }
    }
}

/// Inclusive date range, validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Validate both bounds. A blank value counts as missing.
    pub fn from_request(request: &ExportRequest) -> Result<Self> {
        let from = required(request.date_from.as_deref(), "dateFrom")?;
        let to = required(request.date_to.as_deref(), "dateTo")?;

        let from = parse_date(from, "dateFrom")?;
        let to = parse_date(to, "dateTo")?;

        if from > to {
            return Err(AppError::InvalidParameter {
                name: "dateFrom",
                reason: format!("{} is after dateTo {}", from, to),
            });
        }

        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::MissingParameter(name)),
    }
}

/// A bare ISO date, or an RFC3339 timestamp whose own calendar date is used
fn parse_date(value: &str, name: &'static str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|ts| ts.date_naive()))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.date()))
        .map_err(|e| AppError::InvalidParameter {
            name,
            reason: format!("{:?} is not an ISO date ({})", value, e),
        })
}

// ============================================================================
// Records
// ============================================================================

/// Inspection workflow status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    /// A workflow state this server does not know about; exported as-is
    #[serde(untagged)]
    Other(String),
}

impl InspectionStatus {
    /// Map a stored status. Never fails: unknown states are kept verbatim.
    pub fn from_db(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Self::Draft,
            "submitted" => Self::Submitted,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Other(value) => value,
        }
    }

    /// Drafts are never exported
    pub fn is_exportable(&self) -> bool {
        !matches!(self, Self::Draft)
    }
}

impl FromStr for InspectionStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_db(s))
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An eligible inspection with its denormalized display fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    pub id: String,
    pub inspection_date: NaiveDate,
    /// Last day covered by a weekly check sheet
    pub inspection_end_date: Option<NaiveDate>,
    pub status: InspectionStatus,
    pub mileage: Option<i64>,
    pub comments: Option<String>,
    pub vehicle_reg: String,
    pub vehicle_category: Option<String>,
    pub vehicle_type: Option<String>,
    pub inspector_name: String,
}

impl InspectionRecord {
    /// Classifier input for template selection: category name, falling back to vehicle type
    pub fn template_key(&self) -> &str {
        self.vehicle_category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.vehicle_type.as_deref())
            .unwrap_or("")
    }
}

/// Outcome of a single checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Ok,
    Defect,
    NotApplicable,
}

impl ItemStatus {
    /// Map a stored status. Anything unrecognised is reported as a defect so it gets looked at.
    pub fn from_db(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ok" | "pass" | "passed" => Self::Ok,
            "na" | "n/a" | "not_applicable" => Self::NotApplicable,
            _ => Self::Defect,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Defect => "defect",
            Self::NotApplicable => "na",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Defect => "DEFECT",
            Self::NotApplicable => "N/A",
        }
    }
}

/// One row of an inspection checklist
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionItem {
    pub item_number: i64,
    /// 1 = Monday .. 7 = Sunday for weekly sheets
    pub day_of_week: Option<i64>,
    pub description: String,
    pub status: ItemStatus,
    pub comments: Option<String>,
}

// ============================================================================
// Output
// ============================================================================

/// The finished deliverable
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: &'static str,
}

impl ExportArtifact {
    pub fn is_zip(&self) -> bool {
        self.content_type == ZIP_CONTENT_TYPE
    }
}

/// Newline-delimited progress protocol for the streaming endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    Init {
        total: usize,
        needs_zip: bool,
        num_parts: usize,
    },
    Progress {
        current: usize,
        total: usize,
        current_part: usize,
        total_parts: usize,
    },
    Complete {
        data: String,
        file_name: String,
        content_type: String,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// Encode as one NDJSON line
    pub fn to_line(&self) -> String {
        // Serializing this enum cannot fail: all fields are plain strings and integers
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","error":"Failed to encode progress: {}"}}"#, e)
        });
        line.push('\n');
        line
    }
}

impl From<&AppError> for ProgressEvent {
    fn from(err: &AppError) -> Self {
        Self::Error {
            error: err.summary(),
            details: err.details(),
        }
    }
}

//! Bulk inspection export
//!
//! `prepare` authorizes the caller, validates the date range and selects the
//! records. `run` renders them chunk by chunk, merges each chunk into one
//! PDF and packages the parts. A record whose items cannot be fetched or
//! rendered is skipped; it still counts towards progress.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::chunker::{ChunkPlan, FileNamer};
use super::merge::merge_documents;
use super::package::package;
use super::progress::ProgressSink;
use super::render::DocumentRenderer;
use super::source::InspectionSource;
use super::types::{DateRange, ExportArtifact, ExportRequest, InspectionRecord, ProgressEvent};
use crate::auth::Caller;
use crate::config::ExportConfig;
use crate::error::{AppError, Result};

/// Records selected for one export, in output order
#[derive(Debug, Clone)]
pub struct ExportJob {
    range: DateRange,
    records: Vec<InspectionRecord>,
    plan: ChunkPlan,
}

impl ExportJob {
    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn records(&self) -> &[InspectionRecord] {
        &self.records
    }

    pub fn plan(&self) -> ChunkPlan {
        self.plan
    }
}

/// Drives one export request
pub struct BulkExporter<'a> {
    source: &'a dyn InspectionSource,
    renderer: Arc<dyn DocumentRenderer>,
    chunk_size: usize,
    timeout: Duration,
}

impl<'a> BulkExporter<'a> {
    pub fn new(
        source: &'a dyn InspectionSource,
        renderer: Arc<dyn DocumentRenderer>,
        config: &ExportConfig,
    ) -> Self {
        Self {
            source,
            renderer,
            chunk_size: config.chunk_size,
            timeout: config.timeout(),
        }
    }

    /// Authorize, validate and select. No data access happens before the
    /// capability and parameter checks pass.
    pub async fn prepare(&self, caller: &Caller, request: &ExportRequest) -> Result<ExportJob> {
        if !caller.role.has_elevated_access() {
            tracing::warn!(user_id = %caller.user_id, role = %caller.role, "Bulk export refused");
            return Err(AppError::Forbidden);
        }

        let range = DateRange::from_request(request)?;

        let mut records = self.source.eligible_in_range(&range).await?;
        records.retain(|r| r.status.is_exportable() && range.contains(r.inspection_date));
        records.sort_by(|a, b| {
            a.inspection_date
                .cmp(&b.inspection_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        if records.is_empty() {
            return Err(AppError::NoResultsInRange {
                from: range.from.to_string(),
                to: range.to.to_string(),
            });
        }

        let plan = ChunkPlan::new(records.len(), self.chunk_size);
        tracing::info!(
            from = %range.from,
            to = %range.to,
            total = plan.total,
            parts = plan.num_parts(),
            requested_by = %caller.user_id,
            "Prepared bulk inspection export"
        );

        Ok(ExportJob { range, records, plan })
    }

    /// Render, merge and package, bounded by the configured timeout
    pub async fn run(&self, job: ExportJob, sink: &mut dyn ProgressSink) -> Result<ExportArtifact> {
        match tokio::time::timeout(self.timeout, self.execute(job, sink)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.timeout.as_secs())),
        }
    }

    /// Like [`run`](Self::run), finishing the stream with exactly one
    /// terminal event. Nothing is sent once the client has gone away.
    pub async fn run_streaming(&self, job: ExportJob, sink: &mut dyn ProgressSink) -> Result<()> {
        let terminal = match self.run(job, sink).await {
            Ok(artifact) => ProgressEvent::Complete {
                data: BASE64.encode(&artifact.bytes),
                file_name: artifact.file_name,
                content_type: artifact.content_type.to_string(),
            },
            Err(AppError::Cancelled) => {
                tracing::info!("Client disconnected, export abandoned");
                return Err(AppError::Cancelled);
            }
            Err(e) => {
                tracing::error!("Bulk export failed: {}", e);
                ProgressEvent::from(&e)
            }
        };

        sink.emit(terminal).await
    }

    async fn execute(&self, job: ExportJob, sink: &mut dyn ProgressSink) -> Result<ExportArtifact> {
        let started = Instant::now();
        let plan = job.plan;
        let total_parts = plan.num_parts();

        sink.emit(ProgressEvent::Init {
            total: plan.total,
            needs_zip: plan.needs_zip(),
            num_parts: total_parts,
        })
        .await?;

        let mut current = 0;
        let mut skipped = 0;
        let mut parts = Vec::with_capacity(total_parts);

        for (part_index, chunk) in plan.split(&job.records).enumerate() {
            let mut rendered = Vec::with_capacity(chunk.len());

            for record in chunk {
                match self.render_one(record).await {
                    Ok(bytes) => rendered.push(bytes),
                    Err(e) => {
                        skipped += 1;
                        tracing::warn!(inspection_id = %record.id, "Skipping inspection: {}", e);
                    }
                }

                current += 1;
                sink.emit(ProgressEvent::Progress {
                    current,
                    total: plan.total,
                    current_part: part_index + 1,
                    total_parts,
                })
                .await?;
            }

            // All-skipped parts are dropped; later parts are renumbered by package()
            if rendered.is_empty() {
                tracing::warn!(part = part_index + 1, "No renderable inspections in part, omitting it");
                continue;
            }

            let documents = rendered.len();
            let merged = tokio::task::spawn_blocking(move || merge_documents(&rendered))
                .await
                .map_err(|e| AppError::PackagingFailure(format!("merge task failed: {}", e)))??;
            tracing::debug!(
                part = part_index + 1,
                documents,
                bytes = merged.len(),
                "Merged export part"
            );
            parts.push(merged);
        }

        if parts.is_empty() {
            return Err(AppError::NothingRendered(plan.total));
        }

        let artifact = package(parts, &FileNamer::new(&job.range))?;
        tracing::info!(
            file_name = %artifact.file_name,
            rendered = plan.total - skipped,
            skipped,
            bytes = artifact.bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Bulk inspection export complete"
        );

        Ok(artifact)
    }

    /// Fetch items and render off the async workers so the timeout can fire mid-render
    async fn render_one(&self, record: &InspectionRecord) -> Result<Vec<u8>> {
        let items = self.source.items_for(&record.id).await?;
        let renderer = Arc::clone(&self.renderer);
        let owned = record.clone();

        tokio::task::spawn_blocking(move || renderer.render(&owned, &items))
            .await
            .map_err(|e| AppError::RenderFailure {
                id: record.id.clone(),
                reason: format!("render task failed: {}", e),
            })?
    }
}

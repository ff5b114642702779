//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::InspectionRepository;
use crate::export::{BulkExporter, DocumentRenderer, InspectionSource, PdfRenderer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    inspections: Arc<dyn InspectionSource>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    /// Create application state backed by the SQLite inspection repository
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let inspections = Arc::new(InspectionRepository::new(db.clone()));
        Self::with_components(config, db, inspections, Arc::new(PdfRenderer::new()))
    }

    /// Create application state with explicit pipeline collaborators
    pub fn with_components(
        config: Config,
        db: SqlitePool,
        inspections: Arc<dyn InspectionSource>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                inspections,
                renderer,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Build an exporter over this state's collaborators
    pub fn exporter(&self) -> BulkExporter<'_> {
        BulkExporter::new(
            self.inner.inspections.as_ref(),
            Arc::clone(&self.inner.renderer),
            &self.inner.config.export,
        )
    }
}

//! Bulk inspection export pipeline
//!
//! Selects eligible inspections for a date range, renders one PDF per
//! inspection, merges them into parts of bounded size and delivers either a
//! single PDF or a ZIP of parts, reporting progress along the way.

pub mod chunker;
pub mod merge;
pub mod package;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod source;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use chunker::{ChunkPlan, FileNamer};
pub use pipeline::{BulkExporter, ExportJob};
pub use progress::{BodyChunk, ChannelSink, CollectingSink, NullSink, ProgressSink};
pub use render::{DocumentRenderer, PdfRenderer};
pub use source::InspectionSource;
pub use template::Layout;
pub use types::{
    DateRange, ExportArtifact, ExportRequest, InspectionItem, InspectionRecord, InspectionStatus,
    ItemStatus, ProgressEvent,
};

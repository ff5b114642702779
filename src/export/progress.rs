//! Progress reporting
//!
//! The streaming endpoint forwards every event to the client as one NDJSON
//! line. The download endpoint discards them.

use async_trait::async_trait;
use axum::body::Bytes;
use futures::channel::mpsc;
use futures::SinkExt;

use super::types::ProgressEvent;
use crate::error::{AppError, Result};

/// Receiver of pipeline progress events
#[async_trait]
pub trait ProgressSink: Send {
    /// Deliver one event. An error aborts the export.
    async fn emit(&mut self, event: ProgressEvent) -> Result<()>;
}

/// Drops every event
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl ProgressSink for NullSink {
    async fn emit(&mut self, _event: ProgressEvent) -> Result<()> {
        Ok(())
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<ProgressEvent>,
}

#[async_trait]
impl ProgressSink for CollectingSink {
    async fn emit(&mut self, event: ProgressEvent) -> Result<()> {
        self.events.push(event);
        Ok(())
    }
}

/// Item type of a streamed response body
pub type BodyChunk = std::result::Result<Bytes, std::io::Error>;

/// Writes NDJSON lines into a bounded channel feeding the response body.
///
/// The bounded channel makes rendering wait for a slow client. A send
/// failing means the body was dropped, i.e. the client disconnected.
pub struct ChannelSink {
    tx: mpsc::Sender<BodyChunk>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<BodyChunk>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn emit(&mut self, event: ProgressEvent) -> Result<()> {
        self.tx
            .send(Ok(Bytes::from(event.to_line())))
            .await
            .map_err(|_| AppError::Cancelled)
    }
}

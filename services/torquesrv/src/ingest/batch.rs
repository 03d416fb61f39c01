//! Batches and the storage write seam

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::point::{Precision, TelemetryPoint};
use crate::error::Result;

/// Points written to one database in a single call
#[derive(Debug, Clone)]
pub struct PointBatch {
    pub database: String,
    pub precision: Precision,
    pub points: Vec<TelemetryPoint>,
}

impl PointBatch {
    pub fn new(database: impl Into<String>, precision: Precision) -> Self {
        Self {
            database: database.into(),
            precision,
            points: Vec::new(),
        }
    }

    pub fn add_point(&mut self, point: TelemetryPoint) {
        self.points.push(point);
    }

    /// Request body: one line per point
    pub fn to_line_protocol(&self) -> String {
        self.points
            .iter()
            .map(|point| point.to_line_protocol(self.precision))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Destination of point batches
#[async_trait]
pub trait PointSink: Send + Sync {
    /// Persist a batch in one call
    async fn write_batch(&self, batch: &PointBatch) -> Result<()>;
}

/// Writes each upload as a single-point, millisecond-precision batch
#[derive(Clone)]
pub struct BatchWriter {
    sink: Arc<dyn PointSink>,
    database: String,
}

impl BatchWriter {
    pub fn new(sink: Arc<dyn PointSink>, database: impl Into<String>) -> Self {
        Self {
            sink,
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub async fn write(&self, point: TelemetryPoint) -> Result<()> {
        let mut batch = PointBatch::new(self.database.clone(), Precision::Milliseconds);
        batch.add_point(point);

        self.sink.write_batch(&batch).await?;
        debug!("Wrote to {}: {}", self.database, batch.to_line_protocol());
        Ok(())
    }
}

impl std::fmt::Debug for BatchWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

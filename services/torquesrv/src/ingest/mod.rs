//! Upload ingestion pipeline
//!
//! validate → classify → normalize → tag → timestamp → assemble → write

pub mod batch;
pub mod classify;
pub mod normalize;
pub mod params;
pub mod point;

use std::sync::Arc;

use tracing::debug;

pub use batch::{BatchWriter, PointBatch, PointSink};
pub use classify::{classify, MeasurementCategory};
pub use normalize::{normalize_fields, FieldSet, FilteredField};
pub use params::{validate_mandatory, IncomingRequest, MANDATORY_PARAMS};
pub use point::{derive_timestamp, FieldValue, IdentityTags, Precision, TelemetryPoint};

use crate::dictionary::Dictionary;
use crate::error::Result;

/// Runs uploads through the pipeline and hands points to the writer
#[derive(Debug, Clone)]
pub struct Ingestor {
    dictionary: Arc<Dictionary>,
    writer: BatchWriter,
}

impl Ingestor {
    pub fn new(dictionary: Arc<Dictionary>, writer: BatchWriter) -> Self {
        Self { dictionary, writer }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Build the point for an upload without writing it
    ///
    /// `on_filtered` is called once for every parameter dropped because of
    /// its value, before any later stage can fail.
    pub fn assemble<F>(
        &self,
        request: &IncomingRequest,
        mut on_filtered: F,
    ) -> Result<TelemetryPoint>
    where
        F: FnMut(&FilteredField),
    {
        validate_mandatory(request)?;

        let measurement = classify(request.keys());
        let FieldSet { fields, filtered } = normalize_fields(request, &self.dictionary);
        for field in &filtered {
            on_filtered(field);
        }

        let tags = IdentityTags::from_request(request);
        let timestamp = derive_timestamp(request.first_or_empty("time"))?;

        debug!(
            "Assembling {} point: {} fields, {} filtered",
            measurement,
            fields.len(),
            filtered.len()
        );
        TelemetryPoint::new(measurement, tags, fields, timestamp)
    }

    /// Process one upload end to end
    pub async fn process<F>(&self, request: &IncomingRequest, on_filtered: F) -> Result<()>
    where
        F: FnMut(&FilteredField),
    {
        let point = self.assemble(request, on_filtered)?;
        self.writer.write(point).await
    }
}

//! TorqueSrv library
//!
//! Receives Torque Pro uploads over HTTP and stores them in InfluxDB.

pub mod api;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod ingest;
pub mod storage;

use std::sync::Arc;

pub use config::Config;
pub use dictionary::Dictionary;
pub use error::{Result, TorqueError};
pub use ingest::{BatchWriter, Ingestor, PointSink};

/// Application state
///
/// Built once at startup; the dictionary and storage handle are shared
/// read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(config: Config, dictionary: Dictionary, sink: Arc<dyn PointSink>) -> Self {
        let writer = BatchWriter::new(sink, config.storage.name.clone());
        let ingestor = Ingestor::new(Arc::new(dictionary), writer);

        Self {
            config: Arc::new(config),
            ingestor: Arc::new(ingestor),
        }
    }
}

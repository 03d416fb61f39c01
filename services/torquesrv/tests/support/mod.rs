//! Shared helpers for router tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use tower::util::ServiceExt;

use torquesrv::{
    api::create_router,
    ingest::{PointBatch, PointSink, TelemetryPoint},
    AppState, Config, Dictionary, Result, TorqueError,
};

/// Sink that keeps every batch it is given
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<PointBatch>>,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<PointBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn points(&self) -> Vec<TelemetryPoint> {
        self.batches()
            .into_iter()
            .flat_map(|batch| batch.points)
            .collect()
    }
}

#[async_trait]
impl PointSink for RecordingSink {
    async fn write_batch(&self, batch: &PointBatch) -> Result<()> {
        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

/// Sink that rejects every batch
pub struct FailingSink;

#[async_trait]
impl PointSink for FailingSink {
    async fn write_batch(&self, _batch: &PointBatch) -> Result<()> {
        Err(TorqueError::write("503 Service Unavailable: engine down"))
    }
}

pub fn test_dictionary() -> Dictionary {
    [
        ("rpm", "EngineRPM"),
        ("kff1005", "GPS Longitude"),
        ("k0d", "Speed (OBD)"),
    ]
    .into_iter()
    .collect()
}

/// Router wired to a recording sink
pub fn create_test_router() -> (Router, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let state = AppState::new(Config::default(), test_dictionary(), sink.clone());
    (create_router(state), sink)
}

pub fn create_router_with_sink(sink: Arc<dyn PointSink>) -> Router {
    create_router(AppState::new(Config::default(), test_dictionary(), sink))
}

/// Send a request and return status and body text
pub async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, Method::GET, uri).await
}

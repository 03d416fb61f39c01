//! Request handlers

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::access::AccessLog;
use crate::ingest::IncomingRequest;
use crate::AppState;

/// Body of a successful upload
pub const SUCCESS_BODY: &str = "OK!\n";

/// Ingest one Torque upload
pub async fn add(State(state): State<AppState>, request: Request) -> Response {
    let access = AccessLog::from_request(&request);
    let params = IncomingRequest::from_query(request.uri().query());

    match state
        .ingestor
        .process(&params, |field| access.partial(field))
        .await
    {
        Ok(()) => {
            access.finish(StatusCode::OK, None);
            (StatusCode::OK, SUCCESS_BODY).into_response()
        },
        Err(e) => {
            access.finish(e.status_code(), Some(e.to_string().as_str()));
            e.into_response()
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use tracing_test::traced_test;

    use super::*;
    use crate::config::Config;
    use crate::dictionary::Dictionary;
    use crate::error::Result;
    use crate::ingest::{PointBatch, PointSink};

    struct NullSink;

    #[async_trait]
    impl PointSink for NullSink {
        async fn write_batch(&self, _batch: &PointBatch) -> Result<()> {
            Ok(())
        }
    }

    fn state() -> AppState {
        AppState::new(Config::default(), Dictionary::default(), Arc::new(NullSink))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_add_success_with_filtered_field() {
        let request = Request::builder()
            .uri("/add?v=8&session=1&id=abc&time=1620000000000&k5=Infinity&k0c=900")
            .body(Body::empty())
            .unwrap();

        let response = add(State(state()), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK!\n");

        assert!(logs_contain("status=206"));
        assert!(logs_contain("param: 'k5' has bad value: 'Infinity'"));
        assert!(logs_contain("status=200"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_add_missing_parameter() {
        let request = Request::builder()
            .uri("/add?v=8&id=abc&time=1")
            .body(Body::empty())
            .unwrap();

        let response = add(State(state()), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "missing session URL parameter\n");
        assert!(logs_contain("status=400"));
    }
}

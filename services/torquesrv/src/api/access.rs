//! Per-request access records
//!
//! Every record goes to the `api_access` target and carries the caller, the
//! request line, a status and the time spent so far.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::{Method, StatusCode};
use tracing::{error, info, warn};

use crate::ingest::FilteredField;

/// Access log for one request
#[derive(Debug)]
pub struct AccessLog {
    remote: String,
    method: Method,
    target: String,
    started: Instant,
}

impl AccessLog {
    /// Start timing a request
    ///
    /// The caller address is only known when the server was started with
    /// connect info; otherwise it is recorded as `-`.
    pub fn from_request(request: &Request) -> Self {
        let remote = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "-".to_string());

        Self {
            remote,
            method: request.method().clone(),
            target: request.uri().to_string(),
            started: Instant::now(),
        }
    }

    /// Record a field dropped because of its value
    pub fn partial(&self, field: &FilteredField) {
        let reason = format!("param: '{}' has bad value: '{}'", field.key, field.value);
        self.record(StatusCode::PARTIAL_CONTENT, Some(reason.as_str()));
    }

    /// Record the final outcome of the request
    pub fn finish(&self, status: StatusCode, reason: Option<&str>) {
        self.record(status, reason);
    }

    fn record(&self, status: StatusCode, reason: Option<&str>) {
        let elapsed = self.started.elapsed();
        let status = status.as_u16();
        let reason = reason.unwrap_or("-");

        match status {
            500..=u16::MAX => error!(
                target: "api_access",
                remote = %self.remote,
                method = %self.method,
                target = %self.target,
                status,
                elapsed = ?elapsed,
                reason = %reason,
                "request failed"
            ),
            400..=499 => warn!(
                target: "api_access",
                remote = %self.remote,
                method = %self.method,
                target = %self.target,
                status,
                elapsed = ?elapsed,
                reason = %reason,
                "request rejected"
            ),
            _ => info!(
                target: "api_access",
                remote = %self.remote,
                method = %self.method,
                target = %self.target,
                status,
                elapsed = ?elapsed,
                reason = %reason,
                "request done"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tracing_test::traced_test;

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_from_request_without_connect_info() {
        let access = AccessLog::from_request(&request("/add?v=8&k5=1"));
        assert_eq!(access.remote, "-");
        assert_eq!(access.method, Method::GET);
        assert_eq!(access.target, "/add?v=8&k5=1");
    }

    #[test]
    fn test_from_request_with_connect_info() {
        let mut req = request("/add");
        let addr: SocketAddr = "10.0.0.7:41234".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let access = AccessLog::from_request(&req);
        assert_eq!(access.remote, "10.0.0.7:41234");
    }

    #[test]
    #[traced_test]
    fn test_partial_record() {
        let access = AccessLog::from_request(&request("/add?k5=Infinity"));
        access.partial(&FilteredField {
            key: "k5".to_string(),
            value: "Infinity".to_string(),
        });

        assert!(logs_contain("status=206"));
        assert!(logs_contain("param: 'k5' has bad value: 'Infinity'"));
    }

    #[test]
    #[traced_test]
    fn test_finish_records_status_and_reason() {
        let access = AccessLog::from_request(&request("/add"));
        access.finish(StatusCode::BAD_REQUEST, Some("missing v URL parameter"));

        assert!(logs_contain("status=400"));
        assert!(logs_contain("reason=missing v URL parameter"));
        assert!(logs_contain("target=/add"));
    }
}

//! InfluxDB 1.x HTTP client
//!
//! Batches are posted as line protocol to `/write`. Every call is a single
//! attempt; there is no retry and no buffering.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::error::{Result, TorqueError};
use crate::ingest::{PointBatch, PointSink};

/// InfluxDB client
#[derive(Debug, Clone)]
pub struct InfluxDbClient {
    client: Client,
    base_url: Url,
    user: String,
    pass: String,
}

impl InfluxDbClient {
    /// Create new InfluxDB client
    ///
    /// No connection is made here; an unreachable server shows up on the
    /// first write.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url())
            .map_err(|e| TorqueError::Client(format!("{}: {}", config.base_url(), e)))?;
        let client = Client::builder()
            .build()
            .map_err(|e| TorqueError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            user: config.user.clone(),
            pass: config.pass.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Write endpoint for a batch
    pub fn write_url(&self, batch: &PointBatch) -> Result<Url> {
        let mut url = self
            .base_url
            .join("write")
            .map_err(|e| TorqueError::write(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("db", &batch.database)
            .append_pair("precision", batch.precision.as_str());
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.user.is_empty() {
            request
        } else {
            request.basic_auth(&self.user, Some(&self.pass))
        }
    }

    /// Test connection to InfluxDB
    pub async fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("ping")
            .map_err(|e| TorqueError::Client(e.to_string()))?;

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| TorqueError::Client(format!("Failed to connect to InfluxDB: {e}")))?;

        if response.status().is_success() {
            info!("InfluxDB connection successful: {}", self.base_url);
            Ok(())
        } else {
            Err(TorqueError::Client(format!(
                "InfluxDB ping failed: {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl PointSink for InfluxDbClient {
    async fn write_batch(&self, batch: &PointBatch) -> Result<()> {
        let url = self.write_url(batch)?;
        let body = batch.to_line_protocol();
        debug!("Writing {} points to {}", batch.points.len(), url);

        let response = self
            .authorize(self.client.post(url))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| TorqueError::write(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(TorqueError::write(format!("{status}: {}", detail.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Precision;

    #[test]
    fn test_write_url() {
        let config = StorageConfig {
            host: "influx.local".to_string(),
            port: 9086,
            name: "torque data".to_string(),
            ..Default::default()
        };
        let client = InfluxDbClient::new(&config).unwrap();
        let batch = PointBatch::new(config.name.clone(), Precision::Milliseconds);

        assert_eq!(
            client.write_url(&batch).unwrap().as_str(),
            "http://influx.local:9086/write?db=torque+data&precision=ms"
        );
    }

    #[test]
    fn test_invalid_host_is_client_error() {
        let config = StorageConfig {
            host: "bad host".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            InfluxDbClient::new(&config),
            Err(TorqueError::Client(_))
        ));
    }
}

//! REST gateway for a hosted table store (PostgREST-style API).
//!
//! # Responsibilities
//! - Existence check, signup insert, audit insert, keep-alive probe
//! - Attach service-role credentials to every call
//! - Bound every call with a client-level timeout
//!
//! # Design Decisions
//! - One `reqwest::Client` per gateway; connection pooling is the client's job
//! - Timeouts and transport errors surface as `GatewayError::Transport` and
//!   are mapped by the pipeline to a persistence-failure outcome
//! - No retries here: the pipeline guarantees at most one insert per request

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use super::{Gateway, GatewayError, PingLog, SecurityEvent, WaitlistRecord};

/// Gateway speaking the hosted store's REST dialect.
pub struct RestGateway {
    client: reqwest::Client,
    base_url: Url,
    waitlist_table: String,
    security_table: String,
    ping_table: String,
}

impl RestGateway {
    /// Build a gateway from a validated base URL and service key.
    pub fn new(
        base_url: Url,
        service_key: &str,
        timeout: Duration,
        waitlist_table: String,
        security_table: String,
        ping_table: String,
    ) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", service_key);
        if let (Ok(apikey), Ok(auth)) = (
            HeaderValue::from_str(service_key),
            HeaderValue::from_str(&bearer),
        ) {
            headers.insert("apikey", apikey);
            headers.insert("Authorization", auth);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            waitlist_table,
            security_table,
            ping_table,
        })
    }

    fn table_url(&self, table: &str) -> Url {
        let mut url = self.base_url.clone();
        // Url::join would drop a non-slash-terminated base path.
        {
            let mut segments = url.path_segments_mut().expect("base url is not a base");
            segments.pop_if_empty().extend(["rest", "v1", table]);
        }
        url
    }

    async fn insert_row<T: serde::Serialize>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait::async_trait]
impl Gateway for RestGateway {
    async fn exists(&self, email: &str) -> Result<bool, GatewayError> {
        let filter = format!("eq.{}", email);
        let response = self
            .client
            .get(self.table_url(&self.waitlist_table))
            .query(&[
                ("select", "email"),
                ("email", filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, record: &WaitlistRecord) -> Result<(), GatewayError> {
        self.insert_row(&self.waitlist_table, record).await
    }

    async fn record_event(&self, event: &SecurityEvent) -> Result<(), GatewayError> {
        self.insert_row(&self.security_table, event).await
    }

    async fn count(&self) -> Result<u64, GatewayError> {
        let response = self
            .client
            .get(self.table_url(&self.waitlist_table))
            .header("Prefer", "count=exact")
            .query(&[("select", "email"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // content-range looks like "0-0/42"; the total sits after the slash.
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        Ok(total)
    }

    async fn log_ping(&self, log: &PingLog) -> Result<(), GatewayError> {
        self.insert_row(&self.ping_table, log).await
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::config::JiraConfig;
use crate::error::{DefectLensError, Result};
use crate::fallback::{Fallback, FallbackMonitor};
use crate::providers::CountSource;

const APPROXIMATE_COUNT_PATH: &str = "rest/api/3/search/approximate-count";

pub struct JiraClient {
    client: Client,
    count_url: Url,
    auth_header: String,
    monitor: Arc<FallbackMonitor>,
}

#[derive(Debug, Serialize)]
struct ApproximateCountRequest<'a> {
    jql: &'a str,
}

impl JiraClient {
    pub fn new(config: &JiraConfig, monitor: Arc<FallbackMonitor>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("DefectLens/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| DefectLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let count_url = config
            .base_url
            .join(APPROXIMATE_COUNT_PATH)
            .map_err(|e| DefectLensError::Config(format!("Invalid count URL: {e}")))?;

        Ok(Self {
            client,
            count_url,
            auth_header: config.credentials.basic_auth_header(),
            monitor,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, &self.auth_header)
            .header(ACCEPT, "application/json")
    }

    /// One POST, no retry. The inner `Err` means Jira answered but the body had
    /// no usable count; it describes what came back.
    async fn request_count(&self, jql: &str) -> Result<std::result::Result<u64, String>> {
        let request = self
            .client
            .post(self.count_url.clone())
            .json(&ApproximateCountRequest { jql });
        let request = self.auth_request(request);

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(parse_count(&body).ok_or_else(|| {
            if body.is_empty() {
                format!("HTTP {status} with empty body")
            } else {
                format!("HTTP {status} without a numeric count")
            }
        }))
    }

    /// Approximate number of issues matching `jql`, or 0 when Jira cannot
    /// provide one. Never fails; degraded results go through the monitor.
    pub async fn fetch_approximate_count(&self, jql: &str) -> u64 {
        debug!("Fetching approximate count for JQL: {jql}");

        let reason = match self.request_count(jql).await {
            Ok(Ok(count)) => return count,
            Ok(Err(reason)) => reason,
            Err(e) => e.to_string(),
        };

        self.monitor.record(&Fallback::DegradedCount { jql, reason });
        0
    }
}

#[async_trait]
impl CountSource for JiraClient {
    async fn approximate_count(&self, jql: &str) -> u64 {
        self.fetch_approximate_count(jql).await
    }
}

/// Reads `count` from an approximate-count response body.
pub fn parse_count(body: &str) -> Option<u64> {
    if body.trim().is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("count")?.as_u64()
}

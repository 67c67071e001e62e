//! Crawl job execution: one outbound GET per `crawl_request`.

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use sentinel_domain::config::FetchConfig;
use sentinel_protocol::{WsMessage, CRAWL_ACCEPT, CRAWL_CACHE_CONTROL};

use crate::types::{Job, NodeSdkError};

/// Runs one job to completion and produces the single message reporting it.
///
/// Implementations must always return either `crawl_result` or
/// `crawl_error` for `job.job_id`, and never retry internally.
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    async fn execute(&self, job: Job) -> WsMessage;
}

/// HTTP executor backed by a shared `reqwest::Client`.
///
/// Any completed response, whatever its status code, is a successful
/// crawl.  Only failures below HTTP (DNS, refused, reset, timeout, body
/// read, bad URL) become `crawl_error`.
#[derive(Debug, Clone)]
pub struct CrawlExecutor {
    client: reqwest::Client,
    node_id: Arc<str>,
}

impl CrawlExecutor {
    pub fn new(node_id: impl Into<Arc<str>>, fetch: &FetchConfig) -> Result<Self, NodeSdkError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(CRAWL_ACCEPT));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(CRAWL_CACHE_CONTROL));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(fetch.user_agent.clone());
        if let Some(timeout) = fetch.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| NodeSdkError::Http(e.to_string()))?;

        Ok(Self {
            client,
            node_id: node_id.into(),
        })
    }

    /// Fetch `job.target_url` and package the outcome.
    pub async fn execute_crawl(&self, job: Job) -> WsMessage {
        tracing::info!(job_id = %job.job_id, url = %job.target_url, "crawling");

        match self.fetch(&job.target_url).await {
            Ok((status, body)) => {
                tracing::info!(
                    job_id = %job.job_id,
                    status,
                    bytes = body.len(),
                    "crawl complete"
                );
                WsMessage::CrawlResult {
                    job_id: job.job_id,
                    url: job.target_url,
                    status,
                    body,
                    node_id: self.node_id.to_string(),
                }
            }
            Err(e) => {
                let error = describe(&e);
                tracing::warn!(job_id = %job.job_id, error = %error, "crawl failed");
                WsMessage::CrawlError {
                    job_id: job.job_id,
                    url: job.target_url,
                    error,
                    node_id: self.node_id.to_string(),
                }
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<(u16, String), reqwest::Error> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl JobExecutor for CrawlExecutor {
    async fn execute(&self, job: Job) -> WsMessage {
        self.execute_crawl(job).await
    }
}

/// Error text including its source chain.  Never empty.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        let s = e.to_string();
        if !parts.iter().any(|p| p.contains(&s)) {
            parts.push(s);
        }
        source = e.source();
    }
    let text = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(": ");
    if text.is_empty() {
        "fetch failed".into()
    } else {
        text
    }
}

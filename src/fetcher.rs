use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::WikipediaConfig;
use crate::errors::PipelineError;
use crate::log_fetch_retry;

/// Bounded retry with linearly increasing backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt that follows `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(2),
            timeout: Duration::from_secs(20),
        }
    }
}

impl From<&WikipediaConfig> for RetryPolicy {
    fn from(config: &WikipediaConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_step: Duration::from_millis(config.backoff_ms),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// A validated Wikipedia article location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLocation {
    /// Scheme and host of the article, e.g. `https://en.wikipedia.org`
    pub origin: String,
    /// Path segment after `/wiki/`, still percent-encoded
    pub slug: String,
}

impl ArticleLocation {
    /// Title derived from the slug, used when no summary is available
    pub fn fallback_title(&self) -> String {
        self.slug.replace('_', " ")
    }
}

/// Validate an article URL and pull out its slug. Does no network I/O.
pub fn parse_article_url(raw: &str) -> Result<ArticleLocation, PipelineError> {
    let invalid = || {
        PipelineError::InvalidUrl(format!(
            "'{}' is not a Wikipedia article URL (expected https://<lang>.wikipedia.org/wiki/<Title>)",
            raw
        ))
    };

    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }

    let host = url.host_str().ok_or_else(invalid)?.to_lowercase();
    if host != "wikipedia.org" && !host.ends_with(".wikipedia.org") {
        return Err(invalid());
    }

    let slug = url
        .path()
        .strip_prefix("/wiki/")
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|rest| !rest.is_empty())
        .ok_or_else(invalid)?;

    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };

    Ok(ArticleLocation {
        origin,
        slug: slug.to_string(),
    })
}

/// Page summary as served by the REST API
#[derive(Debug, Clone, Default, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extract: Option<String>,
}

/// Raw article material handed to the extractor
#[derive(Debug, Clone)]
pub struct FetchedArticle {
    pub title: String,
    pub summary: String,
    pub html: String,
}

#[derive(Clone)]
pub struct WikipediaFetcher {
    client: Client,
    base_url: Option<String>,
    user_agent: String,
    retry: RetryPolicy,
}

impl WikipediaFetcher {
    pub fn new(config: &WikipediaConfig) -> Result<Self, PipelineError> {
        Self::with_retry_policy(config, RetryPolicy::from(config))
    }

    pub fn with_retry_policy(
        config: &WikipediaConfig,
        retry: RetryPolicy,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(retry.timeout)
            .build()
            .map_err(|e| PipelineError::Fetch(format!("could not build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            retry,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetch the summary (best effort) and the rendered page (required)
    pub async fn fetch_article(&self, url: &str) -> Result<FetchedArticle, PipelineError> {
        let location = parse_article_url(url)?;
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| location.origin.clone());

        info!(url = %url, slug = %location.slug, base = %base, "Fetching Wikipedia article");

        let summary_url = format!("{}/api/rest_v1/page/summary/{}", base, location.slug);
        let (title, summary) = match self.fetch_summary(&summary_url).await {
            Some(summary) => {
                let title = summary
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| location.fallback_title());
                (title, summary.extract.unwrap_or_default())
            }
            None => (location.fallback_title(), String::new()),
        };

        let page_url = format!("{}/wiki/{}", base, location.slug);
        let response = self.get_with_retry(&page_url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Fetch(format!(
                "{} returned HTTP {}",
                page_url, status
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| PipelineError::Fetch(format!("failed reading {}: {}", page_url, e)))?;

        debug!(
            title = %title,
            summary_length = summary.len(),
            html_length = html.len(),
            "Wikipedia article fetched"
        );

        Ok(FetchedArticle {
            title,
            summary,
            html,
        })
    }

    /// Summary failures never abort the pipeline
    async fn fetch_summary(&self, summary_url: &str) -> Option<SummaryResponse> {
        let response = match self.get_with_retry(summary_url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %summary_url, error = %e, "Summary unavailable, continuing without it");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            warn!(
                url = %summary_url,
                status = %response.status(),
                "Summary endpoint returned non-200, continuing without it"
            );
            return None;
        }

        match response.json::<SummaryResponse>().await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(url = %summary_url, error = %e, "Summary body unreadable, continuing without it");
                None
            }
        }
    }

    /// GET with retries on timeout and connection errors only
    async fn get_with_retry(&self, target: &str) -> Result<reqwest::Response, PipelineError> {
        let mut attempt = 1;
        loop {
            let result = self
                .client
                .get(target)
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .send()
                .await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if is_transient(&e) && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    log_fetch_retry!(
                        target,
                        attempt = attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if is_transient(&e) => {
                    log_fetch_retry!(
                        target,
                        attempt = attempt,
                        max_attempts = self.retry.max_attempts,
                        error = e
                    );
                    return Err(PipelineError::Fetch(format!(
                        "{} unreachable after {} attempts: {}",
                        target, attempt, e
                    )));
                }
                Err(e) => {
                    return Err(PipelineError::Fetch(format!("request to {} failed: {}", target, e)));
                }
            }
        }
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

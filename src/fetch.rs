//! Per-candidate fetch and decode
//!
//! One candidate's failure is data, not control flow: the fetcher returns
//! [`SampleFailure`] instead of raising, and the pipeline decides what a
//! failure means (skip the candidate, keep the run alive). No retries, no
//! disk writes here.

use crate::error::{CurationError, Result};
use crate::source::CandidateRecord;
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Why one candidate was discarded
#[derive(Error, Debug)]
pub enum SampleFailure {
    /// Network or HTTP failure fetching the candidate's resource
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The response body is not a decodable image
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Turns one candidate record into a decoded image, or a recoverable failure
#[async_trait]
pub trait CandidateFetcher: Send + Sync {
    /// Fetch the candidate's resource and decode it into a raster image
    async fn fetch_and_decode(
        &self,
        record: &CandidateRecord,
    ) -> std::result::Result<DynamicImage, SampleFailure>;
}

/// HTTP fetcher with a fixed per-request timeout
///
/// A single client is reused across candidates; connections and decode
/// buffers are scoped per call and released whether the candidate succeeds
/// or fails.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            CurationError::source_unavailable(format!("failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl CandidateFetcher for HttpFetcher {
    async fn fetch_and_decode(
        &self,
        record: &CandidateRecord,
    ) -> std::result::Result<DynamicImage, SampleFailure> {
        let response = self
            .client
            .get(&record.url)
            .send()
            .await
            .map_err(|e| SampleFailure::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SampleFailure::Fetch(format!(
                "HTTP {} for {}",
                response.status(),
                record.url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SampleFailure::Fetch(e.to_string()))?;

        image::load_from_memory(&body).map_err(|e| SampleFailure::Decode(e.to_string()))
    }
}

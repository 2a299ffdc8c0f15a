//! Sample source adapters over the upstream image corpus
//!
//! The pipeline never talks to the network directly for candidate discovery;
//! it pulls from a [`SampleSource`], so the driver can be exercised against a
//! deterministic in-memory stand-in. The concrete [`LaionSource`] pages the
//! Hugging Face datasets-server rows endpoint lazily, and [`ShuffledSource`]
//! decorrelates adjacent upstream rows with a bounded, seeded look-ahead
//! window.

use crate::config::CurateConfig;
use crate::error::{CurationError, Result};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Default datasets-server endpoint for streaming dataset rows
pub const DATASETS_SERVER_BASE: &str = "https://datasets-server.huggingface.co";

/// One upstream entry considered for download
///
/// Transient: produced by a source, consumed once by the fetcher, then
/// discarded. The metadata is the raw upstream row, kept opaque.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    /// Fetchable resource locator
    pub url: String,
    /// Auxiliary upstream metadata, ignored by the pipeline
    pub metadata: serde_json::Value,
}

/// A lazy, possibly-infinite sequence of candidate records
///
/// `Ok(None)` means the upstream is exhausted; the stream is never rewound
/// mid-run.
#[async_trait]
pub trait SampleSource: Send {
    /// Pull the next candidate, or `None` at end of stream
    async fn next_candidate(&mut self) -> Result<Option<CandidateRecord>>;
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: serde_json::Value,
}

/// Extract a candidate from one upstream row.
///
/// The locator key casing varies by dataset revision (`url` vs `URL`);
/// either is accepted. Rows exposing neither are not candidates and are
/// dropped at this level.
fn candidate_from_row(row: &serde_json::Value) -> Option<CandidateRecord> {
    let url = row
        .get("url")
        .or_else(|| row.get("URL"))
        .and_then(serde_json::Value::as_str)?;

    Some(CandidateRecord {
        url: url.to_string(),
        metadata: row.clone(),
    })
}

/// Streaming adapter over the Hugging Face datasets-server rows API
///
/// Pages are requested on demand; the full source is never materialized.
/// Failure to fetch or parse the FIRST page is fatal
/// ([`CurationError::SourceUnavailable`]): the upstream cannot be reached at
/// all, which is distinct from any per-candidate fetch failure. A failure on
/// a later page ends the stream with a warning instead, and the shortfall
/// machinery reports the consequence.
pub struct LaionSource {
    client: Client,
    endpoint: String,
    dataset: String,
    dataset_config: String,
    split: String,
    page_size: usize,
    offset: usize,
    buffered: VecDeque<CandidateRecord>,
    exhausted: bool,
    pages_fetched: usize,
}

impl LaionSource {
    /// Create a source for the dataset named in the configuration
    pub fn new(config: &CurateConfig) -> Result<Self> {
        Self::with_endpoint(config, DATASETS_SERVER_BASE)
    }

    /// Create a source against a specific datasets-server endpoint
    pub fn with_endpoint(config: &CurateConfig, endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| {
                CurationError::source_unavailable(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            dataset: config.dataset.clone(),
            dataset_config: config.dataset_config.clone(),
            split: config.dataset_split.clone(),
            page_size: config.page_size,
            offset: 0,
            buffered: VecDeque::new(),
            exhausted: false,
            pages_fetched: 0,
        })
    }

    /// Parse one rows-endpoint response body into candidate records
    fn parse_page(body: &[u8]) -> std::result::Result<Vec<CandidateRecord>, serde_json::Error> {
        let page: RowsPage = serde_json::from_slice(body)?;
        Ok(page
            .rows
            .iter()
            .filter_map(|entry| candidate_from_row(&entry.row))
            .collect())
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let url = format!("{}/rows", self.endpoint);
        let offset = self.offset.to_string();
        let length = self.page_size.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("dataset", self.dataset.as_str()),
                ("config", self.dataset_config.as_str()),
                ("split", self.split.as_str()),
                ("offset", offset.as_str()),
                ("length", length.as_str()),
            ])
            .send()
            .await;

        let first_page = self.pages_fetched == 0;

        let body = match response {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => return self.page_failure(first_page, &format!("read body: {}", e)),
            },
            Ok(resp) => {
                return self.page_failure(first_page, &format!("HTTP {}", resp.status()));
            },
            Err(e) => return self.page_failure(first_page, &e.to_string()),
        };

        let candidates = match Self::parse_page(&body) {
            Ok(candidates) => candidates,
            Err(e) => return self.page_failure(first_page, &format!("parse rows: {}", e)),
        };

        debug!(
            offset = self.offset,
            candidates = candidates.len(),
            "fetched upstream page"
        );

        if candidates.is_empty() {
            self.exhausted = true;
        }

        self.offset += self.page_size;
        self.pages_fetched += 1;
        self.buffered.extend(candidates);
        Ok(())
    }

    fn page_failure(&mut self, first_page: bool, reason: &str) -> Result<()> {
        if first_page {
            return Err(CurationError::source_unavailable(format!(
                "{} rows for {}: {}",
                self.endpoint, self.dataset, reason
            )));
        }
        warn!(
            dataset = %self.dataset,
            offset = self.offset,
            "upstream page failed, ending stream: {}",
            reason
        );
        self.exhausted = true;
        Ok(())
    }
}

#[async_trait]
impl SampleSource for LaionSource {
    async fn next_candidate(&mut self) -> Result<Option<CandidateRecord>> {
        while self.buffered.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }
        Ok(self.buffered.pop_front())
    }
}

/// Lazily-shuffled view of another source
///
/// Keeps a bounded look-ahead window filled from the inner source and emits a
/// uniformly chosen element each pull. The permutation is fixed by the seed,
/// so a run is restartable from the same seed; the stream is never rewound.
pub struct ShuffledSource<S> {
    inner: S,
    window: Vec<CandidateRecord>,
    capacity: usize,
    rng: StdRng,
}

impl<S: SampleSource> ShuffledSource<S> {
    /// Wrap `inner` with a shuffle window of `capacity` records
    pub fn new(inner: S, capacity: usize, seed: u64) -> Self {
        Self {
            inner,
            window: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

#[async_trait]
impl<S: SampleSource> SampleSource for ShuffledSource<S> {
    async fn next_candidate(&mut self) -> Result<Option<CandidateRecord>> {
        while self.window.len() < self.capacity {
            match self.inner.next_candidate().await? {
                Some(record) => self.window.push(record),
                None => break,
            }
        }

        if self.window.is_empty() {
            return Ok(None);
        }

        let idx = self.rng.gen_range(0..self.window.len());
        Ok(Some(self.window.swap_remove(idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct VecSource(VecDeque<CandidateRecord>);

    impl VecSource {
        fn of_urls(urls: &[&str]) -> Self {
            Self(
                urls.iter()
                    .map(|url| CandidateRecord {
                        url: (*url).to_string(),
                        metadata: serde_json::Value::Null,
                    })
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl SampleSource for VecSource {
        async fn next_candidate(&mut self) -> Result<Option<CandidateRecord>> {
            Ok(self.0.pop_front())
        }
    }

    #[test]
    fn test_candidate_from_row_lowercase_key() {
        let row = json!({"url": "http://example.com/a.jpg", "caption": "a"});
        let candidate = candidate_from_row(&row).unwrap();
        assert_eq!(candidate.url, "http://example.com/a.jpg");
    }

    #[test]
    fn test_candidate_from_row_uppercase_key() {
        let row = json!({"URL": "http://example.com/b.jpg", "NSFW": "unlikely"});
        let candidate = candidate_from_row(&row).unwrap();
        assert_eq!(candidate.url, "http://example.com/b.jpg");
    }

    #[test]
    fn test_row_without_locator_is_not_a_candidate() {
        assert!(candidate_from_row(&json!({"caption": "no link"})).is_none());
        assert!(candidate_from_row(&json!({"url": 42})).is_none());
    }

    #[test]
    fn test_parse_page() {
        let body = json!({
            "features": [],
            "rows": [
                {"row_idx": 0, "row": {"URL": "http://a/0.jpg", "TEXT": "x"}},
                {"row_idx": 1, "row": {"TEXT": "no url here"}},
                {"row_idx": 2, "row": {"url": "http://a/2.jpg"}}
            ],
            "num_rows_total": 3
        });
        let candidates = LaionSource::parse_page(body.to_string().as_bytes()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].url, "http://a/0.jpg");
        assert_eq!(candidates[1].url, "http://a/2.jpg");
    }

    #[test]
    fn test_parse_page_rejects_garbage() {
        assert!(LaionSource::parse_page(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_shuffled_source_is_a_permutation() {
        let urls = ["u0", "u1", "u2", "u3", "u4", "u5"];
        let mut source = ShuffledSource::new(VecSource::of_urls(&urls), 4, 42);

        let mut seen = Vec::new();
        while let Some(record) = source.next_candidate().await.unwrap() {
            seen.push(record.url);
        }

        let mut sorted = seen.clone();
        sorted.sort();
        assert_eq!(sorted, urls.iter().map(|u| (*u).to_string()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_shuffled_source_deterministic_per_seed() {
        let urls = ["u0", "u1", "u2", "u3", "u4", "u5", "u6", "u7"];

        let mut order_a = Vec::new();
        let mut source = ShuffledSource::new(VecSource::of_urls(&urls), 4, 42);
        while let Some(record) = source.next_candidate().await.unwrap() {
            order_a.push(record.url);
        }

        let mut order_b = Vec::new();
        let mut source = ShuffledSource::new(VecSource::of_urls(&urls), 4, 42);
        while let Some(record) = source.next_candidate().await.unwrap() {
            order_b.push(record.url);
        }

        assert_eq!(order_a, order_b);
    }

    #[tokio::test]
    async fn test_shuffle_window_bounds_lookahead() {
        // With a window of 2, the first emitted record must be one of the
        // first two upstream records.
        let urls = ["u0", "u1", "u2", "u3"];
        let mut source = ShuffledSource::new(VecSource::of_urls(&urls), 2, 9);
        let first = source.next_candidate().await.unwrap().unwrap();
        assert!(first.url == "u0" || first.url == "u1");
    }

    #[tokio::test]
    async fn test_shuffled_empty_source() {
        let mut source = ShuffledSource::new(VecSource::of_urls(&[]), 8, 42);
        assert!(source.next_candidate().await.unwrap().is_none());
    }
}

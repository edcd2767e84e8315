//! The per-request decision pipeline
//!
//! Stages run strictly in order and short-circuit:
//!
//! 1. allow-list (fixed delay, no store access)
//! 2. cache tier (read errors degrade to a miss)
//! 3. page fetch (failure is terminal)
//! 4. encode both channels and score (scorer failure fails open, labeled `error`)
//! 5. persist the detection (failure is terminal)
//! 6. cache the verdict, phishing only
//!
//! Benign verdicts never reach the cache, so a cache miss says nothing about
//! a URL's safety.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use super::allow_list::AllowList;
use super::errors::{AnalysisError, AnalysisOutcome};
use super::types::{AnalysisResult, ResultSource};
use crate::config::PipelineConfig;
use crate::retriever::{FetchedPage, NormalizationPolicy, PageRetriever};
use crate::runtime::Sleeper;
use crate::scorer::{Scorer, ScoringError, ScoringResult};
use crate::store::{NewDetection, ResultStore};
use crate::tokenizer::{ContentEncoder, TokenizerError, UrlTokenizer};

/// Outcome of the encode+score stage
struct Scored {
    probability: Result<f64, ScoringError>,
    content_spans: usize,
    content_tokens: usize,
}

#[derive(Clone)]
pub struct DecisionPipeline {
    pub(super) config: PipelineConfig,
    pub(super) allow_list: Arc<AllowList>,
    pub(super) store: ResultStore,
    retriever: PageRetriever,
    normalization: NormalizationPolicy,
    url_tokenizer: Arc<UrlTokenizer>,
    content_encoder: ContentEncoder,
    scorer: Arc<dyn Scorer>,
    sleeper: Arc<dyn Sleeper>,
}

impl DecisionPipeline {
    /// Wire up a pipeline. The allow-list is the curated set extended with
    /// the configured domains and URLs.
    pub fn new(
        config: PipelineConfig,
        store: ResultStore,
        retriever: PageRetriever,
        content_encoder: ContentEncoder,
        scorer: Arc<dyn Scorer>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let allow_list = AllowList::curated_with(&config.whitelist_domains, &config.whitelist_urls);
        let normalization = retriever.config().normalization.clone();
        Self {
            config,
            allow_list: Arc::new(allow_list),
            store,
            retriever,
            normalization,
            url_tokenizer: Arc::new(UrlTokenizer::new()),
            content_encoder,
            scorer,
            sleeper,
        }
    }

    /// Replace the allow-list
    #[must_use]
    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = Arc::new(allow_list);
        self
    }

    #[must_use]
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Whether the scorer can currently serve requests
    pub fn scorer_ready(&self) -> ScoringResult<()> {
        self.scorer.ready()
    }

    /// Classify one URL.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InvalidUrl`] for empty or unnormalizable input
    /// - [`AnalysisError::Fetch`] when the page could not be retrieved
    /// - [`AnalysisError::Encoding`] when the content channel cannot be built
    /// - [`AnalysisError::Persist`] when the detection could not be recorded
    pub async fn analyze(&self, url: &str) -> AnalysisOutcome {
        let raw = url.trim();
        if raw.is_empty() {
            return Err(AnalysisError::InvalidUrl("URL is empty".to_string()));
        }

        let normalized = self.normalization.normalize(raw);

        if self.allow_list.contains(raw)
            || normalized.as_deref().is_ok_and(|n| self.allow_list.contains(n))
        {
            info!(url = raw, "Allow-list hit");
            // keep whitelist latency in line with a real analysis
            self.sleeper.sleep(self.config.whitelist_delay()).await;
            return Ok(AnalysisResult::new(
                false,
                self.config.whitelist_confidence,
                ResultSource::Whitelist,
            ));
        }

        let target = normalized.map_err(|e| AnalysisError::InvalidUrl(e.to_string()))?;

        match self.store.get_cached_result(&target).await {
            Ok(Some(entry)) => {
                info!(url = %target, is_phishing = entry.is_phishing, "Cache hit");
                return Ok(AnalysisResult::new(
                    entry.is_phishing,
                    entry.confidence,
                    ResultSource::Cache,
                ));
            }
            Ok(None) => debug!(url = %target, "Cache miss"),
            Err(e) => warn!(url = %target, error = %e, "Cache read failed, treating as miss"),
        }

        let page = self.retriever.load(&target).await?;
        let attempts = page.attempts;

        let (scored, html) = self.encode_and_score(page).await?;
        let probability = match scored.probability {
            Ok(p) => p,
            Err(e) => {
                warn!(url = %target, error = %e, "Scoring failed, returning labeled fail-open result");
                return Ok(AnalysisResult::scoring_failed());
            }
        };

        let is_phishing = probability >= self.config.phishing_threshold;

        let features = json!({
            "url_length": target.chars().count(),
            "content_spans": scored.content_spans,
            "content_tokens": scored.content_tokens,
            "fetch_attempts": attempts,
        });

        self.store
            .save_detection(NewDetection {
                url: target.clone(),
                is_phishing,
                confidence: probability,
                html_content: Some(html),
                features: Some(features),
            })
            .await
            .map_err(AnalysisError::Persist)?;

        if is_phishing
            && let Err(e) = self
                .store
                .cache_phishing_result(&target, true, probability, self.config.cache_ttl())
                .await
        {
            warn!(url = %target, error = %e, "Failed to cache phishing verdict");
        }

        info!(url = %target, is_phishing, confidence = probability, "Model verdict");
        Ok(AnalysisResult::new(is_phishing, probability, ResultSource::Model))
    }

    /// [`analyze`](Self::analyze) under an outer deadline.
    ///
    /// On expiry the in-flight analysis is dropped; a live browser driver is
    /// closed by its guard.
    ///
    /// # Errors
    ///
    /// Everything `analyze` returns, plus [`AnalysisError::DeadlineExceeded`].
    pub async fn analyze_with_deadline(&self, url: &str, deadline: Duration) -> AnalysisOutcome {
        match tokio::time::timeout(deadline, self.analyze(url)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                warn!(url, deadline_ms, "Analysis deadline exceeded");
                Err(AnalysisError::DeadlineExceeded {
                    url: url.to_string(),
                    deadline,
                })
            }
        }
    }

    /// Tokenize both channels and run the scorer on the blocking pool.
    ///
    /// Returns the page source back for persistence.
    async fn encode_and_score(&self, page: FetchedPage) -> Result<(Scored, String), AnalysisError> {
        let url_tokenizer = Arc::clone(&self.url_tokenizer);
        let encoder = self.content_encoder.clone();
        let scorer = Arc::clone(&self.scorer);
        let max_length = self.config.max_length;

        let task = tokio::task::spawn_blocking(move || -> Result<(Scored, String), TokenizerError> {
            let url_encoding = url_tokenizer.encode_url(&page.url, max_length);
            let prepared = encoder.prepare(&page.html);
            if prepared.is_degenerate() {
                debug!(url = %page.url, "No English content, scoring on URL signal only");
            }
            let content_encoding = encoder.encode_prepared(&prepared, max_length)?;

            let probability = scorer.score(&url_encoding, &content_encoding);
            let scored = Scored {
                probability,
                content_spans: prepared.kept_spans,
                content_tokens: content_encoding.non_pad_len(),
            };
            Ok((scored, page.html))
        });

        match task.await {
            Ok(result) => Ok(result?),
            Err(e) => Ok((
                Scored {
                    probability: Err(ScoringError::Unavailable(format!("scoring task failed: {e}"))),
                    content_spans: 0,
                    content_tokens: 0,
                },
                String::new(),
            )),
        }
    }
}

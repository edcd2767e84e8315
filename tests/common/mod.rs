//! Test utilities shared by the integration suites
//!
//! Everything here is scripted: no browser, no model file, no database file.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use qshing_server::config::{PipelineConfig, RetrieverConfig, StoreConfig};
use qshing_server::pipeline::DecisionPipeline;
use qshing_server::retriever::{DriverError, DriverLauncher, DriverResult, PageDriver, PageRetriever};
use qshing_server::runtime::Sleeper;
use qshing_server::scorer::{Scorer, ScoringError, ScoringResult};
use qshing_server::store::{
    self, CacheTier, DetectionRecord, DetectionStore, MemoryCacheTier, NewDetection, ResultStore,
    SqliteDetectionStore, SqliteFeedbackStore, StoreError, StoreResult,
};
use qshing_server::tokenizer::{
    CONTENT_CLS, CONTENT_SEP, ContentEncoder, SubwordTokenizer, TokenEncoding, TokenizerResult,
};

pub const ENGLISH_LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Account verification</title></head>
<body>
    <p>Your account has been temporarily suspended because of unusual sign-in activity. Please confirm your identity by entering your password below.</p>
    <form><input type="password" name="pw"></form>
</body>
</html>"#;

pub const KOREAN_ONLY_PAGE: &str =
    "<html><body><p>고객님의 계정이 일시적으로 정지되었습니다. 본인 확인을 위해 비밀번호를 입력해 주세요.</p></body></html>";

/// Behavior of one launched driver
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Navigation succeeds and the page source is the given markup
    Load(&'static str),
    /// Navigation fails immediately
    Crash,
    /// Navigation never finishes within any test timeout
    Hang,
    /// The browser cannot even be started
    LaunchFails,
}

struct ScriptedDriver {
    script: Script,
    closes: Arc<AtomicU32>,
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn navigate(&mut self, _url: &str) -> DriverResult<()> {
        match self.script {
            Script::Crash => Err(DriverError::Navigation("net::ERR_CONNECTION_RESET".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn page_source(&mut self) -> DriverResult<String> {
        match self.script {
            Script::Load(html) => Ok(html.to_string()),
            _ => Err(DriverError::PageSource("no document".into())),
        }
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out drivers following a script; once the script runs out every
/// further driver loads `fallback`.
pub struct ScriptedLauncher {
    scripts: Mutex<VecDeque<Script>>,
    fallback: Script,
    launches: AtomicU32,
    closes: Arc<AtomicU32>,
}

impl ScriptedLauncher {
    pub fn new(scripts: &[Script], fallback: Script) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.iter().copied().collect()),
            fallback,
            launches: AtomicU32::new(0),
            closes: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Every driver loads `html`
    pub fn serving(html: &'static str) -> Arc<Self> {
        Self::new(&[], Script::Load(html))
    }

    pub fn launches(&self) -> u32 {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverLauncher for ScriptedLauncher {
    async fn launch(&self) -> DriverResult<Box<dyn PageDriver>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().pop_front().unwrap_or(self.fallback);
        if let Script::LaunchFails = script {
            return Err(DriverError::Launch("chrome binary not found".into()));
        }
        Ok(Box::new(ScriptedDriver {
            script,
            closes: Arc::clone(&self.closes),
        }))
    }
}

/// Records requested waits instead of sleeping
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

/// Always returns the same probability
pub struct FixedScorer {
    probability: f64,
    calls: AtomicU32,
}

impl FixedScorer {
    pub fn new(probability: f64) -> Arc<Self> {
        Arc::new(Self {
            probability,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Scorer for FixedScorer {
    fn score(&self, url: &TokenEncoding, content: &TokenEncoding) -> ScoringResult<f64> {
        assert_eq!(url.len(), content.len(), "channels must be aligned");
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.probability)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Scorer whose model is missing
pub struct FailingScorer;

impl Scorer for FailingScorer {
    fn score(&self, _url: &TokenEncoding, _content: &TokenEncoding) -> ScoringResult<f64> {
        Err(ScoringError::Unavailable("model session not initialized".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn ready(&self) -> ScoringResult<()> {
        Err(ScoringError::Unavailable("model session not initialized".into()))
    }
}

/// Cache tier whose backend is unreachable
pub struct FailingCache;

#[async_trait]
impl CacheTier for FailingCache {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("cache down".into()))
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> StoreResult<()> {
        Err(StoreError::Unavailable("cache down".into()))
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("cache down".into()))
    }
}

/// Detection log whose database is unreachable
pub struct FailingDetections;

#[async_trait]
impl DetectionStore for FailingDetections {
    async fn upsert(&self, _detection: NewDetection) -> StoreResult<DetectionRecord> {
        Err(StoreError::Unavailable("db down".into()))
    }

    async fn recent(&self, _limit: u32, _offset: u32) -> StoreResult<Vec<DetectionRecord>> {
        Err(StoreError::Unavailable("db down".into()))
    }

    async fn recent_phishing(&self, _limit: u32) -> StoreResult<Vec<DetectionRecord>> {
        Err(StoreError::Unavailable("db down".into()))
    }

    async fn count(&self) -> StoreResult<i64> {
        Err(StoreError::Unavailable("db down".into()))
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("db down".into()))
    }
}

/// A result store over in-memory SQLite with the given cache and, when
/// supplied, a replacement detection log
pub async fn store_with(
    cache: Arc<dyn CacheTier>,
    detections: Option<Arc<dyn DetectionStore>>,
) -> ResultStore {
    let pool = store::connect(&StoreConfig::in_memory())
        .await
        .expect("in-memory database");
    let detections =
        detections.unwrap_or_else(|| Arc::new(SqliteDetectionStore::new(pool.clone())));
    ResultStore::new(cache, detections, Arc::new(SqliteFeedbackStore::new(pool)))
}

/// One id per whitespace-separated word; `[CLS]` and `[SEP]` map to 101/102
pub struct WordTokenizer;

impl SubwordTokenizer for WordTokenizer {
    fn encode(&self, text: &str, max_length: usize) -> TokenizerResult<TokenEncoding> {
        let ids = text
            .replace(CONTENT_CLS, " 101 ")
            .replace(CONTENT_SEP, " 102 ")
            .split_whitespace()
            .map(|word| word.parse::<i64>().unwrap_or(1000))
            .collect();
        Ok(TokenEncoding::from_ids(ids, max_length, 0))
    }
}

pub fn retriever_config() -> RetrieverConfig {
    RetrieverConfig {
        retries: 3,
        page_load_timeout_ms: 50,
        settle_delay_ms: 0,
        backoff_base_ms: 500,
        backoff_jitter_ms: 0,
        ..RetrieverConfig::default()
    }
}

pub fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        max_length: 64,
        ..PipelineConfig::default()
    }
}

/// A pipeline over an in-memory store with scripted collaborators
pub struct Harness {
    pub pipeline: DecisionPipeline,
    pub store: ResultStore,
    pub launcher: Arc<ScriptedLauncher>,
    pub sleeper: Arc<RecordingSleeper>,
}

pub async fn harness(launcher: Arc<ScriptedLauncher>, scorer: Arc<dyn Scorer>) -> Harness {
    harness_with(launcher, scorer, pipeline_config()).await
}

pub async fn harness_with(
    launcher: Arc<ScriptedLauncher>,
    scorer: Arc<dyn Scorer>,
    config: PipelineConfig,
) -> Harness {
    let store = ResultStore::connect(&StoreConfig::in_memory(), Arc::new(MemoryCacheTier::new()))
        .await
        .expect("in-memory store");
    harness_with_store(launcher, scorer, config, store)
}

pub fn harness_with_store(
    launcher: Arc<ScriptedLauncher>,
    scorer: Arc<dyn Scorer>,
    config: PipelineConfig,
    store: ResultStore,
) -> Harness {
    let sleeper = Arc::new(RecordingSleeper::default());
    let retriever = PageRetriever::new(launcher.clone(), sleeper.clone(), retriever_config());

    let pipeline = DecisionPipeline::new(
        config,
        store.clone(),
        retriever,
        ContentEncoder::new(Arc::new(WordTokenizer)),
        scorer,
        sleeper.clone(),
    );

    Harness {
        pipeline,
        store,
        launcher,
        sleeper,
    }
}

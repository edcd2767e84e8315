//! Retry engine for page retrieval
//!
//! One [`RetrieverSession`] per `load` call. Each attempt runs
//! `DriverInit -> Navigating -> Loaded` on a brand new driver; a timeout or
//! any driver error tears that driver down and, if attempts remain, backs
//! off before trying again with a fresh one.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::driver::{DriverGuard, DriverLauncher};
use super::errors::{DriverError, DriverResult, FetchError, FetchResult};
use super::page_timeout::with_page_timeout;
use crate::config::RetrieverConfig;
use crate::runtime::Sleeper;

/// Where a session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrieverState {
    Idle,
    DriverInit,
    Navigating,
    Loaded,
    Timeout,
    DriverError,
}

/// Page source captured by a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Normalized URL that was actually navigated to
    pub url: String,
    pub html: String,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Shared, stateless front of the retriever.
///
/// Cheap to clone; every `load` gets its own session and its own drivers.
#[derive(Clone)]
pub struct PageRetriever {
    launcher: Arc<dyn DriverLauncher>,
    sleeper: Arc<dyn Sleeper>,
    config: RetrieverConfig,
}

impl PageRetriever {
    pub fn new(
        launcher: Arc<dyn DriverLauncher>,
        sleeper: Arc<dyn Sleeper>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            launcher,
            sleeper,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Load `url` and return its serialized page source.
    ///
    /// # Errors
    ///
    /// [`FetchError::InvalidUrl`] if the URL cannot be normalized,
    /// [`FetchError::Exhausted`] once every attempt has failed.
    pub async fn load(&self, url: &str) -> FetchResult<FetchedPage> {
        self.session(url)?.run().await
    }

    /// Start a session for `url` without running it
    ///
    /// # Errors
    ///
    /// [`FetchError::InvalidUrl`] if the URL cannot be normalized.
    pub fn session(&self, url: &str) -> FetchResult<RetrieverSession<'_>> {
        let target = self.config.normalization.normalize(url)?;
        Ok(RetrieverSession {
            retriever: self,
            target,
            state: RetrieverState::Idle,
            attempts: 0,
        })
    }

    fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        let base = self.config.backoff_base_ms;
        let exp = base.saturating_mul(2u64.saturating_pow(failed_attempt.saturating_sub(1)));
        let jitter = match self.config.backoff_jitter_ms {
            0 => 0,
            max => rand::rng().random_range(0..=max),
        };
        Duration::from_millis(exp.saturating_add(jitter))
    }
}

/// One retry-bounded sequence of load attempts
pub struct RetrieverSession<'a> {
    retriever: &'a PageRetriever,
    target: String,
    state: RetrieverState,
    attempts: u32,
}

impl RetrieverSession<'_> {
    #[must_use]
    pub fn state(&self) -> RetrieverState {
        self.state
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Drive attempts until one loads or the budget is spent.
    ///
    /// # Errors
    ///
    /// [`FetchError::Exhausted`] carrying the last driver error.
    pub async fn run(&mut self) -> FetchResult<FetchedPage> {
        let max_attempts = self.retriever.config.retries.max(1);
        let mut last_error = DriverError::Released;

        while self.attempts < max_attempts {
            self.attempts += 1;
            let attempt = self.attempts;

            match self.attempt().await {
                Ok(html) => {
                    self.state = RetrieverState::Loaded;
                    info!(
                        url = %self.target,
                        attempt,
                        bytes = html.len(),
                        "Page loaded"
                    );
                    return Ok(FetchedPage {
                        url: self.target.clone(),
                        html,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    self.state = if e.is_timeout() {
                        RetrieverState::Timeout
                    } else {
                        RetrieverState::DriverError
                    };
                    warn!(
                        url = %self.target,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Page load attempt failed"
                    );
                    last_error = e;
                }
            }

            if self.attempts < max_attempts {
                let delay = self.retriever.backoff_delay(attempt);
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                debug!(url = %self.target, delay_ms, "Backing off before retry");
                self.retriever.sleeper.sleep(delay).await;
            }
        }

        Err(FetchError::Exhausted {
            url: self.target.clone(),
            attempts: self.attempts,
            last_error,
        })
    }

    /// A single attempt on a fresh driver. The driver is released before
    /// this returns, whatever the outcome.
    async fn attempt(&mut self) -> DriverResult<String> {
        let retriever = self.retriever;

        self.state = RetrieverState::DriverInit;
        let driver = retriever.launcher.launch().await?;
        let mut guard = DriverGuard::new(driver, format!("{}#{}", self.target, self.attempts));

        self.state = RetrieverState::Navigating;
        let outcome = capture(
            &mut guard,
            &self.target,
            &retriever.config,
            retriever.sleeper.as_ref(),
        )
        .await;

        guard.release().await;
        outcome
    }
}

async fn capture(
    guard: &mut DriverGuard,
    url: &str,
    config: &RetrieverConfig,
    sleeper: &dyn Sleeper,
) -> DriverResult<String> {
    with_page_timeout(
        guard.driver()?.navigate(url),
        config.page_load_timeout(),
        "page load",
    )
    .await?;

    // rendering grace period for late scripts
    sleeper.sleep(config.settle_delay()).await;

    let html = guard.driver()?.page_source().await?;
    if html.trim().is_empty() {
        return Err(DriverError::EmptyPage);
    }
    Ok(html)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::retriever::driver::PageDriver;

    #[derive(Clone, Copy)]
    enum Script {
        Load(&'static str),
        Timeout,
        Crash,
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
                Script::Timeout => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
                Script::Crash => Err(DriverError::Navigation("renderer crashed".into())),
                _ => Ok(()),
            }
        }

        async fn page_source(&mut self) -> DriverResult<String> {
            match self.script {
                Script::Load(html) => Ok(html.to_string()),
                _ => Err(DriverError::PageSource("no page".into())),
            }
        }

        async fn close(&mut self) -> DriverResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScriptedLauncher {
        scripts: Mutex<VecDeque<Script>>,
        launches: AtomicU32,
        closes: Arc<AtomicU32>,
    }

    impl ScriptedLauncher {
        fn new(scripts: &[Script]) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts.iter().copied().collect()),
                launches: AtomicU32::new(0),
                closes: Arc::new(AtomicU32::new(0)),
            })
        }
    }

    #[async_trait]
    impl DriverLauncher for ScriptedLauncher {
        async fn launch(&self) -> DriverResult<Box<dyn PageDriver>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            let script = self.scripts.lock().pop_front().unwrap_or(Script::Crash);
            if let Script::LaunchFails = script {
                return Err(DriverError::Launch("no chrome".into()));
            }
            Ok(Box::new(ScriptedDriver {
                script,
                closes: Arc::clone(&self.closes),
            }))
        }
    }

    #[derive(Default)]
    struct RecordingSleeper(Mutex<Vec<Duration>>);

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().push(duration);
        }
    }

    fn config() -> RetrieverConfig {
        RetrieverConfig {
            retries: 3,
            page_load_timeout_ms: 20,
            settle_delay_ms: 100,
            backoff_base_ms: 500,
            backoff_jitter_ms: 0,
            ..RetrieverConfig::default()
        }
    }

    fn retriever(
        launcher: &Arc<ScriptedLauncher>,
        sleeper: &Arc<RecordingSleeper>,
    ) -> PageRetriever {
        PageRetriever::new(launcher.clone(), sleeper.clone(), config())
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let launcher = ScriptedLauncher::new(&[Script::Load("<html>ok</html>")]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let retriever = retriever(&launcher, &sleeper);

        let mut session = retriever.session("example.com").expect("valid url");
        assert_eq!(session.state(), RetrieverState::Idle);

        let page = session.run().await.expect("page should load");
        assert_eq!(page.url, "https://www.example.com/");
        assert_eq!(page.html, "<html>ok</html>");
        assert_eq!(page.attempts, 1);
        assert_eq!(session.state(), RetrieverState::Loaded);
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
        assert_eq!(*sleeper.0.lock(), vec![Duration::from_millis(100)]);
    }

    #[tokio::test]
    async fn test_recovers_after_crash_with_backoff() {
        let launcher = ScriptedLauncher::new(&[Script::Crash, Script::LaunchFails, Script::Load("<p>x</p>")]);
        let sleeper = Arc::new(RecordingSleeper::default());

        let page = retriever(&launcher, &sleeper)
            .load("https://www.example.com/")
            .await
            .expect("third attempt should load");

        assert_eq!(page.attempts, 3);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 3);
        // launch failure has no driver to close
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 2);
        assert_eq!(
            *sleeper.0.lock(),
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(100),
            ]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let launcher = ScriptedLauncher::new(&[Script::Timeout, Script::Timeout, Script::Timeout]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let retriever = retriever(&launcher, &sleeper);

        let mut session = retriever.session("example.com").expect("valid url");
        let err = session.run().await.expect_err("every attempt times out");

        match err {
            FetchError::Exhausted {
                attempts,
                last_error,
                url,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.is_timeout());
                assert_eq!(url, "https://www.example.com/");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.state(), RetrieverState::Timeout);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 3);
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_source_is_a_failed_attempt() {
        let launcher = ScriptedLauncher::new(&[Script::Load("  "), Script::Load("<b>late</b>")]);
        let sleeper = Arc::new(RecordingSleeper::default());

        let page = retriever(&launcher, &sleeper)
            .load("example.com")
            .await
            .expect("second attempt should load");
        assert_eq!(page.attempts, 2);
        assert_eq!(page.html, "<b>late</b>");
    }

    #[tokio::test]
    async fn test_invalid_url_never_launches() {
        let launcher = ScriptedLauncher::new(&[]);
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = retriever(&launcher, &sleeper)
            .load("ftp://example.com")
            .await
            .expect_err("ftp is not navigable");
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    }
}

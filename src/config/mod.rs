//! Service configuration
//!
//! Defaults live on the types; [`ServiceConfig::from_env`] overlays
//! `QSHING_*` environment variables (a `.env` file is honored) and
//! [`ServiceConfig::validate`] rejects values the service cannot run with.

mod types;

pub use types::{ModelConfig, PipelineConfig, RetrieverConfig, ServerConfig, ServiceConfig, StoreConfig};

use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl ServiceConfig {
    /// Defaults overlaid with process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when a variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each key.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);
        let mut config = Self::default();

        let retriever = &mut config.retriever;
        if let Some(secs) = env.parse::<u64>("QSHING_HTML_LOAD_TIMEOUT")? {
            retriever.page_load_timeout_ms = secs.saturating_mul(1000);
        }
        env.set("QSHING_HTML_LOAD_RETRIES", &mut retriever.retries)?;
        env.set("QSHING_SETTLE_DELAY_MS", &mut retriever.settle_delay_ms)?;
        env.set("QSHING_BACKOFF_BASE_MS", &mut retriever.backoff_base_ms)?;
        env.set("QSHING_BACKOFF_JITTER_MS", &mut retriever.backoff_jitter_ms)?;
        env.set("QSHING_HEADLESS", &mut retriever.headless)?;
        env.set("QSHING_FORCE_WWW", &mut retriever.normalization.force_www)?;
        if let Some(path) = env.get("QSHING_CHROME_BIN") {
            retriever.chrome_executable = Some(PathBuf::from(path));
        }

        let pipeline = &mut config.pipeline;
        env.set("QSHING_MAX_LENGTH", &mut pipeline.max_length)?;
        env.set("QSHING_PHISHING_THRESHOLD", &mut pipeline.phishing_threshold)?;
        env.set("QSHING_WHITELIST_DELAY_MS", &mut pipeline.whitelist_delay_ms)?;
        env.set("QSHING_CACHE_TTL", &mut pipeline.cache_ttl_secs)?;
        env.set("QSHING_REFRESH_LIMIT", &mut pipeline.refresh_limit)?;
        if let Some(domains) = env.list("QSHING_WHITELIST_DOMAINS") {
            pipeline.whitelist_domains = domains;
        }
        if let Some(urls) = env.list("QSHING_WHITELIST_URLS") {
            pipeline.whitelist_urls = urls;
        }

        if let Some(url) = env.get("QSHING_DATABASE_URL") {
            config.store.database_url = url;
        }
        env.set("QSHING_DB_MAX_CONNECTIONS", &mut config.store.max_connections)?;

        if let Some(path) = env.get("QSHING_MODEL_PATH") {
            config.model.model_path = PathBuf::from(path);
        }
        if let Some(path) = env.get("QSHING_TOKENIZER_PATH") {
            config.model.tokenizer_path = PathBuf::from(path);
        }
        if let Some(name) = env.get("QSHING_PROBABILITY_OUTPUT") {
            config.model.probability_output = Some(name);
        }

        if let Some(host) = env.get("QSHING_HOST") {
            config.server.host = host;
        }
        env.set("QSHING_PORT", &mut config.server.port)?;
        env.set("QSHING_ANALYZE_DEADLINE", &mut config.server.analyze_deadline_secs)?;
        if let Some(origins) = env.list("QSHING_CORS_ORIGINS") {
            config.server.cors_origins = origins
                .into_iter()
                .map(|o| o.trim_end_matches('/').to_string())
                .collect();
        }

        Ok(config)
    }

    /// Reject settings the service cannot run with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.retriever.retries == 0 {
            return fail("retriever.retries must be at least 1");
        }
        if self.retriever.page_load_timeout_ms == 0 {
            return fail("retriever.page_load_timeout_ms must be positive");
        }
        if self.pipeline.max_length < 2 {
            return fail("pipeline.max_length must be at least 2");
        }
        for (name, value) in [
            ("pipeline.phishing_threshold", self.pipeline.phishing_threshold),
            ("pipeline.whitelist_confidence", self.pipeline.whitelist_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!("{name} must be within [0, 1]")));
            }
        }
        if self.pipeline.cache_ttl_secs == 0 {
            return fail("pipeline.cache_ttl_secs must be positive");
        }
        if self.store.database_url.trim().is_empty() {
            return fail("store.database_url must not be empty");
        }
        if self.server.analyze_deadline_secs == 0 {
            return fail("server.analyze_deadline_secs must be positive");
        }
        if self.store.max_connections == 0 {
            return fail("store.max_connections must be at least 1");
        }
        Ok(())
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty, trimmed value
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
                value,
            }),
        }
    }

    fn set<T>(&self, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if let Some(value) = self.parse(key)? {
            *slot = value;
        }
        Ok(())
    }

    /// Comma-separated list with blanks dropped
    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

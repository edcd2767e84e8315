//! Shared configuration constants for the detection service
//!
//! Default values used by the config layer, the retriever and the pipeline
//! so that the same numbers are not repeated across modules.

/// Fixed length of both token encodings fed to the scorer.
///
/// The scoring model was trained on 512-token inputs for both the URL and
/// the content channel; changing this requires a re-exported model.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Probability at or above which a URL is classified as phishing.
pub const DEFAULT_PHISHING_THRESHOLD: f64 = 0.5;

/// Confidence reported for allow-listed URLs.
pub const WHITELIST_CONFIDENCE: f64 = 0.01;

/// Artificial latency applied to allow-list hits (milliseconds)
///
/// Keeps whitelist responses from being distinguishable by timing alone.
pub const WHITELIST_DELAY_MS: u64 = 1000;

/// Cache time-to-live: one day
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Prefix applied to every cache-tier key.
pub const CACHE_KEY_PREFIX: &str = "phishing:";

/// Default number of phishing records pushed back into the cache by a refresh.
pub const DEFAULT_REFRESH_LIMIT: u32 = 1000;

/// Page-load timeout for a single navigation attempt (seconds)
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;

/// Number of driver attempts before a fetch is declared failed.
pub const DEFAULT_FETCH_RETRIES: u32 = 3;

/// Rendering grace period after navigation completes (milliseconds)
///
/// Scripts that rewrite the DOM right after `load` (common on phishing kits
/// that assemble the login form client-side) need a moment to settle before
/// the page source is captured.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Base delay for exponential backoff between fetch attempts (milliseconds)
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Upper bound of the random jitter added to each backoff (milliseconds)
pub const DEFAULT_BACKOFF_JITTER_MS: u64 = 250;

/// Interval of the background sweep that evicts expired cache entries.
pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 60;

/// Chrome user agent string presented by the headless driver
///
/// Some phishing kits serve a blank page to obvious automation user agents,
/// so the driver announces itself as a regular desktop Chrome.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

//! Chromium-backed page driver
//!
//! Each launch starts its own Chromium process with a private profile
//! directory. Nothing is pooled: a driver lives for exactly one fetch
//! attempt and is torn down afterwards, so a crashed or wedged renderer can
//! never leak into the next attempt or into a concurrent analysis.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::OnceCell;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use super::driver::{DriverLauncher, PageDriver};
use super::errors::{DriverError, DriverResult};
use crate::config::RetrieverConfig;
use crate::utils::constants::CHROME_USER_AGENT;

/// Launches one headless Chromium per driver session
pub struct ChromiumLauncher {
    headless: bool,
    configured_executable: Option<PathBuf>,
    request_timeout: Duration,
    executable: OnceCell<PathBuf>,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(config: &RetrieverConfig) -> Self {
        Self {
            headless: config.headless,
            configured_executable: config.chrome_executable.clone(),
            request_timeout: config.page_load_timeout(),
            executable: OnceCell::new(),
        }
    }

    /// Resolve the browser binary once: configured path, then a system
    /// install, then a managed download.
    async fn executable(&self) -> DriverResult<&Path> {
        let path = self
            .executable
            .get_or_try_init(|| async {
                if let Some(path) = &self.configured_executable {
                    if path.exists() {
                        return Ok(path.clone());
                    }
                    warn!(path = %path.display(), "Configured Chrome executable does not exist");
                }
                match find_browser_executable() {
                    Some(path) => Ok(path),
                    None => download_managed_browser().await,
                }
            })
            .await?;
        Ok(path.as_path())
    }
}

#[async_trait]
impl DriverLauncher for ChromiumLauncher {
    async fn launch(&self) -> DriverResult<Box<dyn PageDriver>> {
        let chrome_path = self.executable().await?.to_path_buf();

        let user_data_dir = std::env::temp_dir().join(format!("qshing_chrome_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&user_data_dir).map_err(|e| {
            DriverError::Launch(format!(
                "failed to create user data directory {}: {e}",
                user_data_dir.display()
            ))
        })?;

        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(self.request_timeout)
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir.clone())
            .chrome_executable(chrome_path);

        builder = if self.headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };

        let browser_config = builder
            .arg(format!("--user-agent={CHROME_USER_AGENT}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-print-preview")
            .arg("--disable-software-rasterizer")
            .arg("--disable-setuid-sandbox")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--ignore-certificate-errors")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-background-networking")
            .arg("--disable-breakpad")
            .arg("--disable-features=TranslateUI")
            .arg("--disable-hang-monitor")
            .arg("--disable-prompt-on-repost")
            .arg("--password-store=basic")
            .arg("--use-mock-keychain")
            .arg("--mute-audio")
            .build()
            .map_err(|e| DriverError::Launch(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = match Browser::launch(browser_config).await {
            Ok(launched) => launched,
            Err(e) => {
                remove_profile_dir(&user_data_dir);
                return Err(DriverError::Launch(e.to_string()));
            }
        };

        let handler_task = task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let msg = e.to_string();
                    // chromiumoxide does not know every CDP event Chrome emits
                    if msg.contains("data did not match any variant of untagged enum Message")
                        || msg.contains("Failed to deserialize WS response")
                    {
                        trace!("Suppressed benign CDP serialization error: {}", msg);
                    } else {
                        error!("Browser handler error: {:?}", e);
                    }
                }
            }
            debug!("Browser handler task completed");
        });

        info!(profile = %user_data_dir.display(), "Launched Chromium driver");

        Ok(Box::new(ChromiumDriver {
            browser,
            handler: handler_task,
            page: None,
            user_data_dir: Some(user_data_dir),
            closed: false,
        }))
    }
}

/// A running Chromium with at most one open tab
///
/// `Drop` aborts the CDP handler and removes the profile directory;
/// `Browser`'s own drop kills the child process.
pub struct ChromiumDriver {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
    user_data_dir: Option<PathBuf>,
    closed: bool,
}

impl ChromiumDriver {
    async fn page(&mut self) -> DriverResult<Page> {
        if let Some(page) = &self.page {
            return Ok(page.clone());
        }
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Navigation(format!("failed to open tab: {e}")))?;
        self.page = Some(page.clone());
        Ok(page)
    }

    fn cleanup_profile_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            remove_profile_dir(&path);
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::Released);
        }
        let page = self.page().await?;
        page.goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn page_source(&mut self) -> DriverResult<String> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| DriverError::PageSource("no page has been loaded".into()))?;
        page.content()
            .await
            .map_err(|e| DriverError::PageSource(e.to_string()))
    }

    async fn close(&mut self) -> DriverResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(page) = self.page.take()
            && let Err(e) = page.close().await
        {
            debug!("Failed to close tab before browser shutdown: {}", e);
        }

        // Browser::close must be awaited explicitly; dropping only kills the child
        let close_result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Close(e.to_string()));

        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }

        self.handler.abort();
        self.cleanup_profile_dir();

        close_result
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handler.abort();
        if self.user_data_dir.is_some() {
            debug!("ChromiumDriver dropped without close, removing profile in Drop");
            self.cleanup_profile_dir();
        }
    }
}

fn remove_profile_dir(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        warn!(
            "Failed to clean up profile directory {}: {}. Manual cleanup may be required.",
            path.display(),
            e
        );
    }
}

/// Find a Chrome/Chromium executable on this machine.
///
/// `CHROMIUM_PATH` wins over the platform search paths; on Unix `which` is
/// consulted last.
#[must_use]
pub fn find_browser_executable() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Some(path);
        }
        warn!("CHROMIUM_PATH points to non-existent file: {}", path.display());
    }

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for candidate in candidates {
        let path = match candidate.strip_prefix("~/") {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            },
            None => PathBuf::from(candidate),
        };
        if path.exists() {
            info!("Found browser at: {}", path.display());
            return Some(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!("Found browser using 'which': {}", found);
                    return Some(PathBuf::from(found));
                }
            }
        }
    }

    warn!("No Chrome/Chromium executable found, falling back to managed download");
    None
}

/// Download a managed Chromium into the user cache directory.
async fn download_managed_browser() -> DriverResult<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("qshing")
        .join("chromium");

    std::fs::create_dir_all(&cache_dir)
        .map_err(|e| DriverError::Launch(format!("failed to create browser cache dir: {e}")))?;

    info!(dir = %cache_dir.display(), "Downloading managed Chromium");

    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .map_err(|e| DriverError::Launch(format!("failed to build fetcher options: {e}")))?;

    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .map_err(|e| DriverError::Launch(format!("failed to download Chromium: {e}")))?;

    info!("Downloaded Chromium to: {}", revision.folder_path.display());
    Ok(revision.executable_path)
}

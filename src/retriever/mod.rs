//! Page retrieval through a headless browser
//!
//! [`PageRetriever::load`] normalizes a URL, then drives fresh browser
//! sessions through a bounded retry loop until one yields a non-empty page
//! source. Every driver is released on every exit path.

mod chromium;
mod driver;
mod errors;
mod normalize;
mod page_timeout;
mod session;

pub use chromium::{ChromiumDriver, ChromiumLauncher, find_browser_executable};
pub use driver::{DriverGuard, DriverLauncher, PageDriver};
pub use errors::{DriverError, DriverResult, FetchError, FetchResult};
pub use normalize::{DefaultScheme, NormalizationPolicy, NormalizeError};
pub use page_timeout::with_page_timeout;
pub use session::{FetchedPage, PageRetriever, RetrieverSession, RetrieverState};

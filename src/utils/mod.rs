pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{cache_key, extract_host};

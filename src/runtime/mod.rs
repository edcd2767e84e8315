//! Async plumbing shared by the retriever and the pipeline
//!
//! - [`Sleeper`]: injectable wait clock, so retry backoff and fixed delays can
//!   be observed in tests without real sleeping
//! - [`RefreshRequest`]: awaitable handle for background cache refreshes

pub mod async_wrappers;
pub mod clock;

pub use async_wrappers::RefreshRequest;
pub use clock::{Sleeper, TokioSleeper};

//! Decision pipeline and the cache refresh job

mod allow_list;
mod analyzer;
mod errors;
mod refresh;
mod types;

pub use allow_list::{AllowList, CURATED_DOMAINS, CURATED_URLS};
pub use analyzer::DecisionPipeline;
pub use errors::{AnalysisError, AnalysisOutcome};
pub use types::{AnalysisRequest, AnalysisResult, ResultSource};

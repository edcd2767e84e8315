pub mod api;
pub mod config;
pub mod pipeline;
pub mod retriever;
pub mod runtime;
pub mod scorer;
pub mod store;
pub mod tokenizer;
pub mod utils;

pub use api::{AppState, create_router};
pub use config::{ConfigError, ServiceConfig};
pub use pipeline::{AnalysisError, AnalysisResult, DecisionPipeline, ResultSource};
pub use retriever::{ChromiumLauncher, PageRetriever};
pub use scorer::{OnnxScorer, Scorer};
pub use store::{MemoryCacheTier, ResultStore};
pub use tokenizer::{ContentEncoder, HfSubwordTokenizer, UrlTokenizer};

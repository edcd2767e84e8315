//! ONNX Runtime scorer for the dual-channel URL/content model.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{Scorer, ScoringError, ScoringResult, validate_probability};
use crate::tokenizer::TokenEncoding;

/// Model input names, in the order the export declares them
const URL_INPUT_IDS: &str = "url_input_ids";
const URL_ATTENTION_MASK: &str = "url_attention_mask";
const HTML_INPUT_IDS: &str = "html_input_ids";
const HTML_ATTENTION_MASK: &str = "html_attention_mask";

pub struct OnnxScorer {
    /// `Session::run` needs `&mut self`
    session: Mutex<Session>,
    /// Output holding the probability; the last output when unset
    probability_output: Option<String>,
    model_name: String,
}

impl OnnxScorer {
    /// Load the exported model once at startup.
    ///
    /// # Errors
    ///
    /// [`ScoringError::ModelLoad`] if the file is missing or ONNX Runtime
    /// rejects it.
    pub fn load(model_path: &Path, probability_output: Option<String>) -> ScoringResult<Self> {
        let load_err = |reason: String| ScoringError::ModelLoad {
            path: model_path.display().to_string(),
            reason,
        };

        if !model_path.exists() {
            return Err(load_err("model file not found".to_string()));
        }

        let session = Session::builder()
            .map_err(|e| load_err(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| load_err(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| load_err(e.to_string()))?;

        let model_name = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx-model")
            .to_string();

        info!(model = %model_name, "Scoring model loaded");

        Ok(Self {
            session: Mutex::new(session),
            probability_output,
            model_name,
        })
    }
}

fn tensor(values: &[i64]) -> ScoringResult<Tensor<i64>> {
    Tensor::from_array((vec![1i64, values.len() as i64], values.to_vec()))
        .map_err(|e| ScoringError::Inference(format!("tensor creation error: {e}")))
}

impl Scorer for OnnxScorer {
    fn score(&self, url: &TokenEncoding, content: &TokenEncoding) -> ScoringResult<f64> {
        if url.len() != content.len() {
            return Err(ScoringError::Inference(format!(
                "channel lengths differ: url={} content={}",
                url.len(),
                content.len()
            )));
        }

        let inputs = ort::inputs![
            URL_INPUT_IDS => tensor(&url.input_ids)?,
            URL_ATTENTION_MASK => tensor(&url.attention_mask)?,
            HTML_INPUT_IDS => tensor(&content.input_ids)?,
            HTML_ATTENTION_MASK => tensor(&content.attention_mask)?,
        ];

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| ScoringError::Inference(e.to_string()))?;

        let selected = match &self.probability_output {
            Some(wanted) => outputs.iter().find(|(name, _)| *name == wanted.as_str()),
            None => outputs.iter().last(),
        };
        let (name, output) = selected
            .ok_or_else(|| ScoringError::Unavailable("model produced no probability output".into()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ScoringError::Inference(format!("tensor extraction failed: {e}")))?;

        // [1] / [1, 1] carry p directly; [1, 2] is (benign, phishing)
        let p = match data {
            [p] => *p,
            [_, p] => *p,
            _ => {
                return Err(ScoringError::Unavailable(format!(
                    "unexpected shape {shape:?} for output '{name}'"
                )));
            }
        };

        debug!(output = %name, probability = p, "Model scored input");
        validate_probability(f64::from(p))
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

mod openai;

use async_trait::async_trait;

use crate::db::models::Suggestion;
use crate::db::types::ModelTier;

pub(crate) use openai::OpenAiCorrectionProvider;

#[derive(Debug, Clone)]
pub(crate) struct CorrectionRequest {
    pub(crate) text: String,
    pub(crate) word_count: usize,
    pub(crate) model: ModelTier,
    pub(crate) include_alternatives: bool,
    pub(crate) request_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CorrectionOutcome {
    pub(crate) corrected_text: String,
    pub(crate) suggestions: Vec<Suggestion>,
    pub(crate) alternatives: Vec<String>,
    pub(crate) duration_seconds: f64,
}

/// External text-correction backend. Any error is treated the same way by
/// callers; only its message is kept.
#[async_trait]
pub(crate) trait CorrectionProvider: Send + Sync {
    async fn correct(&self, request: CorrectionRequest) -> anyhow::Result<CorrectionOutcome>;
}

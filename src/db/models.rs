use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{ModelTier, SubmissionStatus};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Submission {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) request_id: String,
    pub(crate) original_text: String,
    pub(crate) original_rich_text: Option<String>,
    pub(crate) word_count: i32,
    pub(crate) model_used: ModelTier,
    pub(crate) include_alternatives: bool,
    pub(crate) status: SubmissionStatus,
    pub(crate) corrected_text: Option<String>,
    pub(crate) suggestions: Json<Vec<Suggestion>>,
    pub(crate) alternatives: Json<Vec<String>>,
    pub(crate) processing_time: Option<f64>,
    pub(crate) error: Option<String>,
    pub(crate) archived: bool,
    pub(crate) archived_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One correction inside the submitted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Suggestion {
    pub(crate) original: String,
    pub(crate) corrected: String,
    pub(crate) reason: String,
    #[serde(rename = "type")]
    pub(crate) category: String,
}

/// Metering side-record written once per accepted submission.
#[derive(Debug, Clone)]
pub(crate) struct UsageRecord {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) submission_id: Option<String>,
    pub(crate) word_count: i32,
    pub(crate) model_used: ModelTier,
    pub(crate) recorded_at: PrimitiveDateTime,
}

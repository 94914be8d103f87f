use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Submission, Suggestion};
use crate::db::types::{ModelTier, SubmissionStatus};

const fn default_save_draft() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateSubmissionRequest {
    #[validate(length(min = 1, message = "Text cannot be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) rich_text: Option<String>,
    #[serde(default)]
    pub(crate) include_alternatives: bool,
    /// `false` runs the correction inline and persists nothing.
    #[serde(default = "default_save_draft")]
    pub(crate) save_draft: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) request_id: String,
    pub(crate) original_text: String,
    pub(crate) original_rich_text: Option<String>,
    pub(crate) word_count: i32,
    pub(crate) model_used: ModelTier,
    pub(crate) include_alternatives: bool,
    pub(crate) status: SubmissionStatus,
    pub(crate) corrected_text: Option<String>,
    pub(crate) suggestions: Vec<Suggestion>,
    pub(crate) alternatives: Vec<String>,
    pub(crate) processing_time: Option<f64>,
    pub(crate) error: Option<String>,
    pub(crate) archived: bool,
    pub(crate) archived_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            request_id: submission.request_id,
            original_text: submission.original_text,
            original_rich_text: submission.original_rich_text,
            word_count: submission.word_count,
            model_used: submission.model_used,
            include_alternatives: submission.include_alternatives,
            status: submission.status,
            corrected_text: submission.corrected_text,
            suggestions: submission.suggestions.0,
            alternatives: submission.alternatives.0,
            processing_time: submission.processing_time,
            error: submission.error,
            archived: submission.archived,
            archived_at: submission.archived_at.map(format_primitive),
            created_at: format_primitive(submission.created_at),
            updated_at: format_primitive(submission.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AcceptedSubmissionResponse {
    pub(crate) submission: SubmissionResponse,
    pub(crate) request_id: String,
    pub(crate) message: &'static str,
}

/// Inline correction result for `save_draft = false`.
#[derive(Debug, Serialize)]
pub(crate) struct CorrectionResponse {
    pub(crate) request_id: String,
    pub(crate) word_count: usize,
    pub(crate) model_used: ModelTier,
    pub(crate) corrected_text: String,
    pub(crate) suggestions: Vec<Suggestion>,
    pub(crate) alternatives: Vec<String>,
    pub(crate) processing_time: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListSubmissionsQuery {
    #[serde(default)]
    pub(crate) offset: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ArchiveResponse {
    pub(crate) status: &'static str,
    pub(crate) archived_at: String,
    pub(crate) retention_days: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ArchivedSubmissionResponse {
    #[serde(flatten)]
    pub(crate) submission: SubmissionResponse,
    pub(crate) expires_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ArchiveListResponse {
    pub(crate) items: Vec<ArchivedSubmissionResponse>,
    pub(crate) retention_days: i64,
    pub(crate) notice: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_draft_defaults_to_durable_mode() {
        let request: CreateSubmissionRequest =
            serde_json::from_str(r#"{"text": "hello world"}"#).expect("request");

        assert!(request.save_draft);
        assert!(!request.include_alternatives);
        assert!(request.rich_text.is_none());
    }

    #[test]
    fn empty_text_fails_validation() {
        let request: CreateSubmissionRequest =
            serde_json::from_str(r#"{"text": ""}"#).expect("request");

        assert!(request.validate().is_err());
    }
}

use time::PrimitiveDateTime;

use crate::db::models::Suggestion;
use crate::db::types::ModelTier;

pub(crate) const COLUMNS: &str = "\
    id, user_id, request_id, original_text, original_rich_text, word_count, model_used, \
    include_alternatives, status, corrected_text, suggestions, alternatives, processing_time, \
    error, archived, archived_at, created_at, updated_at";

pub(crate) struct NewSubmission {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) request_id: String,
    pub(crate) original_text: String,
    pub(crate) original_rich_text: Option<String>,
    pub(crate) word_count: i32,
    pub(crate) model_used: ModelTier,
    pub(crate) include_alternatives: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct CompletionUpdate {
    pub(crate) corrected_text: String,
    pub(crate) suggestions: Vec<Suggestion>,
    pub(crate) alternatives: Vec<String>,
    pub(crate) processing_time: f64,
    pub(crate) completed_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArchiveOutcome {
    Archived { archived_at: PrimitiveDateTime },
    AlreadyArchived { archived_at: PrimitiveDateTime },
}

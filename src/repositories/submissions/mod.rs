mod commands;
mod queries;
mod types;

pub(crate) use commands::{
    archive, create, mark_completed, mark_failed, mark_processing, purge_archived_before,
};
pub(crate) use queries::{
    count_active_by_user, find_by_id, find_for_user, list_active_by_user,
    list_archived_by_user,
};
pub(crate) use types::{ArchiveOutcome, CompletionUpdate, NewSubmission};

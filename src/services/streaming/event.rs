use serde_json::{json, Value};

use crate::db::types::SubmissionStatus;
use crate::schemas::submission::SubmissionResponse;

/// Ephemeral event delivered to the listeners of one submission.
#[derive(Debug, Clone)]
pub(crate) enum SubmissionEvent {
    Status { submission_id: String, request_id: String, status: SubmissionStatus },
    Result(Box<SubmissionResponse>),
    Failure { submission_id: String, error: String },
    End { submission_id: String },
    Ping { timestamp: String },
}

impl SubmissionEvent {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Result(_) => "result",
            Self::Failure { .. } => "failure",
            Self::End { .. } => "end",
            Self::Ping { .. } => "ping",
        }
    }

    pub(crate) fn is_end(&self) -> bool {
        matches!(self, Self::End { .. })
    }

    pub(crate) fn payload(&self) -> Value {
        match self {
            Self::Status { submission_id, request_id, status } => json!({
                "status": status,
                "submission_id": submission_id,
                "request_id": request_id,
            }),
            Self::Result(submission) => {
                serde_json::to_value(submission.as_ref()).unwrap_or(Value::Null)
            }
            Self::Failure { submission_id, error } => json!({
                "error": error,
                "submission_id": submission_id,
            }),
            Self::End { submission_id } => json!({ "submission_id": submission_id }),
            Self::Ping { timestamp } => json!({ "timestamp": timestamp }),
        }
    }
}

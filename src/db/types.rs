use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Lifecycle of a submission: `pending -> processing -> {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "submissionstatus", rename_all = "lowercase")]
pub(crate) enum SubmissionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SubmissionStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a pipeline write of `next` may replace `self`. Terminal writes
    /// also accept `pending`, so a lost `processing` write cannot strand a row.
    pub(crate) fn can_transition_to(self, next: Self) -> bool {
        match next {
            Self::Pending => false,
            Self::Processing => self == Self::Pending,
            Self::Completed | Self::Failed => !self.is_terminal(),
        }
    }
}

/// Model tier chosen from the word count at submit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "modeltier", rename_all = "snake_case")]
pub(crate) enum ModelTier {
    /// Lightweight model for short texts.
    ModelA,
    /// Deeper model for long texts.
    ModelB,
}

impl ModelTier {
    pub(crate) fn for_word_count(word_count: usize, threshold: usize) -> Self {
        if word_count < threshold {
            Self::ModelA
        } else {
            Self::ModelB
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::ModelA => "model_a",
            Self::ModelB => "model_b",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_the_lifecycle() {
        use SubmissionStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));

        assert!(!Processing.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn terminal_statuses() {
        assert!(SubmissionStatus::Completed.is_terminal());
        assert!(SubmissionStatus::Failed.is_terminal());
        assert!(!SubmissionStatus::Pending.is_terminal());
        assert!(!SubmissionStatus::Processing.is_terminal());
    }

    #[test]
    fn model_tier_switches_at_threshold() {
        assert_eq!(ModelTier::for_word_count(1, 500), ModelTier::ModelA);
        assert_eq!(ModelTier::for_word_count(499, 500), ModelTier::ModelA);
        assert_eq!(ModelTier::for_word_count(500, 500), ModelTier::ModelB);
        assert_eq!(ModelTier::for_word_count(5_000, 500), ModelTier::ModelB);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SubmissionStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let tier = serde_json::to_string(&ModelTier::ModelB).unwrap();
        assert_eq!(tier, "\"model_b\"");
    }
}

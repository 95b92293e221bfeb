use thiserror::Error;

use crate::types::SkillId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("skill not found: {skill_id}")]
    SkillNotFound { skill_id: SkillId },

    #[error("skill has no charge left: {skill_id}")]
    OutOfCharge { skill_id: SkillId },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A caller broke a contract of the charge engine. Report it as a defect,
    /// never as a user-facing message.
    #[error("precondition violated: {message}")]
    Precondition { message: String },
}

impl Error {
    #[must_use]
    pub fn skill_not_found(skill_id: SkillId) -> Self {
        Self::SkillNotFound { skill_id }
    }

    #[must_use]
    pub fn out_of_charge(skill_id: SkillId) -> Self {
        Self::OutOfCharge { skill_id }
    }

    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Whether this error is a programming defect rather than a rejected
    /// user action.
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

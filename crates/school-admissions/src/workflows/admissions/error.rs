use std::fmt;

use serde::Serialize;

use super::domain::{ApplicantId, ApplicantStatus, EnquiryId, EnquiryStatus};
use super::repository::RepositoryError;

/// Entity family named in admissions errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Enquiry,
    Applicant,
    Student,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Enquiry => "enquiry",
            Self::Applicant => "applicant",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A status change that is not an edge of the entity's transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionError {
    pub entity: EntityKind,
    pub id: String,
    pub current: &'static str,
    pub attempted: &'static str,
    /// The current status has no outgoing edges.
    pub terminal: bool,
}

impl TransitionError {
    pub(crate) fn applicant(
        id: &ApplicantId,
        current: ApplicantStatus,
        attempted: ApplicantStatus,
    ) -> Self {
        Self {
            entity: EntityKind::Applicant,
            id: id.0.clone(),
            current: current.label(),
            attempted: attempted.label(),
            terminal: current.is_terminal(),
        }
    }

    pub(crate) fn enquiry(id: &EnquiryId, current: EnquiryStatus, attempted: EnquiryStatus) -> Self {
        Self {
            entity: EntityKind::Enquiry,
            id: id.0.clone(),
            current: current.label(),
            attempted: attempted.label(),
            terminal: current.is_terminal(),
        }
    }

    pub fn already_decided(&self) -> bool {
        self.terminal
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terminal {
            write!(
                f,
                "{} '{}' already decided ({}); cannot move to {}",
                self.entity, self.id, self.current, self.attempted
            )
        } else {
            write!(
                f,
                "{} '{}' cannot move from {} to {}",
                self.entity, self.id, self.current, self.attempted
            )
        }
    }
}

impl std::error::Error for TransitionError {}

/// One member of a batch that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub reason: String,
}

impl BatchFailure {
    pub(crate) fn new(id: impl Into<String>, error: &AdmissionsError) -> Self {
        Self {
            id: id.into(),
            reason: error.to_string(),
        }
    }
}

/// Error taxonomy shared by intake, registry, screening, and enrollment.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionsError {
    #[error("validation failed for: {}", .fields.join(", "))]
    Validation { fields: Vec<&'static str> },
    #[error("{entity} id '{id}' already exists")]
    DuplicateId { entity: EntityKind, id: String },
    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityKind, id: String },
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("{entity} '{id}' is {status}; expected {required}")]
    InvalidState {
        entity: EntityKind,
        id: String,
        status: &'static str,
        required: &'static str,
    },
    #[error("batch partially failed: {succeeded} succeeded, {} failed", .failures.len())]
    PartialBatchFailure {
        succeeded: usize,
        failures: Vec<BatchFailure>,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AdmissionsError {
    pub(crate) fn applicant_not_found(id: &ApplicantId) -> Self {
        Self::NotFound {
            entity: EntityKind::Applicant,
            id: id.0.clone(),
        }
    }

    pub(crate) fn enquiry_not_found(id: &EnquiryId) -> Self {
        Self::NotFound {
            entity: EntityKind::Enquiry,
            id: id.0.clone(),
        }
    }

    pub(crate) fn not_enrollable(id: &ApplicantId, status: ApplicantStatus) -> Self {
        Self::InvalidState {
            entity: EntityKind::Applicant,
            id: id.0.clone(),
            status: status.label(),
            required: ApplicantStatus::Accepted.label(),
        }
    }
}

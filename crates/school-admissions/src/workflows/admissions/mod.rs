//! School admissions pipeline: enquiries, the applicant pool, screening, and enrollment.
//!
//! Every status change goes through the transition tables in [`domain`]. Storage and
//! notification delivery sit behind the [`AdmissionsStore`] and [`NotificationDispatcher`]
//! traits; the in-memory implementations in [`memory`] back the HTTP service and the tests.

pub mod config;
pub mod domain;
pub mod enrollment;
pub mod error;
pub mod import;
pub mod intake;
pub mod memory;
pub mod registry;
pub mod repository;
pub mod router;
pub mod screening;
pub mod service;
pub(crate) mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use config::{AdmissionsConfig, NotificationTargeting};
pub use domain::{
    Applicant, ApplicantForm, ApplicantId, ApplicantStatus, Audience, Enquiry, EnquiryForm,
    EnquiryId, EnquiryStatus, EnrollmentDetails, Gender, Notification, NotificationId,
    ScreeningOutcome, ScreeningSchedule, Student, StudentId, StudentStatus,
};
pub use enrollment::EnrollmentBatch;
pub use error::{AdmissionsError, BatchFailure, EntityKind, TransitionError};
pub use import::{ApplicantCsvImporter, ApplicantImportError, ImportReport, RejectedRow};
pub use memory::{InMemoryAdmissionsStore, InMemoryNotificationFeeds};
pub use repository::{AdmissionsStore, DispatchError, NotificationDispatcher, RepositoryError};
pub use router::admissions_router;
pub use screening::{ScheduleReport, ScreeningBatch};
pub use service::AdmissionsService;
pub use views::{ApplicantView, EnquiryView, StudentView};

use super::domain::{
    Applicant, ApplicantId, ApplicantStatus, Enquiry, EnquiryId, EnquiryStatus, Notification,
    Student, StudentId,
};

/// Record store backing the admissions collections (`enquiries`, `applicants`, `students`).
///
/// Listing methods return records in insertion order. Every mutation is a single
/// read-modify-write against the live collections, so implementations must apply each call
/// atomically.
pub trait AdmissionsStore: Send + Sync {
    fn insert_enquiry(&self, enquiry: Enquiry) -> Result<Enquiry, RepositoryError>;
    fn fetch_enquiry(&self, id: &EnquiryId) -> Result<Option<Enquiry>, RepositoryError>;
    fn enquiries(&self) -> Result<Vec<Enquiry>, RepositoryError>;

    /// Move an enquiry to `next` only if it is still in `expected`.
    fn swap_enquiry_status(
        &self,
        id: &EnquiryId,
        expected: EnquiryStatus,
        next: EnquiryStatus,
    ) -> Result<Enquiry, RepositoryError>;

    /// Insert `applicant` and link it to a converted, unlinked enquiry in one step.
    fn commit_conversion(
        &self,
        enquiry_id: &EnquiryId,
        applicant: Applicant,
    ) -> Result<(Enquiry, Applicant), RepositoryError>;

    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, RepositoryError>;
    fn fetch_applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError>;
    fn applicants(&self) -> Result<Vec<Applicant>, RepositoryError>;

    /// Move an applicant to `next` only if it is still in `expected`.
    fn swap_applicant_status(
        &self,
        id: &ApplicantId,
        expected: ApplicantStatus,
        next: ApplicantStatus,
    ) -> Result<Applicant, RepositoryError>;

    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError>;
    fn students(&self) -> Result<Vec<Student>, RepositoryError>;

    /// Remove the accepted applicant sharing the student's id and append the student.
    /// Either both happen or neither does.
    fn commit_enrollment(&self, student: Student) -> Result<Student, RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("applicant status changed concurrently (now {found})")]
    StaleApplicant { found: ApplicantStatus },
    #[error("enquiry status changed concurrently (now {found})")]
    StaleEnquiry { found: EnquiryStatus },
    #[error("enquiry already linked to applicant '{applicant}'")]
    EnquiryLinked { applicant: ApplicantId },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook appending notifications to an audience feed.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: Notification) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

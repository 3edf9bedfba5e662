use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::admissions::domain::{
    Applicant, ApplicantForm, ApplicantId, ApplicantStatus, Enquiry, EnquiryForm, EnquiryId,
    EnquiryStatus, EnrollmentDetails, Gender, Notification, Student, StudentId,
};
use crate::workflows::admissions::repository::{
    AdmissionsStore, DispatchError, NotificationDispatcher, RepositoryError,
};
use crate::workflows::admissions::{
    admissions_router, AdmissionsConfig, AdmissionsService, InMemoryAdmissionsStore,
    InMemoryNotificationFeeds,
};

pub(super) type MemoryService = AdmissionsService<InMemoryAdmissionsStore, InMemoryNotificationFeeds>;

pub(super) fn applicant_form(id: &str, name: &str, class_name: &str) -> ApplicantForm {
    ApplicantForm {
        id: ApplicantId(id.to_string()),
        name: name.to_string(),
        class_name: class_name.to_string(),
        avatar: None,
        submission_date: NaiveDate::from_ymd_opt(2024, 1, 15),
        parent_name: "Tunde Ade".to_string(),
        parent_phone: "+234 803 555 0101".to_string(),
        parent_email: "tunde.ade@example.com".to_string(),
    }
}

pub(super) fn kunle_form() -> ApplicantForm {
    applicant_form("UC/24/010", "Kunle Ade", "JSS 1A")
}

pub(super) fn enquiry_form() -> EnquiryForm {
    EnquiryForm {
        student_name: "Amaka Nwosu".to_string(),
        class_of_interest: "JSS 1B".to_string(),
        parent_name: "Chioma Nwosu".to_string(),
        parent_phone: "08031234567".to_string(),
        parent_email: Some("chioma@example.com".to_string()),
    }
}

pub(super) fn full_profile() -> EnrollmentDetails {
    EnrollmentDetails {
        date_of_birth: NaiveDate::from_ymd_opt(2012, 6, 2),
        gender: Some(Gender::Male),
        address: Some("14 Allen Avenue, Ikeja".to_string()),
    }
}

pub(super) fn build_service_with(
    config: AdmissionsConfig,
) -> (
    Arc<MemoryService>,
    Arc<InMemoryAdmissionsStore>,
    Arc<InMemoryNotificationFeeds>,
) {
    let store = Arc::new(InMemoryAdmissionsStore::new());
    let feeds = Arc::new(InMemoryNotificationFeeds::new());
    let service = Arc::new(AdmissionsService::new(
        Arc::clone(&store),
        Arc::clone(&feeds),
        config,
    ));
    (service, store, feeds)
}

pub(super) fn build_service() -> (
    Arc<MemoryService>,
    Arc<InMemoryAdmissionsStore>,
    Arc<InMemoryNotificationFeeds>,
) {
    build_service_with(AdmissionsConfig::default())
}

/// Walk a freshly created applicant along the happy path up to `target`.
pub(super) fn advance_to<S, D>(
    service: &AdmissionsService<S, D>,
    id: &ApplicantId,
    target: ApplicantStatus,
) where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let path = [
        ApplicantStatus::Reviewed,
        ApplicantStatus::Screening,
        ApplicantStatus::Accepted,
    ];
    if target == ApplicantStatus::Applied {
        return;
    }
    for step in path {
        service
            .set_applicant_status(id, step)
            .expect("happy path transition");
        if step == target {
            return;
        }
    }
    panic!("{target} is not on the happy path");
}

pub(super) fn accepted_applicant(service: &MemoryService, id: &str, name: &str) -> ApplicantId {
    let applicant = service
        .create_applicant(applicant_form(id, name, "JSS 1A"))
        .expect("applicant created");
    advance_to(service, &applicant.id, ApplicantStatus::Accepted);
    applicant.id
}

pub(super) fn converted_enquiry(service: &MemoryService) -> EnquiryId {
    let enquiry = service.log_enquiry(enquiry_form()).expect("enquiry logged");
    service
        .advance_enquiry_status(&enquiry.id, EnquiryStatus::Contacted)
        .expect("contacted");
    service
        .advance_enquiry_status(&enquiry.id, EnquiryStatus::Converted)
        .expect("converted");
    enquiry.id
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_for(service: Arc<MemoryService>) -> axum::Router {
    admissions_router(service)
}

/// Dispatcher whose transport is always down.
#[derive(Default)]
pub(super) struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn dispatch(&self, _notification: Notification) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("smtp relay offline".to_string()))
    }
}

/// Store that refuses every call.
pub(super) struct UnavailableStore;

impl UnavailableStore {
    fn down<T>() -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl AdmissionsStore for UnavailableStore {
    fn insert_enquiry(&self, _enquiry: Enquiry) -> Result<Enquiry, RepositoryError> {
        Self::down()
    }

    fn fetch_enquiry(&self, _id: &EnquiryId) -> Result<Option<Enquiry>, RepositoryError> {
        Self::down()
    }

    fn enquiries(&self) -> Result<Vec<Enquiry>, RepositoryError> {
        Self::down()
    }

    fn swap_enquiry_status(
        &self,
        _id: &EnquiryId,
        _expected: EnquiryStatus,
        _next: EnquiryStatus,
    ) -> Result<Enquiry, RepositoryError> {
        Self::down()
    }

    fn commit_conversion(
        &self,
        _enquiry_id: &EnquiryId,
        _applicant: Applicant,
    ) -> Result<(Enquiry, Applicant), RepositoryError> {
        Self::down()
    }

    fn insert_applicant(&self, _applicant: Applicant) -> Result<Applicant, RepositoryError> {
        Self::down()
    }

    fn fetch_applicant(&self, _id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        Self::down()
    }

    fn applicants(&self) -> Result<Vec<Applicant>, RepositoryError> {
        Self::down()
    }

    fn swap_applicant_status(
        &self,
        _id: &ApplicantId,
        _expected: ApplicantStatus,
        _next: ApplicantStatus,
    ) -> Result<Applicant, RepositoryError> {
        Self::down()
    }

    fn fetch_student(&self, _id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        Self::down()
    }

    fn students(&self) -> Result<Vec<Student>, RepositoryError> {
        Self::down()
    }

    fn commit_enrollment(&self, _student: Student) -> Result<Student, RepositoryError> {
        Self::down()
    }
}

/// In-memory store where another actor enrolls `victim` right after the first cohort
/// snapshot is taken.
pub(super) struct RacingStore {
    pub(super) inner: InMemoryAdmissionsStore,
    victim: ApplicantId,
    raced: AtomicBool,
}

impl RacingStore {
    pub(super) fn new(victim: ApplicantId) -> Self {
        Self {
            inner: InMemoryAdmissionsStore::new(),
            victim,
            raced: AtomicBool::new(false),
        }
    }
}

impl AdmissionsStore for RacingStore {
    fn insert_enquiry(&self, enquiry: Enquiry) -> Result<Enquiry, RepositoryError> {
        self.inner.insert_enquiry(enquiry)
    }

    fn fetch_enquiry(&self, id: &EnquiryId) -> Result<Option<Enquiry>, RepositoryError> {
        self.inner.fetch_enquiry(id)
    }

    fn enquiries(&self) -> Result<Vec<Enquiry>, RepositoryError> {
        self.inner.enquiries()
    }

    fn swap_enquiry_status(
        &self,
        id: &EnquiryId,
        expected: EnquiryStatus,
        next: EnquiryStatus,
    ) -> Result<Enquiry, RepositoryError> {
        self.inner.swap_enquiry_status(id, expected, next)
    }

    fn commit_conversion(
        &self,
        enquiry_id: &EnquiryId,
        applicant: Applicant,
    ) -> Result<(Enquiry, Applicant), RepositoryError> {
        self.inner.commit_conversion(enquiry_id, applicant)
    }

    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, RepositoryError> {
        self.inner.insert_applicant(applicant)
    }

    fn fetch_applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        self.inner.fetch_applicant(id)
    }

    fn applicants(&self) -> Result<Vec<Applicant>, RepositoryError> {
        let snapshot = self.inner.applicants()?;
        let victim = snapshot
            .iter()
            .find(|applicant| {
                applicant.id == self.victim && applicant.status == ApplicantStatus::Accepted
            })
            .cloned();
        if let Some(applicant) = victim {
            if !self.raced.swap(true, Ordering::SeqCst) {
                let enrolled_on = applicant.submission_date;
                self.inner.commit_enrollment(Student::from_applicant(
                    applicant,
                    EnrollmentDetails::default(),
                    enrolled_on,
                ))?;
            }
        }
        Ok(snapshot)
    }

    fn swap_applicant_status(
        &self,
        id: &ApplicantId,
        expected: ApplicantStatus,
        next: ApplicantStatus,
    ) -> Result<Applicant, RepositoryError> {
        self.inner.swap_applicant_status(id, expected, next)
    }

    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        self.inner.fetch_student(id)
    }

    fn students(&self) -> Result<Vec<Student>, RepositoryError> {
        self.inner.students()
    }

    fn commit_enrollment(&self, student: Student) -> Result<Student, RepositoryError> {
        self.inner.commit_enrollment(student)
    }
}

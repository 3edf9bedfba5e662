use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use super::config::AdmissionsConfig;
use super::domain::{
    Applicant, ApplicantForm, ApplicantId, ApplicantStatus, Enquiry, EnquiryForm, EnquiryId,
    EnquiryStatus, EnrollmentDetails, ScreeningOutcome, ScreeningSchedule, Student,
};
use super::enrollment::{EnrollmentBatch, EnrollmentConverter};
use super::error::AdmissionsError;
use super::import::{ApplicantCsvImporter, ApplicantImportError, ImportReport};
use super::intake::EnquiryIntake;
use super::registry::ApplicantRegistry;
use super::repository::{AdmissionsStore, NotificationDispatcher};
use super::screening::{ScheduleReport, ScreeningBatch, ScreeningCoordinator};

/// Service composing intake, the applicant registry, screening, and enrollment over one
/// shared store.
pub struct AdmissionsService<S, D> {
    store: Arc<S>,
    intake: EnquiryIntake<S>,
    registry: ApplicantRegistry<S>,
    screening: ScreeningCoordinator<S, D>,
    enrollment: EnrollmentConverter<S>,
    config: AdmissionsConfig,
}

impl<S, D> AdmissionsService<S, D>
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: Arc<D>, config: AdmissionsConfig) -> Self {
        let registry = ApplicantRegistry::new(Arc::clone(&store));
        Self {
            intake: EnquiryIntake::new(Arc::clone(&store)),
            screening: ScreeningCoordinator::new(registry.clone(), dispatcher, &config),
            enrollment: EnrollmentConverter::new(Arc::clone(&store), &config),
            registry,
            store,
            config,
        }
    }

    pub fn config(&self) -> &AdmissionsConfig {
        &self.config
    }

    pub fn registry(&self) -> &ApplicantRegistry<S> {
        &self.registry
    }

    pub fn log_enquiry(&self, form: EnquiryForm) -> Result<Enquiry, AdmissionsError> {
        self.intake.log_enquiry(form)
    }

    pub fn advance_enquiry_status(
        &self,
        id: &EnquiryId,
        next: EnquiryStatus,
    ) -> Result<Enquiry, AdmissionsError> {
        self.intake.advance_status(id, next)
    }

    pub fn convert_enquiry(
        &self,
        id: &EnquiryId,
        applicant_id: ApplicantId,
    ) -> Result<(Enquiry, Applicant), AdmissionsError> {
        self.intake.convert_to_applicant(id, applicant_id)
    }

    pub fn get_enquiry(&self, id: &EnquiryId) -> Result<Enquiry, AdmissionsError> {
        self.intake.get(id)
    }

    pub fn list_enquiries(&self) -> Result<Vec<Enquiry>, AdmissionsError> {
        self.intake.list_enquiries()
    }

    pub fn create_applicant(&self, form: ApplicantForm) -> Result<Applicant, AdmissionsError> {
        self.registry.create_applicant(form)
    }

    pub fn set_applicant_status(
        &self,
        id: &ApplicantId,
        next: ApplicantStatus,
    ) -> Result<Applicant, AdmissionsError> {
        self.registry.set_status(id, next)
    }

    pub fn get_applicant(&self, id: &ApplicantId) -> Result<Applicant, AdmissionsError> {
        self.registry.get(id)
    }

    pub fn list_applicants(&self) -> Result<Vec<Applicant>, AdmissionsError> {
        self.registry.list_applicants()
    }

    pub fn list_by_status(&self, status: ApplicantStatus) -> Result<Vec<Applicant>, AdmissionsError> {
        self.registry.list_by_status(status)
    }

    pub fn record_screening_result(
        &self,
        id: &ApplicantId,
        outcome: ScreeningOutcome,
    ) -> Result<Applicant, AdmissionsError> {
        self.screening.record_result(id, outcome)
    }

    pub fn record_screening_results(
        &self,
        decisions: Vec<(ApplicantId, ScreeningOutcome)>,
    ) -> ScreeningBatch {
        self.screening.record_results(decisions)
    }

    pub fn schedule_test(
        &self,
        schedule: ScreeningSchedule,
    ) -> Result<ScheduleReport, AdmissionsError> {
        self.screening.schedule_test(schedule)
    }

    pub fn enroll_one(
        &self,
        id: &ApplicantId,
        details: EnrollmentDetails,
    ) -> Result<Student, AdmissionsError> {
        self.enrollment.enroll_one(id, details)
    }

    /// Enroll the accepted cohort with no extra profile data.
    pub fn enroll_all(&self) -> Result<EnrollmentBatch, AdmissionsError> {
        self.enrollment.enroll_all(&BTreeMap::new())
    }

    pub fn enroll_all_with(
        &self,
        details: &BTreeMap<ApplicantId, EnrollmentDetails>,
    ) -> Result<EnrollmentBatch, AdmissionsError> {
        self.enrollment.enroll_all(details)
    }

    pub fn list_students(&self) -> Result<Vec<Student>, AdmissionsError> {
        Ok(self.store.students()?)
    }

    pub fn import_applicants<R: Read>(&self, reader: R) -> Result<ImportReport, ApplicantImportError> {
        ApplicantCsvImporter::from_reader(reader, &self.registry)
    }
}

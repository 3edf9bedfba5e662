use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::config::AdmissionsConfig;
use super::domain::{Applicant, ApplicantId, ApplicantStatus, EnrollmentDetails, Student};
use super::error::{AdmissionsError, BatchFailure, EntityKind};
use super::registry::ApplicantRegistry;
use super::repository::{AdmissionsStore, RepositoryError};

/// Students created by one `enroll_all` pass plus the members that were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentBatch {
    pub students: Vec<Student>,
    pub failures: Vec<BatchFailure>,
}

impl EnrollmentBatch {
    pub fn count(&self) -> usize {
        self.students.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn ensure_complete(self) -> Result<Vec<Student>, AdmissionsError> {
        if self.failures.is_empty() {
            Ok(self.students)
        } else {
            Err(AdmissionsError::PartialBatchFailure {
                succeeded: self.students.len(),
                failures: self.failures,
            })
        }
    }
}

/// Terminal step of admissions: accepted applicants leave the pool and become students.
pub struct EnrollmentConverter<S> {
    registry: ApplicantRegistry<S>,
    store: Arc<S>,
    require_complete_profile: bool,
}

impl<S> EnrollmentConverter<S>
where
    S: AdmissionsStore + 'static,
{
    pub fn new(store: Arc<S>, config: &AdmissionsConfig) -> Self {
        Self {
            registry: ApplicantRegistry::new(Arc::clone(&store)),
            store,
            require_complete_profile: config.require_complete_profile,
        }
    }

    pub fn enroll_one(
        &self,
        id: &ApplicantId,
        details: EnrollmentDetails,
    ) -> Result<Student, AdmissionsError> {
        let applicant = self.registry.get(id)?;
        self.convert(applicant, details)
    }

    /// Convert the accepted cohort as it stands now. Each member is re-checked against the
    /// live store when it is committed; members that changed in the meantime are reported in
    /// `failures` and the rest still enroll.
    pub fn enroll_all(
        &self,
        details: &BTreeMap<ApplicantId, EnrollmentDetails>,
    ) -> Result<EnrollmentBatch, AdmissionsError> {
        let cohort = self.registry.list_by_status(ApplicantStatus::Accepted)?;
        let mut students = Vec::with_capacity(cohort.len());
        let mut failures = Vec::new();

        for applicant in cohort {
            let id = applicant.id.clone();
            let profile = details.get(&id).cloned().unwrap_or_default();
            match self.convert(applicant, profile) {
                Ok(student) => students.push(student),
                Err(err) => {
                    warn!(applicant_id = %id, error = %err, "applicant skipped during batch enrollment");
                    failures.push(BatchFailure::new(id.0, &err));
                }
            }
        }

        info!(
            enrolled = students.len(),
            failed = failures.len(),
            "batch enrollment finished"
        );
        Ok(EnrollmentBatch { students, failures })
    }

    fn convert(
        &self,
        applicant: Applicant,
        details: EnrollmentDetails,
    ) -> Result<Student, AdmissionsError> {
        if applicant.status != ApplicantStatus::Accepted {
            return Err(AdmissionsError::not_enrollable(&applicant.id, applicant.status));
        }

        let id = applicant.id.clone();
        let student = Student::from_applicant(applicant, details, Utc::now().date_naive());
        let missing = student.missing_profile_fields();
        if self.require_complete_profile && !missing.is_empty() {
            return Err(AdmissionsError::Validation { fields: missing });
        }

        match self.store.commit_enrollment(student) {
            Ok(student) => {
                if missing.is_empty() {
                    info!(student_id = %student.id, class = %student.class_name, "applicant enrolled");
                } else {
                    info!(
                        student_id = %student.id,
                        missing = ?missing,
                        "applicant enrolled with incomplete profile"
                    );
                }
                Ok(student)
            }
            Err(RepositoryError::NotFound) => Err(AdmissionsError::applicant_not_found(&id)),
            Err(RepositoryError::StaleApplicant { found }) => {
                Err(AdmissionsError::not_enrollable(&id, found))
            }
            Err(RepositoryError::Conflict) => Err(AdmissionsError::DuplicateId {
                entity: EntityKind::Student,
                id: id.0,
            }),
            Err(other) => Err(other.into()),
        }
    }
}

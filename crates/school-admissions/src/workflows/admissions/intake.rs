use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{
    Applicant, ApplicantForm, ApplicantId, Enquiry, EnquiryForm, EnquiryId, EnquiryStatus,
};
use super::error::{AdmissionsError, EntityKind, TransitionError};
use super::repository::{AdmissionsStore, RepositoryError};
use super::validation::{validate_applicant_form, validate_enquiry_form, FieldCheck};

static ENQUIRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_enquiry_id() -> EnquiryId {
    let id = ENQUIRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EnquiryId(format!("ENQ-{id:06}"))
}

/// Logs pre-application contacts and walks them through the enquiry table.
pub struct EnquiryIntake<S> {
    store: Arc<S>,
}

impl<S> Clone for EnquiryIntake<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> EnquiryIntake<S>
where
    S: AdmissionsStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn log_enquiry(&self, form: EnquiryForm) -> Result<Enquiry, AdmissionsError> {
        validate_enquiry_form(&form)?;

        let mut enquiry = Enquiry {
            id: next_enquiry_id(),
            student_name: form.student_name.trim().to_string(),
            class_of_interest: form.class_of_interest.trim().to_string(),
            parent_name: form.parent_name.trim().to_string(),
            parent_phone: form.parent_phone.trim().to_string(),
            parent_email: form
                .parent_email
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
            enquiry_date: Utc::now(),
            status: EnquiryStatus::New,
            linked_applicant: None,
        };

        // The sequence is per process; a store that outlives it may already hold the id.
        loop {
            match self.store.insert_enquiry(enquiry.clone()) {
                Ok(stored) => {
                    info!(enquiry_id = %stored.id, class = %stored.class_of_interest, "enquiry logged");
                    return Ok(stored);
                }
                Err(RepositoryError::Conflict) => {
                    debug!(enquiry_id = %enquiry.id, "enquiry id already stored; drawing the next one");
                    enquiry.id = next_enquiry_id();
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    pub fn advance_status(
        &self,
        id: &EnquiryId,
        next: EnquiryStatus,
    ) -> Result<Enquiry, AdmissionsError> {
        let mut current = self.get(id)?.status;

        loop {
            if !current.can_transition_to(next) {
                return Err(TransitionError::enquiry(id, current, next).into());
            }

            match self.store.swap_enquiry_status(id, current, next) {
                Ok(updated) => {
                    info!(enquiry_id = %id, from = %current, to = %next, "enquiry advanced");
                    return Ok(updated);
                }
                Err(RepositoryError::StaleEnquiry { found }) => current = found,
                Err(RepositoryError::NotFound) => return Err(AdmissionsError::enquiry_not_found(id)),
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Seed the applicant pool from a converted enquiry. The enquiry stays on record and is
    /// linked to the new applicant.
    pub fn convert_to_applicant(
        &self,
        id: &EnquiryId,
        applicant_id: ApplicantId,
    ) -> Result<(Enquiry, Applicant), AdmissionsError> {
        let enquiry = self.get(id)?;
        if enquiry.status != EnquiryStatus::Converted {
            return Err(AdmissionsError::InvalidState {
                entity: EntityKind::Enquiry,
                id: id.0.clone(),
                status: enquiry.status.label(),
                required: EnquiryStatus::Converted.label(),
            });
        }
        if let Some(linked) = enquiry.linked_applicant {
            return Err(AdmissionsError::DuplicateId {
                entity: EntityKind::Applicant,
                id: linked.0,
            });
        }

        let parent_email = enquiry.parent_email.unwrap_or_default();
        FieldCheck::new()
            .required("parent_email", &parent_email)
            .finish()?;

        let form = ApplicantForm {
            id: applicant_id,
            name: enquiry.student_name,
            class_name: enquiry.class_of_interest,
            avatar: None,
            submission_date: None,
            parent_name: enquiry.parent_name,
            parent_phone: enquiry.parent_phone,
            parent_email,
        };
        validate_applicant_form(&form)?;
        let applicant = Applicant::from_form(form, Utc::now().date_naive());
        let applicant_id = applicant.id.clone();

        match self.store.commit_conversion(id, applicant) {
            Ok((enquiry, applicant)) => {
                info!(enquiry_id = %id, applicant_id = %applicant.id, "enquiry converted to applicant");
                Ok((enquiry, applicant))
            }
            Err(RepositoryError::Conflict) => Err(AdmissionsError::DuplicateId {
                entity: EntityKind::Applicant,
                id: applicant_id.0,
            }),
            Err(RepositoryError::EnquiryLinked { applicant }) => Err(AdmissionsError::DuplicateId {
                entity: EntityKind::Applicant,
                id: applicant.0,
            }),
            Err(RepositoryError::StaleEnquiry { found }) => Err(AdmissionsError::InvalidState {
                entity: EntityKind::Enquiry,
                id: id.0.clone(),
                status: found.label(),
                required: EnquiryStatus::Converted.label(),
            }),
            Err(RepositoryError::NotFound) => Err(AdmissionsError::enquiry_not_found(id)),
            Err(other) => Err(other.into()),
        }
    }

    pub fn get(&self, id: &EnquiryId) -> Result<Enquiry, AdmissionsError> {
        self.store
            .fetch_enquiry(id)?
            .ok_or_else(|| AdmissionsError::enquiry_not_found(id))
    }

    pub fn list_enquiries(&self) -> Result<Vec<Enquiry>, AdmissionsError> {
        Ok(self.store.enquiries()?)
    }
}

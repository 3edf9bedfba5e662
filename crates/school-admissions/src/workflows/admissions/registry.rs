use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{Applicant, ApplicantForm, ApplicantId, ApplicantStatus};
use super::error::{AdmissionsError, EntityKind, TransitionError};
use super::repository::{AdmissionsStore, RepositoryError};
use super::validation::validate_applicant_form;

/// Owns the applicant pool and the only path by which an applicant's status changes.
pub struct ApplicantRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for ApplicantRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ApplicantRegistry<S>
where
    S: AdmissionsStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_applicant(&self, form: ApplicantForm) -> Result<Applicant, AdmissionsError> {
        validate_applicant_form(&form)?;
        let applicant = Applicant::from_form(form, Utc::now().date_naive());
        let id = applicant.id.clone();

        match self.store.insert_applicant(applicant) {
            Ok(stored) => {
                info!(applicant_id = %stored.id, class = %stored.class_name, "applicant registered");
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => Err(AdmissionsError::DuplicateId {
                entity: EntityKind::Applicant,
                id: id.0,
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Apply one edge of the transition table and return the updated record.
    pub fn set_status(
        &self,
        id: &ApplicantId,
        next: ApplicantStatus,
    ) -> Result<Applicant, AdmissionsError> {
        let mut current = self.get(id)?.status;

        // Statuses only move forward, so a lost race can repeat at most once per edge.
        loop {
            if !current.can_transition_to(next) {
                return Err(TransitionError::applicant(id, current, next).into());
            }

            match self.store.swap_applicant_status(id, current, next) {
                Ok(updated) => {
                    debug!(applicant_id = %id, from = %current, to = %next, "applicant status changed");
                    return Ok(updated);
                }
                Err(RepositoryError::StaleApplicant { found }) => current = found,
                Err(RepositoryError::NotFound) => {
                    return Err(AdmissionsError::applicant_not_found(id))
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    pub fn get(&self, id: &ApplicantId) -> Result<Applicant, AdmissionsError> {
        self.store
            .fetch_applicant(id)?
            .ok_or_else(|| AdmissionsError::applicant_not_found(id))
    }

    /// Cohort for `status`, oldest submission first, ties broken by id.
    pub fn list_by_status(&self, status: ApplicantStatus) -> Result<Vec<Applicant>, AdmissionsError> {
        let mut cohort: Vec<Applicant> = self
            .store
            .applicants()?
            .into_iter()
            .filter(|applicant| applicant.status == status)
            .collect();
        sort_cohort(&mut cohort);
        Ok(cohort)
    }

    pub fn list_applicants(&self) -> Result<Vec<Applicant>, AdmissionsError> {
        let mut pool = self.store.applicants()?;
        sort_cohort(&mut pool);
        Ok(pool)
    }
}

fn sort_cohort(applicants: &mut [Applicant]) {
    applicants.sort_by(|left, right| {
        left.submission_date
            .cmp(&right.submission_date)
            .then_with(|| left.id.cmp(&right.id))
    });
}

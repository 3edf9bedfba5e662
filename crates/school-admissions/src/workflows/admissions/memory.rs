use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    Applicant, ApplicantId, ApplicantStatus, Audience, Enquiry, EnquiryId, EnquiryStatus,
    Notification, Student, StudentId,
};
use super::repository::{
    AdmissionsStore, DispatchError, NotificationDispatcher, RepositoryError,
};

#[derive(Debug, Default)]
struct Collections {
    enquiries: Vec<Enquiry>,
    applicants: Vec<Applicant>,
    students: Vec<Student>,
}

/// Process-local store. One lock covers all collections so compound commits stay atomic.
#[derive(Debug, Default)]
pub struct InMemoryAdmissionsStore {
    collections: Mutex<Collections>,
}

impl InMemoryAdmissionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed students enrolled outside admissions (other modules append to the same roster).
    pub fn with_students(students: Vec<Student>) -> Self {
        Self {
            collections: Mutex::new(Collections {
                students,
                ..Collections::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepositoryError> {
        self.collections
            .lock()
            .map_err(|_| RepositoryError::Unavailable("admissions store lock poisoned".to_string()))
    }
}

impl AdmissionsStore for InMemoryAdmissionsStore {
    fn insert_enquiry(&self, enquiry: Enquiry) -> Result<Enquiry, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.enquiries.iter().any(|existing| existing.id == enquiry.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.enquiries.push(enquiry.clone());
        Ok(enquiry)
    }

    fn fetch_enquiry(&self, id: &EnquiryId) -> Result<Option<Enquiry>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.enquiries.iter().find(|enquiry| &enquiry.id == id).cloned())
    }

    fn enquiries(&self) -> Result<Vec<Enquiry>, RepositoryError> {
        Ok(self.lock()?.enquiries.clone())
    }

    fn swap_enquiry_status(
        &self,
        id: &EnquiryId,
        expected: EnquiryStatus,
        next: EnquiryStatus,
    ) -> Result<Enquiry, RepositoryError> {
        let mut guard = self.lock()?;
        let enquiry = guard
            .enquiries
            .iter_mut()
            .find(|enquiry| &enquiry.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if enquiry.status != expected {
            return Err(RepositoryError::StaleEnquiry {
                found: enquiry.status,
            });
        }
        enquiry.status = next;
        Ok(enquiry.clone())
    }

    fn commit_conversion(
        &self,
        enquiry_id: &EnquiryId,
        applicant: Applicant,
    ) -> Result<(Enquiry, Applicant), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.applicants.iter().any(|existing| existing.id == applicant.id) {
            return Err(RepositoryError::Conflict);
        }

        let enquiry = guard
            .enquiries
            .iter_mut()
            .find(|enquiry| &enquiry.id == enquiry_id)
            .ok_or(RepositoryError::NotFound)?;
        if enquiry.status != EnquiryStatus::Converted {
            return Err(RepositoryError::StaleEnquiry {
                found: enquiry.status,
            });
        }
        if let Some(linked) = &enquiry.linked_applicant {
            return Err(RepositoryError::EnquiryLinked {
                applicant: linked.clone(),
            });
        }

        enquiry.linked_applicant = Some(applicant.id.clone());
        let enquiry = enquiry.clone();
        guard.applicants.push(applicant.clone());
        Ok((enquiry, applicant))
    }

    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.applicants.iter().any(|existing| existing.id == applicant.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.applicants.push(applicant.clone());
        Ok(applicant)
    }

    fn fetch_applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.applicants.iter().find(|applicant| &applicant.id == id).cloned())
    }

    fn applicants(&self) -> Result<Vec<Applicant>, RepositoryError> {
        Ok(self.lock()?.applicants.clone())
    }

    fn swap_applicant_status(
        &self,
        id: &ApplicantId,
        expected: ApplicantStatus,
        next: ApplicantStatus,
    ) -> Result<Applicant, RepositoryError> {
        let mut guard = self.lock()?;
        let applicant = guard
            .applicants
            .iter_mut()
            .find(|applicant| &applicant.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if applicant.status != expected {
            return Err(RepositoryError::StaleApplicant {
                found: applicant.status,
            });
        }
        applicant.status = next;
        Ok(applicant.clone())
    }

    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.students.iter().find(|student| &student.id == id).cloned())
    }

    fn students(&self) -> Result<Vec<Student>, RepositoryError> {
        Ok(self.lock()?.students.clone())
    }

    fn commit_enrollment(&self, student: Student) -> Result<Student, RepositoryError> {
        let mut guard = self.lock()?;
        let applicant_id = student.id.applicant_id();
        let position = guard
            .applicants
            .iter()
            .position(|applicant| applicant.id == applicant_id)
            .ok_or(RepositoryError::NotFound)?;

        let status = guard.applicants[position].status;
        if status != ApplicantStatus::Accepted {
            return Err(RepositoryError::StaleApplicant { found: status });
        }
        if guard.students.iter().any(|existing| existing.id == student.id) {
            return Err(RepositoryError::Conflict);
        }

        guard.applicants.remove(position);
        guard.students.push(student.clone());
        Ok(student)
    }
}

/// Per-audience notification feeds (`notifications:<audience>`).
#[derive(Debug, Default)]
pub struct InMemoryNotificationFeeds {
    feeds: Mutex<BTreeMap<Audience, Vec<Notification>>>,
}

impl InMemoryNotificationFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, audience: Audience) -> Vec<Notification> {
        self.feeds
            .lock()
            .map(|feeds| feeds.get(&audience).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.feeds
            .lock()
            .map(|feeds| feeds.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

impl NotificationDispatcher for InMemoryNotificationFeeds {
    fn dispatch(&self, notification: Notification) -> Result<(), DispatchError> {
        let mut feeds = self
            .feeds
            .lock()
            .map_err(|_| DispatchError::Transport("notification feed lock poisoned".to_string()))?;
        feeds
            .entry(notification.audience)
            .or_default()
            .push(notification);
        Ok(())
    }
}

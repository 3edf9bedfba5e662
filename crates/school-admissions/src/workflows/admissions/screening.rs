use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::config::{AdmissionsConfig, NotificationTargeting};
use super::domain::{
    Applicant, ApplicantId, ApplicantStatus, Audience, Notification, NotificationId,
    ScreeningOutcome, ScreeningSchedule,
};
use super::error::{AdmissionsError, BatchFailure};
use super::registry::ApplicantRegistry;
use super::repository::{AdmissionsStore, NotificationDispatcher};

const SCREENING_ICON: &str = "calendar-check";

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("NTF-{id:06}"))
}

/// Outcome of announcing a screening test to the current cohort.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub scheduled_for: NaiveDateTime,
    pub cohort_size: usize,
    pub cohort: Vec<ApplicantId>,
    pub dispatched: usize,
    pub failures: Vec<BatchFailure>,
}

impl ScheduleReport {
    pub fn fully_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of recording several screening decisions at once.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningBatch {
    pub decided: Vec<Applicant>,
    pub failures: Vec<BatchFailure>,
}

impl ScreeningBatch {
    pub fn ensure_complete(self) -> Result<Vec<Applicant>, AdmissionsError> {
        if self.failures.is_empty() {
            Ok(self.decided)
        } else {
            Err(AdmissionsError::PartialBatchFailure {
                succeeded: self.decided.len(),
                failures: self.failures,
            })
        }
    }
}

/// Runs the screening cycle: announces tests to the cohort and records pass/fail decisions.
pub struct ScreeningCoordinator<S, D> {
    registry: ApplicantRegistry<S>,
    dispatcher: Arc<D>,
    targeting: NotificationTargeting,
    href: String,
}

impl<S, D> ScreeningCoordinator<S, D>
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    pub fn new(registry: ApplicantRegistry<S>, dispatcher: Arc<D>, config: &AdmissionsConfig) -> Self {
        Self {
            registry,
            dispatcher,
            targeting: config.notification_targeting,
            href: config.screening_href.clone(),
        }
    }

    /// Decide a screened applicant. Already decided applicants surface an
    /// `InvalidTransition` that reports itself as already decided.
    pub fn record_result(
        &self,
        id: &ApplicantId,
        outcome: ScreeningOutcome,
    ) -> Result<Applicant, AdmissionsError> {
        let decided = self.registry.set_status(id, outcome.decided_status())?;
        info!(applicant_id = %id, status = %decided.status, "screening result recorded");
        Ok(decided)
    }

    pub fn record_results(&self, decisions: Vec<(ApplicantId, ScreeningOutcome)>) -> ScreeningBatch {
        let mut decided = Vec::with_capacity(decisions.len());
        let mut failures = Vec::new();

        for (id, outcome) in decisions {
            match self.record_result(&id, outcome) {
                Ok(applicant) => decided.push(applicant),
                Err(err) => {
                    warn!(applicant_id = %id, error = %err, "screening decision skipped");
                    failures.push(BatchFailure::new(id.0, &err));
                }
            }
        }

        ScreeningBatch { decided, failures }
    }

    /// Announce a test slot to the whole screening cohort. Statuses are untouched and a
    /// failed dispatch is reported without undoing the schedule.
    pub fn schedule_test(
        &self,
        schedule: ScreeningSchedule,
    ) -> Result<ScheduleReport, AdmissionsError> {
        let cohort = self.registry.list_by_status(ApplicantStatus::Screening)?;
        let notifications = if cohort.is_empty() {
            Vec::new()
        } else {
            match self.targeting {
                NotificationTargeting::Audience => self.audience_notifications(&schedule),
                NotificationTargeting::Guardians => cohort
                    .iter()
                    .flat_map(|applicant| self.guardian_notifications(&schedule, applicant))
                    .collect(),
            }
        };

        let mut dispatched = 0;
        let mut failures = Vec::new();
        for notification in notifications {
            let target = notification
                .recipient
                .clone()
                .unwrap_or_else(|| notification.audience.feed_key().to_string());
            match self.dispatcher.dispatch(notification) {
                Ok(()) => dispatched += 1,
                Err(err) => {
                    warn!(recipient = %target, error = %err, "screening notification not delivered");
                    failures.push(BatchFailure {
                        id: target,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let cohort: Vec<ApplicantId> = cohort.into_iter().map(|applicant| applicant.id).collect();
        info!(
            cohort = cohort.len(),
            dispatched,
            failed = failures.len(),
            scheduled_for = %schedule.scheduled_for,
            "screening test scheduled"
        );

        Ok(ScheduleReport {
            scheduled_for: schedule.scheduled_for,
            cohort_size: cohort.len(),
            cohort,
            dispatched,
            failures,
        })
    }

    fn audience_notifications(&self, schedule: &ScreeningSchedule) -> Vec<Notification> {
        vec![
            self.notification(
                Audience::Student,
                None,
                "Entrance screening scheduled".to_string(),
                describe_slot(schedule),
            ),
            self.notification(
                Audience::Parent,
                None,
                "Entrance screening for your ward".to_string(),
                describe_slot(schedule),
            ),
        ]
    }

    fn guardian_notifications(
        &self,
        schedule: &ScreeningSchedule,
        applicant: &Applicant,
    ) -> Vec<Notification> {
        let guardian = if applicant.parent_email.trim().is_empty() {
            applicant.parent_phone.clone()
        } else {
            applicant.parent_email.clone()
        };

        vec![
            self.notification(
                Audience::Student,
                Some(applicant.id.0.clone()),
                "Entrance screening scheduled".to_string(),
                describe_slot(schedule),
            ),
            self.notification(
                Audience::Parent,
                Some(guardian),
                format!("Entrance screening for {}", applicant.name),
                format!(
                    "{} ({}) is due for screening. {}",
                    applicant.name,
                    applicant.class_name,
                    describe_slot(schedule)
                ),
            ),
        ]
    }

    fn notification(
        &self,
        audience: Audience,
        recipient: Option<String>,
        title: String,
        description: String,
    ) -> Notification {
        Notification {
            id: next_notification_id(),
            title,
            description,
            icon: SCREENING_ICON.to_string(),
            read: false,
            href: self.href.clone(),
            audience,
            recipient,
            created_at: Utc::now(),
        }
    }
}

fn describe_slot(schedule: &ScreeningSchedule) -> String {
    let when = format!(
        "The screening test holds on {} at {}.",
        schedule.scheduled_for.format("%A, %d %B %Y"),
        schedule.scheduled_for.format("%H:%M")
    );
    let instructions = schedule.instructions.trim();
    if instructions.is_empty() {
        when
    } else {
        format!("{when} {instructions}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn slot_description_includes_instructions_when_present() {
        let scheduled_for = NaiveDate::from_ymd_opt(2024, 5, 18)
            .expect("valid")
            .and_hms_opt(9, 30, 0)
            .expect("valid");
        let bare = ScreeningSchedule {
            scheduled_for,
            instructions: "   ".to_string(),
        };
        assert_eq!(
            describe_slot(&bare),
            "The screening test holds on Saturday, 18 May 2024 at 09:30."
        );

        let detailed = ScreeningSchedule {
            scheduled_for,
            instructions: "Bring two HB pencils.".to_string(),
        };
        assert!(describe_slot(&detailed).ends_with("09:30. Bring two HB pencils."));
    }
}

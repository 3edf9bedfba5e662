//! Display mapping for admissions records. The pipeline itself never reads these tables.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    Applicant, ApplicantId, ApplicantStatus, Enquiry, EnquiryId, EnquiryStatus, Gender, Student,
    StudentId, StudentStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    Neutral,
    Info,
    Warning,
    Success,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub label: &'static str,
    pub tone: BadgeTone,
    pub icon: &'static str,
}

pub const fn applicant_badge(status: ApplicantStatus) -> StatusBadge {
    match status {
        ApplicantStatus::Applied => StatusBadge {
            label: "Applied",
            tone: BadgeTone::Neutral,
            icon: "file-text",
        },
        ApplicantStatus::Pending => StatusBadge {
            label: "Pending",
            tone: BadgeTone::Warning,
            icon: "clock",
        },
        ApplicantStatus::Reviewed => StatusBadge {
            label: "Reviewed",
            tone: BadgeTone::Info,
            icon: "eye",
        },
        ApplicantStatus::Screening => StatusBadge {
            label: "Screening",
            tone: BadgeTone::Info,
            icon: "clipboard-check",
        },
        ApplicantStatus::Accepted => StatusBadge {
            label: "Accepted",
            tone: BadgeTone::Success,
            icon: "check-circle",
        },
        ApplicantStatus::Rejected => StatusBadge {
            label: "Rejected",
            tone: BadgeTone::Danger,
            icon: "x-circle",
        },
    }
}

pub const fn enquiry_badge(status: EnquiryStatus) -> StatusBadge {
    match status {
        EnquiryStatus::New => StatusBadge {
            label: "New",
            tone: BadgeTone::Info,
            icon: "inbox",
        },
        EnquiryStatus::Contacted => StatusBadge {
            label: "Contacted",
            tone: BadgeTone::Neutral,
            icon: "phone",
        },
        EnquiryStatus::FollowUp => StatusBadge {
            label: "Follow-up",
            tone: BadgeTone::Warning,
            icon: "repeat",
        },
        EnquiryStatus::NotInterested => StatusBadge {
            label: "Not Interested",
            tone: BadgeTone::Danger,
            icon: "user-x",
        },
        EnquiryStatus::Converted => StatusBadge {
            label: "Converted",
            tone: BadgeTone::Success,
            icon: "user-check",
        },
    }
}

pub const fn student_badge(status: StudentStatus) -> StatusBadge {
    match status {
        StudentStatus::Active => StatusBadge {
            label: StudentStatus::Active.label(),
            tone: BadgeTone::Success,
            icon: "user",
        },
        StudentStatus::Inactive => StatusBadge {
            label: StudentStatus::Inactive.label(),
            tone: BadgeTone::Neutral,
            icon: "user-minus",
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnquiryView {
    pub id: EnquiryId,
    pub student_name: String,
    pub class_of_interest: String,
    pub parent_name: String,
    pub enquiry_date: DateTime<Utc>,
    pub status: EnquiryStatus,
    pub badge: StatusBadge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_applicant: Option<ApplicantId>,
}

impl From<&Enquiry> for EnquiryView {
    fn from(enquiry: &Enquiry) -> Self {
        Self {
            id: enquiry.id.clone(),
            student_name: enquiry.student_name.clone(),
            class_of_interest: enquiry.class_of_interest.clone(),
            parent_name: enquiry.parent_name.clone(),
            enquiry_date: enquiry.enquiry_date,
            status: enquiry.status,
            badge: enquiry_badge(enquiry.status),
            linked_applicant: enquiry.linked_applicant.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicantView {
    pub id: ApplicantId,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub initials: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub submission_date: NaiveDate,
    pub status: ApplicantStatus,
    pub badge: StatusBadge,
    pub parent_name: String,
}

impl From<&Applicant> for ApplicantView {
    fn from(applicant: &Applicant) -> Self {
        Self {
            id: applicant.id.clone(),
            name: applicant.name.clone(),
            class_name: applicant.class_name.clone(),
            initials: applicant.initials.clone(),
            avatar: applicant.avatar.clone(),
            submission_date: applicant.submission_date,
            status: applicant.status,
            badge: applicant_badge(applicant.status),
            parent_name: applicant.parent_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentView {
    pub id: StudentId,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub initials: String,
    pub status: &'static str,
    pub badge: StatusBadge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub enrolled_on: NaiveDate,
    pub profile_complete: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<&'static str>,
}

impl From<&Student> for StudentView {
    fn from(student: &Student) -> Self {
        let missing_fields = student.missing_profile_fields();
        Self {
            id: student.id.clone(),
            name: student.name.clone(),
            class_name: student.class_name.clone(),
            initials: student.initials.clone(),
            status: student.status.label(),
            badge: student_badge(student.status),
            date_of_birth: student.date_of_birth,
            gender: student.gender,
            enrolled_on: student.enrolled_on,
            profile_complete: missing_fields.is_empty(),
            missing_fields,
        }
    }
}

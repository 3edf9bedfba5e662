use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// School-assigned applicant identifier. Survives enrollment as the student id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Student identifier; admissions only ever mints these from an [`ApplicantId`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnquiryId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EnquiryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ApplicantId> for StudentId {
    fn from(id: &ApplicantId) -> Self {
        Self(id.0.clone())
    }
}

impl StudentId {
    /// The applicant identity this student was enrolled from.
    pub fn applicant_id(&self) -> ApplicantId {
        ApplicantId(self.0.clone())
    }
}

/// Lifecycle of a pre-application contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    New,
    Contacted,
    FollowUp,
    NotInterested,
    Converted,
}

impl EnquiryStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::New,
            Self::Contacted,
            Self::FollowUp,
            Self::NotInterested,
            Self::Converted,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::FollowUp => "follow_up",
            Self::NotInterested => "not_interested",
            Self::Converted => "converted",
        }
    }

    /// Statuses reachable in one step from `self`.
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::Contacted],
            Self::Contacted => &[Self::FollowUp, Self::NotInterested, Self::Converted],
            Self::FollowUp => &[Self::NotInterested, Self::Converted],
            Self::NotInterested | Self::Converted => &[],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    pub const fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

impl fmt::Display for EnquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Admissions state machine. `Accepted` is the only status enrollment consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    Applied,
    Pending,
    Reviewed,
    Screening,
    Accepted,
    Rejected,
}

impl ApplicantStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Applied,
            Self::Pending,
            Self::Reviewed,
            Self::Screening,
            Self::Accepted,
            Self::Rejected,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Screening => "screening",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Applied => &[Self::Pending, Self::Reviewed],
            Self::Pending => &[Self::Reviewed, Self::Rejected],
            Self::Reviewed => &[Self::Screening, Self::Rejected],
            Self::Screening => &[Self::Accepted, Self::Rejected],
            Self::Accepted | Self::Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    pub const fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

impl fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Serialized with its display name, the same text [`StudentStatus::label`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentStatus {
    Active,
    Inactive,
}

impl StudentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Intake form for a parent or guardian's first contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryForm {
    pub student_name: String,
    pub class_of_interest: String,
    pub parent_name: String,
    pub parent_phone: String,
    #[serde(default)]
    pub parent_email: Option<String>,
}

/// Historical record of a contact; never deleted, even once converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enquiry {
    pub id: EnquiryId,
    pub student_name: String,
    pub class_of_interest: String,
    pub parent_name: String,
    pub parent_phone: String,
    pub parent_email: Option<String>,
    pub enquiry_date: DateTime<Utc>,
    pub status: EnquiryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_applicant: Option<ApplicantId>,
}

/// Direct application payload. The id is assigned by the school, not generated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantForm {
    pub id: ApplicantId,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub submission_date: Option<NaiveDate>,
    pub parent_name: String,
    pub parent_phone: String,
    pub parent_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub avatar: Option<String>,
    pub initials: String,
    pub submission_date: NaiveDate,
    pub status: ApplicantStatus,
    pub parent_name: String,
    pub parent_phone: String,
    pub parent_email: String,
}

impl Applicant {
    /// Build a fresh `Applied` record from an already validated form.
    pub(crate) fn from_form(form: ApplicantForm, today: NaiveDate) -> Self {
        let ApplicantForm {
            id,
            name,
            class_name,
            avatar,
            submission_date,
            parent_name,
            parent_phone,
            parent_email,
        } = form;

        let name = name.trim().to_string();
        let initials = initials_for(&name);

        Self {
            id: ApplicantId(id.0.trim().to_string()),
            name,
            class_name: class_name.trim().to_string(),
            avatar: avatar.filter(|value| !value.trim().is_empty()),
            initials,
            submission_date: submission_date.unwrap_or(today),
            status: ApplicantStatus::Applied,
            parent_name: parent_name.trim().to_string(),
            parent_phone: parent_phone.trim().to_string(),
            parent_email: parent_email.trim().to_string(),
        }
    }
}

/// Profile fields an applicant never carries; supplied at enrollment time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentDetails {
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub avatar: Option<String>,
    pub initials: String,
    pub status: StudentStatus,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub parent_name: String,
    pub parent_phone: String,
    pub parent_email: String,
    pub address: Option<String>,
    pub enrolled_on: NaiveDate,
}

impl Student {
    /// Convert an applicant, keeping its id. Missing profile fields stay empty rather than
    /// being filled with placeholders.
    pub(crate) fn from_applicant(
        applicant: Applicant,
        details: EnrollmentDetails,
        enrolled_on: NaiveDate,
    ) -> Self {
        let EnrollmentDetails {
            date_of_birth,
            gender,
            address,
        } = details;

        Self {
            id: StudentId::from(&applicant.id),
            name: applicant.name,
            class_name: applicant.class_name,
            avatar: applicant.avatar,
            initials: applicant.initials,
            status: StudentStatus::Active,
            date_of_birth,
            gender,
            parent_name: applicant.parent_name,
            parent_phone: applicant.parent_phone,
            parent_email: applicant.parent_email,
            address: address.filter(|value| !value.trim().is_empty()),
            enrolled_on,
        }
    }

    pub fn missing_profile_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.date_of_birth.is_none() {
            missing.push("date_of_birth");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        if self.address.is_none() {
            missing.push("address");
        }
        missing
    }

    pub fn profile_complete(&self) -> bool {
        self.missing_profile_fields().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningOutcome {
    Pass,
    Fail,
}

impl ScreeningOutcome {
    pub const fn decided_status(self) -> ApplicantStatus {
        match self {
            Self::Pass => ApplicantStatus::Accepted,
            Self::Fail => ApplicantStatus::Rejected,
        }
    }
}

/// Informational test slot announced to the screening cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningSchedule {
    pub scheduled_for: NaiveDateTime,
    #[serde(default)]
    pub instructions: String,
}

/// Feed partition a notification lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Student,
    Parent,
    Admin,
}

impl Audience {
    pub const fn ordered() -> [Self; 3] {
        [Self::Student, Self::Parent, Self::Admin]
    }

    pub const fn feed_key(self) -> &'static str {
        match self {
            Self::Student => "notifications:student",
            Self::Parent => "notifications:parent",
            Self::Admin => "notifications:admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub read: bool,
    pub href: String,
    pub audience: Audience,
    /// Individual addressee inside the audience feed; `None` addresses the whole feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Up to two uppercase letters taken from the leading words of a name.
pub fn initials_for(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applicant_table_matches_admissions_policy() {
        use ApplicantStatus::*;
        let allowed = [
            (Applied, Pending),
            (Applied, Reviewed),
            (Pending, Reviewed),
            (Pending, Rejected),
            (Reviewed, Screening),
            (Reviewed, Rejected),
            (Screening, Accepted),
            (Screening, Rejected),
        ];

        for from in ApplicantStatus::ordered() {
            for to in ApplicantStatus::ordered() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
        assert!(Accepted.is_terminal());
        assert!(Rejected.is_terminal());
        assert!(!Screening.is_terminal());
    }

    #[test]
    fn enquiry_table_only_allows_forward_contact_flow() {
        use EnquiryStatus::*;
        let allowed = [
            (New, Contacted),
            (Contacted, FollowUp),
            (Contacted, NotInterested),
            (Contacted, Converted),
            (FollowUp, NotInterested),
            (FollowUp, Converted),
        ];

        for from in EnquiryStatus::ordered() {
            for to in EnquiryStatus::ordered() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn initials_use_first_two_words() {
        assert_eq!(initials_for("Kunle Ade"), "KA");
        assert_eq!(initials_for("  amaka  chioma obi "), "AC");
        assert_eq!(initials_for("Tolu"), "T");
        assert_eq!(initials_for(""), "");
    }

    #[test]
    fn student_reports_missing_profile_fields() {
        let applicant = Applicant {
            id: ApplicantId("UC/24/001".to_string()),
            name: "Ada Obi".to_string(),
            class_name: "JSS 1B".to_string(),
            avatar: None,
            initials: "AO".to_string(),
            submission_date: NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid"),
            status: ApplicantStatus::Accepted,
            parent_name: "Ngozi Obi".to_string(),
            parent_phone: "08031234567".to_string(),
            parent_email: "ngozi@example.com".to_string(),
        };
        let student = Student::from_applicant(
            applicant,
            EnrollmentDetails {
                gender: Some(Gender::Female),
                address: Some("   ".to_string()),
                ..EnrollmentDetails::default()
            },
            NaiveDate::from_ymd_opt(2024, 9, 1).expect("valid"),
        );

        assert_eq!(student.id, StudentId("UC/24/001".to_string()));
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.missing_profile_fields(), vec!["date_of_birth", "address"]);
        assert!(!student.profile_complete());
    }
}

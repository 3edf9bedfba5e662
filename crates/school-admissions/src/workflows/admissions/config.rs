use serde::{Deserialize, Serialize};

pub const DEFAULT_SCREENING_HREF: &str = "/admissions/screening";

/// Who a screening announcement is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTargeting {
    /// One notification per audience feed with no individual recipient.
    #[default]
    Audience,
    /// One notification per cohort member, in the student feed and in the parent feed
    /// addressed to that applicant's guardian.
    Guardians,
}

impl NotificationTargeting {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "audience" | "feed" => Some(Self::Audience),
            "guardians" | "guardian" | "per_applicant" => Some(Self::Guardians),
            _ => None,
        }
    }
}

/// Policy dials for the admissions pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionsConfig {
    pub notification_targeting: NotificationTargeting,
    pub screening_href: String,
    /// Refuse enrollment when date of birth, gender, or address is missing.
    pub require_complete_profile: bool,
}

impl Default for AdmissionsConfig {
    fn default() -> Self {
        Self {
            notification_targeting: NotificationTargeting::default(),
            screening_href: DEFAULT_SCREENING_HREF.to_string(),
            require_complete_profile: false,
        }
    }
}

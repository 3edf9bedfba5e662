use super::domain::{ApplicantForm, EnquiryForm};
use super::error::AdmissionsError;

/// Collects every failing field so callers can surface them together.
#[derive(Debug, Default)]
pub(crate) struct FieldCheck {
    failing: Vec<&'static str>,
}

impl FieldCheck {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn required(mut self, field: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.failing.push(field);
        }
        self
    }

    pub(crate) fn identifier(mut self, field: &'static str, value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            self.failing.push(field);
        }
        self
    }

    pub(crate) fn email(mut self, field: &'static str, value: &str) -> Self {
        if !is_email(value) {
            self.failing.push(field);
        }
        self
    }

    pub(crate) fn optional_email(self, field: &'static str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|value| !value.is_empty()) {
            Some(email) => self.email(field, email),
            None => self,
        }
    }

    pub(crate) fn finish(self) -> Result<(), AdmissionsError> {
        if self.failing.is_empty() {
            Ok(())
        } else {
            Err(AdmissionsError::Validation {
                fields: self.failing,
            })
        }
    }
}

pub(crate) fn validate_enquiry_form(form: &EnquiryForm) -> Result<(), AdmissionsError> {
    FieldCheck::new()
        .required("student_name", &form.student_name)
        .required("class_of_interest", &form.class_of_interest)
        .required("parent_name", &form.parent_name)
        .required("parent_phone", &form.parent_phone)
        .optional_email("parent_email", form.parent_email.as_deref())
        .finish()
}

pub(crate) fn validate_applicant_form(form: &ApplicantForm) -> Result<(), AdmissionsError> {
    FieldCheck::new()
        .identifier("id", &form.id.0)
        .required("name", &form.name)
        .required("class", &form.class_name)
        .required("parent_name", &form.parent_name)
        .required("parent_phone", &form.parent_phone)
        .email("parent_email", &form.parent_email)
        .finish()
}

fn is_email(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.chars().any(char::is_whitespace) {
        return false;
    }
    match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rule_requires_domain() {
        assert!(is_email("parent@school.ng"));
        assert!(!is_email("parent@localhost"));
        assert!(!is_email("@school.ng"));
        assert!(!is_email("parent@@school.ng"));
        assert!(!is_email("parent at school.ng"));
    }

    #[test]
    fn enquiry_validation_reports_every_failing_field() {
        let form = EnquiryForm {
            student_name: " ".to_string(),
            class_of_interest: "JSS 1".to_string(),
            parent_name: String::new(),
            parent_phone: "  ".to_string(),
            parent_email: Some("not-an-email".to_string()),
        };

        match validate_enquiry_form(&form) {
            Err(AdmissionsError::Validation { fields }) => assert_eq!(
                fields,
                vec!["student_name", "parent_name", "parent_phone", "parent_email"]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_optional_email_is_ignored() {
        let form = EnquiryForm {
            student_name: "Tobi Ade".to_string(),
            class_of_interest: "Primary 4".to_string(),
            parent_name: "Mrs Ade".to_string(),
            parent_phone: "08031234567".to_string(),
            parent_email: Some("  ".to_string()),
        };
        assert!(validate_enquiry_form(&form).is_ok());
    }

    #[test]
    fn any_non_blank_phone_is_accepted() {
        let form = EnquiryForm {
            student_name: "Tobi Ade".to_string(),
            class_of_interest: "Primary 4".to_string(),
            parent_name: "Mrs Ade".to_string(),
            parent_phone: "ask for Mrs Ade at the front desk".to_string(),
            parent_email: None,
        };
        assert!(validate_enquiry_form(&form).is_ok());
    }
}

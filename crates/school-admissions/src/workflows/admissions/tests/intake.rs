use super::common::*;

use chrono::Utc;

use crate::workflows::admissions::domain::{
    ApplicantId, ApplicantStatus, Enquiry, EnquiryId, EnquiryStatus,
};
use crate::workflows::admissions::repository::AdmissionsStore;
use crate::workflows::admissions::{AdmissionsError, EntityKind};

fn stored_enquiry(sequence: u64) -> Enquiry {
    let form = enquiry_form();
    Enquiry {
        id: EnquiryId(format!("ENQ-{sequence:06}")),
        student_name: form.student_name,
        class_of_interest: form.class_of_interest,
        parent_name: form.parent_name,
        parent_phone: form.parent_phone,
        parent_email: form.parent_email,
        enquiry_date: Utc::now(),
        status: EnquiryStatus::Contacted,
        linked_applicant: None,
    }
}

#[test]
fn logged_enquiry_starts_new_with_generated_id() {
    let (service, _, _) = build_service();

    let first = service.log_enquiry(enquiry_form()).expect("logged");
    let second = service.log_enquiry(enquiry_form()).expect("logged");

    assert_eq!(first.status, EnquiryStatus::New);
    assert!(first.id.0.starts_with("ENQ-"));
    assert_ne!(first.id, second.id);
    assert_eq!(service.list_enquiries().expect("listing").len(), 2);
}

#[test]
fn enquiry_without_contact_phone_is_rejected() {
    let (service, _, _) = build_service();
    let mut form = enquiry_form();
    form.parent_phone = "  ".to_string();
    form.parent_email = Some("   ".to_string());

    match service.log_enquiry(form) {
        Err(AdmissionsError::Validation { fields }) => assert_eq!(fields, vec!["parent_phone"]),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn enquiry_cannot_skip_contact() {
    let (service, _, _) = build_service();
    let enquiry = service.log_enquiry(enquiry_form()).expect("logged");

    let err = service
        .advance_enquiry_status(&enquiry.id, EnquiryStatus::Converted)
        .expect_err("new enquiries must be contacted first");

    assert!(matches!(err, AdmissionsError::InvalidTransition(_)));
    assert_eq!(
        service.get_enquiry(&enquiry.id).expect("present").status,
        EnquiryStatus::New
    );
}

#[test]
fn closed_enquiry_reports_already_decided() {
    let (service, _, _) = build_service();
    let enquiry = service.log_enquiry(enquiry_form()).expect("logged");
    service
        .advance_enquiry_status(&enquiry.id, EnquiryStatus::Contacted)
        .expect("contacted");
    service
        .advance_enquiry_status(&enquiry.id, EnquiryStatus::NotInterested)
        .expect("closed");

    match service.advance_enquiry_status(&enquiry.id, EnquiryStatus::FollowUp) {
        Err(AdmissionsError::InvalidTransition(transition)) => {
            assert_eq!(transition.entity, EntityKind::Enquiry);
            assert!(transition.already_decided());
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn converted_enquiry_seeds_an_applied_applicant() {
    let (service, _, _) = build_service();
    let enquiry_id = converted_enquiry(&service);

    let (enquiry, applicant) = service
        .convert_enquiry(&enquiry_id, ApplicantId("UC/24/020".to_string()))
        .expect("conversion succeeds");

    assert_eq!(enquiry.linked_applicant, Some(applicant.id.clone()));
    assert_eq!(applicant.status, ApplicantStatus::Applied);
    assert_eq!(applicant.name, "Amaka Nwosu");
    assert_eq!(applicant.class_name, "JSS 1B");
    assert_eq!(applicant.parent_email, "chioma@example.com");
    assert_eq!(
        service.list_by_status(ApplicantStatus::Applied).expect("cohort").len(),
        1
    );
    assert_eq!(service.list_enquiries().expect("history").len(), 1);
}

#[test]
fn enquiry_converts_only_once() {
    let (service, _, _) = build_service();
    let enquiry_id = converted_enquiry(&service);
    service
        .convert_enquiry(&enquiry_id, ApplicantId("UC/24/020".to_string()))
        .expect("first conversion");

    match service.convert_enquiry(&enquiry_id, ApplicantId("UC/24/021".to_string())) {
        Err(AdmissionsError::DuplicateId { id, .. }) => assert_eq!(id, "UC/24/020"),
        other => panic!("expected duplicate, got {other:?}"),
    }
    assert_eq!(service.list_applicants().expect("pool").len(), 1);
}

#[test]
fn only_converted_enquiries_can_seed_applicants() {
    let (service, _, _) = build_service();
    let enquiry = service.log_enquiry(enquiry_form()).expect("logged");

    match service.convert_enquiry(&enquiry.id, ApplicantId("UC/24/020".to_string())) {
        Err(AdmissionsError::InvalidState {
            entity,
            status,
            required,
            ..
        }) => {
            assert_eq!(entity, EntityKind::Enquiry);
            assert_eq!(status, "new");
            assert_eq!(required, "converted");
        }
        other => panic!("expected invalid state, got {other:?}"),
    }
    assert!(service.list_applicants().expect("pool").is_empty());
}

#[test]
fn conversion_without_guardian_email_fails_validation() {
    let (service, _, _) = build_service();
    let mut form = enquiry_form();
    form.parent_email = None;
    let enquiry = service.log_enquiry(form).expect("logged");
    service
        .advance_enquiry_status(&enquiry.id, EnquiryStatus::Contacted)
        .expect("contacted");
    service
        .advance_enquiry_status(&enquiry.id, EnquiryStatus::Converted)
        .expect("converted");

    match service.convert_enquiry(&enquiry.id, ApplicantId("UC/24/020".to_string())) {
        Err(AdmissionsError::Validation { fields }) => assert_eq!(fields, vec!["parent_email"]),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(
        service.get_enquiry(&enquiry.id).expect("present").linked_applicant,
        None
    );
}

#[test]
fn logging_skips_ids_already_held_by_the_store() {
    let (scratch, _, _) = build_service();
    let last_issued: u64 = scratch
        .log_enquiry(enquiry_form())
        .expect("logged")
        .id
        .0
        .trim_start_matches("ENQ-")
        .parse()
        .expect("numeric sequence");

    let (service, store, _) = build_service();
    let mut held: Vec<EnquiryId> = Vec::new();
    for sequence in (1..=3).chain(last_issued + 1..=last_issued + 3) {
        held.push(
            store
                .insert_enquiry(stored_enquiry(sequence))
                .expect("seeded")
                .id,
        );
    }

    let logged = service.log_enquiry(enquiry_form()).expect("valid form is logged");

    assert!(!held.contains(&logged.id));
    assert_eq!(logged.status, EnquiryStatus::New);
    let history = service.list_enquiries().expect("history");
    assert_eq!(history.len(), held.len() + 1);
    for id in &held {
        assert_eq!(
            service.get_enquiry(id).expect("seeded enquiry kept").status,
            EnquiryStatus::Contacted
        );
    }
}

#[test]
fn advancing_an_unknown_enquiry_is_not_found() {
    let (service, _, _) = build_service();
    let existing = service.log_enquiry(enquiry_form()).expect("logged");
    let missing = EnquiryId("ENQ-999999".to_string());

    match service.advance_enquiry_status(&missing, EnquiryStatus::Contacted) {
        Err(AdmissionsError::NotFound { entity, id }) => {
            assert_eq!(entity, EntityKind::Enquiry);
            assert_eq!(id, "ENQ-999999");
        }
        other => panic!("expected not found, got {other:?}"),
    }
    let history = service.list_enquiries().expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, existing.id);
    assert_eq!(history[0].status, EnquiryStatus::New);
}

#[test]
fn converting_an_unknown_enquiry_is_not_found() {
    let (service, _, _) = build_service();
    let missing = EnquiryId("ENQ-999999".to_string());

    match service.convert_enquiry(&missing, ApplicantId("UC/24/020".to_string())) {
        Err(AdmissionsError::NotFound { entity, id }) => {
            assert_eq!(entity, EntityKind::Enquiry);
            assert_eq!(id, "ENQ-999999");
        }
        other => panic!("expected not found, got {other:?}"),
    }
    assert!(service.list_applicants().expect("pool").is_empty());
    assert!(service.list_enquiries().expect("history").is_empty());
}

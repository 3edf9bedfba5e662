use crate::infra::{in_memory_admissions, parse_date, InMemoryAdmissions};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::Args;
use school_admissions::error::AppError;
use school_admissions::workflows::admissions::views::{applicant_badge, ApplicantView, StudentView};
use school_admissions::workflows::admissions::{
    AdmissionsConfig, ApplicantCsvImporter, ApplicantForm, ApplicantId, ApplicantStatus, Audience,
    EnquiryForm, EnquiryStatus, EnrollmentDetails, Gender, ImportReport, InMemoryAdmissionsStore,
    NotificationTargeting, ScreeningOutcome, ScreeningSchedule,
};
use school_admissions::workflows::admissions::registry::ApplicantRegistry;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Address screening notices to each applicant's guardian instead of the shared feeds.
    #[arg(long)]
    pub(crate) guardians: bool,
    /// Refuse enrollment for students without date of birth, gender, and address.
    #[arg(long)]
    pub(crate) require_complete_profile: bool,
    /// Screening slot (YYYY-MM-DDTHH:MM). Defaults to next week at 09:00.
    #[arg(long, value_parser = crate::infra::parse_datetime)]
    pub(crate) screening_at: Option<NaiveDateTime>,
    /// Optional applicant CSV export added to the pool before screening.
    #[arg(long)]
    pub(crate) applicants_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Applicant CSV export (ID, Name, Class, Parent Name, Parent Phone, Parent Email)
    pub(crate) csv: PathBuf,
}

pub(crate) fn run_import_check(args: ImportArgs) -> Result<(), AppError> {
    let registry = ApplicantRegistry::new(Arc::new(InMemoryAdmissionsStore::new()));
    let report = ApplicantCsvImporter::from_path(&args.csv, &registry)?;

    println!("Applicant import check: {}", args.csv.display());
    render_import(&report);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        guardians,
        require_complete_profile,
        screening_at,
        applicants_csv,
    } = args;

    let config = AdmissionsConfig {
        notification_targeting: if guardians {
            NotificationTargeting::Guardians
        } else {
            NotificationTargeting::Audience
        },
        require_complete_profile,
        ..AdmissionsConfig::default()
    };
    let (service, feeds) = in_memory_admissions(config);

    println!("School admissions walkthrough");

    println!("\nEnquiry intake");
    let enquiry = service.log_enquiry(EnquiryForm {
        student_name: "Amaka Nwosu".to_string(),
        class_of_interest: "JSS 1B".to_string(),
        parent_name: "Chioma Nwosu".to_string(),
        parent_phone: "08031234567".to_string(),
        parent_email: Some("chioma.nwosu@example.com".to_string()),
    })?;
    println!("- {} logged for {} ({})", enquiry.id, enquiry.student_name, enquiry.status);
    for next in [EnquiryStatus::Contacted, EnquiryStatus::Converted] {
        let updated = service.advance_enquiry_status(&enquiry.id, next)?;
        println!("- {} moved to {}", updated.id, updated.status);
    }
    let (_, converted) =
        service.convert_enquiry(&enquiry.id, ApplicantId("UC/24/011".to_string()))?;
    println!("- seeded applicant {} from {}", converted.id, enquiry.id);

    println!("\nDirect application");
    let kunle = service.create_applicant(ApplicantForm {
        id: ApplicantId("UC/24/010".to_string()),
        name: "Kunle Ade".to_string(),
        class_name: "JSS 1A".to_string(),
        avatar: None,
        submission_date: parse_date("2024-01-15").ok(),
        parent_name: "Tunde Ade".to_string(),
        parent_phone: "+234 803 555 0101".to_string(),
        parent_email: "tunde.ade@example.com".to_string(),
    })?;
    println!("- {} {} applied for {}", kunle.id, kunle.name, kunle.class_name);

    if let Some(path) = applicants_csv {
        let file = std::fs::File::open(&path)?;
        let report = service.import_applicants(file)?;
        println!("\nApplicant import: {}", path.display());
        render_import(&report);
    }

    println!("\nReview");
    for applicant in service.list_by_status(ApplicantStatus::Applied)? {
        for next in [ApplicantStatus::Reviewed, ApplicantStatus::Screening] {
            service.set_applicant_status(&applicant.id, next)?;
        }
    }
    render_pool(&service)?;

    let scheduled_for = screening_at.unwrap_or_else(default_screening_slot);
    let report = service.schedule_test(ScreeningSchedule {
        scheduled_for,
        instructions: "Candidates should arrive 30 minutes early with two HB pencils."
            .to_string(),
    })?;
    println!(
        "\nScreening scheduled for {} | cohort {} | {} notices posted",
        report.scheduled_for.format("%d %b %Y %H:%M"),
        report.cohort_size,
        report.dispatched
    );
    for audience in Audience::ordered() {
        for notice in feeds.feed(audience) {
            println!(
                "  [{}] {}{}",
                audience.feed_key(),
                notice.title,
                notice
                    .recipient
                    .map(|recipient| format!(" -> {recipient}"))
                    .unwrap_or_default()
            );
        }
    }

    println!("\nScreening results");
    let batch = service.record_screening_results(vec![
        (kunle.id.clone(), ScreeningOutcome::Pass),
        (converted.id.clone(), ScreeningOutcome::Fail),
    ]);
    for applicant in &batch.decided {
        println!("- {} {}", applicant.id, applicant_badge(applicant.status).label);
    }
    for failure in &batch.failures {
        println!("- {} skipped: {}", failure.id, failure.reason);
    }

    match service.set_applicant_status(&kunle.id, ApplicantStatus::Applied) {
        Ok(_) => println!("- unexpected: {} reopened", kunle.id),
        Err(err) => println!("- reopening refused: {err}"),
    }

    println!("\nEnrollment");
    let mut details = BTreeMap::new();
    details.insert(
        kunle.id.clone(),
        EnrollmentDetails {
            date_of_birth: NaiveDate::from_ymd_opt(2012, 6, 2),
            gender: Some(Gender::Male),
            address: Some("14 Allen Avenue, Ikeja".to_string()),
        },
    );
    let enrolled = service.enroll_all_with(&details)?;
    for student in enrolled.students.iter().map(StudentView::from) {
        let profile = if student.profile_complete {
            "profile complete".to_string()
        } else {
            format!("missing {}", student.missing_fields.join(", "))
        };
        println!(
            "- {} {} ({}) {} | {}",
            student.id.0, student.name, student.class_name, student.status, profile
        );
    }
    for failure in &enrolled.failures {
        println!("- {} not enrolled: {}", failure.id, failure.reason);
    }

    let again = service.enroll_all()?;
    println!("- second pass enrolled {} more", again.count());

    render_pool(&service)?;
    Ok(())
}

fn default_screening_slot() -> NaiveDateTime {
    let day = Local::now().date_naive() + chrono::Duration::days(7);
    day.and_hms_opt(9, 0, 0).unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN))
}

fn render_pool(service: &InMemoryAdmissions) -> Result<(), AppError> {
    let pool = service.list_applicants()?;
    if pool.is_empty() {
        println!("Applicant pool: empty");
        return Ok(());
    }
    println!("Applicant pool");
    for applicant in pool.iter().map(ApplicantView::from) {
        println!(
            "  - {} {} [{}] {} ({})",
            applicant.id.0,
            applicant.initials,
            applicant.badge.label,
            applicant.name,
            applicant.class_name
        );
    }
    Ok(())
}

fn render_import(report: &ImportReport) {
    println!("- {} applicants accepted", report.created.len());
    if report.rejected.is_empty() {
        println!("- no rows rejected");
        return;
    }
    println!("- {} rows rejected", report.rejected.len());
    for row in &report.rejected {
        println!(
            "  line {}{}: {}",
            row.line,
            row.id
                .as_deref()
                .map(|id| format!(" ({id})"))
                .unwrap_or_default(),
            row.reason
        );
    }
}

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    ApplicantForm, ApplicantId, ApplicantStatus, EnquiryForm, EnquiryId, EnquiryStatus,
    EnrollmentDetails, ScreeningOutcome, ScreeningSchedule,
};
use super::error::{AdmissionsError, BatchFailure};
use super::repository::{AdmissionsStore, NotificationDispatcher};
use super::service::AdmissionsService;
use super::views::{ApplicantView, EnquiryView, StudentView};

type SharedService<S, D> = Arc<AdmissionsService<S, D>>;

/// Router builder exposing the admissions pipeline over HTTP.
///
/// Applicant ids are school-assigned and often contain `/` (for example `UC/24/010`), so
/// clients percent-encode them in path segments.
pub fn admissions_router<S, D>(service: SharedService<S, D>) -> Router
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/enquiries",
            get(list_enquiries_handler::<S, D>).post(log_enquiry_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/enquiries/:enquiry_id/status",
            post(enquiry_status_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/enquiries/:enquiry_id/convert",
            post(convert_enquiry_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/applicants",
            get(list_applicants_handler::<S, D>).post(create_applicant_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/applicants/import",
            post(import_applicants_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/applicants/:applicant_id",
            get(applicant_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/applicants/:applicant_id/status",
            post(applicant_status_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/applicants/:applicant_id/screening-result",
            post(screening_result_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/applicants/:applicant_id/enroll",
            post(enroll_one_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/screening/schedule",
            post(schedule_test_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/screening/results",
            post(screening_results_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/enrollments",
            post(enroll_all_handler::<S, D>),
        )
        .route(
            "/api/v1/admissions/students",
            get(list_students_handler::<S, D>),
        )
        .with_state(service)
}

/// HTTP status reported for each admissions failure.
pub fn status_for(error: &AdmissionsError) -> StatusCode {
    match error {
        AdmissionsError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AdmissionsError::DuplicateId { .. } => StatusCode::CONFLICT,
        AdmissionsError::NotFound { .. } => StatusCode::NOT_FOUND,
        AdmissionsError::InvalidTransition(_) | AdmissionsError::InvalidState { .. } => {
            StatusCode::CONFLICT
        }
        AdmissionsError::PartialBatchFailure { .. } => StatusCode::MULTI_STATUS,
        AdmissionsError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(error: AdmissionsError) -> Response {
    let status = status_for(&error);
    let payload = match &error {
        AdmissionsError::Validation { fields } => json!({
            "error": error.to_string(),
            "fields": fields,
        }),
        AdmissionsError::InvalidTransition(transition) => json!({
            "error": error.to_string(),
            "already_decided": transition.already_decided(),
        }),
        AdmissionsError::PartialBatchFailure { succeeded, failures } => json!({
            "error": error.to_string(),
            "succeeded": succeeded,
            "failures": failures,
        }),
        _ => json!({ "error": error.to_string() }),
    };
    (status, axum::Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, AdmissionsError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnquiryStatusChange {
    pub(crate) status: EnquiryStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicantStatusChange {
    pub(crate) status: ApplicantStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConvertRequest {
    pub(crate) applicant_id: ApplicantId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScreeningResultRequest {
    pub(crate) outcome: ScreeningOutcome,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScreeningDecision {
    pub(crate) applicant_id: ApplicantId,
    pub(crate) outcome: ScreeningOutcome,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScreeningResultsRequest {
    pub(crate) decisions: Vec<ScreeningDecision>,
}

/// Per-applicant profile data keyed by applicant id.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EnrollAllRequest {
    #[serde(default)]
    pub(crate) details: BTreeMap<String, EnrollmentDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicantQuery {
    pub(crate) status: Option<ApplicantStatus>,
}

#[derive(Debug, Serialize)]
struct ConversionResponse {
    enquiry: EnquiryView,
    applicant: ApplicantView,
}

#[derive(Debug, Serialize)]
struct BatchResponse<T> {
    succeeded: usize,
    records: Vec<T>,
    failures: Vec<BatchFailure>,
}

impl<T: Serialize> BatchResponse<T> {
    fn finish(self) -> Response {
        let status = if self.failures.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::MULTI_STATUS
        };
        (status, axum::Json(self)).into_response()
    }
}

pub(crate) async fn log_enquiry_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    axum::Json(form): axum::Json<EnquiryForm>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    respond(
        StatusCode::CREATED,
        service.log_enquiry(form).map(|enquiry| EnquiryView::from(&enquiry)),
    )
}

pub(crate) async fn list_enquiries_handler<S, D>(
    State(service): State<SharedService<S, D>>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    respond(
        StatusCode::OK,
        service
            .list_enquiries()
            .map(|enquiries| enquiries.iter().map(EnquiryView::from).collect::<Vec<_>>()),
    )
}

pub(crate) async fn enquiry_status_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    Path(enquiry_id): Path<String>,
    axum::Json(change): axum::Json<EnquiryStatusChange>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let id = EnquiryId(enquiry_id);
    respond(
        StatusCode::OK,
        service
            .advance_enquiry_status(&id, change.status)
            .map(|enquiry| EnquiryView::from(&enquiry)),
    )
}

pub(crate) async fn convert_enquiry_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    Path(enquiry_id): Path<String>,
    axum::Json(request): axum::Json<ConvertRequest>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let id = EnquiryId(enquiry_id);
    respond(
        StatusCode::CREATED,
        service
            .convert_enquiry(&id, request.applicant_id)
            .map(|(enquiry, applicant)| ConversionResponse {
                enquiry: EnquiryView::from(&enquiry),
                applicant: ApplicantView::from(&applicant),
            }),
    )
}

pub(crate) async fn create_applicant_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    axum::Json(form): axum::Json<ApplicantForm>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    respond(
        StatusCode::CREATED,
        service
            .create_applicant(form)
            .map(|applicant| ApplicantView::from(&applicant)),
    )
}

pub(crate) async fn list_applicants_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    Query(query): Query<ApplicantQuery>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let applicants = match query.status {
        Some(status) => service.list_by_status(status),
        None => service.list_applicants(),
    };
    respond(
        StatusCode::OK,
        applicants.map(|pool| pool.iter().map(ApplicantView::from).collect::<Vec<_>>()),
    )
}

pub(crate) async fn import_applicants_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    body: String,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    match service.import_applicants(Cursor::new(body.into_bytes())) {
        Ok(report) => {
            let status = if report.rejected.is_empty() {
                StatusCode::OK
            } else {
                StatusCode::MULTI_STATUS
            };
            let payload = json!({
                "created": report.created.iter().map(ApplicantView::from).collect::<Vec<_>>(),
                "rejected": report.rejected,
            });
            (status, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn applicant_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    Path(applicant_id): Path<String>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let id = ApplicantId(applicant_id);
    respond(
        StatusCode::OK,
        service
            .get_applicant(&id)
            .map(|applicant| ApplicantView::from(&applicant)),
    )
}

pub(crate) async fn applicant_status_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    Path(applicant_id): Path<String>,
    axum::Json(change): axum::Json<ApplicantStatusChange>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let id = ApplicantId(applicant_id);
    respond(
        StatusCode::OK,
        service
            .set_applicant_status(&id, change.status)
            .map(|applicant| ApplicantView::from(&applicant)),
    )
}

pub(crate) async fn screening_result_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    Path(applicant_id): Path<String>,
    axum::Json(request): axum::Json<ScreeningResultRequest>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let id = ApplicantId(applicant_id);
    respond(
        StatusCode::OK,
        service
            .record_screening_result(&id, request.outcome)
            .map(|applicant| ApplicantView::from(&applicant)),
    )
}

pub(crate) async fn screening_results_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    axum::Json(request): axum::Json<ScreeningResultsRequest>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let decisions = request
        .decisions
        .into_iter()
        .map(|decision| (decision.applicant_id, decision.outcome))
        .collect();
    let batch = service.record_screening_results(decisions);

    BatchResponse {
        succeeded: batch.decided.len(),
        records: batch.decided.iter().map(ApplicantView::from).collect(),
        failures: batch.failures,
    }
    .finish()
}

pub(crate) async fn schedule_test_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    axum::Json(schedule): axum::Json<ScreeningSchedule>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    match service.schedule_test(schedule) {
        Ok(report) => {
            let status = if report.fully_delivered() {
                StatusCode::OK
            } else {
                StatusCode::MULTI_STATUS
            };
            (status, axum::Json(report)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn enroll_one_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    Path(applicant_id): Path<String>,
    axum::Json(details): axum::Json<EnrollmentDetails>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let id = ApplicantId(applicant_id);
    respond(
        StatusCode::CREATED,
        service
            .enroll_one(&id, details)
            .map(|student| StudentView::from(&student)),
    )
}

pub(crate) async fn enroll_all_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    axum::Json(request): axum::Json<EnrollAllRequest>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    let details = request
        .details
        .into_iter()
        .map(|(id, profile)| (ApplicantId(id), profile))
        .collect();

    match service.enroll_all_with(&details) {
        Ok(batch) => BatchResponse {
            succeeded: batch.count(),
            records: batch.students.iter().map(StudentView::from).collect(),
            failures: batch.failures,
        }
        .finish(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_students_handler<S, D>(
    State(service): State<SharedService<S, D>>,
) -> Response
where
    S: AdmissionsStore + 'static,
    D: NotificationDispatcher + 'static,
{
    respond(
        StatusCode::OK,
        service
            .list_students()
            .map(|students| students.iter().map(StudentView::from).collect::<Vec<_>>()),
    )
}

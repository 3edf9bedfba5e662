use crate::cli::ServeArgs;
use crate::infra::{in_memory_admissions, AppState};
use crate::routes::with_admissions_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use school_admissions::config::AppConfig;
use school_admissions::error::AppError;
use school_admissions::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (admissions, _feeds) = in_memory_admissions(config.admissions.clone());

    if let Some(path) = args.seed_csv.take() {
        let file = std::fs::File::open(&path)?;
        let report = admissions.import_applicants(file)?;
        for row in &report.rejected {
            warn!(line = row.line, reason = %row.reason, "seed row skipped");
        }
        info!(
            path = %path.display(),
            created = report.created.len(),
            rejected = report.rejected.len(),
            "applicant pool seeded"
        );
    }

    let app = with_admissions_routes(admissions)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        targeting = ?config.admissions.notification_targeting,
        "school admissions service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

use crate::cli::ServeArgs;
use crate::infra::{AppState, AuditObserver, InMemorySessionRepository};
use crate::routes::with_admission_routes;
use admission_flow::config::AppConfig;
use admission_flow::error::AppError;
use admission_flow::telemetry;
use admission_flow::workflows::admissions::{
    AdmissionSessionService, HttpSubmissionTransport, StaticCredentials,
};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemorySessionRepository::default());
    let transport = Arc::new(HttpSubmissionTransport::new(&config.backend)?);
    let credentials = Arc::new(StaticCredentials::from_config(&config.backend));
    let admission_service = Arc::new(
        AdmissionSessionService::new(repository, transport, credentials, config.validation)
            .with_observer(Arc::new(AuditObserver)),
    );

    let app = with_admission_routes(admission_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        backend = %config.backend.base_url,
        "admissions wizard service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

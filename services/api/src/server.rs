use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryFormRepository, LoggingMailTransport};
use crate::routes::with_form_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use housing_forms::config::AppConfig;
use housing_forms::error::AppError;
use housing_forms::telemetry;
use housing_forms::workflows::mcr::{ApproverAllowList, McrFormService, NotificationDispatcher};

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

    let repository = Arc::new(InMemoryFormRepository::default());
    let transport = Arc::new(LoggingMailTransport);
    let dispatcher = NotificationDispatcher::new(
        transport,
        config.mail.approver_inbox.clone(),
        config.mail.delivery_timeout(),
    );
    let form_service = Arc::new(McrFormService::new(
        repository,
        dispatcher,
        ApproverAllowList::new(&config.approvals.approvers),
    ));

    let app = with_form_routes(form_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "manual check request service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

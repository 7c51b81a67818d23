use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_desk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use collector_desk::config::AppConfig;
use collector_desk::error::AppError;
use collector_desk::remote::LendingApiClient;
use collector_desk::telemetry;
use collector_desk::workflows::desk::CollectorDeskService;
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

    telemetry::init(&config.telemetry)?;

    let client = Arc::new(LendingApiClient::new(&config.desk)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        calculator: client.clone(),
    };

    let desk_service = Arc::new(CollectorDeskService::new(
        client.clone(),
        config.desk.failure_policy,
    ));

    let app = with_desk_routes(desk_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        api_base_url = client.base_url(),
        policy = ?config.desk.failure_policy,
        "collector desk gateway ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryBlobStorage, InMemoryEndorsementStore, InMemoryNotificationSink,
};
use crate::routes::with_endorsement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hr_intake::config::AppConfig;
use hr_intake::error::AppError;
use hr_intake::telemetry;
use hr_intake::workflows::endorsement::{AgencyId, EndorsementService};
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

    let service = Arc::new(EndorsementService::from_config(
        &config,
        AgencyId(args.agency),
        Arc::new(InMemoryEndorsementStore::default()),
        Arc::new(InMemoryBlobStorage::default()),
        Arc::new(InMemoryNotificationSink::default()),
    ));

    let app = with_endorsement_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "endorsement intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

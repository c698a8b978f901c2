use crate::cli::ServeArgs;
use crate::infra::{load_dataset, AppState};
use crate::routes::with_matching_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use realty_match::config::AppConfig;
use realty_match::error::AppError;
use realty_match::telemetry;
use realty_match::workflows::matching::{InMemoryStore, MatchingService};
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = match args.dataset.take() {
        Some(path) => {
            let dataset = load_dataset(&path)?;
            info!(
                path = %path.display(),
                profiles = dataset.profiles.len(),
                properties = dataset.properties.len(),
                "seeded store from dataset"
            );
            InMemoryStore::from_dataset(dataset)
        }
        None => InMemoryStore::default(),
    };
    let matching_service = Arc::new(MatchingService::new(Arc::new(store), config.matching));

    let app = with_matching_routes(matching_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "realty match service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

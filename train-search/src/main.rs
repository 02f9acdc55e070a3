use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use train_search::catalog::{CatalogLoader, SharedCatalog};
use train_search::config::AppConfig;
use train_search::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    info!(
        catalog = %config.catalog,
        slots = %config.search.slots,
        max_distance_km = config.search.acceptable_distance_km,
        box_degrees = config.search.box_half_degrees,
        "loaded configuration"
    );

    // Load the catalog (fail fast if unavailable)
    let loader =
        CatalogLoader::new(config.loader_config()).expect("Failed to create catalog loader");
    let catalog = SharedCatalog::load(loader)
        .await
        .expect("Failed to load catalog");
    let stats = catalog.stats().await;
    info!(
        stations = stats.stations,
        trains = stats.trains,
        "catalog loaded"
    );

    // Spawn background task to refresh the catalog
    match config.refresh_interval {
        Some(period) => {
            let catalog_refresh = catalog.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.tick().await; // First tick is immediate, skip it
                loop {
                    interval.tick().await;
                    match catalog_refresh.refresh().await {
                        Ok(stats) => info!(
                            stations = stats.stations,
                            trains = stats.trains,
                            generation = stats.generation,
                            "refreshed catalog"
                        ),
                        Err(e) => error!(error = %e, "failed to refresh catalog"),
                    }
                }
            });
        }
        None => warn!("catalog refresh disabled"),
    }

    let state = AppState::new(catalog, config.search.clone());
    let app = create_router(state);

    info!(addr = %config.bind, "train search listening");
    info!("  GET /health");
    info!("  GET /api/stations?q=");
    info!("  GET /api/search?from=&to=&class=&date=&departure_time=&arrival_time=");
    info!("  GET /api/trains/:number/schedule");

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}

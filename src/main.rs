use std::sync::Arc;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use listing_wizard::{
    assets::{ConfigStore, HostedAssets},
    location::{GeocodingProvider, MapboxGeocoder},
    routes,
    sdk::{HttpSdk, MemoryTokenStore},
    settings::Settings,
    store::MemoryWizardStore,
    AppState,
};
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    std::env::set_var(
        "RUST_LOG",
        std::env::var("RUST_LOG").unwrap_or_else(|_| String::from("info")),
    );

    // initialize tracing
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env()?;

    let assets = HostedAssets::new(
        &settings.asset_base_url,
        &settings.client_id,
        &settings.marketplace_currency,
    );
    let state = AppState {
        config: ConfigStore::new(Arc::new(assets), settings.config_cache_ttl),
        sdk: Arc::new(HttpSdk::new(
            &settings.sdk_base_url,
            &settings.client_id,
            MemoryTokenStore::default(),
        )),
        wizards: Arc::new(MemoryWizardStore::new()),
        geocoder: settings
            .mapbox_access_token
            .as_ref()
            .map(|token| Arc::new(MapboxGeocoder::new(token)) as Arc<dyn GeocodingProvider>),
    };

    // Warm the config cache so a broken asset setup fails at startup.
    state.config.get().await?;

    if let Some(credentials) = &settings.credentials {
        state
            .sdk
            .login(&credentials.username, &credentials.password)
            .await?;
        info!(username = %credentials.username, "logged in to marketplace");
    }

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = routes::router(state)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http());

    info!("listening on {}", settings.bind_addr);
    axum::Server::bind(&settings.bind_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

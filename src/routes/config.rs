use crate::{entities::MarketplaceConfig, error::AppError, AppState};
use axum::{extract::State, Json};
use metrics::increment_counter;

pub async fn config(State(state): State<AppState>) -> Result<Json<MarketplaceConfig>, AppError> {
    increment_counter!("listing_wizard_config_request");

    let config = state.config.get().await?;
    Ok(Json(config.as_ref().clone()))
}

// Drops the cached config and fetches it again.
pub async fn refresh(State(state): State<AppState>) -> Result<Json<MarketplaceConfig>, AppError> {
    increment_counter!("listing_wizard_config_refresh");

    state.config.invalidate().await;
    let config = state.config.get().await?;
    Ok(Json(config.as_ref().clone()))
}

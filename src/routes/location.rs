use crate::{
    error::{AppError, WizardError},
    location::Place,
    AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use metrics::increment_counter;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub q: String,
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Vec<Place>>, AppError> {
    increment_counter!("listing_wizard_location_request");

    let Some(geocoder) = &state.geocoder else {
        return Err(WizardError::LocationSearchDisabled.into());
    };
    if query.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let places = geocoder.suggest(query.q.trim()).await?;
    Ok(Json(places))
}

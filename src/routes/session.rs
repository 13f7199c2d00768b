use crate::{
    error::{AppError, WizardError},
    sdk::CurrentUser,
    settings::Credentials,
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use metrics::increment_counter;
use tracing::info;

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<StatusCode, AppError> {
    increment_counter!("listing_wizard_login_request");

    state
        .sdk
        .login(&credentials.username, &credentials.password)
        .await
        .map_err(WizardError::Sdk)?;
    info!(username = %credentials.username, "session started");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.sdk.logout().await.map_err(WizardError::Sdk)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<AppState>) -> Result<Json<CurrentUser>, AppError> {
    let user = state.sdk.current_user().await.map_err(WizardError::Sdk)?;
    Ok(Json(user))
}

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

pub mod config;
pub mod location;
pub mod session;
pub mod wizard;

/// Every wizard endpoint. Layers and `/metrics` are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/config", get(config::config))
        .route("/config/refresh", post(config::refresh))
        .route("/session", post(session::login).delete(session::logout))
        .route("/me", get(session::me))
        .route("/locations", get(location::search))
        .route("/wizards", post(wizard::create))
        .route("/wizards/:key", get(wizard::show).delete(wizard::remove))
        .route("/wizards/:key/form", put(wizard::update_form))
        .route("/wizards/:key/category", put(wizard::select_category))
        .route("/wizards/:key/images", post(wizard::upload_images))
        .route("/wizards/:key/sections", get(wizard::sections))
        .route("/wizards/:key/payload", get(wizard::payload))
        .route("/wizards/:key/publish", post(wizard::publish))
        .with_state(state)
}

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(clippy::missing_const_for_fn)]
#![deny(clippy::nursery)]
#![deny(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use assets::ConfigStore;
use location::GeocodingProvider;
use sdk::MarketplaceSdk;
use store::WizardStore;

pub mod assets;
pub mod category;
pub mod currency;
pub mod eligibility;
pub mod entities;
pub mod error;
pub mod form;
pub mod lint;
pub mod location;
pub mod publish;
pub mod routes;
pub mod schema;
pub mod sdk;
pub mod settings;
pub mod store;
pub mod transform;
pub mod upload;

#[cfg(test)]
mod testing;

#[derive(Clone)]
pub struct AppState {
    // Marketplace configuration is one object, so the cache holds a single entry.
    pub config: ConfigStore,
    pub sdk: Arc<dyn MarketplaceSdk>,
    pub wizards: Arc<dyn WizardStore>,
    /// Unset when no geocoding token is configured.
    pub geocoder: Option<Arc<dyn GeocodingProvider>>,
}

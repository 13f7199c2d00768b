//! Location autocomplete. Queries are debounced and every new query aborts
//! the one before it, whether it is still waiting or already in flight.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::form::{LatLng, LocationInput};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoding provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid geocoding url: {0}")]
    Url(String),
}

/// A suggestion from the geocoding provider. `center` is `[lng, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub place_name: String,
    pub center: [f64; 2],
}

impl Place {
    pub fn origin(&self) -> LatLng {
        let [lng, lat] = self.center;
        LatLng { lat, lng }
    }

    /// The form value stored when the user picks this suggestion.
    pub fn to_location(&self) -> LocationInput {
        LocationInput {
            address: self.place_name.clone(),
            building: None,
            origin: Some(self.origin()),
        }
    }
}

#[async_trait]
pub trait GeocodingProvider: Send + Sync + 'static {
    async fn suggest(&self, query: &str) -> Result<Vec<Place>, GeocodeError>;
}

pub struct MapboxGeocoder {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    limit: u8,
}

impl MapboxGeocoder {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string(),
            access_token: access_token.into(),
            limit: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Place>,
}

#[async_trait]
impl GeocodingProvider for MapboxGeocoder {
    async fn suggest(&self, query: &str) -> Result<Vec<Place>, GeocodeError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|err| GeocodeError::Url(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| GeocodeError::Url(self.base_url.clone()))?
            .push(&format!("{query}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .append_pair("limit", &self.limit.to_string())
            .append_pair("autocomplete", "true");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }
        let collection: FeatureCollection = response.json().await?;
        Ok(collection.features)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    #[default]
    Idle,
    Results {
        query: String,
        places: Vec<Place>,
    },
    Failed {
        query: String,
        message: String,
    },
}

/// Debounced autocomplete over a [`GeocodingProvider`]. Must be used from
/// within a tokio runtime.
pub struct LocationSearch<G> {
    provider: Arc<G>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    state: Arc<watch::Sender<SearchState>>,
}

impl<G: GeocodingProvider> LocationSearch<G> {
    pub fn new(provider: Arc<G>) -> Self {
        Self::with_delay(provider, SEARCH_DEBOUNCE)
    }

    pub fn with_delay(provider: Arc<G>, delay: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            provider,
            delay,
            pending: Mutex::new(None),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Schedules a lookup for `query`, replacing any earlier one. A blank
    /// query resets the results without a request.
    pub fn search(&self, query: impl Into<String>) {
        let query = query.into();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        if query.trim().is_empty() {
            self.state.send_replace(SearchState::Idle);
            return;
        }

        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(%query, "searching locations");
            let result = provider.suggest(&query).await;
            let next = match result {
                Ok(places) => SearchState::Results { query, places },
                Err(err) => {
                    warn!(%query, %err, "location search failed");
                    SearchState::Failed {
                        query,
                        message: err.to_string(),
                    }
                }
            };
            state.send_replace(next);
        }));
    }
}

impl<G> LocationSearch<G> {
    pub fn cancel(&self) {
        if let Some(previous) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            previous.abort();
        }
    }
}

impl<G> Drop for LocationSearch<G> {
    fn drop(&mut self) {
        self.cancel();
    }
}

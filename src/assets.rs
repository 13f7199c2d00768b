use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::info;

use crate::entities::{
    known_entries, CategoryConfiguration, ListingField, ListingTypeConfig, MarketplaceConfig,
    UserField, UserTypeConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("asset request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("asset {path} returned status {status}")]
    Status {
        path: &'static str,
        status: reqwest::StatusCode,
    },
}

/// Where marketplace configuration comes from.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self) -> Result<MarketplaceConfig, ConfigError>;
}

/// Reads the hosted asset documents of one marketplace.
pub struct HostedAssets {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct AssetDocument<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingTypesAsset {
    #[serde(default)]
    listing_types: Vec<ListingTypeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingFieldsAsset {
    #[serde(default, deserialize_with = "known_entries")]
    listing_fields: Vec<ListingField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserTypesAsset {
    #[serde(default)]
    user_types: Vec<UserTypeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserFieldsAsset {
    #[serde(default, deserialize_with = "known_entries")]
    user_fields: Vec<UserField>,
}

impl HostedAssets {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            currency: currency.into(),
        }
    }

    async fn document<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, ConfigError> {
        let url = format!("{}/pub/{}/latest/{path}", self.base_url, self.client_id);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::Status { path, status });
        }
        let document: AssetDocument<T> = response.json().await?;
        Ok(document.data)
    }
}

#[async_trait]
impl AssetSource for HostedAssets {
    async fn fetch(&self) -> Result<MarketplaceConfig, ConfigError> {
        let (listing_types, listing_fields, categories, user_types, user_fields) = tokio::try_join!(
            self.document::<ListingTypesAsset>("content/listing-types.json"),
            self.document::<ListingFieldsAsset>("content/listing-fields.json"),
            self.document::<CategoryConfiguration>("content/listing-categories.json"),
            self.document::<UserTypesAsset>("content/user-types.json"),
            self.document::<UserFieldsAsset>("content/user-fields.json"),
        )?;

        Ok(MarketplaceConfig {
            currency: self.currency.clone(),
            listing_types: listing_types.listing_types,
            listing_fields: listing_fields.listing_fields,
            categories,
            user_types: user_types.user_types,
            user_fields: user_fields.user_fields,
        })
    }
}

/// A fixed configuration, for tests and local files.
pub struct StaticAssets(pub MarketplaceConfig);

#[async_trait]
impl AssetSource for StaticAssets {
    async fn fetch(&self) -> Result<MarketplaceConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Fetches configuration once and hands out the cached copy.
#[derive(Clone)]
pub struct ConfigStore {
    source: Arc<dyn AssetSource>,
    cache: Cache<(), Arc<MarketplaceConfig>>,
}

impl ConfigStore {
    pub fn new(source: Arc<dyn AssetSource>, ttl: Option<Duration>) -> Self {
        let builder = Cache::builder().max_capacity(1);
        let cache = match ttl {
            Some(ttl) => builder.time_to_live(ttl).build(),
            None => builder.build(),
        };
        Self { source, cache }
    }

    pub async fn get(&self) -> Result<Arc<MarketplaceConfig>, Arc<ConfigError>> {
        self.cache
            .try_get_with((), async {
                let config = self.source.fetch().await?;
                info!(
                    listing_types = config.listing_types.len(),
                    listing_fields = config.listing_fields.len(),
                    categories = config.categories.categories.len(),
                    "loaded marketplace configuration"
                );
                Ok::<_, ConfigError>(Arc::new(config))
            })
            .await
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}

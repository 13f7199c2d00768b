//! Marketplace API collaborator: own listings, images, current user and auth.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{multipart, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    currency::Money,
    error::{ApiError, StorableError},
    form::{AvailabilityPlan, LatLng},
    transform::ListingPayload,
};

pub type SdkResult<T> = Result<T, StorableError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingAttributes {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_plan: Option<AvailabilityPlan>,
    #[serde(default)]
    pub public_data: Map<String, Value>,
    #[serde(default)]
    pub private_data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnListing {
    pub id: Uuid,
    pub attributes: ListingAttributes,
    pub images: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub id: Uuid,
}

/// Image bytes picked on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub public_data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: u64,
}

#[async_trait]
pub trait MarketplaceSdk: Send + Sync {
    async fn create_listing(&self, payload: &ListingPayload) -> SdkResult<OwnListing>;

    async fn update_listing(&self, id: Uuid, payload: &ListingPayload) -> SdkResult<OwnListing>;

    async fn show_listing(&self, id: Uuid) -> SdkResult<OwnListing>;

    async fn upload_image(&self, image: ImageFile) -> SdkResult<UploadedImage>;

    async fn current_user(&self) -> SdkResult<CurrentUser>;

    async fn login(&self, username: &str, password: &str) -> SdkResult<()>;

    async fn logout(&self) -> SdkResult<()>;
}

/// Where the user's access token lives between requests.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<AuthToken>;
    fn set(&self, token: AuthToken);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<AuthToken>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<AuthToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: AuthToken) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        self.token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

// JSON:API envelopes used by the marketplace API.

#[derive(Debug, Deserialize)]
struct Document<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Resource<A> {
    id: Uuid,
    attributes: A,
    #[serde(default)]
    relationships: Relationships,
}

#[derive(Debug, Default, Deserialize)]
struct Relationships {
    #[serde(default)]
    images: Option<Document<Vec<ResourceRef>>>,
}

#[derive(Debug, Deserialize)]
struct ResourceRef {
    id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    errors: Vec<ApiError>,
}

impl From<Resource<ListingAttributes>> for OwnListing {
    fn from(resource: Resource<ListingAttributes>) -> Self {
        Self {
            id: resource.id,
            attributes: resource.attributes,
            images: resource
                .relationships
                .images
                .map(|images| images.data.into_iter().map(|image| image.id).collect())
                .unwrap_or_default(),
        }
    }
}

/// Marketplace API client over HTTP.
pub struct HttpSdk<T> {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    tokens: T,
}

impl<T: TokenStore> HttpSdk<T> {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>, tokens: T) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> SdkResult<reqwest::RequestBuilder> {
        let token = self.tokens.get().ok_or_else(|| {
            StorableError::new("AuthError", "Not logged in").with_status(StatusCode::UNAUTHORIZED)
        })?;
        Ok(request.bearer_auth(token.access_token))
    }

    async fn send<R: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> SdkResult<R> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body: ErrorDocument = response.json().await.unwrap_or_default();
            let message = body
                .errors
                .first()
                .and_then(|err| err.title.clone())
                .unwrap_or_else(|| format!("Request failed with status {status}"));
            return Err(StorableError::new("ApiError", message)
                .with_status(status)
                .with_api_errors(body.errors));
        }
        response
            .json()
            .await
            .map_err(|err| StorableError::new("ResponseError", err.to_string()))
    }

    fn login_request(&self, username: &str, password: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url("auth/token")).form(&[
            ("client_id", self.client_id.as_str()),
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", "user"),
        ])
    }

    async fn listing_request(&self, request: reqwest::RequestBuilder) -> SdkResult<OwnListing> {
        let document: Document<Resource<ListingAttributes>> = self
            .send(self.authorized(request.query(&[("include", "images")]))?)
            .await?;
        Ok(document.data.into())
    }
}

#[async_trait]
impl<T: TokenStore> MarketplaceSdk for HttpSdk<T> {
    async fn create_listing(&self, payload: &ListingPayload) -> SdkResult<OwnListing> {
        debug!(title = %payload.title, "creating listing");
        let request = self
            .client
            .post(self.url("api/own_listings/create"))
            .json(payload);
        self.listing_request(request).await
    }

    async fn update_listing(&self, id: Uuid, payload: &ListingPayload) -> SdkResult<OwnListing> {
        debug!(%id, "updating listing");
        let mut body = serde_json::to_value(payload)
            .map_err(|err| StorableError::new("SerializationError", err.to_string()))?;
        body["id"] = json!(id);
        let request = self
            .client
            .post(self.url("api/own_listings/update"))
            .json(&body);
        self.listing_request(request).await
    }

    async fn show_listing(&self, id: Uuid) -> SdkResult<OwnListing> {
        let request = self
            .client
            .get(self.url("api/own_listings/show"))
            .query(&[("id", id.to_string())]);
        self.listing_request(request).await
    }

    async fn upload_image(&self, image: ImageFile) -> SdkResult<UploadedImage> {
        let part = multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = multipart::Form::new().part("image", part);
        let request = self
            .client
            .post(self.url("api/images/upload"))
            .multipart(form);
        let document: Document<Resource<Value>> = self.send(self.authorized(request)?).await?;
        Ok(UploadedImage {
            id: document.data.id,
        })
    }

    async fn current_user(&self) -> SdkResult<CurrentUser> {
        let request = self.client.get(self.url("api/current_user/show"));
        let document: Document<Resource<Map<String, Value>>> =
            self.send(self.authorized(request)?).await?;
        let attributes = document.data.attributes;
        Ok(CurrentUser {
            id: document.data.id,
            email: attributes
                .get("email")
                .and_then(Value::as_str)
                .map(str::to_string),
            public_data: attributes
                .get("profile")
                .and_then(|profile| profile.get("publicData"))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn login(&self, username: &str, password: &str) -> SdkResult<()> {
        let token: AuthToken = self.send(self.login_request(username, password)).await?;
        self.tokens.set(token);
        info!("logged in");
        Ok(())
    }

    async fn logout(&self) -> SdkResult<()> {
        let Some(token) = self.tokens.get() else {
            return Ok(());
        };
        let request = self
            .client
            .post(self.url("auth/revoke"))
            .bearer_auth(&token.access_token)
            .form(&[("token", token.refresh_token.unwrap_or(token.access_token))]);
        let _: Value = self.send(request).await?;
        self.tokens.clear();
        info!("logged out");
        Ok(())
    }
}

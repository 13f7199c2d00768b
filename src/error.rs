use axum::{response::IntoResponse, Json};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{form::FieldErrors, store::WizardKey};

#[derive(Debug)]
pub struct AppError(pub color_eyre::eyre::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if let Some(err) = self.0.downcast_ref::<WizardError>() {
            return (err.status(), Json(err.body())).into_response();
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<color_eyre::eyre::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// One entry of the marketplace API `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Serializable error kept in wizard state and shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{name}: {message}")]
pub struct StorableError {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default)]
    pub api_errors: Vec<ApiError>,
}

impl StorableError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: "error".to_string(),
            name: name.into(),
            message: message.into(),
            status: None,
            status_text: None,
            api_errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self.status_text = status.canonical_reason().map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_api_errors(mut self, api_errors: Vec<ApiError>) -> Self {
        self.api_errors = api_errors;
        self
    }
}

impl From<reqwest::Error> for StorableError {
    fn from(err: reqwest::Error) -> Self {
        let storable = Self::new("NetworkError", err.to_string());
        match err.status() {
            Some(status) => storable.with_status(status),
            None => storable,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("no wizard with key {0}")]
    UnknownWizard(WizardKey),
    #[error("listing type is not selected or not configured")]
    MissingListingType,
    #[error("form has invalid fields")]
    Validation(FieldErrors),
    #[error("listing is already being published")]
    PublishInProgress,
    #[error("location search is not configured")]
    LocationSearchDisabled,
    #[error(transparent)]
    Sdk(#[from] StorableError),
}

impl WizardError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::UnknownWizard(_) => StatusCode::NOT_FOUND,
            Self::MissingListingType | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PublishInProgress => StatusCode::CONFLICT,
            Self::LocationSearchDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::Sdk(err) => match err.status {
                Some(401) => StatusCode::UNAUTHORIZED,
                Some(404) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Validation(fields) => json!({ "error": self.to_string(), "fields": fields }),
            Self::Sdk(err) => json!({ "error": err }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

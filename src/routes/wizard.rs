use std::time::Instant;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use metrics::{histogram, increment_counter};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    category::{selected_path, subcategories_for_level},
    eligibility::{show_details_form, visible_listing_fields, SectionVisibility},
    entities::{CategoryNode, ListingField},
    error::{AppError, WizardError},
    form::{EditListingForm, FieldErrors},
    sdk::{ImageFile, OwnListing},
    store::{WizardAction, WizardKey, WizardState},
    transform::{initial_form_values, ListingPayload},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWizard {
    /// Edit an existing listing instead of starting from a blank form.
    #[serde(default)]
    pub listing_id: Option<Uuid>,
    #[serde(default)]
    pub form: Option<EditListingForm>,
}

#[derive(Debug, Serialize)]
pub struct WizardResponse {
    pub key: WizardKey,
    #[serde(flatten)]
    pub state: WizardState,
}

#[derive(Debug, Deserialize)]
pub struct CategorySelection {
    pub level: usize,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsResponse {
    pub sections: SectionVisibility,
    pub show_details: bool,
    /// Options for the next category level, empty once the path is complete.
    pub category_options: Vec<CategoryNode>,
    pub fields: Vec<ListingField>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesResponse {
    pub uploaded: Vec<Uuid>,
    /// One message per file that failed to upload.
    pub alerts: Vec<String>,
    pub images: Vec<Uuid>,
}

fn invalid(field: &str, message: String) -> AppError {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), message);
    WizardError::Validation(errors).into()
}

fn selected(state: &AppState, key: &WizardKey) -> Result<WizardState, WizardError> {
    state
        .wizards
        .select(key)
        .ok_or_else(|| WizardError::UnknownWizard(key.clone()))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateWizard>,
) -> Result<(StatusCode, Json<WizardResponse>), AppError> {
    increment_counter!("listing_wizard_create_request");

    let (form, listing_id) = match request.listing_id {
        Some(id) => {
            let config = state.config.get().await?;
            let listing = state.sdk.show_listing(id).await.map_err(WizardError::Sdk)?;
            (initial_form_values(&listing, &config), Some(id))
        }
        None => (request.form.unwrap_or_default(), None),
    };

    let key = WizardKey::generate();
    state.wizards.dispatch(WizardAction::Mount {
        key: key.clone(),
        form,
        listing_id,
    });
    info!(%key, ?listing_id, "wizard created");

    let wizard = selected(&state, &key)?;
    Ok((
        StatusCode::CREATED,
        Json(WizardResponse { key, state: wizard }),
    ))
}

pub async fn show(
    State(state): State<AppState>,
    Path(key): Path<WizardKey>,
) -> Result<Json<WizardResponse>, AppError> {
    let wizard = selected(&state, &key)?;
    Ok(Json(WizardResponse { key, state: wizard }))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(key): Path<WizardKey>,
) -> Result<StatusCode, AppError> {
    if !state
        .wizards
        .dispatch(WizardAction::Unmount { key: key.clone() })
    {
        return Err(WizardError::UnknownWizard(key).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(key): Path<WizardKey>,
    Json(form): Json<EditListingForm>,
) -> Result<Json<WizardResponse>, AppError> {
    if !state.wizards.dispatch(WizardAction::UpdateForm {
        key: key.clone(),
        form,
    }) {
        return Err(WizardError::UnknownWizard(key).into());
    }
    let wizard = selected(&state, &key)?;
    Ok(Json(WizardResponse { key, state: wizard }))
}

pub async fn select_category(
    State(state): State<AppState>,
    Path(key): Path<WizardKey>,
    Json(selection): Json<CategorySelection>,
) -> Result<Json<WizardResponse>, AppError> {
    let config = state.config.get().await?;
    let wizard = selected(&state, &key)?;

    // Levels are picked top down; a level may only follow a selected parent.
    let path = selected_path(&wizard.form.fields, &config.categories.key);
    if selection.level == 0 || selection.level > path.len() + 1 {
        return Err(invalid(
            "level",
            format!("Select a category for level {} first.", path.len() + 1),
        ));
    }
    if let Some(id) = selection.id.as_deref() {
        let options =
            subcategories_for_level(&config.categories.categories, &path, selection.level);
        if !options.iter().any(|category| category.id == id) {
            return Err(invalid(
                "id",
                format!("{id} is not a category at level {}.", selection.level),
            ));
        }
    }

    state.wizards.dispatch(WizardAction::SelectCategory {
        key: key.clone(),
        category_key: config.categories.key.clone(),
        level: selection.level,
        id: selection.id,
    });
    let wizard = selected(&state, &key)?;
    Ok(Json(WizardResponse { key, state: wizard }))
}

pub async fn upload_images(
    State(state): State<AppState>,
    Path(key): Path<WizardKey>,
    mut multipart: Multipart,
) -> Result<Json<ImagesResponse>, AppError> {
    increment_counter!("listing_wizard_image_upload_request");
    selected(&state, &key)?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| invalid("images", err.to_string()))?
    {
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| invalid("images", err.to_string()))?;
        files.push(ImageFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let report = crate::upload::upload_images(state.sdk.as_ref(), files).await;
    if !state.wizards.dispatch(WizardAction::AddImages {
        key: key.clone(),
        images: report.images.clone(),
    }) {
        return Err(WizardError::UnknownWizard(key).into());
    }

    let wizard = selected(&state, &key)?;
    Ok(Json(ImagesResponse {
        uploaded: report.images,
        alerts: report
            .failures
            .into_iter()
            .map(|failure| failure.message)
            .collect(),
        images: wizard.form.images,
    }))
}

pub async fn sections(
    State(state): State<AppState>,
    Path(key): Path<WizardKey>,
) -> Result<Json<SectionsResponse>, AppError> {
    let config = state.config.get().await?;
    let form = selected(&state, &key)?.form;
    let listing_type = form.listing_type.as_deref();

    let sections = listing_type
        .map(|listing_type| SectionVisibility::resolve(&config, listing_type, &config.currency))
        .unwrap_or_default();
    let path = selected_path(&form.fields, &config.categories.key);

    let category_options = if sections.categories {
        subcategories_for_level(&config.categories.categories, &path, path.len() + 1).to_vec()
    } else {
        Vec::new()
    };
    let fields = match listing_type {
        Some(listing_type) if sections.details => {
            visible_listing_fields(&config, listing_type, &path)
                .into_iter()
                .cloned()
                .collect()
        }
        _ => Vec::new(),
    };

    Ok(Json(SectionsResponse {
        sections,
        show_details: show_details_form(&config, listing_type, &form.fields, &config.currency),
        category_options,
        fields,
    }))
}

pub async fn payload(
    State(state): State<AppState>,
    Path(key): Path<WizardKey>,
) -> Result<Json<ListingPayload>, AppError> {
    let config = state.config.get().await?;
    let payload = crate::publish::listing_payload(state.wizards.as_ref(), &config, &key)?;
    Ok(Json(payload))
}

pub async fn publish(
    State(state): State<AppState>,
    Path(key): Path<WizardKey>,
) -> Result<Json<OwnListing>, AppError> {
    increment_counter!("listing_wizard_publish_request");

    let config = state.config.get().await?;
    let publish_time = Instant::now();
    let result = crate::publish::publish(
        state.sdk.as_ref(),
        state.wizards.as_ref(),
        &config,
        &key,
    )
    .await;
    histogram!("listing_wizard_publish_time", publish_time.elapsed());

    match result {
        Ok(listing) => Ok(Json(listing)),
        Err(err) => {
            increment_counter!("listing_wizard_publish_failure");
            Err(err.into())
        }
    }
}

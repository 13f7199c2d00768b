//! Test doubles shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::StorableError,
    sdk::{
        CurrentUser, ImageFile, ListingAttributes, MarketplaceSdk, OwnListing, SdkResult,
        UploadedImage,
    },
    transform::ListingPayload,
};

/// In-memory SDK that records calls. Uploads fail for names listed in
/// `fail_uploads`; listing writes fail with `fail_writes` when set.
#[derive(Default)]
pub struct FakeSdk {
    pub fail_uploads: Vec<String>,
    pub fail_writes: Option<StorableError>,
    pub uploads: Mutex<Vec<String>>,
    pub created: Mutex<Vec<ListingPayload>>,
    pub updated: Mutex<Vec<(Uuid, ListingPayload)>>,
}

fn listing(id: Uuid, payload: &ListingPayload) -> OwnListing {
    OwnListing {
        id,
        attributes: ListingAttributes {
            title: payload.title.clone(),
            description: payload.description.clone(),
            state: Some("published".to_string()),
            price: payload.price.clone(),
            geolocation: payload.geolocation,
            availability_plan: payload.availability_plan.clone(),
            public_data: payload.public_data.clone().unwrap_or_default(),
            private_data: payload.private_data.clone().unwrap_or_default(),
        },
        images: payload.images.clone(),
    }
}

#[async_trait]
impl MarketplaceSdk for FakeSdk {
    async fn create_listing(&self, payload: &ListingPayload) -> SdkResult<OwnListing> {
        if let Some(err) = &self.fail_writes {
            return Err(err.clone());
        }
        self.created.lock().unwrap().push(payload.clone());
        Ok(listing(Uuid::new_v4(), payload))
    }

    async fn update_listing(&self, id: Uuid, payload: &ListingPayload) -> SdkResult<OwnListing> {
        if let Some(err) = &self.fail_writes {
            return Err(err.clone());
        }
        self.updated.lock().unwrap().push((id, payload.clone()));
        Ok(listing(id, payload))
    }

    async fn show_listing(&self, _id: Uuid) -> SdkResult<OwnListing> {
        Err(StorableError::new("NotFound", "no listings in fake"))
    }

    async fn upload_image(&self, image: ImageFile) -> SdkResult<UploadedImage> {
        self.uploads.lock().unwrap().push(image.file_name.clone());
        if self.fail_uploads.contains(&image.file_name) {
            return Err(StorableError::new("ApiError", "image too large"));
        }
        Ok(UploadedImage { id: Uuid::new_v4() })
    }

    async fn current_user(&self) -> SdkResult<CurrentUser> {
        Err(StorableError::new("AuthError", "Not logged in"))
    }

    async fn login(&self, _username: &str, _password: &str) -> SdkResult<()> {
        Ok(())
    }

    async fn logout(&self) -> SdkResult<()> {
        Ok(())
    }
}

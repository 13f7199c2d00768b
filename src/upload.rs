use tracing::warn;
use uuid::Uuid;

use crate::{
    error::StorableError,
    sdk::{ImageFile, MarketplaceSdk},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub file_name: String,
    /// Alert text for the user.
    pub message: String,
    pub error: StorableError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub images: Vec<Uuid>,
    pub failures: Vec<UploadFailure>,
}

/// Uploads images one after another. A failed upload is reported and
/// skipped; images uploaded before it are kept.
pub async fn upload_images<S>(sdk: &S, files: Vec<ImageFile>) -> UploadReport
where
    S: MarketplaceSdk + ?Sized,
{
    let mut report = UploadReport::default();
    for file in files {
        let file_name = file.file_name.clone();
        match sdk.upload_image(file).await {
            Ok(image) => report.images.push(image.id),
            Err(error) => {
                warn!(%file_name, %error, "image upload failed");
                report.failures.push(UploadFailure {
                    message: format!("Could not upload {file_name}. Try again with another image."),
                    file_name,
                    error,
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSdk;

    fn file(name: &str) -> ImageFile {
        ImageFile {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8],
        }
    }

    #[tokio::test]
    async fn failed_upload_is_skipped() {
        let sdk = FakeSdk {
            fail_uploads: vec!["b.jpg".to_string()],
            ..FakeSdk::default()
        };

        let report = upload_images(&sdk, vec![file("a.jpg"), file("b.jpg"), file("c.jpg")]).await;

        assert_eq!(report.images.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_name, "b.jpg");
        assert_eq!(
            *sdk.uploads.lock().unwrap(),
            vec!["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()]
        );
    }
}

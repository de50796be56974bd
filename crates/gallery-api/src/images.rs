use std::sync::Arc;

use futures::future::join_all;
use gallery_core::models::{display_title_from_filename, AssetView};
use gallery_core::util::unix_timestamp_now;
use gallery_core::SigningRequest;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::media::{MediaHost, UploadFile, UpstreamError};

/// Gallery operations against the hosted collection.
///
/// Stateless: every call signs from scratch with the current time.
#[derive(Clone)]
pub struct ImageService {
    config: Arc<AppConfig>,
    host: Arc<dyn MediaHost>,
}

impl ImageService {
    pub fn new(config: Arc<AppConfig>, host: Arc<dyn MediaHost>) -> Self {
        Self { config, host }
    }

    /// Lists gallery assets. Upstream failures yield an empty gallery.
    pub async fn list_images(&self) -> Vec<AssetView> {
        match self.host.list_resources(self.config.list_max_results).await {
            Ok(listing) => {
                let location = self.config.delivery_location();
                listing
                    .into_assets()
                    .iter()
                    .map(|asset| asset.to_view(&location))
                    .collect()
            }
            Err(error) => {
                tracing::warn!(
                    endpoint = "images_list",
                    "Listing failed, serving empty gallery: {error}"
                );
                Vec::new()
            }
        }
    }

    /// Uploads one file and returns the upstream object unchanged.
    pub async fn upload_image(&self, file: UploadFile, tags: &[String]) -> Result<Value, AppError> {
        let file_name = file.file_name.clone();
        let title = display_title_from_filename(&file.file_name).to_string();
        let fields = SigningRequest::upload(&title, tags, unix_timestamp_now())
            .sign(&self.config.api_secret)
            .into_form_fields(&self.config.api_key);

        self.host.upload(file, fields).await.map_err(|error| {
            tracing::error!(
                endpoint = "images_upload",
                file_name_len = file_name.len(),
                "Upstream upload failed: {error}"
            );
            AppError::external(format!("Failed to upload image: {}", summarize(&error)))
        })
    }

    /// Uploads every file concurrently and waits for all of them.
    ///
    /// Uploads that succeeded stay in the collection when another file fails;
    /// the batch is then reported as failed with the names that did not make it.
    pub async fn upload_batch(
        &self,
        files: Vec<UploadFile>,
        tags: &[String],
    ) -> Result<Vec<Value>, AppError> {
        let names: Vec<String> = files.iter().map(|file| file.file_name.clone()).collect();
        let outcomes = join_all(files.into_iter().map(|file| self.upload_image(file, tags))).await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut failed = Vec::new();
        for (name, outcome) in names.into_iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(_) => failed.push(name),
            }
        }

        if failed.is_empty() {
            return Ok(results);
        }
        tracing::warn!(
            endpoint = "images_upload",
            uploaded = results.len(),
            failed = failed.len(),
            "Batch upload partially failed; completed uploads are kept"
        );
        Err(AppError::PartialUpload {
            attempted: results.len() + failed.len(),
            uploaded: results.len(),
            failed,
        })
    }

    /// Destroys one asset. Upstream detail is logged, never returned.
    pub async fn delete_image(&self, public_id: &str) -> Result<Value, AppError> {
        if public_id.trim().is_empty() {
            return Err(AppError::bad_request("No public_id provided"));
        }

        let fields = SigningRequest::destroy(public_id, unix_timestamp_now())
            .sign(&self.config.api_secret)
            .into_form_fields(&self.config.api_key);

        self.host.destroy(fields).await.map_err(|error| {
            tracing::error!(
                endpoint = "images_delete",
                public_id_len = public_id.len(),
                "Upstream delete failed: {error}"
            );
            AppError::external("Failed to delete image")
        })
    }
}

fn summarize(error: &UpstreamError) -> String {
    match error {
        UpstreamError::Transport(_) => "media service unreachable".to_string(),
        UpstreamError::Status { status, .. } => format!("media service returned HTTP {status}"),
        UpstreamError::Decode(_) => "unreadable media service response".to_string(),
    }
}

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::BoxFuture;
use gallery_core::models::ResourceListing;
use gallery_core::util::{compact_text, sanitize};
use http::header::AUTHORIZATION;
use reqwest::multipart;
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;

/// Failure talking to the hosted media service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable response: {0}")]
    Decode(String),
}

/// One file as received from the gallery, ready to forward.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Calls against the hosted media service.
///
/// Signing happens before these are called; implementations only move bytes.
pub trait MediaHost: Send + Sync {
    /// Lists image resources, authenticated with the API key and secret.
    fn list_resources(
        &self,
        max_results: u32,
    ) -> BoxFuture<'_, Result<ResourceListing, UpstreamError>>;

    /// Uploads one file with already-signed form fields. Returns the raw
    /// upstream object.
    fn upload(
        &self,
        file: UploadFile,
        fields: Vec<(String, String)>,
    ) -> BoxFuture<'_, Result<Value, UpstreamError>>;

    /// Destroys one asset with already-signed form fields.
    fn destroy(&self, fields: Vec<(String, String)>) -> BoxFuture<'_, Result<Value, UpstreamError>>;
}

#[derive(Clone)]
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: Arc<AppConfig>,
}

impl CloudinaryHost {
    pub fn new(config: Arc<AppConfig>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{path}",
            self.config.api_base_url, self.config.cloud_name
        )
    }

    async fn fetch_listing(&self, max_results: u32) -> Result<ResourceListing, UpstreamError> {
        let response = self
            .client
            .get(self.endpoint("resources/image"))
            .query(&[("max_results", max_results)])
            .header(
                AUTHORIZATION,
                basic_authorization(&self.config.api_key, &self.config.api_secret),
            )
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| UpstreamError::Transport(sanitize(&error)))?;

        let body = read_success_body(response).await?;
        ResourceListing::from_json(&body).map_err(|error| UpstreamError::Decode(sanitize(&error)))
    }

    async fn post_upload(
        &self,
        file: UploadFile,
        fields: Vec<(String, String)>,
    ) -> Result<Value, UpstreamError> {
        let mut part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|error| UpstreamError::Transport(sanitize(&error)))?;
        }
        let form = fields
            .into_iter()
            .fold(multipart::Form::new().part("file", part), |form, (name, value)| {
                form.text(name, value)
            });

        let response = self
            .client
            .post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|error| UpstreamError::Transport(sanitize(&error)))?;

        parse_json(&read_success_body(response).await?)
    }

    async fn post_destroy(&self, fields: Vec<(String, String)>) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .post(self.endpoint("image/destroy"))
            .form(&fields)
            .send()
            .await
            .map_err(|error| UpstreamError::Transport(sanitize(&error)))?;

        parse_json(&read_success_body(response).await?)
    }
}

impl MediaHost for CloudinaryHost {
    fn list_resources(
        &self,
        max_results: u32,
    ) -> BoxFuture<'_, Result<ResourceListing, UpstreamError>> {
        Box::pin(self.fetch_listing(max_results))
    }

    fn upload(
        &self,
        file: UploadFile,
        fields: Vec<(String, String)>,
    ) -> BoxFuture<'_, Result<Value, UpstreamError>> {
        Box::pin(self.post_upload(file, fields))
    }

    fn destroy(&self, fields: Vec<(String, String)>) -> BoxFuture<'_, Result<Value, UpstreamError>> {
        Box::pin(self.post_destroy(fields))
    }
}

/// `Basic` authorization value for the admin listing endpoint.
fn basic_authorization(api_key: &str, api_secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{api_key}:{api_secret}")))
}

async fn read_success_body(response: reqwest::Response) -> Result<String, UpstreamError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| UpstreamError::Transport(sanitize(&error)))?;
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body: compact_text(&body),
        });
    }
    Ok(body)
}

fn parse_json(body: &str) -> Result<Value, UpstreamError> {
    serde_json::from_str(body).map_err(|error| UpstreamError::Decode(sanitize(&error)))
}

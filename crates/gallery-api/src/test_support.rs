//! In-process stand-in for the hosted media service.

use std::sync::Mutex;

use futures::future::{ready, BoxFuture};
use gallery_core::models::ResourceListing;
use serde_json::{json, Value};

use crate::media::{MediaHost, UploadFile, UpstreamError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    List {
        max_results: u32,
    },
    Upload {
        file_name: String,
        fields: Vec<(String, String)>,
        stored: bool,
    },
    Destroy {
        fields: Vec<(String, String)>,
    },
}

enum Listing {
    Body(String),
    Status(u16),
    Transport,
}

pub struct FakeHost {
    calls: Mutex<Vec<HostCall>>,
    listing: Listing,
    failing_uploads: Vec<String>,
    fail_destroy: bool,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            listing: Listing::Body(r#"{"resources": []}"#.to_string()),
            failing_uploads: Vec::new(),
            fail_destroy: false,
        }
    }

    pub fn with_listing_body(mut self, body: &str) -> Self {
        self.listing = Listing::Body(body.to_string());
        self
    }

    pub fn with_listing_status(mut self, status: u16) -> Self {
        self.listing = Listing::Status(status);
        self
    }

    pub fn with_listing_transport_failure(mut self) -> Self {
        self.listing = Listing::Transport;
        self
    }

    pub fn with_listing_undecodable(self) -> Self {
        self.with_listing_body("<html>maintenance</html>")
    }

    pub fn failing_upload(mut self, file_name: &str) -> Self {
        self.failing_uploads.push(file_name.to_string());
        self
    }

    pub fn failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of files the fake service accepted.
    pub fn uploaded_files(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Upload {
                    file_name,
                    stored: true,
                    ..
                } => Some(file_name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MediaHost for FakeHost {
    fn list_resources(
        &self,
        max_results: u32,
    ) -> BoxFuture<'_, Result<ResourceListing, UpstreamError>> {
        self.record(HostCall::List { max_results });
        let outcome = match &self.listing {
            Listing::Body(body) => ResourceListing::from_json(body)
                .map_err(|error| UpstreamError::Decode(error.to_string())),
            Listing::Status(status) => Err(UpstreamError::Status {
                status: *status,
                body: "upstream exploded".to_string(),
            }),
            Listing::Transport => Err(UpstreamError::Transport("connection refused".to_string())),
        };
        Box::pin(ready(outcome))
    }

    fn upload(
        &self,
        file: UploadFile,
        fields: Vec<(String, String)>,
    ) -> BoxFuture<'_, Result<Value, UpstreamError>> {
        let stored = !self.failing_uploads.contains(&file.file_name);
        self.record(HostCall::Upload {
            file_name: file.file_name.clone(),
            fields,
            stored,
        });
        let outcome = if stored {
            Ok(json!({
                "public_id": format!("uploads/{}", file.file_name),
                "original_filename": file.file_name,
                "bytes": file.bytes.len(),
                "version": 1,
            }))
        } else {
            Err(UpstreamError::Status {
                status: 400,
                body: "Invalid image file".to_string(),
            })
        };
        Box::pin(ready(outcome))
    }

    fn destroy(&self, fields: Vec<(String, String)>) -> BoxFuture<'_, Result<Value, UpstreamError>> {
        self.record(HostCall::Destroy { fields });
        let outcome = if self.fail_destroy {
            Err(UpstreamError::Status {
                status: 401,
                body: "Invalid Signature 0123abcd".to_string(),
            })
        } else {
            Ok(json!({ "result": "ok" }))
        };
        Box::pin(ready(outcome))
    }
}

pub fn file(name: &str) -> UploadFile {
    UploadFile {
        file_name: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

//! Signed-parameter authentication for the hosted media API.
//!
//! Privileged calls (upload, destroy) carry a `signature` field instead of the
//! shared secret. The service rebuilds the same canonical string from the
//! parameters it receives and rejects the call when the digests differ, so the
//! key order and value formatting here must match the service exactly:
//!
//! ```text
//! key1=value1&key2=value2...<secret>
//! ```
//!
//! hashed with SHA-1 and rendered as lowercase hex. The API key and the
//! secret itself are never part of the signed parameters.

use std::fmt;

use sha1::{Digest, Sha1};

const FLAG_TRUE: &str = "true";

/// Ordered parameters for one signed call.
///
/// Built immediately before a call and consumed by [`SigningRequest::sign`].
/// `Debug` prints keys only since values end up next to the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningRequest {
    params: Vec<(String, String)>,
}

impl SigningRequest {
    /// Parameters for an upload that keeps the original file name as context.
    ///
    /// The `tags` segment is left out entirely when `tags` is empty.
    pub fn upload(original_filename: &str, tags: &[String], timestamp: i64) -> Self {
        let mut params = vec![(
            "context".to_string(),
            format!("original_filename={original_filename}"),
        )];
        if !tags.is_empty() {
            params.push(("tags".to_string(), tags.join(",")));
        }
        params.push(("timestamp".to_string(), timestamp.to_string()));
        params.push(("unique_filename".to_string(), FLAG_TRUE.to_string()));
        params.push(("use_filename".to_string(), FLAG_TRUE.to_string()));
        Self { params }
    }

    /// Parameters for destroying one asset.
    pub fn destroy(public_id: &str, timestamp: i64) -> Self {
        Self {
            params: vec![
                ("public_id".to_string(), public_id.to_string()),
                ("timestamp".to_string(), timestamp.to_string()),
            ],
        }
    }

    /// Parameters in signing order.
    #[cfg(test)]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Signs the parameters and hands them back as form fields.
    pub fn sign(self, secret: &str) -> SignedParams {
        let signature = sign(&self.params, secret);
        SignedParams {
            fields: self.params,
            signature,
        }
    }
}

impl fmt::Debug for SigningRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_list()
            .entries(self.params.iter().map(|(key, _)| key))
            .finish()
    }
}

/// Signed parameters ready to be sent alongside the call.
///
/// The fields are exactly the ones that were hashed, so the timestamp sent is
/// always the timestamp signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedParams {
    fields: Vec<(String, String)>,
    signature: String,
}

impl SignedParams {
    #[cfg(test)]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Value of a signed field, if present.
    #[cfg(test)]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Form fields for the outbound request: the signed parameters followed by
    /// `api_key` and `signature`.
    pub fn into_form_fields(self, api_key: &str) -> Vec<(String, String)> {
        let mut fields = self.fields;
        fields.push(("api_key".to_string(), api_key.to_string()));
        fields.push(("signature".to_string(), self.signature));
        fields
    }
}

/// Derive the signature for `params` with the shared secret.
///
/// Pure and infallible. An empty secret still yields a well-formed digest that
/// the service will reject.
pub fn sign<K, V>(params: &[(K, V)], secret: &str) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params, secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Canonical `key=value&...` form without the secret.
pub fn canonical_string<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key.as_ref(), value.as_ref()))
        .collect::<Vec<_>>()
        .join("&")
}

fn string_to_sign<K, V>(params: &[(K, V)], secret: &str) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut payload = canonical_string(params);
    payload.push_str(secret);
    payload
}

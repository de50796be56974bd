//! Media asset model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Case-insensitive markers for placeholder and demo content.
const PLACEHOLDER_MARKERS: [&str; 2] = ["sample", "demo"];

/// Namespace the hosting service seeds new accounts with.
const SAMPLE_NAMESPACE_PREFIX: &str = "cld-sample";

/// One stored image as reported by the hosting service.
///
/// The retrieval URL is not stored; it is rebuilt from the version, id and
/// format on every call to [`MediaAsset::retrieval_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Identifier assigned by the service, immutable.
    pub id: String,
    /// Storage version, part of the retrieval path.
    pub storage_version: u64,
    /// File format such as `jpg` or `png`.
    pub format: String,
    /// Human-readable title.
    pub display_title: String,
    pub width: u32,
    pub height: u32,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    pub tags: Vec<String>,
}

/// Public delivery location of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryLocation {
    base_url: String,
    cloud_name: String,
}

impl DeliveryLocation {
    pub fn new(base_url: impl Into<String>, cloud_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cloud_name: cloud_name.into(),
        }
    }
}

impl MediaAsset {
    /// Build an asset from an upstream record.
    ///
    /// Title preference: stored `original_filename` context, then the
    /// top-level `original_filename`, then the last path segment of the id.
    pub fn from_resource(resource: UpstreamResource) -> Result<Self> {
        if resource.public_id.trim().is_empty() {
            return Err(Error::InvalidInput("resource has an empty public_id".to_string()));
        }
        if resource.width == 0 || resource.height == 0 {
            return Err(Error::InvalidInput(format!(
                "resource `{}` has zero dimensions",
                resource.public_id
            )));
        }

        let display_title = resource
            .context
            .and_then(|context| context.custom)
            .and_then(|custom| custom.original_filename)
            .filter(|name| !name.is_empty())
            .or_else(|| resource.original_filename.filter(|name| !name.is_empty()))
            .unwrap_or_else(|| trailing_segment(&resource.public_id).to_string());

        Ok(Self {
            id: resource.public_id,
            storage_version: resource.version,
            format: resource.format,
            display_title,
            width: resource.width,
            height: resource.height,
            created_at: resource.created_at,
            tags: resource.tags.unwrap_or_default(),
        })
    }

    /// Public URL for the current version of this asset.
    pub fn retrieval_url(&self, location: &DeliveryLocation) -> String {
        format!(
            "{}/{}/image/upload/v{}/{}.{}",
            location.base_url, location.cloud_name, self.storage_version, self.id, self.format
        )
    }

    /// Shape returned to the gallery UI.
    pub fn to_view(&self, location: &DeliveryLocation) -> AssetView {
        AssetView {
            public_id: self.id.clone(),
            url: self.retrieval_url(location),
            title: self.display_title.clone(),
            format: self.format.clone(),
            width: self.width,
            height: self.height,
            created_at: self.created_at.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Whether an id belongs to placeholder or demo content that the gallery hides.
pub fn is_placeholder_id(public_id: &str) -> bool {
    let lowered = public_id.to_lowercase();
    PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
        || lowered.starts_with(SAMPLE_NAMESPACE_PREFIX)
}

fn trailing_segment(public_id: &str) -> &str {
    match public_id.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => public_id,
    }
}

/// Asset as serialized for the gallery UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetView {
    pub public_id: String,
    pub url: String,
    pub title: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub created_at: String,
    pub tags: Vec<String>,
}

impl AssetView {
    /// Case-insensitive substring match on the title or any tag.
    ///
    /// A blank query matches every asset.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Asset record from the service's listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamResource {
    pub public_id: String,
    pub version: u64,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub created_at: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub context: Option<ResourceContext>,
    #[serde(default)]
    pub original_filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceContext {
    #[serde(default)]
    pub custom: Option<CustomContext>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomContext {
    #[serde(default)]
    pub original_filename: Option<String>,
}

/// Body of the listing endpoint.
///
/// Records stay untyped until [`ResourceListing::into_assets`] so one
/// incomplete record cannot void the rest of the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceListing {
    #[serde(default)]
    pub resources: Option<Vec<Value>>,
}

impl ResourceListing {
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Gallery assets in upstream order, without placeholder content.
    ///
    /// Records that cannot form a valid asset are skipped.
    pub fn into_assets(self) -> Vec<MediaAsset> {
        self.resources
            .unwrap_or_default()
            .into_iter()
            .filter_map(|record| match parse_record(record) {
                Ok(Some(asset)) => Some(asset),
                Ok(None) => None,
                Err(error) => {
                    tracing::debug!("Skipping listing record: {error}");
                    None
                }
            })
            .collect()
    }
}

/// `Ok(None)` for placeholder content, an error for incomplete records.
fn parse_record(record: Value) -> Result<Option<MediaAsset>> {
    let resource: UpstreamResource = serde_json::from_value(record)?;
    if is_placeholder_id(&resource.public_id) {
        return Ok(None);
    }
    MediaAsset::from_resource(resource).map(Some)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn resource(public_id: &str) -> UpstreamResource {
        UpstreamResource {
            public_id: public_id.to_string(),
            version: 1_712_345_678,
            format: "jpg".to_string(),
            width: 800,
            height: 600,
            created_at: "2024-04-05T12:00:00Z".to_string(),
            tags: None,
            context: None,
            original_filename: None,
        }
    }

    #[test]
    fn title_falls_back_to_trailing_path_segment() {
        let asset = MediaAsset::from_resource(resource("albums/summer/IMG_9")).unwrap();
        assert_eq!(asset.display_title, "IMG_9");

        let flat = MediaAsset::from_resource(resource("IMG_10")).unwrap();
        assert_eq!(flat.display_title, "IMG_10");
    }

    #[test]
    fn title_prefers_stored_original_filename() {
        let mut record = resource("albums/abc123");
        record.original_filename = Some("top-level".to_string());
        record.context = Some(ResourceContext {
            custom: Some(CustomContext {
                original_filename: Some("vacation photo".to_string()),
            }),
        });
        let asset = MediaAsset::from_resource(record).unwrap();
        assert_eq!(asset.display_title, "vacation photo");

        let mut record = resource("albums/abc123");
        record.original_filename = Some("top-level".to_string());
        let asset = MediaAsset::from_resource(record).unwrap();
        assert_eq!(asset.display_title, "top-level");
    }

    #[test]
    fn retrieval_url_follows_current_version() {
        let location = DeliveryLocation::new("https://res.cloudinary.com/", "demo-cloud");
        let mut asset = MediaAsset::from_resource(resource("albums/IMG_1")).unwrap();
        assert_eq!(
            asset.retrieval_url(&location),
            "https://res.cloudinary.com/demo-cloud/image/upload/v1712345678/albums/IMG_1.jpg"
        );

        asset.storage_version = 1_800_000_000;
        asset.format = "png".to_string();
        assert_eq!(
            asset.retrieval_url(&location),
            "https://res.cloudinary.com/demo-cloud/image/upload/v1800000000/albums/IMG_1.png"
        );
    }

    #[test]
    fn placeholder_ids_are_detected() {
        assert!(is_placeholder_id("samples/landscapes/nature-mountains"));
        assert!(is_placeholder_id("My_SAMPLE_shot"));
        assert!(is_placeholder_id("Demo/cat"));
        assert!(is_placeholder_id("cld-sample-5"));
        assert!(!is_placeholder_id("albums/summer/IMG_9"));
    }

    #[test]
    fn listing_drops_placeholders_and_invalid_records() {
        let body = r#"{
            "resources": [
                {"public_id": "albums/IMG_1", "version": 1, "format": "jpg", "width": 10, "height": 20,
                 "created_at": "2024-01-01T00:00:00Z", "tags": ["beach"]},
                {"public_id": "samples/dog", "version": 1, "format": "jpg", "width": 10, "height": 20,
                 "created_at": "2024-01-01T00:00:00Z"},
                {"public_id": "cld-sample-2", "version": 1, "format": "jpg", "width": 10, "height": 20,
                 "created_at": "2024-01-01T00:00:00Z"},
                {"public_id": "broken", "version": 1, "format": "jpg", "width": 0, "height": 20,
                 "created_at": "2024-01-01T00:00:00Z", "tags": null},
                {"public_id": "albums/IMG_2", "version": 3, "format": "png", "width": 5, "height": 5,
                 "created_at": "2024-01-02T00:00:00Z", "tags": null}
            ]
        }"#;
        let assets = ResourceListing::from_json(body).unwrap().into_assets();
        let ids: Vec<&str> = assets.iter().map(|asset| asset.id.as_str()).collect();
        assert_eq!(ids, vec!["albums/IMG_1", "albums/IMG_2"]);
        assert_eq!(assets[0].tags, vec!["beach".to_string()]);
        assert!(assets[1].tags.is_empty());
    }

    #[test]
    fn listing_skips_records_missing_required_fields() {
        let body = r#"{
            "resources": [
                {"public_id": "albums/IMG_1", "version": 1, "format": "jpg", "width": 10, "height": 20,
                 "created_at": "2024-01-01T00:00:00Z"},
                {"public_id": "albums/IMG_2", "version": 1, "format": "jpg", "height": 20,
                 "created_at": "2024-01-01T00:00:00Z"},
                {"public_id": "albums/IMG_3", "width": 10, "height": 20},
                "not a record"
            ]
        }"#;
        let assets = ResourceListing::from_json(body).unwrap().into_assets();
        let ids: Vec<&str> = assets.iter().map(|asset| asset.id.as_str()).collect();
        assert_eq!(ids, vec!["albums/IMG_1"]);
    }

    #[test]
    fn listing_without_resources_is_empty() {
        assert!(ResourceListing::from_json("{}").unwrap().into_assets().is_empty());
        assert!(ResourceListing::from_json("not json").is_err());
    }

    #[test]
    fn view_serializes_with_gallery_field_names() {
        let location = DeliveryLocation::new("https://res.cloudinary.com", "cloud");
        let asset = MediaAsset::from_resource(resource("albums/IMG_1")).unwrap();
        let value = serde_json::to_value(asset.to_view(&location)).unwrap();
        assert_eq!(value["public_id"], "albums/IMG_1");
        assert_eq!(value["title"], "IMG_1");
        assert_eq!(
            value["url"],
            "https://res.cloudinary.com/cloud/image/upload/v1712345678/albums/IMG_1.jpg"
        );
        assert_eq!(value["tags"], serde_json::json!([]));
    }

    #[test]
    fn query_matches_title_or_tag_ignoring_case() {
        let location = DeliveryLocation::new("https://res.cloudinary.com", "cloud");
        let mut record = resource("albums/Sunset_Pier");
        record.tags = Some(vec!["Beach".to_string(), "travel".to_string()]);
        let view = MediaAsset::from_resource(record).unwrap().to_view(&location);

        assert!(view.matches_query("sunset"));
        assert!(view.matches_query("BEA"));
        assert!(view.matches_query("  "));
        assert!(view.matches_query(""));
        assert!(!view.matches_query("mountain"));
    }
}

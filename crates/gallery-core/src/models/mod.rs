//! Data models for the gallery

mod asset;
mod upload;

pub use asset::{
    is_placeholder_id, AssetView, DeliveryLocation, MediaAsset, ResourceListing, UpstreamResource,
};
pub use upload::{display_title_from_filename, parse_tags};

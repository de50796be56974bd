//! gallery-core - Core library for the gallery proxy
//!
//! This crate contains the asset models, the signed-parameter builder for the
//! hosted media API, and small helpers shared by the backend.

pub mod error;
pub mod models;
pub mod signing;
pub mod util;

pub use error::{Error, Result};
pub use models::{DeliveryLocation, MediaAsset};
pub use signing::{sign, SignedParams, SigningRequest};

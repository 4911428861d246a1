//! Async convenience layer over an S3-compatible object store.
//!
//! [`ObjectStoreClient`] authenticates with static credentials, optionally
//! targets a custom endpoint and builds its connection on first use.

pub mod adapters;
pub mod client;
pub mod config;
pub mod model;
pub mod util;

pub use client::{ObjectStore, ObjectStoreClient};
pub use model::error::StoreError;
pub use model::object::{
    Credentials, EndpointConfig, ObjectHandle, ObjectLocator, ObjectSummary, UploadResult,
    UploadSpec, Visibility,
};

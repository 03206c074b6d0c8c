//! Asset orchestration.
//!
//! Every operation is scoped to a verified [`CallerIdentity`]:
//! - Direct upload under a content-addressed key
//! - Presigned PUT URL under a timestamp key
//! - Listing of the caller's namespace across all pages
//! - Metadata lookup and idempotent deletion by asset id
//!
//! [`CallerIdentity`]: mediagate_shared::CallerIdentity

mod error;
mod service;
mod types;

pub use error::AssetError;
pub use service::AssetService;
pub use types::{
    AssetDescriptor, AssetMetadata, AssetSettings, AssetSummary, DEFAULT_CONTENT_TYPE,
    PresignDescriptor, UploadFile,
};

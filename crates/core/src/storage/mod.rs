//! Object store gateway.
//!
//! [`ObjectStore`] is the capability surface the asset orchestrators use;
//! [`StorageService`] implements it with Apache OpenDAL for:
//! - S3-compatible: Cloudflare R2, AWS S3, MinIO
//! - Local filesystem (development only, no presigning)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write_with("key", data) │ op.presign_write("key", duration)  │
//! │ op.lister_with("prefix/")  │ op.stat("key")                     │
//! │ op.delete("key")           │                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod gateway;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
#[cfg(test)]
pub use gateway::MockObjectStore;
pub use gateway::{ObjectMeta, ObjectPage, ObjectStore};
pub use service::StorageService;

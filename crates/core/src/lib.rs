//! Core asset logic for Mediagate.
//!
//! This crate has no web dependencies. It owns storage key derivation, the
//! object store gateway and the asset orchestrators built on top of it.
//!
//! # Modules
//!
//! - `keys` - Tenant-scoped storage key derivation
//! - `storage` - Object store gateway (OpenDAL)
//! - `assets` - Upload, presign, list, get and delete

pub mod assets;
pub mod keys;
pub mod storage;

//! Shared types, errors, and configuration for Mediagate.
//!
//! This crate provides common types used across all other crates:
//! - Bearer credential verification and the caller identity it yields
//! - Application-wide error taxonomy
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;


pub use auth::{CallerIdentity, Claims};
pub use config::AppConfig;
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};

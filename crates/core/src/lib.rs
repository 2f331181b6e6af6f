//! Core types and shared functionality for loupe.
//!
//! This crate provides:
//! - Two-tier blob cache (memory + disk) with a coordinating front
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheCoordinator, CachedBlob, StorageLocation, StorageRoots};
pub use config::AppConfig;
pub use error::Error;

//! Client code for loupe.
//!
//! This crate provides the conditional HTTP fetcher, the image decode
//! capability, and the resource loader that ties them to the core cache.

pub mod decode;
pub mod fetch;
pub mod loader;

pub use image;

pub use decode::{Decoder, ImageDecoder, TargetSize};
pub use fetch::{FetchClient, FetchConfig, FetchOutcome, Fetcher, TransportError};
pub use loader::{LoadOptions, LoadSource, Loaded, ResourceLoader};

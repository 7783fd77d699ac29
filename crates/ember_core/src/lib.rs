//! Ember Core - assets and configuration shared by the tracer and the viewer.
//!
//! This crate provides:
//!
//! - **Image assets**: `ImageData` decoded once at scene-build time, and an
//!   `ImageCache` that shares decoded images between textures
//! - **Configuration**: `ViewerConfig`, loaded from JSON
//!
//! # Example
//!
//! ```ignore
//! use ember_core::{ImageCache, ViewerConfig};
//!
//! let config = ViewerConfig::load_or_default("ember.json")?;
//! let mut cache = ImageCache::new();
//! let earth = cache.load_or_placeholder("assets/earthmap.jpg");
//! ```

pub mod config;
pub mod asset;

// Re-export commonly used types
pub use config::{ConfigError, SceneKind, ViewerConfig};
pub use asset::{AssetError, AssetResult, ImageCache, ImageData};

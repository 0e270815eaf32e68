//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Collaborator configuration
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the coordinator and the
//! service facade depend on. It establishes the logging conventions, the
//! dependency-injection builder, and the event broadcasting mechanism.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use error::{Error, Result};

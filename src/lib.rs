//! hookgen library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod config;
pub mod crop;
pub mod images;
pub mod kling;
pub mod orchestrator;
pub mod prompts;
pub mod upload;

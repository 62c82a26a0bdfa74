//! Test Helper Utilities
//!
//! Shared utilities for testing archive-import

#![allow(dead_code)]

pub mod audio_generator;
pub mod fixture;
pub mod log_capture;

pub use audio_generator::{generate_test_wav, AudioConfig};
pub use fixture::ImportFixture;
pub use log_capture::LogCapture;

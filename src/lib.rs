// Clippy allows for reasonable defaults
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer

// Module declarations
pub mod advice;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod file_storage;
pub mod generation;
pub mod ledger;
pub mod models;
pub mod prompt;
pub mod shutdown;
pub mod view;

// Server module (HTTP/WebSocket API)
pub mod server;

// Re-export models and errors for use by the binary and tests
pub use error::{AdviceError, ConfigError, StoreError};
pub use models::*;

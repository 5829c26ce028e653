// crates/client/src/lib.rs
//! HTTP submission client and configuration for the `goat` binary.

pub mod api;
pub mod config;

pub use api::{GoatApi, SubmitError};
pub use config::ClientConfig;

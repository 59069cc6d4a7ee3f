//! Credential handling.

pub mod credentials;

pub use credentials::{resolve_api_key, SecretString, API_KEY_ENV};

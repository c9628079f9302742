//! Core engine crate for the Lookbook fashion studio.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod studio;

#[cfg(test)]
mod test_support;

pub use lookbook_types as types;

pub use auth::{HostKeySurface, KeyAvailability, KeyGate};
pub use client::{Client, ClientBuilder, HttpOptions};
pub use error::{Error, Result};
pub use studio::{GenerationResult, ImageAsset, SessionState, Studio, Variation, VARIATIONS};

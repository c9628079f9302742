//! Shared types for the Lookbook studio engine.

mod base64_serde;

pub mod config;
pub mod content;
pub mod enums;
pub mod models;
pub mod response;

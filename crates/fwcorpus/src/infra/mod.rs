//! Infrastructure adapters: document storage and editor configuration.

pub mod config;
pub mod store;

//! Domain types, configuration and the repositories built on top of storage.

pub mod analytics;
pub mod config;
pub mod models;
pub mod portfolio;
pub mod upload;

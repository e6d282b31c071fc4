//! API Lambda handler and request processing

pub mod analytics;
pub mod auth;
pub mod handler;
pub mod helpers;
pub mod multipart;
pub mod parsing;
pub mod portfolio;
pub mod session;
pub mod upload;

// Re-export the main handler for convenience
pub use handler::handler;

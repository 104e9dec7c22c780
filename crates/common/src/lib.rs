//! Llego shared building blocks
//!
//! Configuration, the error taxonomy shared by every crate, and tracing setup.

pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::LlegoError;
pub type Result<T> = std::result::Result<T, LlegoError>;

//! Core data models, interfaces and crypto for the Gatehouse authority

pub mod auth;
pub mod clock;
pub mod error;
pub mod services;
pub mod session;
pub mod token;
pub mod types;

pub use clock::*;
pub use error::*;
pub use session::*;
pub use token::*;
pub use types::*;

/// Result type alias for Gatehouse operations
pub type Result<T> = std::result::Result<T, GatehouseError>;

//! Shared types used across domains and the server layer.

pub mod errors;

pub use errors::{ConfigurationError, DeliveryError, ExtractionError, PersistenceError};

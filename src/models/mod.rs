//! Models Module - Data Structures & Configuration
//!
//! Single source of truth for the crate's data types, error codes and
//! runtime configuration.

pub mod config;
pub mod errors;
pub mod smart_error;
pub mod types;

pub use config::*;
pub use errors::*;
pub use smart_error::*;
pub use types::*;

//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, telemetry log and report rendering shared across the crate.

pub mod constants;
pub mod report;
pub mod telemetry;

pub use constants::*;
pub use report::*;
pub use telemetry::*;

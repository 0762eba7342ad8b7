//! Providers Module - External Data Sources
//!
//! JSON-RPC chain data for error enrichment and the security audit backend.

pub mod audit;
pub mod rpc;

pub use audit::*;
pub use rpc::*;

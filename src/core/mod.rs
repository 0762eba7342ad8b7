//! Core Module - Scanning & Error Intelligence
//!
//! Solidity pattern scanning, risk scoring, error classification and the
//! context/handling flow around it.

pub mod classifier;
pub mod enricher;
pub mod handler;
pub mod risk_score;
pub mod scanner;

pub use classifier::*;
pub use enricher::*;
pub use handler::*;
pub use risk_score::*;
pub use scanner::*;

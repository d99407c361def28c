//! Oracle Feeder Library
//!
//! Keeps an on-chain key/value price oracle in sync with an off-chain feed,
//! writing only when the price moved past a deviation threshold.

pub mod chain;
pub mod config;
pub mod error;
pub mod feed;
pub mod oracle;
pub mod secrets;
pub mod types;

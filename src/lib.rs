//! # Octolog - Octopus Energy data logger
//!
//! Fetches electricity and gas consumption, tariffs and standing charges from
//! the Octopus Energy REST API, prices and classifies the consumption and
//! stores the results as InfluxDB time series.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration with environment overrides
//! - `logging`: Structured logging and tracing
//! - `octopus`: Typed API client, pagination and account facade
//! - `tariff`: Matching consumption intervals to unit rates, daily cost
//! - `peak`: Peak/off-peak/standard classification
//! - `measurements`: Time-series points for each measurement
//! - `sink`: InfluxDB and line protocol writers
//! - `jobs`: The one-shot jobs run by the `octolog` binary

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod measurements;
pub mod octopus;
pub mod peak;
pub mod sink;
pub mod tariff;

// Re-export commonly used types
pub use config::Config;
pub use error::{OctologError, Result};
pub use octopus::{Octopus, OctopusClient};

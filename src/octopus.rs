//! Octopus Energy REST API
//!
//! Typed endpoints, immutable request parameters, bounded pagination and the
//! account facade used by the jobs.

pub mod account;
pub mod api;
pub mod client;
pub mod endpoint;
pub mod pagination;
pub mod query;
pub mod types;

pub use account::{AccountInfo, MeterKind, MeterPointRef};
pub use api::{Octopus, PricedUsage};
pub use client::{Fuel, OctopusClient, RateSeries};
pub use endpoint::{Endpoint, MeterRef, Param, TariffCode};
pub use pagination::Pages;
pub use query::{Grouping, Ordering, Period, ProductFilter, Query};
pub use types::{Consumption, Page, Rate, Region};

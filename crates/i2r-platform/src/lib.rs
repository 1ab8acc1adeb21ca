//! Platform REST contract and its HTTP client.
//!
//! - [`PlatformApi`] - every listing, move, update, connector, and file
//!   store call the migration engine makes
//! - [`HttpPlatform`] - the `reqwest` implementation
//! - [`ErrorEnvelope`] / [`PlatformError`] - decoded failures
//!
//! With the `fake` feature, [`fake::FakePlatform`] provides an in-memory
//! implementation for driver tests.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod api;
mod error;
mod http;
mod wire;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use api::{PlatformApi, PlatformResult};
pub use error::{ErrorEnvelope, PlatformError, ResponseMessage};
pub use http::{ClientSettings, HttpPlatform};

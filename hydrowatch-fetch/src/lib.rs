// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Obtaining sensor values from the telemetry endpoint.
//!
//! - [`SampleFetcher`] is the seam the coordinator samples through.
//! - [`HttpFetcher`] is the production implementation: one GET per sensor,
//!   bounded by a timeout and retried under a [`RetryPolicy`].
//! - [`Endpoint`] builds the per-sensor and device-probe URLs.

pub mod endpoint;
pub mod fetcher;
pub mod http;
pub mod parse;
pub mod retry;
pub mod usage;

pub use self::endpoint::{decode_token, Endpoint, Token};
pub use self::fetcher::SampleFetcher;
pub use self::http::{HttpFetcher, HttpFetcherOptions};
pub use self::parse::{parse_reading, ValueRange};
pub use self::retry::{retry, RetryPolicy};
pub use self::usage::UsageReport;
pub use hydrowatch_error::FetchError;

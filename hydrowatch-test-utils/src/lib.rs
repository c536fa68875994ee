// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for hydrowatch.
//!
//! Intended for development and testing only.
//!
//! # Key Types
//!
//! ## `ScriptedFetcher`
//!
//! A [`SampleFetcher`](hydrowatch_fetch::SampleFetcher) whose answers are
//! queued per sensor ahead of time:
//!
//! ```rust
//! use hydrowatch_core::SensorId;
//! use hydrowatch_fetch::{FetchError, SampleFetcher};
//! use hydrowatch_test_utils::{ScriptedFetcher, Step};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fetcher = ScriptedFetcher::new()
//!     .then(SensorId::Tds, Step::Value(410.0))
//!     .always(SensorId::Tds, Step::Error(FetchError::http_status(503)));
//!
//! assert_eq!(fetcher.fetch(SensorId::Tds).await, Ok(410.0));
//! assert!(fetcher.fetch(SensorId::Tds).await.is_err());
//! assert_eq!(fetcher.calls(SensorId::Tds), 2);
//! # }
//! ```
//!
//! ## Helpers
//!
//! - [`helpers::recv_timeout`] / [`helpers::assert_no_recv`] for streams
//! - [`fixtures`] for common cycles and stores

pub mod fixtures;
pub mod helpers;
pub mod scripted_fetcher;

pub use self::scripted_fetcher::{ConstantFetcher, ScriptedFetcher, Step};

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use hydrowatch_error::{ConfigError, FetchError, HydroError, Result, ResultExt};
use std::time::Duration;

#[test]
fn test_error_display() {
    let err = FetchError::http_status(502);
    assert_eq!(err.to_string(), "endpoint returned HTTP 502");

    let err = HydroError::consistency("reset");
    assert_eq!(err.to_string(), "consistency boundary unavailable: reset");

    let err = HydroError::from(ConfigError::missing("BLYNK_AUTH_TOKEN"));
    assert_eq!(
        err.to_string(),
        "configuration error: missing required setting `BLYNK_AUTH_TOKEN`"
    );
}

#[test]
fn test_transient_fetch_errors() {
    assert!(FetchError::timeout(Duration::from_secs(5)).is_transient());
    assert!(FetchError::transport("connection refused").is_transient());
    assert!(FetchError::http_status(500).is_transient());
    assert!(!FetchError::parse("not-a-number").is_transient());
    assert!(!FetchError::invalid_range(1200.0, 0.0, 1000.0).is_transient());
}

#[test]
fn test_parse_error_truncates_body() {
    let body = "x".repeat(500);
    let FetchError::Parse { body } = FetchError::parse(&body) else {
        panic!("expected parse error");
    };
    assert_eq!(body.len(), FetchError::MAX_BODY_EXCERPT);
}

#[test]
fn test_is_recoverable() {
    assert!(HydroError::consistency("cycle").is_recoverable());
    assert!(HydroError::from(FetchError::http_status(503)).is_recoverable());
    assert!(!HydroError::from(FetchError::parse("abc")).is_recoverable());
    assert!(!HydroError::task_panic("boom").is_recoverable());
}

#[test]
fn test_is_permanent_and_fatal() {
    let config = HydroError::from(ConfigError::invalid_token("empty"));
    assert!(config.is_permanent());
    assert!(config.is_fatal());

    assert!(HydroError::Closed.is_permanent());
    assert!(!HydroError::Closed.is_fatal());
    assert!(!HydroError::consistency("cycle").is_permanent());
}

#[test]
fn test_result_context_wraps_consistency() {
    let result: Result<()> = Err(HydroError::consistency("buffer lock"));

    let err = result.context("reset").unwrap_err();
    assert!(matches!(err, HydroError::Consistency { .. }));
    assert!(err.to_string().contains("reset: buffer lock"));
}

#[test]
fn test_result_context_preserves_fetch_errors() {
    let result: std::result::Result<(), FetchError> = Err(FetchError::http_status(404));

    let err = result.context("fetching TDS").unwrap_err();
    assert!(matches!(
        err,
        HydroError::Fetch(FetchError::HttpStatus { code: 404 })
    ));
}

#[test]
fn test_result_with_context_ok() {
    let result: Result<i32> = Ok(42);
    let value = result.with_context(|| "unused".to_string()).unwrap();
    assert_eq!(value, 42);
}

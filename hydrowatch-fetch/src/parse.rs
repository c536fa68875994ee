// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt;
use core::str::FromStr;
use hydrowatch_error::{ConfigError, FetchError};

/// Parses a bare decimal response body.
///
/// Surrounding whitespace is ignored. `NaN` and infinities are rejected even
/// though `f64::from_str` accepts them.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] if the body is not a finite number.
///
/// # Example
///
/// ```
/// use hydrowatch_fetch::parse_reading;
///
/// assert_eq!(parse_reading(" 23.5\n").unwrap(), 23.5);
/// assert!(parse_reading("offline").is_err());
/// ```
pub fn parse_reading(body: &str) -> Result<f64, FetchError> {
    let trimmed = body.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::parse(trimmed))
}

/// Inclusive bounds a parsed value must fall within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] unless `min <= max` and both are finite.
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConfigError::invalid_value(
                "value-range",
                format!("expected finite MIN..MAX with MIN <= MAX, got {min}..{max}"),
            ));
        }
        Ok(Self { min, max })
    }

    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRange`] when `value` is out of bounds.
    pub fn check(&self, value: f64) -> Result<f64, FetchError> {
        if (self.min..=self.max).contains(&value) {
            Ok(value)
        } else {
            Err(FetchError::invalid_range(value, self.min, self.max))
        }
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

impl FromStr for ValueRange {
    type Err = ConfigError;

    /// Accepts `MIN..MAX`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s.split_once("..").ok_or_else(|| {
            ConfigError::invalid_value("value-range", format!("expected MIN..MAX, got `{s}`"))
        })?;
        let bound = |raw: &str| {
            raw.trim().parse::<f64>().map_err(|e| {
                ConfigError::invalid_value("value-range", format!("`{}`: {e}", raw.trim()))
            })
        };
        Self::new(bound(min)?, bound(max)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_bodies() {
        for body in ["NaN", "inf", "-infinity", ""] {
            assert!(matches!(parse_reading(body), Err(FetchError::Parse { .. })), "{body}");
        }
    }

    #[test]
    fn range_round_trips_through_display() {
        let range: ValueRange = "0..1000".parse().unwrap();
        assert_eq!(range, ValueRange::new(0.0, 1000.0).unwrap());
        assert_eq!(range.to_string().parse::<ValueRange>().unwrap(), range);
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!("5..1".parse::<ValueRange>().is_err());
        assert!("5".parse::<ValueRange>().is_err());
    }
}

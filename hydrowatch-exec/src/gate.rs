// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Threshold gating: discard a whole cycle unless key sensors read high enough.

use core::fmt;
use core::str::FromStr;
use hydrowatch_core::SensorId;
use hydrowatch_error::ConfigError;
use serde::Serialize;
use std::collections::BTreeMap;

/// `sensor` must read strictly above `above`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    pub sensor: SensorId,
    pub above: f64,
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.sensor, self.above)
    }
}

impl FromStr for Threshold {
    type Err = ConfigError;

    /// Accepts `SENSOR>VALUE`, e.g. `TDS>18`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sensor, above) = s.split_once('>').ok_or_else(|| {
            ConfigError::invalid_value("gate", format!("expected SENSOR>VALUE, got `{}`", s.trim()))
        })?;
        let sensor = sensor.parse::<SensorId>()?;
        let above = above
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                ConfigError::invalid_value("gate", format!("`{}` is not a finite number", above.trim()))
            })?;
        Ok(Self { sensor, above })
    }
}

/// A gated sensor that failed its threshold this cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateFailure {
    pub threshold: Threshold,
    /// `None` when the sensor produced no value.
    pub value: Option<f64>,
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{} = {} (needs {})", self.threshold.sensor, value, self.threshold),
            None => write!(f, "{} missing (needs {})", self.threshold.sensor, self.threshold),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Pass,
    Skip(Vec<GateFailure>),
}

impl GateDecision {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Set of thresholds a cycle must meet to be committed. Empty means disabled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatingPolicy {
    thresholds: Vec<Threshold>,
}

impl GatingPolicy {
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(thresholds: Vec<Threshold>) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.thresholds.is_empty()
    }

    #[must_use]
    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }

    /// Checks every threshold against this cycle's values.
    #[must_use]
    pub fn evaluate(&self, values: &BTreeMap<SensorId, f64>) -> GateDecision {
        let failures: Vec<_> = self
            .thresholds
            .iter()
            .filter_map(|threshold| {
                let value = values.get(&threshold.sensor).copied();
                match value {
                    Some(v) if v > threshold.above => None,
                    _ => Some(GateFailure {
                        threshold: *threshold,
                        value,
                    }),
                }
            })
            .collect();

        if failures.is_empty() {
            GateDecision::Pass
        } else {
            GateDecision::Skip(failures)
        }
    }
}

impl FromStr for GatingPolicy {
    type Err = ConfigError;

    /// Comma-separated thresholds, e.g. `TDS>18,EC>6.28`. Blank disables gating.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let thresholds = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Threshold>, _>>()?;
        Ok(Self::new(thresholds))
    }
}

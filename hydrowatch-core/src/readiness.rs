// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::str::FromStr;
use hydrowatch_error::ConfigError;
use serde::{Deserialize, Serialize};

/// When statistics become visible to readers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessPolicy {
    /// Stats for every sensor once every buffer is at capacity, none before.
    #[default]
    AllFull,
    /// Stats for each sensor as soon as its own buffer is at capacity.
    PerSensor,
}

impl ReadinessPolicy {
    /// Whether a sensor whose buffer is `sensor_full` gets stats, given whether
    /// all buffers are full.
    #[must_use]
    pub const fn stats_visible(self, sensor_full: bool, all_full: bool) -> bool {
        match self {
            ReadinessPolicy::AllFull => all_full,
            ReadinessPolicy::PerSensor => sensor_full,
        }
    }
}

impl FromStr for ReadinessPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all-full" | "all" => Ok(ReadinessPolicy::AllFull),
            "per-sensor" | "sensor" => Ok(ReadinessPolicy::PerSensor),
            other => Err(ConfigError::invalid_value(
                "readiness",
                format!("expected `all-full` or `per-sensor`, got `{other}`"),
            )),
        }
    }
}

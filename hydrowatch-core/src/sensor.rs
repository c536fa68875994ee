// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use chrono::{DateTime, Utc};
use core::fmt;
use core::str::FromStr;
use hydrowatch_error::ConfigError;
use serde::{Deserialize, Serialize};

/// One of the monitored physical quantities.
///
/// The set is fixed at compile time. Ordering follows declaration order and is
/// the order used in snapshots and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SensorId {
    /// Total dissolved solids (ppm)
    #[serde(rename = "TDS")]
    Tds,
    /// Electrical conductivity (µS/cm)
    #[serde(rename = "EC")]
    Ec,
    /// Air temperature (°C)
    Temperature,
    /// Relative humidity (%)
    Humidity,
}

impl SensorId {
    /// Every sensor, in snapshot order.
    pub const ALL: [SensorId; 4] = [
        SensorId::Tds,
        SensorId::Ec,
        SensorId::Temperature,
        SensorId::Humidity,
    ];

    /// Display name, matching the serialized form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SensorId::Tds => "TDS",
            SensorId::Ec => "EC",
            SensorId::Temperature => "Temperature",
            SensorId::Humidity => "Humidity",
        }
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorId {
    type Err = ConfigError;

    /// Case-insensitive; accepts the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SensorId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::invalid_value("sensor", format!("unknown sensor `{wanted}`")))
    }
}

/// A single sensor value observed at a wall-clock instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor: SensorId,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Creates a reading stamped with the current time.
    #[must_use]
    pub fn now(sensor: SensorId, value: f64) -> Self {
        Self::at(sensor, value, Utc::now())
    }

    /// Creates a reading with a specific timestamp.
    #[must_use]
    pub const fn at(sensor: SensorId, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            sensor,
            value,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("tds".parse::<SensorId>().unwrap(), SensorId::Tds);
        assert_eq!(" Humidity ".parse::<SensorId>().unwrap(), SensorId::Humidity);
        assert!("pressure".parse::<SensorId>().is_err());
    }

    #[test]
    fn display_matches_serialized_name() {
        for id in SensorId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{id}\""));
        }
    }
}

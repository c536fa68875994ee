// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use hydrowatch_core::SensorId;
use serde::Serialize;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Approximate traffic of one round of sensor requests.
///
/// Sent bytes are the request URL lengths; received bytes are the response
/// body lengths. Headers are not counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub failed: Vec<SensorId>,
}

impl UsageReport {
    pub fn record(&mut self, sent: usize, received: usize) {
        self.bytes_sent += sent as u64;
        self.bytes_received += received as u64;
    }

    pub fn record_failure(&mut self, sensor: SensorId) {
        self.failed.push(sensor);
    }

    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.bytes_sent + self.bytes_received
    }

    #[must_use]
    pub fn total_megabytes(&self) -> f64 {
        self.total_bytes() as f64 / BYTES_PER_MB
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sent_and_received() {
        let mut report = UsageReport::default();
        report.record(100, 4);
        report.record(100, 5);
        report.record_failure(SensorId::Humidity);

        assert_eq!(report.total_bytes(), 209);
        assert_eq!(report.failed, vec![SensorId::Humidity]);
        assert!((report.total_megabytes() - 209.0 / 1_048_576.0).abs() < 1e-15);
    }
}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::gate::GateFailure;
use chrono::{DateTime, Utc};
use hydrowatch_core::{Reading, SensorId};
use hydrowatch_error::HydroError;
use std::collections::BTreeMap;

/// What happened to a cycle's values.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Values were appended and a snapshot was built.
    Committed {
        version: u64,
        all_ready: bool,
        /// `false` if a newer snapshot (e.g. a reset) was already installed.
        published: bool,
    },
    /// The gate rejected the cycle; it was counted but nothing was stored.
    Skipped {
        version: u64,
        failures: Vec<GateFailure>,
        /// `false` if a newer snapshot was already installed.
        published: bool,
    },
    /// The store could not be updated; the next cycle tries again.
    Aborted(HydroError),
}

/// Report of one [`run_cycle`](crate::SampleCoordinator::run_cycle).
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub started_at: DateTime<Utc>,
    pub values: BTreeMap<SensorId, f64>,
    pub failures: BTreeMap<SensorId, HydroError>,
    pub outcome: CycleOutcome,
}

impl CycleResult {
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Committed { .. })
    }

    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Skipped { .. })
    }

    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Aborted(_))
    }

    /// Whether statistics became (or stayed) available with this cycle.
    #[must_use]
    pub const fn all_ready(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Committed { all_ready: true, .. })
    }

    /// This cycle's values as readings sharing the cycle start time.
    #[must_use]
    pub fn readings(&self) -> Vec<Reading> {
        self.values
            .iter()
            .map(|(sensor, value)| Reading::at(*sensor, *value, self.started_at))
            .collect()
    }

    /// Short label for logs and health reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self.outcome {
            CycleOutcome::Committed { .. } => "committed",
            CycleOutcome::Skipped { .. } => "skipped",
            CycleOutcome::Aborted(_) => "aborted",
        }
    }
}

//! Record counting with periodic progress reports.

use tracing::info;

/// Counts records and reports every `interval` records.
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    interval: u64,
    records: u64,
}

impl ProgressMeter {
    /// An interval of 0 disables reporting; records are still counted.
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            records: 0,
        }
    }

    /// Count one record. Returns `true` when a report was emitted.
    pub fn tick(&mut self) -> bool {
        self.records += 1;
        if self.interval == 0 || self.records % self.interval != 0 {
            return false;
        }
        info!("{} records processed.", self.records);
        true
    }

    pub fn records(&self) -> u64 {
        self.records
    }
}

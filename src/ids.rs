//! Time-based identifiers.

use chrono::Utc;

/// Hands out millisecond timestamps, bumped as needed so ids strictly increase.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id, never lower than `floor` or any id already issued.
    pub fn next_after(&mut self, floor: u64) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last = now.max(floor).max(self.last + 1);
        self.last
    }

    pub fn next(&mut self) -> u64 {
        self.next_after(0)
    }
}

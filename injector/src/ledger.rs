//! Append-only record of completed injection runs

use serde::{Deserialize, Serialize};

/// One injection run, in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    /// True if both intervals share at least one instant
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Interval ledger owned by a single injector
#[derive(Debug, Clone, Default)]
pub struct IntervalLedger {
    entries: Vec<Interval>,
}

impl IntervalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run. `end` is clamped so that `end >= start` always holds.
    pub fn record(&mut self, start: i64, end: i64) -> Interval {
        let interval = Interval { start, end: end.max(start) };
        self.entries.push(interval);
        interval
    }

    pub fn snapshot(&self) -> Vec<Interval> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ledger() {
        let ledger = IntervalLedger::new();
        assert!(ledger.snapshot().is_empty());
    }

    #[test]
    fn test_record_keeps_order() {
        let mut ledger = IntervalLedger::new();
        ledger.record(1_000, 1_250);
        ledger.record(2_000, 2_100);

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0], Interval { start: 1_000, end: 1_250 });
        assert_eq!(snapshot[1], Interval { start: 2_000, end: 2_100 });
    }

    #[test]
    fn test_end_is_clamped_to_start() {
        let mut ledger = IntervalLedger::new();
        let interval = ledger.record(5_000, 4_990);
        assert_eq!(interval.end, 5_000);
        assert_eq!(interval.duration_ms(), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut ledger = IntervalLedger::new();
        ledger.record(0, 10);
        let snapshot = ledger.snapshot();
        ledger.record(20, 30);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(ledger.snapshot().len(), 2);
    }

    #[test]
    fn test_overlap() {
        let a = Interval { start: 0, end: 100 };
        assert!(a.overlaps(&Interval { start: 100, end: 200 }));
        assert!(a.overlaps(&Interval { start: 50, end: 60 }));
        assert!(!a.overlaps(&Interval { start: 101, end: 200 }));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Interval { start: 1, end: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"start": 1, "end": 2}));
    }
}

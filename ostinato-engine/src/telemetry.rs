//! Transport telemetry
//!
//! While the transport runs, the engine produces a report frame at a
//! configurable millisecond interval: normalized position, transport flags,
//! loop bounds in milliseconds and the coarse human-facing state. The host
//! polls `LooperEngine::take_report` after each vector; nothing is emitted
//! from the audio path itself.

use serde::Serialize;

/// Coarse transport state for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HumanState {
    Stop = 0,
    Play = 1,
    Record = 2,
    Overdub = 3,
    Append = 4,
    Initial = 5,
}

/// One telemetry report.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportFrame {
    /// Playhead position normalized into the loop, clamped 0..1
    pub position: f64,
    /// Transport running
    pub go: bool,
    /// Recording (or overdubbing)
    pub record: bool,
    /// Loop start in milliseconds
    pub start_ms: f64,
    /// Loop end in milliseconds
    pub end_ms: f64,
    /// Window size in milliseconds
    pub window_ms: f64,
    /// Coarse state
    pub state: HumanState,
}

/// Interval bookkeeping for report emission, counted in samples so offline
/// rendering stays deterministic.
#[derive(Debug)]
pub(crate) struct Reporter {
    interval_ms: i64,
    samples_since: u64,
    /// Emit one frame immediately on the next opportunity
    prime: bool,
    pending: Option<ReportFrame>,
}

impl Reporter {
    pub(crate) fn new(interval_ms: i64) -> Self {
        Self { interval_ms, samples_since: 0, prime: true, pending: None }
    }

    pub(crate) fn set_interval(&mut self, interval_ms: i64) {
        self.interval_ms = interval_ms.max(0);
    }

    /// Re-arm the immediate report (transport just started).
    pub(crate) fn prime(&mut self) {
        self.prime = true;
        self.samples_since = 0;
    }

    /// Advance by one vector; returns true when a report is due.
    pub(crate) fn advance(&mut self, samples: u64, sample_rate: f64) -> bool {
        if self.interval_ms <= 0 {
            return false;
        }
        if self.prime {
            self.prime = false;
            return true;
        }
        self.samples_since += samples;
        let due = (self.interval_ms as f64 * 0.001 * sample_rate) as u64;
        if self.samples_since >= due.max(1) {
            self.samples_since = 0;
            true
        } else {
            false
        }
    }

    pub(crate) fn publish(&mut self, frame: ReportFrame) {
        self.pending = Some(frame);
    }

    pub(crate) fn take(&mut self) -> Option<ReportFrame> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_report_is_immediate() {
        let mut r = Reporter::new(50);
        assert!(r.advance(64, 48000.0));
        assert!(!r.advance(64, 48000.0));
    }

    #[test]
    fn test_interval_elapses_in_samples() {
        let mut r = Reporter::new(10); // 480 samples at 48k
        assert!(r.advance(64, 48000.0)); // primed
        let mut due = 0;
        for _ in 0..10 {
            if r.advance(64, 48000.0) {
                due += 1;
            }
        }
        // 640 samples crossed one 480-sample interval
        assert_eq!(due, 1);
    }

    #[test]
    fn test_zero_interval_disables() {
        let mut r = Reporter::new(0);
        assert!(!r.advance(4096, 48000.0));
    }
}

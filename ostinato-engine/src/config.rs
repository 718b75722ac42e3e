//! Engine construction parameters
//!
//! Mirrors the host-visible attributes: channel count, sync outlet, telemetry
//! interval, fade lengths, switch-ramp curve and playback interpolation. The
//! struct deserializes from TOML so hosts can load it from a config file and
//! override per-field.

use crate::dsp::fade::SwitchRampCurve;
use crate::dsp::interp::InterpMode;
use crate::error::{BufferError, EngineError};
use serde::Deserialize;

/// Longest permitted fade, in samples.
pub const MAX_RAMP: i64 = 2048;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Audio channel count, fixed at construction (1, 2 or 4)
    pub channels: usize,

    /// Emit a sync-phase output alongside the audio outputs
    pub syncout: bool,

    /// Telemetry report interval in milliseconds (0 disables)
    pub report_ms: i64,

    /// Global fade length in samples for record/play edges, clipped 0..=2048
    pub ramp: i64,

    /// Switch-and-ramp length in samples, clipped 0..=2048
    pub snramp: i64,

    /// Switch-and-ramp easing curve
    pub snr_curve: SwitchRampCurve,

    /// Playback interpolation mode
    pub interp: InterpMode,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            channels: 1,
            syncout: false,
            report_ms: 50,
            ramp: 256,
            snramp: 256,
            snr_curve: SwitchRampCurve::default(),
            interp: InterpMode::default(),
        }
    }
}

impl EngineParams {
    /// Clamp every field into its legal range; rejects unsupported channel
    /// counts.
    pub fn validated(mut self) -> Result<Self, EngineError> {
        if !matches!(self.channels, 1 | 2 | 4) {
            return Err(BufferError::UnsupportedChannels { channels: self.channels }.into());
        }
        self.ramp = self.ramp.clamp(0, MAX_RAMP);
        self.snramp = self.snramp.clamp(0, MAX_RAMP);
        self.report_ms = self.report_ms.max(0);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = EngineParams::default();
        assert_eq!(p.channels, 1);
        assert_eq!(p.ramp, 256);
        assert_eq!(p.snramp, 256);
        assert_eq!(p.interp, InterpMode::Cubic);
        assert_eq!(p.snr_curve, SwitchRampCurve::SineIn);
    }

    #[test]
    fn test_ramp_clamping() {
        let p = EngineParams { ramp: 99999, snramp: -5, ..Default::default() };
        let p = p.validated().unwrap();
        assert_eq!(p.ramp, MAX_RAMP);
        assert_eq!(p.snramp, 0);
    }

    #[test]
    fn test_bad_channel_count_rejected() {
        let p = EngineParams { channels: 3, ..Default::default() };
        assert!(p.validated().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let toml = r#"
            channels = 2
            syncout = true
            ramp = 128
            interp = "spline"
            snr_curve = "expo_out"
        "#;
        let p: EngineParams = toml::from_str(toml).unwrap();
        assert_eq!(p.channels, 2);
        assert!(p.syncout);
        assert_eq!(p.interp, InterpMode::Spline);
        assert_eq!(p.snr_curve, SwitchRampCurve::ExpoOut);
    }
}

//! Shared sample buffer
//!
//! A contiguous `frames x channels` store of f32 samples shared between the
//! engine and its host. The audio thread takes the lock with `try_lock` for
//! the duration of one vector; a vector that cannot acquire it degrades to
//! silence instead of blocking. Hosts that hold the lock for editing are
//! expected to release it between vectors.
//!
//! A relaxed atomic dirty flag carries "the engine wrote into this buffer"
//! notifications out to the host without touching the lock.

use crate::error::BufferError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Interior of the shared buffer, reachable only through a lock.
#[derive(Debug)]
pub struct BufferInner {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: f64,
}

impl BufferInner {
    /// Frame count (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Sample rate expressed in samples per millisecond
    pub fn ms_rate(&self) -> f64 {
        self.sample_rate * 0.001
    }

    /// Interleaved sample data
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Zero every sample
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Resize to a new frame count, zero-filling new space. Existing content
    /// is preserved where it still fits.
    pub fn resize(&mut self, frames: usize) {
        self.samples.resize(frames * self.channels, 0.0);
    }
}

/// Lock-guarded sample store with a dirty flag.
#[derive(Debug)]
pub struct SharedSampleBuffer {
    inner: Mutex<BufferInner>,
    dirty: AtomicBool,
}

impl SharedSampleBuffer {
    /// Allocate a zeroed buffer.
    pub fn new(frames: usize, channels: usize, sample_rate: f64) -> Result<Self, BufferError> {
        if frames == 0 || channels == 0 {
            return Err(BufferError::ZeroLength);
        }
        Ok(Self {
            inner: Mutex::new(BufferInner {
                samples: vec![0.0; frames * channels],
                channels,
                sample_rate,
            }),
            dirty: AtomicBool::new(false),
        })
    }

    /// Wrap existing interleaved samples.
    pub fn from_samples(
        samples: Vec<f32>,
        channels: usize,
        sample_rate: f64,
    ) -> Result<Self, BufferError> {
        if samples.is_empty() || channels == 0 || samples.len() % channels != 0 {
            return Err(BufferError::ZeroLength);
        }
        Ok(Self {
            inner: Mutex::new(BufferInner { samples, channels, sample_rate }),
            dirty: AtomicBool::new(false),
        })
    }

    /// Non-blocking lock for the audio thread. `None` means another holder
    /// has the buffer this vector.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, BufferInner>> {
        self.inner.try_lock().ok()
    }

    /// Blocking lock for host-side edits. Recovers the data if a previous
    /// holder panicked.
    pub fn lock(&self) -> MutexGuard<'_, BufferInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raise the written-to notification.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Consume the written-to notification.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::Relaxed)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length_rejected() {
        assert!(SharedSampleBuffer::new(0, 1, 44100.0).is_err());
        assert!(SharedSampleBuffer::new(16, 0, 44100.0).is_err());
        assert!(SharedSampleBuffer::from_samples(vec![], 1, 44100.0).is_err());
    }

    #[test]
    fn test_frames_and_channels() {
        let buf = SharedSampleBuffer::new(16, 2, 48000.0).unwrap();
        let inner = buf.lock();
        assert_eq!(inner.frames(), 16);
        assert_eq!(inner.channels(), 2);
        assert_eq!(inner.samples().len(), 32);
        assert_eq!(inner.ms_rate(), 48.0);
    }

    #[test]
    fn test_try_lock_contention() {
        let buf = SharedSampleBuffer::new(16, 1, 44100.0).unwrap();
        let _held = buf.lock();
        assert!(buf.try_lock().is_none());
    }

    #[test]
    fn test_dirty_flag_roundtrip() {
        let buf = SharedSampleBuffer::new(16, 1, 44100.0).unwrap();
        assert!(!buf.is_dirty());
        buf.mark_dirty();
        assert!(buf.take_dirty());
        assert!(!buf.is_dirty());
    }
}

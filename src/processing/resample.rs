//! Irregular-to-uniform resampling.
//!
//! The device delivers samples at whatever rate it manages, so every window
//! is re-gridded before feature extraction:
//!
//! ```text
//!   t0 = timestamp of the sample at the window's boundary offset
//!   grid[k] = t0 + k * duration / n,   n = round(rate * duration)
//! ```
//!
//! One piecewise-linear interpolant per axis is fitted over the whole
//! recording (not only the window), and evaluated with linear extrapolation
//! outside the first/last sample.
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use crate::acquisition::{CaptureError, FrozenBuffer, Sample, N_AXES};
use crate::timeline::BoundaryMarker;
/// One scripted window after resampling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledWindow {
    pub label: String,
    pub label_id: i64,
    /// `[window_sample_count, N_AXES]`
    pub waveform: Array2<f64>,
}
/// Global per-axis interpolant over a frozen recording.
pub struct Resampler<'a> {
    samples: &'a [Sample],
}
impl<'a> Resampler<'a> {
    pub fn new(buffer: &'a FrozenBuffer) -> Result<Self, CaptureError> {
        Self::from_samples(buffer.samples())
    }
    /// `samples` must be ordered by timestamp.
    pub fn from_samples(samples: &'a [Sample]) -> Result<Self, CaptureError> {
        if samples.len() < 2 {
            return Err(CaptureError::InsufficientSamples {
                available: samples.len(),
            });
        }
        Ok(Self { samples })
    }
    /// Uniform `[n, N_AXES]` waveform for the window starting at `start_offset`.
    ///
    /// An offset at or past the end of the recording (the window began before
    /// any further sample arrived) anchors on the last sample and extrapolates.
    pub fn resample(&self, start_offset: usize, window_duration: f64, target_rate: f64) -> Array2<f64> {
        let grid = self.grid(start_offset, window_duration, target_rate);
        let mut out = Array2::<f64>::zeros((grid.len(), N_AXES));
        for (&t, mut row) in grid.iter().zip(out.rows_mut()) {
            for (dst, v) in row.iter_mut().zip(self.at(t)) {
                *dst = v;
            }
        }
        out
    }
    /// Interpolated reading at time `t`, extrapolated linearly outside the
    /// recording.
    pub fn at(&self, t: f64) -> [f64; N_AXES] {
        let (i, j) = self.segment(t);
        std::array::from_fn(|axis| self.lerp(i, j, axis, t))
    }
    pub fn window(&self, marker: &BoundaryMarker, window_duration: f64, target_rate: f64) -> LabeledWindow {
        LabeledWindow {
            label: marker.label.clone(),
            label_id: marker.label_id,
            waveform: self.resample(marker.buffer_offset, window_duration, target_rate),
        }
    }
    /// Grid timestamps for the window starting at `start_offset`.
    pub fn grid(&self, start_offset: usize, window_duration: f64, target_rate: f64) -> Vec<f64> {
        let anchor = start_offset.min(self.samples.len() - 1);
        let t0 = self.samples[anchor].timestamp;
        let n = grid_len(window_duration, target_rate);
        (0..n)
            .map(|k| t0 + k as f64 * window_duration / n as f64)
            .collect()
    }
    /// Bracketing sample pair for `t`; the first or last pair when `t` lies
    /// outside the recording.
    fn segment(&self, t: f64) -> (usize, usize) {
        let upper = self.samples.partition_point(|s| s.timestamp <= t);
        let j = upper.clamp(1, self.samples.len() - 1);
        (j - 1, j)
    }
    fn lerp(&self, i: usize, j: usize, axis: usize, t: f64) -> f64 {
        let (a, b) = (&self.samples[i], &self.samples[j]);
        let dt = b.timestamp - a.timestamp;
        if dt <= 0.0 {
            return b.axes[axis];
        }
        a.axes[axis] + (t - a.timestamp) * (b.axes[axis] - a.axes[axis]) / dt
    }
}
pub fn grid_len(window_duration: f64, target_rate: f64) -> usize {
    (target_rate * window_duration).round().max(0.0) as usize
}
/// One-shot form of [`Resampler::resample`].
pub fn resample(
    buffer: &FrozenBuffer,
    start_offset: usize,
    window_duration: f64,
    target_rate: f64,
) -> Result<Array2<f64>, CaptureError> {
    Ok(Resampler::new(buffer)?.resample(start_offset, window_duration, target_rate))
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use crate::acquisition::{CaptureError, Sample};
/// Append-only sample store shared by the producer and the timeline.
///
/// The write cursor is the length of the backing vector, so a sample becomes
/// visible to readers in the same critical section that stores it.
pub struct AcquisitionBuffer {
    samples: Mutex<Vec<Sample>>,
    capacity: usize,
    overflowed: AtomicBool,
}
impl AcquisitionBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            overflowed: AtomicBool::new(false),
        }
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    fn lock(&self) -> MutexGuard<'_, Vec<Sample>> {
        // Samples are pushed whole, so a poisoned guard never holds a torn write.
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }
    pub fn append(&self, sample: Sample) -> Result<usize, CaptureError> {
        let mut samples = self.lock();
        if samples.len() == self.capacity {
            self.overflowed.store(true, Ordering::Release);
            return Err(CaptureError::BufferFull {
                capacity: self.capacity,
            });
        }
        samples.push(sample);
        Ok(samples.len())
    }
    /// Append a whole poll result under one lock so a boundary snapshot never
    /// lands in the middle of a batch. Samples past capacity are rejected.
    pub fn append_batch(&self, batch: &[Sample]) -> Result<usize, CaptureError> {
        let mut samples = self.lock();
        let room = self.capacity - samples.len();
        if batch.len() > room {
            samples.extend_from_slice(&batch[..room]);
            self.overflowed.store(true, Ordering::Release);
            return Err(CaptureError::BufferFull {
                capacity: self.capacity,
            });
        }
        samples.extend_from_slice(batch);
        Ok(samples.len())
    }
    /// Consistent snapshot of the write cursor.
    pub fn current_index(&self) -> usize {
        self.lock().len()
    }
    /// Latched once any append hit the capacity limit.
    pub fn is_overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }
    pub fn read_index(&self, index: usize) -> Result<Sample, CaptureError> {
        let samples = self.lock();
        samples.get(index).copied().ok_or(CaptureError::OutOfRange {
            lo: index,
            hi: index + 1,
            len: samples.len(),
        })
    }
    pub fn read_slice(&self, lo: usize, hi: usize) -> Result<Vec<Sample>, CaptureError> {
        let samples = self.lock();
        checked_range(&samples, lo, hi).map(<[Sample]>::to_vec)
    }
    /// Freeze the buffer once the producer has been joined. Taking `self` by
    /// value guarantees no writer can still hold a reference.
    pub fn into_frozen(self) -> FrozenBuffer {
        let samples = self
            .samples
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        FrozenBuffer { samples }
    }
}
fn checked_range(samples: &[Sample], lo: usize, hi: usize) -> Result<&[Sample], CaptureError> {
    if lo > hi || hi > samples.len() {
        return Err(CaptureError::OutOfRange {
            lo,
            hi,
            len: samples.len(),
        });
    }
    Ok(&samples[lo..hi])
}
/// Read-only view of everything the producer wrote.
#[derive(Clone, Debug, Default)]
pub struct FrozenBuffer {
    samples: Vec<Sample>,
}
impl FrozenBuffer {
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
    pub fn read_index(&self, index: usize) -> Result<Sample, CaptureError> {
        self.samples.get(index).copied().ok_or(CaptureError::OutOfRange {
            lo: index,
            hi: index + 1,
            len: self.samples.len(),
        })
    }
    pub fn read_slice(&self, lo: usize, hi: usize) -> Result<&[Sample], CaptureError> {
        checked_range(&self.samples, lo, hi)
    }
    /// Observed device rate, derived from consecutive timestamp gaps. `None`
    /// unless at least one gap is positive.
    pub fn arrival_rate(&self) -> Option<ArrivalRate> {
        let gaps: Vec<f64> = self
            .samples
            .windows(2)
            .map(|pair| pair[1].timestamp - pair[0].timestamp)
            .collect();
        let positive = || gaps.iter().copied().filter(|g| *g > 0.0);
        let min_gap = positive().reduce(f64::min)?;
        let max_gap = positive().reduce(f64::max)?;
        let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
        if mean_gap <= 0.0 {
            return None;
        }
        Some(ArrivalRate {
            min_hz: 1.0 / max_gap,
            max_hz: 1.0 / min_gap,
            mean_hz: 1.0 / mean_gap,
        })
    }
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrivalRate {
    pub min_hz: f64,
    pub max_hz: f64,
    pub mean_hz: f64,
}
#[cfg(test)]
mod tests {
    use super::*;
    fn sample(i: usize) -> Sample {
        Sample::new(i as f64 * 0.01, [i as f64, -(i as f64), 0.5])
    }
    #[test]
    fn append_then_read_is_identity() {
        let buffer = AcquisitionBuffer::with_capacity(64);
        let written: Vec<Sample> = (0..40).map(sample).collect();
        for (i, s) in written.iter().enumerate() {
            assert_eq!(buffer.append(*s).unwrap(), i + 1);
        }
        assert_eq!(buffer.current_index(), 40);
        assert_eq!(buffer.read_slice(0, buffer.current_index()).unwrap(), written);
        assert_eq!(buffer.read_index(7).unwrap(), written[7]);
    }
    #[test]
    fn append_past_capacity_is_buffer_full() {
        let buffer = AcquisitionBuffer::with_capacity(2);
        buffer.append(sample(0)).unwrap();
        buffer.append(sample(1)).unwrap();
        assert!(!buffer.is_overflowed());
        let err = buffer.append(sample(2)).unwrap_err();
        assert!(matches!(err, CaptureError::BufferFull { capacity: 2 }));
        assert!(buffer.is_overflowed());
        assert_eq!(buffer.current_index(), 2);
    }
    #[test]
    fn batch_append_fills_up_to_capacity() {
        let buffer = AcquisitionBuffer::with_capacity(3);
        let batch: Vec<Sample> = (0..5).map(sample).collect();
        assert!(buffer.append_batch(&batch).is_err());
        assert_eq!(buffer.current_index(), 3);
        assert_eq!(buffer.read_slice(0, 3).unwrap(), &batch[..3]);
    }
    #[test]
    fn reads_outside_cursor_are_out_of_range() {
        let buffer = AcquisitionBuffer::with_capacity(8);
        buffer.append(sample(0)).unwrap();
        assert!(matches!(
            buffer.read_index(1),
            Err(CaptureError::OutOfRange { lo: 1, hi: 2, len: 1 })
        ));
        assert!(buffer.read_slice(0, 2).is_err());
        assert!(buffer.read_slice(1, 0).is_err());
        assert!(buffer.read_slice(1, 1).unwrap().is_empty());
    }
    #[test]
    fn frozen_buffer_keeps_everything_written() {
        let buffer = AcquisitionBuffer::with_capacity(8);
        for i in 0..5 {
            buffer.append(sample(i)).unwrap();
        }
        let frozen = buffer.into_frozen();
        assert_eq!(frozen.len(), 5);
        assert_eq!(frozen.read_slice(1, 3).unwrap(), &[sample(1), sample(2)]);
        assert!(frozen.read_index(5).is_err());
    }
    #[test]
    fn arrival_rate_reports_min_max_mean() {
        let frozen = FrozenBuffer::from_samples(vec![
            Sample::new(0.0, [0.0; 3]),
            Sample::new(0.1, [0.0; 3]),
            Sample::new(0.3, [0.0; 3]),
            Sample::new(0.4, [0.0; 3]),
        ]);
        let rate = frozen.arrival_rate().unwrap();
        assert!((rate.min_hz - 5.0).abs() < 1e-9);
        assert!((rate.max_hz - 10.0).abs() < 1e-6);
        assert!((rate.mean_hz - 7.5).abs() < 1e-9);
        assert!(FrozenBuffer::from_samples(vec![sample(0)]).arrival_rate().is_none());
    }
    #[test]
    fn arrival_rate_needs_a_positive_gap() {
        let stalled = FrozenBuffer::from_samples(vec![Sample::new(2.0, [0.0; 3]); 4]);
        assert!(stalled.arrival_rate().is_none());
        let backwards = FrozenBuffer::from_samples(vec![
            Sample::new(2.0, [0.0; 3]),
            Sample::new(1.0, [0.0; 3]),
        ]);
        assert!(backwards.arrival_rate().is_none());
        let mixed = FrozenBuffer::from_samples(vec![
            Sample::new(0.0, [0.0; 3]),
            Sample::new(0.0, [0.0; 3]),
            Sample::new(0.5, [0.0; 3]),
        ]);
        let rate = mixed.arrival_rate().unwrap();
        assert!((rate.min_hz - 2.0).abs() < 1e-9);
        assert!((rate.max_hz - 2.0).abs() < 1e-9);
        assert!((rate.mean_hz - 4.0).abs() < 1e-9);
    }
}

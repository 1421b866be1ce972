use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::acquisition::CaptureError;
/// Number of motion axes carried by every sample (x, y, z).
pub const N_AXES: usize = 3;
/// One time-stamped triaxial reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    pub axes: [f64; N_AXES],
}
impl Sample {
    pub fn new(timestamp: f64, axes: [f64; N_AXES]) -> Self {
        Self { timestamp, axes }
    }
}
/// Anything that can be polled for a batch of samples.
///
/// An empty batch is a valid answer; failures are transient and the caller
/// simply polls again.
pub trait SampleSource: Send {
    fn poll(&mut self) -> Result<Vec<Sample>, CaptureError>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Result<Vec<Sample>, CaptureError>>,
}
impl ManualSource {
    pub fn new(batches: impl IntoIterator<Item = Vec<Sample>>) -> Self {
        Self {
            queue: batches.into_iter().map(Ok).collect(),
        }
    }
    /// Queue a failed poll, e.g. to simulate a network hiccup.
    pub fn push_failure(&mut self, reason: &str) {
        self.queue
            .push_back(Err(CaptureError::SourceUnavailable(reason.to_string())));
    }
    pub fn push_batch(&mut self, batch: Vec<Sample>) {
        self.queue.push_back(Ok(batch));
    }
}
impl SampleSource for ManualSource {
    fn poll(&mut self) -> Result<Vec<Sample>, CaptureError> {
        self.queue.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
#[derive(Deserialize)]
struct PollBody {
    buffer: HashMap<String, ChannelBuffer>,
}
#[derive(Deserialize)]
struct ChannelBuffer {
    buffer: Vec<Option<f64>>,
}
/// Channel names requested from the device: one time channel plus one per axis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelNames {
    pub time: String,
    pub axes: [String; N_AXES],
}
impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            time: "acc_time".into(),
            axes: ["accX".into(), "accY".into(), "accZ".into()],
        }
    }
}
impl ChannelNames {
    /// Query string of the form `accX&accY&accZ&acc_time`.
    pub fn query(&self) -> String {
        let mut parts: Vec<&str> = self.axes.iter().map(String::as_str).collect();
        parts.push(&self.time);
        parts.join("&")
    }
}
/// A device timestamp this far (seconds) behind the last one means the
/// device's timer restarted rather than a stale reading being served again.
pub const CLOCK_RESTART_TOLERANCE: f64 = 0.5;
/// Polls a phone-style sensor server over HTTP.
///
/// The device answers every GET with its latest buffered values, so repeated
/// polls can return a sample that was already seen; those are dropped here to
/// keep the buffer's timestamps strictly increasing.
///
/// When the device's timer restarts, later timestamps are shifted so they
/// continue after the last accepted one. The first reading after the restart
/// only re-anchors the clock and is dropped.
pub struct HttpSource {
    agent: ureq::Agent,
    url: String,
    channels: ChannelNames,
    /// Last accepted timestamp in device time.
    last_timestamp: Option<f64>,
    clock_offset: f64,
    clock_restarts: usize,
}
impl HttpSource {
    pub fn new(url: impl Into<String>, channels: ChannelNames, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            url: url.into(),
            channels,
            last_timestamp: None,
            clock_offset: 0.0,
            clock_restarts: 0,
        }
    }
    pub fn url(&self) -> &str {
        &self.url
    }
    /// How often the device clock was seen jumping backwards.
    pub fn clock_restarts(&self) -> usize {
        self.clock_restarts
    }
    fn fetch(&self) -> Result<String, CaptureError> {
        let mut response = self
            .agent
            .get(self.url.as_str())
            .call()
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))
    }
    /// Decode a response body into samples, skipping anything not newer than
    /// the last accepted timestamp.
    pub fn decode(&mut self, body: &str) -> Result<Vec<Sample>, CaptureError> {
        let parsed: PollBody = serde_json::from_str(body)
            .map_err(|e| CaptureError::SourceUnavailable(format!("malformed body: {e}")))?;
        let channel = |name: &str| {
            parsed
                .buffer
                .get(name)
                .map(|c| c.buffer.as_slice())
                .ok_or_else(|| CaptureError::SourceUnavailable(format!("missing channel {name}")))
        };
        let times = channel(&self.channels.time)?;
        let x = channel(&self.channels.axes[0])?;
        let y = channel(&self.channels.axes[1])?;
        let z = channel(&self.channels.axes[2])?;
        let len = times.len().min(x.len()).min(y.len()).min(z.len());
        let mut samples = Vec::with_capacity(len);
        for i in 0..len {
            let (Some(t), Some(ax), Some(ay), Some(az)) = (times[i], x[i], y[i], z[i]) else {
                continue;
            };
            if let Some(last) = self.last_timestamp {
                if t < last - CLOCK_RESTART_TOLERANCE {
                    warn!(
                        "Device clock went back from {last:.3}s to {t:.3}s; rebasing later samples"
                    );
                    self.clock_offset += last - t;
                    self.clock_restarts += 1;
                    self.last_timestamp = Some(t);
                    continue;
                }
                if t <= last {
                    continue;
                }
            }
            self.last_timestamp = Some(t);
            samples.push(Sample::new(t + self.clock_offset, [ax, ay, az]));
        }
        Ok(samples)
    }
}
impl SampleSource for HttpSource {
    fn poll(&mut self) -> Result<Vec<Sample>, CaptureError> {
        let body = self.fetch()?;
        self.decode(&body)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn source() -> HttpSource {
        HttpSource::new(
            "http://127.0.0.1:9/get",
            ChannelNames::default(),
            Duration::from_millis(50),
        )
    }
    #[test]
    fn decodes_device_body_and_drops_repeats() {
        let mut src = source();
        let body = r#"{"buffer":{
            "acc_time":{"buffer":[0.5]},
            "accX":{"buffer":[1.0]},"accY":{"buffer":[2.0]},"accZ":{"buffer":[3.0]}}}"#;
        let first = src.decode(body).unwrap();
        assert_eq!(first, vec![Sample::new(0.5, [1.0, 2.0, 3.0])]);
        // Same reading served again by the device.
        assert!(src.decode(body).unwrap().is_empty());
    }
    fn body(t: f64, x: f64) -> String {
        format!(
            r#"{{"buffer":{{"acc_time":{{"buffer":[{t}]}},
            "accX":{{"buffer":[{x}]}},"accY":{{"buffer":[0.0]}},"accZ":{{"buffer":[9.8]}}}}}}"#
        )
    }
    #[test]
    fn device_clock_restart_keeps_later_samples() {
        let mut src = source();
        assert_eq!(src.decode(&body(100.0, 1.0)).unwrap().len(), 1);
        let mut kept = Vec::new();
        for i in 1..=50 {
            kept.extend(src.decode(&body(i as f64 * 0.1, i as f64)).unwrap());
        }
        assert_eq!(src.clock_restarts(), 1);
        // Only the reading that revealed the restart is dropped.
        assert_eq!(kept.len(), 49);
        assert!((kept[0].timestamp - 100.1).abs() < 1e-9);
        assert_eq!(kept[0].axes[0], 2.0);
        assert!(kept.windows(2).all(|w| w[1].timestamp > w[0].timestamp));
    }
    #[test]
    fn small_backward_jitter_is_treated_as_a_repeat() {
        let mut src = source();
        assert_eq!(src.decode(&body(10.0, 1.0)).unwrap().len(), 1);
        assert!(src.decode(&body(9.8, 2.0)).unwrap().is_empty());
        assert_eq!(src.clock_restarts(), 0);
        assert_eq!(src.decode(&body(10.1, 3.0)).unwrap()[0].timestamp, 10.1);
    }
    #[test]
    fn null_entries_and_ragged_channels_are_tolerated() {
        let mut src = source();
        let body = r#"{"buffer":{
            "acc_time":{"buffer":[0.1, 0.2, 0.3]},
            "accX":{"buffer":[1.0, null, 3.0]},
            "accY":{"buffer":[0.0, 0.0, 0.0]},
            "accZ":{"buffer":[9.8, 9.8]}}}"#;
        let samples = src.decode(body).unwrap();
        assert_eq!(samples, vec![Sample::new(0.1, [1.0, 0.0, 9.8])]);
    }
    #[test]
    fn malformed_body_is_source_unavailable() {
        let mut src = source();
        let err = src.decode("<html>busy</html>").unwrap_err();
        assert!(matches!(err, CaptureError::SourceUnavailable(_)));
        let err = src.decode(r#"{"buffer":{}}"#).unwrap_err();
        assert!(matches!(err, CaptureError::SourceUnavailable(_)));
    }
    #[test]
    fn unreachable_device_is_source_unavailable() {
        let mut src = source();
        assert!(matches!(src.poll(), Err(CaptureError::SourceUnavailable(_))));
    }
    #[test]
    fn manual_source_replays_batches_then_runs_dry() {
        let mut src = ManualSource::new(vec![vec![Sample::new(0.0, [0.0; 3])]]);
        src.push_failure("dropped");
        assert_eq!(src.poll().unwrap().len(), 1);
        assert!(src.poll().is_err());
        assert!(src.poll().unwrap().is_empty());
    }
    #[test]
    fn query_lists_axes_then_time() {
        assert_eq!(ChannelNames::default().query(), "accX&accY&accZ&acc_time");
    }
}

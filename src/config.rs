use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::acquisition::{CaptureError, ChannelNames};
/// One experimental condition: the label shown to the participant and the
/// numeric id written into the dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub label: String,
    pub id: i64,
}
impl Condition {
    pub fn new(label: &str, id: i64) -> Self {
        Self {
            label: label.to_string(),
            id,
        }
    }
}
/// Phase durations in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseDurations {
    pub fixation: f64,
    pub preparation: f64,
    pub window: f64,
    pub rest: f64,
}
impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            fixation: 2.0,
            preparation: 1.0,
            window: 0.5,
            rest: 5.0,
        }
    }
}
impl PhaseDurations {
    /// Length of one trial: fixation, preparation, all windows, rest.
    pub fn trial_seconds(&self, n_windows: usize) -> f64 {
        self.fixation + self.preparation + n_windows as f64 * self.window + self.rest
    }
}
pub fn seconds(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub conditions: Vec<Condition>,
    /// Repetitions of every condition.
    pub n_trials: usize,
    /// Labeled windows per trial.
    pub n_windows: usize,
    pub durations: PhaseDurations,
    /// Rate of the uniform output waveform (Hz).
    pub sampling_rate: f64,
    /// Worst-case device rate (Hz); sizes the buffer and paces polling.
    pub max_device_rate: f64,
    pub device_address: String,
    pub channels: ChannelNames,
    pub poll_timeout_secs: f64,
    pub output_dir: PathBuf,
}
impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            conditions: vec![
                Condition::new("Jumping", 1),
                Condition::new("Squats", 2),
                Condition::new("Lateral Lunges", 3),
                Condition::new("Walking straight", 4),
                Condition::new("Nothing", 5),
                Condition::new("Hip Circles", 6),
            ],
            n_trials: 10,
            n_windows: 10,
            durations: PhaseDurations::default(),
            sampling_rate: 30.0,
            max_device_rate: 5000.0,
            device_address: "192.168.1.69".into(),
            channels: ChannelNames::default(),
            poll_timeout_secs: 0.5,
            output_dir: PathBuf::from("."),
        }
    }
}
impl ExperimentConfig {
    /// Load a JSON config; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, CaptureError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), CaptureError> {
        let invalid = |msg: &str| Err(CaptureError::InvalidConfig(msg.to_string()));
        if self.conditions.is_empty() {
            return invalid("at least one condition is required");
        }
        if self.n_trials == 0 || self.n_windows == 0 {
            return invalid("n_trials and n_windows must be positive");
        }
        let d = &self.durations;
        let durations = [d.fixation, d.preparation, d.window, d.rest, self.poll_timeout_secs];
        if durations.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return invalid("durations must be finite and non-negative");
        }
        if d.window <= 0.0 {
            return invalid("window duration must be positive");
        }
        for rate in [self.sampling_rate, self.max_device_rate] {
            if !rate.is_finite() || rate <= 0.0 {
                return invalid("sampling rates must be finite and positive");
            }
        }
        Ok(())
    }
    pub fn total_trials(&self) -> usize {
        self.n_trials * self.conditions.len()
    }
    pub fn trial_seconds(&self) -> f64 {
        self.durations.trial_seconds(self.n_windows)
    }
    /// Pre-sized with 2x headroom over the worst-case sample count.
    pub fn buffer_capacity(&self) -> usize {
        (2.0 * self.total_trials() as f64 * self.trial_seconds() * self.max_device_rate).ceil()
            as usize
    }
    pub fn poll_interval(&self) -> Duration {
        seconds(1.0 / self.max_device_rate)
    }
    pub fn poll_timeout(&self) -> Duration {
        seconds(self.poll_timeout_secs)
    }
    pub fn window_sample_count(&self) -> usize {
        (self.sampling_rate * self.durations.window).round() as usize
    }
    pub fn device_url(&self) -> String {
        format!("http://{}/get?{}", self.device_address, self.channels.query())
    }
}

use std::thread;
use std::time::Duration;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::acquisition::{AcquisitionBuffer, CaptureError};
use crate::config::{seconds, Condition, PhaseDurations};
/// Buffer offset observed when one scripted window began.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryMarker {
    pub label: String,
    pub label_id: i64,
    pub buffer_offset: usize,
}
#[derive(Clone, Debug, PartialEq)]
pub enum Phase<'a> {
    Fixation,
    Preparation { trial: usize, condition: &'a Condition },
    Window { trial: usize, index: usize },
    Rest { trial: usize },
}
pub trait Clock {
    fn sleep(&self, duration: Duration);
}
/// Wall-clock pacing.
pub struct SystemClock;
impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
/// Result of one pass through the timeline.
#[derive(Debug)]
pub struct TimelineRun {
    pub markers: Vec<BoundaryMarker>,
    /// Set when the run ended before the last trial; `markers` still holds
    /// every window that did start.
    pub aborted: Option<CaptureError>,
}
/// Randomised trial order plus the phase script that walks it.
pub struct TrialTimeline {
    trials: Vec<Condition>,
    n_windows: usize,
}
impl TrialTimeline {
    /// `n_trials` repetitions of every condition in one uniform shuffle.
    pub fn shuffled<R: Rng + ?Sized>(
        conditions: &[Condition],
        n_trials: usize,
        n_windows: usize,
        rng: &mut R,
    ) -> Self {
        let mut trials: Vec<Condition> = (0..n_trials)
            .flat_map(|_| conditions.iter().cloned())
            .collect();
        trials.shuffle(rng);
        Self { trials, n_windows }
    }
    pub fn trials(&self) -> &[Condition] {
        &self.trials
    }
    pub fn scheduled_windows(&self) -> usize {
        self.trials.len() * self.n_windows
    }
    /// Walk every phase, blocking on `clock` for each phase's duration and
    /// snapshotting the buffer cursor at the start of every window.
    pub fn run<C: Clock + ?Sized>(
        &self,
        buffer: &AcquisitionBuffer,
        durations: &PhaseDurations,
        clock: &C,
    ) -> TimelineRun {
        let mut markers = Vec::with_capacity(self.scheduled_windows());
        info!("********* Experiment in progress *********");
        clock.sleep(seconds(durations.fixation));
        for (trial, condition) in self.trials.iter().enumerate() {
            if let Some(aborted) = check_buffer(buffer, &markers) {
                return TimelineRun { markers, aborted: Some(aborted) };
            }
            info!("********* Trial {}/{} *********", trial + 1, self.trials.len());
            Self::enter(Phase::Fixation);
            clock.sleep(seconds(durations.fixation));
            Self::enter(Phase::Preparation { trial, condition });
            clock.sleep(seconds(durations.preparation));
            for index in 0..self.n_windows {
                if let Some(aborted) = check_buffer(buffer, &markers) {
                    return TimelineRun { markers, aborted: Some(aborted) };
                }
                Self::enter(Phase::Window { trial, index });
                let marker = BoundaryMarker {
                    label: condition.label.clone(),
                    label_id: condition.id,
                    buffer_offset: buffer.current_index(),
                };
                debug!("Window {index} of {} starts at offset {}", marker.label, marker.buffer_offset);
                markers.push(marker);
                clock.sleep(seconds(durations.window));
            }
            Self::enter(Phase::Rest { trial });
            clock.sleep(seconds(durations.rest));
        }
        TimelineRun { markers, aborted: None }
    }
    fn enter(phase: Phase<'_>) {
        match phase {
            Phase::Fixation => debug!("+"),
            Phase::Preparation { trial, condition } => {
                info!("{} (trial {})", condition.label, trial + 1)
            }
            Phase::Window { trial, index } => debug!("Trial {} window {}", trial + 1, index + 1),
            Phase::Rest { trial } => info!("----Rest---- (after trial {})", trial + 1),
        }
    }
}
fn check_buffer(buffer: &AcquisitionBuffer, markers: &[BoundaryMarker]) -> Option<CaptureError> {
    if !buffer.is_overflowed() {
        return None;
    }
    warn!(
        "Stopping timeline early: buffer overflowed after {} windows",
        markers.len()
    );
    Some(CaptureError::BufferFull {
        capacity: buffer.capacity(),
    })
}

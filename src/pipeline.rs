use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc;
use std::thread;
use log::error;
use crate::acquisition::{
    spawn_producer, AcquisitionBuffer, ArrivalRate, CaptureError, FrozenBuffer, ProducerStats,
    SampleSource, N_AXES,
};
use crate::config::ExperimentConfig;
use crate::processing::{
    tally_skips, Dataset, DatasetAssembler, LabeledWindow, Resampler, SkippedWindow,
};
use crate::recording::Recording;
use crate::timeline::{BoundaryMarker, Clock, TrialTimeline};
/// Everything captured while the timeline ran.
pub struct Acquisition {
    pub buffer: FrozenBuffer,
    pub markers: Vec<BoundaryMarker>,
    pub scheduled_windows: usize,
    pub producer: ProducerStats,
    pub aborted: Option<CaptureError>,
}
/// Run the producer and the timeline side by side until the last phase ends.
///
/// The producer is always stopped and joined before the buffer is frozen, so
/// the returned buffer holds every sample that was ever appended.
pub fn acquire<S, C>(
    config: &ExperimentConfig,
    source: S,
    timeline: &TrialTimeline,
    clock: &C,
) -> Acquisition
where
    S: SampleSource,
    C: Clock + ?Sized,
{
    let buffer = AcquisitionBuffer::with_capacity(config.buffer_capacity());
    let (stop_tx, stop_rx) = mpsc::channel();
    let (run, producer) = thread::scope(|scope| {
        let handle = spawn_producer(scope, source, &buffer, config.poll_interval(), stop_rx);
        let run = timeline.run(&buffer, &config.durations, clock);
        // The producer may already be gone after an overflow.
        let _ = stop_tx.send(());
        let producer = handle.join().unwrap_or_else(|_| {
            error!("Producer thread panicked; keeping the samples already recorded");
            ProducerStats::default()
        });
        (run, producer)
    });
    Acquisition {
        buffer: buffer.into_frozen(),
        markers: run.markers,
        scheduled_windows: timeline.scheduled_windows(),
        producer,
        aborted: run.aborted,
    }
}
/// Output of the offline pass over a finished acquisition.
pub struct Processed {
    pub windows: Vec<LabeledWindow>,
    pub dataset: Dataset,
    pub skipped: Vec<SkippedWindow>,
}
/// Resample every marked window and featurize it. Per-window failures are
/// collected in `skipped`; the batch always completes.
pub fn process(buffer: &FrozenBuffer, markers: &[BoundaryMarker], config: &ExperimentConfig) -> Processed {
    let resampler = Resampler::new(buffer);
    let mut assembler = DatasetAssembler::new(N_AXES);
    let mut windows = Vec::with_capacity(markers.len());
    for marker in markers {
        let Ok(resampler) = &resampler else {
            assembler.push_result(
                &marker.label,
                Err(CaptureError::InsufficientSamples {
                    available: buffer.len(),
                }),
            );
            continue;
        };
        let window = resampler.window(marker, config.durations.window, config.sampling_rate);
        assembler.push_window(&window);
        windows.push(window);
    }
    let (dataset, skipped) = assembler.finish();
    Processed {
        windows,
        dataset,
        skipped,
    }
}
/// Featurize a previously saved recording.
pub fn featurize_recording(recording: &Recording) -> (Dataset, Vec<SkippedWindow>) {
    let mut assembler = DatasetAssembler::new(N_AXES);
    for window in &recording.windows {
        assembler.push_window(window);
    }
    assembler.finish()
}
/// End-of-run report.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub scheduled_windows: usize,
    pub marked_windows: usize,
    pub featurized: usize,
    pub skipped: BTreeMap<&'static str, usize>,
    pub aborted: Option<String>,
    pub samples: usize,
    pub producer: Option<ProducerStats>,
    pub arrival: Option<ArrivalRate>,
}
impl RunSummary {
    pub fn from_run(acquisition: &Acquisition, processed: &Processed) -> Self {
        Self {
            scheduled_windows: acquisition.scheduled_windows,
            marked_windows: acquisition.markers.len(),
            featurized: processed.dataset.n_rows(),
            skipped: tally_skips(&processed.skipped),
            aborted: acquisition.aborted.as_ref().map(ToString::to_string),
            samples: acquisition.buffer.len(),
            producer: Some(acquisition.producer),
            arrival: acquisition.buffer.arrival_rate(),
        }
    }
    pub fn from_replay(recording: &Recording, dataset: &Dataset, skipped: &[SkippedWindow]) -> Self {
        Self {
            scheduled_windows: recording.windows.len(),
            marked_windows: recording.windows.len(),
            featurized: dataset.n_rows(),
            skipped: tally_skips(skipped),
            ..Self::default()
        }
    }
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}
impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Windows scheduled:  {}", self.scheduled_windows)?;
        writeln!(f, "Windows marked:     {}", self.marked_windows)?;
        writeln!(f, "Windows featurized: {}", self.featurized)?;
        writeln!(f, "Windows skipped:    {}", self.skipped_total())?;
        for (reason, count) in &self.skipped {
            writeln!(f, "  {reason}: {count}")?;
        }
        if let Some(reason) = &self.aborted {
            writeln!(f, "Run stopped early: {reason}")?;
        }
        if let Some(p) = &self.producer {
            writeln!(
                f,
                "Polls: {} ({} failed), samples recorded: {}",
                p.polls, p.failed_polls, self.samples
            )?;
        }
        match &self.arrival {
            Some(rate) => {
                writeln!(f, "Min sampling rate: {:.2} Hz", rate.min_hz)?;
                writeln!(f, "Max sampling rate: {:.2} Hz", rate.max_hz)?;
                write!(f, "Average sampling rate: {:.2} Hz", rate.mean_hz)
            }
            None if self.producer.is_some() => write!(f, "Sampling rate: not enough samples"),
            None => Ok(()),
        }
    }
}

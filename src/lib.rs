pub mod acquisition;
pub mod config;
pub mod pipeline;
pub mod processing;
pub mod recording;
pub mod timeline;
pub use acquisition::{AcquisitionBuffer, CaptureError, FrozenBuffer, HttpSource, Sample, SampleSource};
pub use config::{Condition, ExperimentConfig, PhaseDurations};
pub use pipeline::{acquire, featurize_recording, process, RunSummary};
pub use processing::{Dataset, DatasetAssembler, FeatureVector, LabeledWindow, Resampler};
pub use recording::Recording;
pub use timeline::{BoundaryMarker, Clock, SystemClock, TrialTimeline};

// src/acquisition/mod.rs
pub mod buffer;
pub mod error;
pub mod producer;
pub mod source;
pub use buffer::{AcquisitionBuffer, ArrivalRate, FrozenBuffer};
pub use error::CaptureError;
pub use producer::{run_producer, spawn_producer, ProducerStats};
pub use source::{ChannelNames, HttpSource, ManualSource, Sample, SampleSource, N_AXES};

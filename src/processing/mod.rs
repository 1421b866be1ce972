// src/processing/mod.rs
pub mod dataset;
pub mod features;
pub mod resample;
pub use dataset::{tally_skips, Dataset, DatasetAssembler, SkippedWindow};
pub use features::{column_names, extract, extract_waveform, row_len, FeatureVector};
pub use resample::{resample, LabeledWindow, Resampler};

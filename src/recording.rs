use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use chrono::Local;
use log::info;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use crate::acquisition::{CaptureError, N_AXES};
use crate::processing::{column_names, row_len, Dataset, LabeledWindow};
/// Every resampled window of one experiment, in timeline order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub captured_at: String,
    pub sampling_rate: f64,
    pub windows: Vec<LabeledWindow>,
}
/// File stem derived from the capture time, e.g. `10_19_2026_14_03_59`.
pub fn capture_stem() -> String {
    Local::now().format("%m_%d_%Y_%H_%M_%S").to_string()
}
pub struct OutputPaths {
    pub recording: PathBuf,
    pub dataset: PathBuf,
}
impl OutputPaths {
    pub fn in_dir(dir: &Path, stem: &str) -> Self {
        Self {
            recording: dir.join(format!("{stem}.json")),
            dataset: dir.join(format!("{stem}.txt")),
        }
    }
}
pub fn save_recording(path: &Path, recording: &Recording) -> Result<(), CaptureError> {
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut w, recording)?;
    w.flush()?;
    info!("Recording saved: {} ({} windows)", path.display(), recording.windows.len());
    Ok(())
}
pub fn load_recording(path: &Path) -> Result<Recording, CaptureError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
/// Whitespace-separated table, one feature vector per line. A full-width
/// feature table gets a `#` header naming its columns.
pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<(), CaptureError> {
    let mut w = BufWriter::new(File::create(path)?);
    if dataset.table().ncols() == row_len(N_AXES) {
        writeln!(w, "# {}", column_names(N_AXES).join(" "))?;
    }
    for row in dataset.table().rows() {
        let mut first = true;
        for v in row {
            if !first {
                write!(w, " ")?;
            }
            write!(w, "{v:.18e}")?;
            first = false;
        }
        writeln!(w)?;
    }
    w.flush()?;
    info!("Dataset saved: {} ({} rows)", path.display(), dataset.n_rows());
    Ok(())
}
pub fn load_dataset(path: &Path) -> Result<Dataset, CaptureError> {
    let reader = BufReader::new(File::open(path)?);
    let mut values = Vec::new();
    let mut width: Option<usize> = None;
    let mut rows = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| CaptureError::MalformedTable {
                line: i + 1,
                reason: e.to_string(),
            })?;
        match width {
            Some(w) if w != row.len() => {
                return Err(CaptureError::MalformedTable {
                    line: i + 1,
                    reason: format!("expected {w} columns, found {}", row.len()),
                })
            }
            _ => width = Some(row.len()),
        }
        values.extend(row);
        rows += 1;
    }
    let table = Array2::from_shape_vec((rows, width.unwrap_or(0)), values).map_err(|e| {
        CaptureError::MalformedTable {
            line: rows,
            reason: e.to_string(),
        }
    })?;
    Ok(Dataset::from_table(table))
}
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("motion_trials_{}_{name}", std::process::id()))
    }
    #[test]
    fn recording_round_trips() {
        let recording = Recording {
            captured_at: capture_stem(),
            sampling_rate: 30.0,
            windows: vec![
                LabeledWindow {
                    label: "Hip Circles".into(),
                    label_id: 6,
                    waveform: array![[0.1, -9.81, 1.0 / 3.0], [0.2, -9.7, 2.0]],
                },
                LabeledWindow {
                    label: "Nothing".into(),
                    label_id: 5,
                    waveform: Array2::zeros((2, 3)),
                },
            ],
        };
        let path = scratch("recording.json");
        save_recording(&path, &recording).unwrap();
        let loaded = load_recording(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.windows.len(), 2);
        for (a, b) in loaded.windows.iter().zip(&recording.windows) {
            assert_eq!(a.label, b.label);
            assert_eq!(a.label_id, b.label_id);
            assert_eq!(a.waveform.dim(), b.waveform.dim());
            for (x, y) in a.waveform.iter().zip(b.waveform.iter()) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }
    #[test]
    fn dataset_round_trips_through_text() {
        let dataset = Dataset::from_table(array![[1.0, 0.25, -3.5e-7], [6.0, 1.0 / 3.0, 42.0]]);
        let path = scratch("dataset.txt");
        save_dataset(&path, &dataset).unwrap();
        let loaded = load_dataset(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.table().dim(), (2, 3));
        assert_eq!(loaded.label_ids().to_vec(), vec![1.0, 6.0]);
        for (x, y) in loaded.table().iter().zip(dataset.table().iter()) {
            assert!((x - y).abs() <= 1e-15 * y.abs().max(1.0));
        }
    }
    #[test]
    fn feature_table_header_is_skipped_on_load() {
        let dataset = Dataset::from_table(Array2::from_elem((3, row_len(N_AXES)), 0.5));
        let path = scratch("features.txt");
        save_dataset(&path, &dataset).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let loaded = load_dataset(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(text.starts_with("# label_id axis0_mean"));
        assert_eq!(loaded, dataset);
    }
    #[test]
    fn ragged_table_is_rejected() {
        let path = scratch("ragged.txt");
        std::fs::write(&path, "1 2 3\n4 5\n").unwrap();
        let err = load_dataset(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, CaptureError::MalformedTable { line: 2, .. }));
    }
    #[test]
    fn output_paths_share_the_capture_stem() {
        let paths = OutputPaths::in_dir(Path::new("out"), "01_02_2026_03_04_05");
        assert_eq!(paths.recording, Path::new("out/01_02_2026_03_04_05.json"));
        assert_eq!(paths.dataset, Path::new("out/01_02_2026_03_04_05.txt"));
    }
}

use std::collections::BTreeMap;
use log::warn;
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use crate::acquisition::CaptureError;
use crate::processing::features::{extract, row_len, FeatureVector, AXIS_FEATURES};
use crate::processing::LabeledWindow;
/// A window that did not make it into the dataset.
#[derive(Debug)]
pub struct SkippedWindow {
    /// Position in the scheduled window sequence.
    pub index: usize,
    pub label: String,
    pub reason: CaptureError,
}
/// Rectangular feature table; column 0 holds the label id.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    table: Array2<f64>,
}
impl Dataset {
    pub fn from_table(table: Array2<f64>) -> Self {
        Self { table }
    }
    pub fn table(&self) -> &Array2<f64> {
        &self.table
    }
    pub fn n_rows(&self) -> usize {
        self.table.nrows()
    }
    pub fn label_ids(&self) -> ArrayView1<'_, f64> {
        self.table.column(0)
    }
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.table.slice(s![.., 1..])
    }
}
/// Collects feature vectors in production order, counting windows that fail.
pub struct DatasetAssembler {
    n_axes: usize,
    rows: Vec<FeatureVector>,
    skipped: Vec<SkippedWindow>,
    seen: usize,
}
impl DatasetAssembler {
    pub fn new(n_axes: usize) -> Self {
        Self {
            n_axes,
            rows: Vec::new(),
            skipped: Vec::new(),
            seen: 0,
        }
    }
    /// Extract features from `window`; failures are recorded, not returned.
    pub fn push_window(&mut self, window: &LabeledWindow) {
        let outcome = extract(window);
        self.push_result(&window.label, outcome);
    }
    /// Rows whose width does not match `n_axes` are skipped as `AxisMismatch`.
    pub fn push_result(&mut self, label: &str, outcome: Result<FeatureVector, CaptureError>) {
        let index = self.seen;
        self.seen += 1;
        let outcome = outcome.and_then(|fv| self.check_width(fv));
        match outcome {
            Ok(fv) => self.rows.push(fv),
            Err(reason) => {
                warn!("Skipping window {index} ({label}): {reason}");
                self.skipped.push(SkippedWindow {
                    index,
                    label: label.to_string(),
                    reason,
                });
            }
        }
    }
    fn check_width(&self, fv: FeatureVector) -> Result<FeatureVector, CaptureError> {
        if fv.row().len() == row_len(self.n_axes) {
            return Ok(fv);
        }
        Err(CaptureError::AxisMismatch {
            expected: self.n_axes,
            actual: fv.features.len().saturating_sub(1) / AXIS_FEATURES.len(),
        })
    }
    pub fn skipped(&self) -> &[SkippedWindow] {
        &self.skipped
    }
    pub fn finish(self) -> (Dataset, Vec<SkippedWindow>) {
        let width = row_len(self.n_axes);
        let mut table = Array2::<f64>::zeros((self.rows.len(), width));
        for (mut out, fv) in table.rows_mut().into_iter().zip(&self.rows) {
            for (dst, src) in out.iter_mut().zip(fv.row()) {
                *dst = src;
            }
        }
        (Dataset { table }, self.skipped)
    }
}
/// Skip counts keyed by failure kind.
pub fn tally_skips(skipped: &[SkippedWindow]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for window in skipped {
        *counts.entry(window.reason.kind()).or_insert(0) += 1;
    }
    counts
}

use ndarray::{Array2, ArrayView1};
use crate::acquisition::CaptureError;
use crate::processing::LabeledWindow;
/// Per-axis statistics, in output order.
pub const AXIS_FEATURES: [&str; 12] = [
    "mean",
    "std",
    "kurtosis",
    "skewness",
    "min",
    "max",
    "median",
    "p25",
    "p75",
    "ptp",
    "velocity_mean",
    "velocity_std",
];
/// Row width of the dataset: label id, per-axis block, global energy term.
pub fn row_len(n_axes: usize) -> usize {
    1 + n_axes * AXIS_FEATURES.len() + 1
}
/// Column names matching [`FeatureVector::row`].
pub fn column_names(n_axes: usize) -> Vec<String> {
    let mut names = vec!["label_id".to_string()];
    for axis in 0..n_axes {
        names.extend(AXIS_FEATURES.iter().map(|f| format!("axis{axis}_{f}")));
    }
    names.push("energy".to_string());
    names
}
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector {
    pub label_id: i64,
    pub features: Vec<f64>,
}
impl FeatureVector {
    /// `[label_id, features...]`
    pub fn row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.features.len() + 1);
        row.push(self.label_id as f64);
        row.extend_from_slice(&self.features);
        row
    }
}
pub fn extract(window: &LabeledWindow) -> Result<FeatureVector, CaptureError> {
    extract_waveform(window.label_id, &window.waveform)
}
/// Reduce a `[samples, axes]` waveform to its feature vector.
pub fn extract_waveform(label_id: i64, waveform: &Array2<f64>) -> Result<FeatureVector, CaptureError> {
    let samples = waveform.nrows();
    if samples < 2 {
        return Err(CaptureError::InsufficientWindowData { samples });
    }
    let mut features = Vec::with_capacity(row_len(waveform.ncols()) - 1);
    for column in waveform.columns() {
        features.extend(axis_features(column));
    }
    let energy = waveform.iter().map(|v| v * v).sum::<f64>().sqrt();
    features.push(energy);
    Ok(FeatureVector { label_id, features })
}
fn axis_features(signal: ArrayView1<'_, f64>) -> [f64; 12] {
    let values: Vec<f64> = signal.iter().copied().collect();
    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);
    let moments = Moments::of(&values);
    let velocity: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let velocity_moments = Moments::of(&velocity);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    [
        moments.mean,
        moments.std(),
        moments.excess_kurtosis(),
        moments.skewness(),
        min,
        max,
        percentile(&sorted, 50.0),
        percentile(&sorted, 25.0),
        percentile(&sorted, 75.0),
        max - min,
        velocity_moments.mean,
        velocity_moments.std(),
    ]
}
/// Central moments (population, not sample-corrected).
struct Moments {
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}
impl Moments {
    fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        Self {
            mean,
            m2: m2 / n,
            m3: m3 / n,
            m4: m4 / n,
        }
    }
    fn std(&self) -> f64 {
        self.m2.sqrt()
    }
    /// Variance indistinguishable from rounding noise around the mean.
    fn is_degenerate(&self) -> bool {
        self.m2 <= (f64::EPSILON * self.mean).powi(2)
    }
    /// Reported as 0.0 for a constant signal.
    fn skewness(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        self.m3 / self.m2.powf(1.5)
    }
    /// Fisher (excess) kurtosis; 0.0 for a constant signal.
    fn excess_kurtosis(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        self.m4 / (self.m2 * self.m2) - 3.0
    }
}
/// Linear interpolation between closest ranks of an ascending slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
}
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    fn feature(fv: &FeatureVector, axis: usize, name: &str) -> f64 {
        let idx = AXIS_FEATURES.iter().position(|f| *f == name).unwrap();
        fv.features[axis * AXIS_FEATURES.len() + idx]
    }
    #[test]
    fn constant_window_has_zero_spread() {
        let waveform = Array2::from_shape_fn((4, 3), |(_, axis)| if axis == 0 { 1.0 } else { 0.0 });
        let fv = extract_waveform(4, &waveform).unwrap();
        assert_eq!(fv.row().len(), row_len(3));
        assert_eq!(fv.row().len(), 38);
        assert_eq!(fv.row()[0], 4.0);
        assert_eq!(feature(&fv, 0, "std"), 0.0);
        assert_eq!(feature(&fv, 0, "min"), 1.0);
        assert_eq!(feature(&fv, 0, "max"), 1.0);
        assert_eq!(feature(&fv, 0, "ptp"), 0.0);
        assert_eq!(feature(&fv, 0, "kurtosis"), 0.0);
        assert_eq!(feature(&fv, 0, "skewness"), 0.0);
        assert_eq!(feature(&fv, 0, "velocity_std"), 0.0);
        assert!((fv.features.last().unwrap() - 2.0).abs() < 1e-12);
    }
    #[test]
    fn statistics_match_reference_values() {
        // x = [1, 2, 3, 4, 10]
        let waveform = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0], [10.0, 0.0]];
        let fv = extract_waveform(1, &waveform).unwrap();
        assert_eq!(fv.features.len(), 2 * 12 + 1);
        assert!((feature(&fv, 0, "mean") - 4.0).abs() < 1e-12);
        assert!((feature(&fv, 0, "std") - 10.0_f64.sqrt()).abs() < 1e-12);
        // m3 = 180/5, m2 = 10 -> 3.6 / sqrt(10)
        assert!((feature(&fv, 0, "skewness") - 3.6 / 10.0_f64.sqrt()).abs() < 1e-12);
        // m4 = 1394/5 = 278.8 -> 278.8 / 100 - 3
        assert!((feature(&fv, 0, "kurtosis") - (-0.212)).abs() < 1e-12);
        assert_eq!(feature(&fv, 0, "median"), 3.0);
        assert_eq!(feature(&fv, 0, "p25"), 2.0);
        assert_eq!(feature(&fv, 0, "p75"), 4.0);
        assert_eq!(feature(&fv, 0, "ptp"), 9.0);
        // diff = [1, 1, 1, 6]
        assert!((feature(&fv, 0, "velocity_mean") - 2.25).abs() < 1e-12);
        assert!((feature(&fv, 0, "velocity_std") - 4.6875_f64.sqrt()).abs() < 1e-12);
        assert!((fv.features[24] - 130.0_f64.sqrt()).abs() < 1e-12);
    }
    #[test]
    fn percentiles_interpolate_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&sorted, 75.0) - 3.25).abs() < 1e-12);
    }
    #[test]
    fn single_sample_window_is_rejected() {
        let window = LabeledWindow {
            label: "Jumping".into(),
            label_id: 1,
            waveform: Array2::zeros((1, 3)),
        };
        assert!(matches!(
            extract(&window),
            Err(CaptureError::InsufficientWindowData { samples: 1 })
        ));
    }
    #[test]
    fn column_names_line_up_with_rows() {
        let names = column_names(3);
        assert_eq!(names.len(), row_len(3));
        assert_eq!(names[1], "axis0_mean");
        assert_eq!(names[37], "energy");
    }
}

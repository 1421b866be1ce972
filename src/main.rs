// src/main.rs
use std::env;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use log::info;
use motion_trials::recording::{
    capture_stem, load_recording, save_dataset, save_recording, OutputPaths,
};
use motion_trials::{
    acquire, featurize_recording, process, ExperimentConfig, HttpSource, Recording, RunSummary,
    SystemClock, TrialTimeline,
};
/// JSON file overriding the default experiment.
const CONFIG_ENV: &str = "MOTION_TRIALS_CONFIG";
/// Saved recording to re-featurize instead of running a new experiment.
const REPLAY_ENV: &str = "MOTION_TRIALS_REPLAY";
fn load_config() -> Result<ExperimentConfig> {
    match env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            ExperimentConfig::from_json_file(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => {
            let config = ExperimentConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}
fn replay(config: &ExperimentConfig, path: &Path) -> Result<()> {
    let recording = load_recording(path)
        .with_context(|| format!("failed to read recording {}", path.display()))?;
    let (dataset, skipped) = featurize_recording(&recording);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(capture_stem);
    let out = OutputPaths::in_dir(&config.output_dir, &stem);
    save_dataset(&out.dataset, &dataset).context("failed to write dataset")?;
    println!("{}", RunSummary::from_replay(&recording, &dataset, &skipped));
    Ok(())
}
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = load_config()?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("cannot create {}", config.output_dir.display()))?;
    if let Some(path) = env::var_os(REPLAY_ENV) {
        return replay(&config, Path::new(&path));
    }
    let timeline = TrialTimeline::shuffled(
        &config.conditions,
        config.n_trials,
        config.n_windows,
        &mut rand::thread_rng(),
    );
    let source = HttpSource::new(config.device_url(), config.channels.clone(), config.poll_timeout());
    info!(
        "Polling {} ({} trials, buffer for {} samples)",
        source.url(),
        timeline.trials().len(),
        config.buffer_capacity()
    );
    let acquisition = acquire(&config, source, &timeline, &SystemClock);
    let processed = process(&acquisition.buffer, &acquisition.markers, &config);
    let summary = RunSummary::from_run(&acquisition, &processed);
    let stem = capture_stem();
    let out = OutputPaths::in_dir(&config.output_dir, &stem);
    let recording = Recording {
        captured_at: stem,
        sampling_rate: config.sampling_rate,
        windows: processed.windows,
    };
    save_recording(&out.recording, &recording).context("failed to write recording")?;
    save_dataset(&out.dataset, &processed.dataset).context("failed to write dataset")?;
    println!("{summary}");
    if let Some(reason) = summary.aborted {
        bail!("run stopped early: {reason}");
    }
    Ok(())
}

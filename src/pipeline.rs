use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::audio::wav;
use crate::cli::Mode;
use crate::config::Config;
use crate::convert::transcoder::{Profile, Transcoder};
use crate::error::PipelineError;
use crate::progress::{ProgressSink, TerminalProgress};
use crate::recognize::aggregate::TranscriptionResult;
use crate::recognize::google::GoogleSpeechService;
use crate::recognize::operation::{RecognitionRequest, RecognitionService};
use crate::recognize::poller::OperationPoller;
use crate::upload::gcs::GcsBlobStore;
use crate::upload::BlobStore;

const LINE: &str = "\n--------------------\n";

/// What a single invocation produced.
#[derive(Debug)]
pub enum RunReport {
    Converted(PathBuf),
    Transcribed {
        waveform: PathBuf,
        result: TranscriptionResult,
    },
}

pub fn convert(
    config: &Config,
    input: &Path,
    output_hint: Option<&Path>,
    profile: Profile,
) -> Result<PathBuf, PipelineError> {
    Transcoder::new(&config.transcoder).transcode(input, output_hint, profile)
}

/// Upload a WAV file, run recognition on it and wait for the result.
pub fn transcribe(
    config: &Config,
    waveform: &Path,
    store: &dyn BlobStore,
    service: &dyn RecognitionService,
    progress: &mut dyn ProgressSink,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<TranscriptionResult, PipelineError> {
    wav::validate_waveform(waveform)?;

    if let Some(spec) = wav::probe_spec(waveform) {
        if spec.bits_per_sample != 16 {
            tracing::warn!(
                "{} is {}-bit PCM but will be submitted as LINEAR16",
                waveform.display(),
                spec.bits_per_sample
            );
        }
    }
    let sample_rate_hz = wav::resolve_sample_rate(
        waveform,
        config.audio.sample_rate,
        config.audio.default_sample_rate,
    );

    if cancel
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
    {
        tracing::warn!("Cancelled before uploading {}", waveform.display());
        return Err(PipelineError::Cancelled);
    }

    let uri = store.upload(waveform)?;
    tracing::info!("Uploaded {} via {} to {}", waveform.display(), store.name(), uri);

    let request = RecognitionRequest {
        uri,
        sample_rate_hz,
        language_code: config.recognition.language_code.clone(),
    };

    let mut poller = OperationPoller::new(service, config.recognition.poll_interval())
        .with_timeout(config.recognition.timeout());
    if let Some(flag) = cancel {
        poller = poller.with_cancel_flag(flag);
    }
    poller.run(&request, progress)
}

/// Run one invocation against the configured cloud services.
pub fn run(
    config: &Config,
    mode: Mode,
    input: &Path,
    output: Option<&Path>,
    cancel: Arc<AtomicBool>,
) -> Result<RunReport> {
    let waveform = match mode.profile() {
        Some(profile) => convert(config, input, output, profile)?,
        None => input.to_path_buf(),
    };

    if !mode.transcribes() {
        return Ok(RunReport::Converted(waveform));
    }

    // Fail on a bad input before touching credentials.
    wav::validate_waveform(&waveform)?;

    let store = GcsBlobStore::from_config(&config.storage)?;
    let service = GoogleSpeechService::from_config(&config.recognition)?;
    let mut progress = TerminalProgress::stdout(&config.progress).with_labels("Recognizing", "");

    let result = transcribe(
        config,
        &waveform,
        &store,
        &service,
        &mut progress,
        Some(cancel),
    )?;
    Ok(RunReport::Transcribed { waveform, result })
}

/// Human-readable transcript block printed at the end of a run.
pub fn format_report(result: &TranscriptionResult) -> String {
    format!(
        "Transcript: {} {} {} This transcription was made with an average of {:.2} confidence",
        LINE, result.transcript, LINE, result.confidence
    )
}

pub fn save_transcript(path: &Path, result: &TranscriptionResult) -> Result<()> {
    let content = serde_json::to_string_pretty(result)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
    Ok(())
}

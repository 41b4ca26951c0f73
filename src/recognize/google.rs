use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::{resolve_access_token, RecognitionConfig};
use crate::error::{PipelineError, Result};
use crate::recognize::aggregate::TranscriptFragment;
use crate::recognize::operation::{
    CompletionCallback, Operation, Outcome, RecognitionFailure, RecognitionRequest,
    RecognitionService,
};

#[derive(Debug, Serialize)]
struct LongRunningRecognizeRequest<'a> {
    config: RecognitionSettings<'a>,
    audio: AudioSource<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionSettings<'a> {
    encoding: &'a str,
    sample_rate_hertz: u32,
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
struct AudioSource<'a> {
    uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    metadata: Option<OperationMetadata>,
    #[serde(default)]
    response: Option<RecognizeResponse>,
    #[serde(default)]
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationMetadata {
    #[serde(default)]
    progress_percent: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Debug, Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

impl OperationStatus {
    fn progress(&self) -> Option<u8> {
        self.metadata
            .as_ref()
            .and_then(|m| m.progress_percent)
            .map(|p| p.clamp(0, 100) as u8)
    }

    /// `None` while the operation is still running.
    fn into_outcome(self) -> Option<Outcome> {
        if !self.done {
            return None;
        }
        if let Some(error) = self.error {
            return Some(Err(RecognitionFailure {
                code: error.code,
                message: error.message,
            }));
        }
        // Only the top alternative of each result is kept.
        let fragments = self
            .response
            .unwrap_or_default()
            .results
            .into_iter()
            .filter_map(|result| result.alternatives.into_iter().next())
            .map(|alt| TranscriptFragment::new(alt.transcript, alt.confidence))
            .collect();
        Some(Ok(fragments))
    }
}

#[derive(Clone)]
struct SpeechApi {
    endpoint: String,
    access_token: String,
    client: reqwest::blocking::Client,
}

impl SpeechApi {
    fn fetch_operation(&self, name: &str) -> anyhow::Result<OperationStatus> {
        let url = format!("{}/v1/operations/{}", self.endpoint, name);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .context("Failed to fetch operation status")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            anyhow::bail!("Speech API returned HTTP {}: {}", status.as_u16(), body);
        }
        response
            .json()
            .context("Failed to parse operation status")
    }
}

/// Google Cloud Speech-to-Text `longrunningrecognize` over REST.
pub struct GoogleSpeechService {
    api: SpeechApi,
    check_interval: Duration,
}

impl std::fmt::Debug for GoogleSpeechService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechService")
            .field("endpoint", &self.api.endpoint)
            .field("access_token", &"[REDACTED]")
            .field("check_interval", &self.check_interval)
            .finish()
    }
}

impl GoogleSpeechService {
    pub fn from_config(config: &RecognitionConfig) -> anyhow::Result<Self> {
        if config.endpoint.is_empty() {
            anyhow::bail!("Speech endpoint not configured. Set [recognition] endpoint in wavscribe.toml");
        }
        let access_token = resolve_access_token(&config.access_token)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build speech HTTP client")?;

        Ok(Self {
            api: SpeechApi {
                endpoint: config.endpoint.trim_end_matches('/').to_string(),
                access_token,
                client,
            },
            check_interval: Duration::from_millis(config.operation_check_interval_ms),
        })
    }
}

impl RecognitionService for GoogleSpeechService {
    fn name(&self) -> &str {
        "google-speech"
    }

    fn submit(&self, request: &RecognitionRequest) -> Result<Box<dyn Operation>> {
        let url = format!("{}/v1/speech:longrunningrecognize", self.api.endpoint);
        let body = LongRunningRecognizeRequest {
            config: RecognitionSettings {
                encoding: "LINEAR16",
                sample_rate_hertz: request.sample_rate_hz,
                language_code: &request.language_code,
            },
            audio: AudioSource { uri: &request.uri },
        };

        tracing::info!(
            "Submitting {} ({} Hz, {}) for recognition",
            request.uri,
            request.sample_rate_hz,
            request.language_code
        );

        let response = self
            .api
            .client
            .post(&url)
            .bearer_auth(&self.api.access_token)
            .json(&body)
            .send()
            .map_err(|e| PipelineError::RecognitionService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(PipelineError::RecognitionService(format!(
                "Speech API returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let submitted: OperationStatus = response.json().map_err(|e| {
            PipelineError::RecognitionService(format!("unreadable submit response: {}", e))
        })?;

        Ok(Box::new(GoogleOperation {
            name: submitted.name.clone(),
            progress: Arc::new(Mutex::new(submitted.progress())),
            abandoned: Arc::new(AtomicBool::new(false)),
            api: self.api.clone(),
            check_interval: self.check_interval,
        }))
    }
}

struct GoogleOperation {
    name: String,
    progress: Arc<Mutex<Option<u8>>>,
    abandoned: Arc<AtomicBool>,
    api: SpeechApi,
    check_interval: Duration,
}

impl Operation for GoogleOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn progress(&self) -> Option<u8> {
        self.progress.lock().ok().and_then(|p| *p)
    }

    fn on_complete(&mut self, callback: CompletionCallback) {
        let name = self.name.clone();
        let api = self.api.clone();
        let progress = Arc::clone(&self.progress);
        let abandoned = Arc::clone(&self.abandoned);
        let interval = self.check_interval;

        let spawned = std::thread::Builder::new()
            .name("operation-watcher".into())
            .spawn(move || {
                watch_operation(&api, &name, &progress, &abandoned, interval, callback)
            });
        if let Err(e) = spawned {
            // The callback went down with the closure; the poller sees a
            // closed channel.
            tracing::error!("Failed to start operation watcher: {}", e);
        }
    }

    fn abandon(&self) {
        self.abandoned.store(true, Ordering::Relaxed);
    }
}

fn watch_operation(
    api: &SpeechApi,
    name: &str,
    progress: &Mutex<Option<u8>>,
    abandoned: &AtomicBool,
    interval: Duration,
    callback: CompletionCallback,
) {
    loop {
        if abandoned.load(Ordering::Relaxed) {
            tracing::debug!("Stopped watching abandoned operation {}", name);
            return;
        }

        let status = match api.fetch_operation(name) {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Lost track of operation {}: {:?}", name, e);
                callback(Err(RecognitionFailure::new(format!("{:#}", e))));
                return;
            }
        };

        if let Some(percent) = status.progress() {
            if let Ok(mut slot) = progress.lock() {
                *slot = Some(percent);
            }
        }
        if let Some(outcome) = status.into_outcome() {
            callback(outcome);
            return;
        }

        std::thread::sleep(interval);
    }
}

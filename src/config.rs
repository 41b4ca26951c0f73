use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ACCESS_TOKEN_ENV: &str = "WAVSCRIBE_ACCESS_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub transcoder: TranscoderConfig,
    pub recognition: RecognitionConfig,
    pub storage: StorageConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Forces the sample rate sent to the recognizer, skipping the header probe.
    pub sample_rate: Option<u32>,
    /// Used when the WAV header cannot be read.
    pub default_sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    pub program: String,
    pub output_sample_rate: u32,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub language_code: String,
    pub poll_interval_ms: u64,
    /// Absent means wait for the remote operation forever.
    pub timeout_secs: Option<u64>,
    pub endpoint: String,
    pub access_token: String,
    pub operation_check_interval_ms: u64,
}

impl fmt::Debug for RecognitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionConfig")
            .field("language_code", &self.language_code)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("endpoint", &self.endpoint)
            .field("access_token", &"[REDACTED]")
            .field("operation_check_interval_ms", &self.operation_check_interval_ms)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
    pub prefix: String,
    pub endpoint: String,
    pub access_token: String,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("endpoint", &self.endpoint)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Display only.
    pub bar_width: usize,
    pub decimals: usize,
}

// --- Default implementations ---

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: None,
            default_sample_rate: 44100,
        }
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            output_sample_rate: 44100,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language_code: "en-US".to_string(),
            poll_interval_ms: 100,
            timeout_secs: None,
            endpoint: "https://speech.googleapis.com".to_string(),
            access_token: String::new(),
            operation_check_interval_ms: 1000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefix: "wavscribe".to_string(),
            endpoint: "https://storage.googleapis.com".to_string(),
            access_token: String::new(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            bar_width: 100,
            decimals: 1,
        }
    }
}

impl RecognitionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Returns the configured token, falling back to `WAVSCRIBE_ACCESS_TOKEN`.
pub fn resolve_access_token(configured: &str) -> anyhow::Result<String> {
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    std::env::var(ACCESS_TOKEN_ENV).map_err(|_| {
        anyhow::anyhow!(
            "Access token not configured. Set access_token in wavscribe.toml or {}",
            ACCESS_TOKEN_ENV
        )
    })
}

// --- Config loading ---

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Check explicit path
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            let config: Config = toml::from_str(&content)?;
            return Ok((config, Some(p.to_path_buf())));
        }

        // 2. Check beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(p) = exe_path.parent().map(|p| p.join("wavscribe.toml")) {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    let config: Config = toml::from_str(&content)?;
                    return Ok((config, Some(p)));
                }
            }
        }

        // 3. Check platform config directory (e.g. ~/.config/wavscribe/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_config = config_dir.join("wavscribe").join("config.toml");
            if platform_config.exists() {
                let content = std::fs::read_to_string(&platform_config)?;
                let config: Config = toml::from_str(&content)?;
                return Ok((config, Some(platform_config)));
            }
        }

        // 4. Fall back to defaults
        tracing::info!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        r#"# wavscribe configuration

[audio]
# Sample rate reported to the recognizer. When unset, it is read from the
# WAV header, falling back to default_sample_rate if the header is unreadable.
# sample_rate = 16000
default_sample_rate = 44100

[transcoder]
# External program used to extract mono PCM audio from media files.
program = "ffmpeg"
# Sample rate of converted WAV files.
output_sample_rate = 44100

[recognition]
# Recognition locale.
language_code = "en-US"
# How often (in milliseconds) the progress bar is refreshed while waiting.
poll_interval_ms = 100
# Give up after this many seconds. Leave unset to wait until the job finishes.
# timeout_secs = 3600
# Speech API base URL.
endpoint = "https://speech.googleapis.com"
# OAuth access token (or set WAVSCRIBE_ACCESS_TOKEN environment variable).
# access_token = ""
# How often (in milliseconds) the remote operation status is fetched.
operation_check_interval_ms = 1000

[storage]
# Bucket that receives uploaded WAV files. Required for transcription.
# bucket = "my-audio-bucket"
# Object name prefix inside the bucket.
prefix = "wavscribe"
# Storage API base URL.
endpoint = "https://storage.googleapis.com"
# OAuth access token (or set WAVSCRIBE_ACCESS_TOKEN environment variable).
# access_token = ""

[progress]
# Character width of the terminal progress bar.
bar_width = 100
# Decimal places shown for the percentage.
decimals = 1
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.audio.sample_rate, None);
        assert_eq!(config.audio.default_sample_rate, 44100);
        assert_eq!(config.transcoder.program, "ffmpeg");
        assert_eq!(config.transcoder.output_sample_rate, 44100);
        assert_eq!(config.recognition.language_code, "en-US");
        assert_eq!(config.recognition.poll_interval_ms, 100);
        assert!(config.recognition.timeout_secs.is_none());
        assert_eq!(config.progress.bar_width, 100);
        assert_eq!(config.storage.prefix, "wavscribe");
    }

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_str = r#"
            [audio]
            sample_rate = 16000

            [recognition]
            language_code = "de-DE"
            timeout_secs = 600
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.audio.sample_rate, Some(16000));
        assert_eq!(config.recognition.language_code, "de-DE");
        assert_eq!(config.recognition.timeout(), Some(Duration::from_secs(600)));
        // Defaults still applied for unspecified fields
        assert_eq!(config.audio.default_sample_rate, 44100);
        assert_eq!(config.recognition.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.transcoder.program, "ffmpeg");
    }

    #[test]
    fn test_load_nonexistent_path_errors() {
        let result = Config::load(Some(Path::new("/nonexistent/wavscribe.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_path_returns_resolved_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config_file = tmp.path().join("wavscribe.toml");
        std::fs::write(&config_file, "[storage]\nbucket = \"clips\"\n").unwrap();

        let (config, resolved) = Config::load_with_path(Some(config_file.as_path())).unwrap();
        assert_eq!(config.storage.bucket, "clips");
        assert_eq!(resolved, Some(config_file));
    }

    #[test]
    fn test_generate_default_commented_is_valid_toml() {
        let content = Config::generate_default_commented();
        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.audio.default_sample_rate, 44100);
        assert_eq!(config.recognition.language_code, "en-US");
        assert_eq!(config.recognition.operation_check_interval_ms, 1000);
        assert_eq!(config.progress.decimals, 1);
        assert!(content.contains("[storage]"));
        assert!(content.contains("[progress]"));
    }

    #[test]
    fn test_debug_redacts_access_tokens() {
        let mut config = Config::default();
        config.recognition.access_token = "speech-secret".to_string();
        config.storage.access_token = "storage-secret".to_string();
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("speech-secret"));
        assert!(!debug_output.contains("storage-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_resolve_access_token_prefers_configured() {
        assert_eq!(resolve_access_token("abc").unwrap(), "abc");
    }
}

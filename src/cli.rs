use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;
use crate::convert::transcoder::Profile;

#[derive(Parser, Debug)]
#[command(
    name = "wavscribe",
    version,
    about = "Convert media to mono WAV and transcribe it with a long-running cloud recognition job"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Media or WAV file to process
    #[arg(short, long, required_unless_present = "print_config")]
    pub input: Option<PathBuf>,

    /// What to do with the input
    #[arg(short, long, value_enum, default_value_t = Mode::Transcribe)]
    pub mode: Mode,

    /// Desired WAV output path for conversions (a numeric suffix is added if taken)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the transcript as JSON to this path
    #[arg(long)]
    pub save_transcript: Option<PathBuf>,

    /// Sample rate reported to the recognizer, instead of the WAV header value
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Recognition locale (e.g. en-US)
    #[arg(long)]
    pub language_code: Option<String>,

    /// Progress refresh interval while waiting for recognition
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Stop waiting for recognition after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print a commented default config file and exit
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Transcribe an existing .wav file
    Transcribe,
    /// Extract 16-bit mono WAV from a video file
    ConvertVideo,
    /// Convert an audio file to 8-bit mono WAV
    ConvertAudio,
    /// Extract 16-bit mono WAV from a video file, then transcribe it
    ConvertAndTranscribe,
}

impl Mode {
    /// Conversion profile applied before transcription, if any.
    pub fn profile(&self) -> Option<Profile> {
        match self {
            Mode::Transcribe => None,
            Mode::ConvertVideo | Mode::ConvertAndTranscribe => Some(Profile::VideoSource),
            Mode::ConvertAudio => Some(Profile::AudioSource),
        }
    }

    pub fn transcribes(&self) -> bool {
        matches!(self, Mode::Transcribe | Mode::ConvertAndTranscribe)
    }
}

impl Cli {
    /// Command-line values take precedence over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(rate) = self.sample_rate {
            config.audio.sample_rate = Some(rate);
        }
        if let Some(code) = &self.language_code {
            config.recognition.language_code = code.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.recognition.poll_interval_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.recognition.timeout_secs = Some(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_profiles() {
        assert_eq!(Mode::Transcribe.profile(), None);
        assert_eq!(Mode::ConvertVideo.profile(), Some(Profile::VideoSource));
        assert_eq!(Mode::ConvertAudio.profile(), Some(Profile::AudioSource));
        assert_eq!(Mode::ConvertAndTranscribe.profile(), Some(Profile::VideoSource));
        assert!(Mode::Transcribe.transcribes());
        assert!(Mode::ConvertAndTranscribe.transcribes());
        assert!(!Mode::ConvertVideo.transcribes());
        assert!(!Mode::ConvertAudio.transcribes());
    }

    #[test]
    fn test_defaults_to_transcribe() {
        let cli = Cli::try_parse_from(["wavscribe", "--input", "output.wav"]).unwrap();
        assert_eq!(cli.mode, Mode::Transcribe);
        assert_eq!(cli.input, Some(PathBuf::from("output.wav")));
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_parses_kebab_case_modes() {
        let cli = Cli::try_parse_from([
            "wavscribe",
            "-i",
            "talk.mp4",
            "--mode",
            "convert-and-transcribe",
            "-o",
            "talk.wav",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::ConvertAndTranscribe);
        assert_eq!(cli.output, Some(PathBuf::from("talk.wav")));

        let cli =
            Cli::try_parse_from(["wavscribe", "-i", "song.mp3", "-m", "convert-audio"]).unwrap();
        assert_eq!(cli.mode, Mode::ConvertAudio);
    }

    #[test]
    fn test_input_required_unless_printing_config() {
        assert!(Cli::try_parse_from(["wavscribe"]).is_err());
        let cli = Cli::try_parse_from(["wavscribe", "--print-config"]).unwrap();
        assert!(cli.print_config);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["wavscribe", "-i", "a.wav", "--mode", "stream"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::try_parse_from([
            "wavscribe",
            "-i",
            "a.wav",
            "--sample-rate",
            "16000",
            "--language-code",
            "fr-FR",
            "--poll-interval-ms",
            "250",
            "--timeout-secs",
            "90",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.audio.sample_rate, Some(16000));
        assert_eq!(config.recognition.language_code, "fr-FR");
        assert_eq!(config.recognition.poll_interval_ms, 250);
        assert_eq!(config.recognition.timeout_secs, Some(90));
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let cli = Cli::try_parse_from(["wavscribe", "-i", "a.wav"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.audio.sample_rate, None);
        assert_eq!(config.recognition.language_code, "en-US");
        assert!(config.recognition.timeout_secs.is_none());
    }
}

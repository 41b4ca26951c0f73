use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::TranscoderConfig;
use crate::convert::naming::derive_unique_path;
use crate::error::{PipelineError, Result};

/// Fixed PCM parameters applied to a conversion. Both profiles drop the video
/// stream and downmix to mono.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// 16-bit signed little-endian PCM.
    VideoSource,
    /// 8-bit unsigned PCM.
    AudioSource,
}

impl Profile {
    pub fn codec(&self) -> &'static str {
        match self {
            Self::VideoSource => "pcm_s16le",
            Self::AudioSource => "pcm_u8",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VideoSource => write!(f, "video-source"),
            Self::AudioSource => write!(f, "audio-source"),
        }
    }
}

pub struct Transcoder {
    program: String,
    sample_rate: u32,
}

impl Transcoder {
    pub fn new(config: &TranscoderConfig) -> Self {
        Self {
            program: config.program.clone(),
            sample_rate: config.output_sample_rate,
        }
    }

    fn arguments(&self, input: &Path, output: &Path, profile: Profile) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = Vec::with_capacity(10);
        args.push("-i".into());
        args.push(input.as_os_str().to_owned());
        args.push("-vn".into());
        args.push("-acodec".into());
        args.push(profile.codec().into());
        args.push("-ar".into());
        args.push(self.sample_rate.to_string().into());
        args.push("-ac".into());
        args.push("1".into());
        args.push(output.as_os_str().to_owned());
        args
    }

    /// Convert `input` to a mono WAV file and return the path actually written.
    ///
    /// Without an `output_hint` the input path itself is the hint, so the
    /// result lands next to the input as `<stem>1.wav`.
    pub fn transcode(
        &self,
        input: &Path,
        output_hint: Option<&Path>,
        profile: Profile,
    ) -> Result<PathBuf> {
        if !input.is_file() {
            return Err(PipelineError::FileNotFound(input.to_path_buf()));
        }

        let output = derive_unique_path(output_hint.unwrap_or(input));
        tracing::info!(
            "Converting {} -> {} ({})",
            input.display(),
            output.display(),
            profile
        );

        let status = Command::new(&self.program)
            .args(self.arguments(input, &output, profile))
            .stdin(Stdio::null())
            .status()
            .map_err(|source| PipelineError::TranscoderLaunch {
                tool: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(PipelineError::TranscodeFailure {
                tool: self.program.clone(),
                input: input.to_path_buf(),
                status: status.to_string(),
            });
        }

        tracing::debug!("{} finished for {}", self.program, input.display());
        Ok(output)
    }
}

use std::io::Write;

use crate::config::ProgressConfig;

/// Receives percent-complete updates while a job runs.
pub trait ProgressSink {
    fn update(&mut self, percent: u8);
}

/// Single-line terminal bar, redrawn in place with `\r`.
pub struct TerminalProgress<W: Write> {
    out: W,
    width: usize,
    decimals: usize,
    prefix: String,
    suffix: String,
}

impl TerminalProgress<std::io::Stdout> {
    pub fn stdout(config: &ProgressConfig) -> Self {
        Self::new(std::io::stdout(), config)
    }
}

impl<W: Write> TerminalProgress<W> {
    pub fn new(out: W, config: &ProgressConfig) -> Self {
        Self {
            out,
            width: config.bar_width,
            decimals: config.decimals,
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    pub fn with_labels(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&self, percent: u8) -> String {
        let percent = percent.min(100);
        let filled = (self.width as f64 * percent as f64 / 100.0).round() as usize;
        let bar = format!("{}{}", "█".repeat(filled), "-".repeat(self.width - filled));
        format!(
            "\r{} |{}| {:.*}% {}",
            self.prefix, bar, self.decimals, percent as f64, self.suffix
        )
    }
}

impl<W: Write> ProgressSink for TerminalProgress<W> {
    fn update(&mut self, percent: u8) {
        let mut line = self.render(percent);
        if percent >= 100 {
            line.push('\n');
        }
        // A broken terminal must not abort the job.
        if let Err(e) = self
            .out
            .write_all(line.as_bytes())
            .and_then(|_| self.out.flush())
        {
            tracing::debug!("Progress output failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(width: usize) -> TerminalProgress<Vec<u8>> {
        TerminalProgress::new(
            Vec::new(),
            &ProgressConfig {
                bar_width: width,
                decimals: 1,
            },
        )
    }

    #[test]
    fn test_render_half() {
        let line = bar(10).render(50);
        assert_eq!(line, "\r |█████-----| 50.0% ");
    }

    #[test]
    fn test_render_with_labels() {
        let line = bar(4).with_labels("Processing", "done").render(25);
        assert_eq!(line, "\rProcessing |█---| 25.0% done");
    }

    #[test]
    fn test_complete_bar_ends_line() {
        let mut progress = bar(4);
        progress.update(30);
        progress.update(100);
        let out = String::from_utf8(progress.into_inner()).unwrap();
        assert!(out.ends_with("|████| 100.0% \n"));
        assert_eq!(out.matches('\n').count(), 1);
    }

    #[test]
    fn test_over_hundred_is_clamped() {
        let line = bar(2).render(250);
        assert!(line.contains("100.0%"));
        assert!(line.contains("|██|"));
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use wavscribe::cli::Cli;
use wavscribe::config::Config;
use wavscribe::pipeline::{self, RunReport};

fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for the progress bar and transcript.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wavscribe=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    if cli.print_config {
        print!("{}", Config::generate_default_commented());
        return Ok(());
    }

    let (mut config, config_path) = Config::load_with_path(cli.config.as_deref())?;
    if let Some(path) = &config_path {
        tracing::info!("Loaded config from {}", path.display());
    }
    cli.apply_overrides(&mut config);

    let input = cli.input.as_deref().context("--input is required")?;

    // First Ctrl+C stops the recognition wait; a second one exits immediately.
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_ctrlc = cancel.clone();
    ctrlc::set_handler(move || {
        if cancel_ctrlc.swap(true, Ordering::Relaxed) {
            std::process::exit(130);
        }
        tracing::info!("Interrupt received, cancelling (press Ctrl+C again to abort)");
    })?;

    match pipeline::run(&config, cli.mode, input, cli.output.as_deref(), cancel)? {
        RunReport::Converted(path) => {
            tracing::info!("Converted {} -> {}", input.display(), path.display());
            println!("{}", path.display());
        }
        RunReport::Transcribed { waveform, result } => {
            tracing::info!(
                "Transcribed {} ({} fragments)",
                waveform.display(),
                result.fragments
            );
            println!("{}", pipeline::format_report(&result));
            if let Some(path) = &cli.save_transcript {
                pipeline::save_transcript(path, &result)?;
                tracing::info!("Saved transcript to {}", path.display());
            }
        }
    }

    Ok(())
}

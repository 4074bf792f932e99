//! Extract command implementation.

use super::{load_config, open_source};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use quarry_core::{CancellationToken, MediaType};
use quarry_ingest::{validate_source, Ingestor};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

const PROGRESS_STEPS: u64 = 1000;

/// Machine-readable result printed with `--json`.
#[derive(Debug, Serialize)]
struct ExtractReport<'a> {
    path: String,
    media_type: &'a str,
    chars: usize,
    words: usize,
    text: &'a str,
}

impl<'a> ExtractReport<'a> {
    fn new(path: &Path, media_type: MediaType, text: &'a str) -> Self {
        Self {
            path: path.display().to_string(),
            media_type: media_type.mime(),
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
            text,
        }
    }
}

/// Extract the text of a single document.
pub fn run(
    path: &Path,
    media_type: Option<String>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config()?;
    let source = open_source(path, media_type.as_deref())?;
    let media_type = validate_source(&source, config.ingest.max_file_size_bytes())?;
    let ingestor = Ingestor::from_config(&config)?;

    let pb = ProgressBar::new(PROGRESS_STEPS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Extracting {}", path.display()));

    let bar = pb.clone();
    let result = run_interruptible(|cancel| async move {
        ingestor
            .ingest(
                source,
                move |fraction| bar.set_position((fraction * PROGRESS_STEPS as f64) as u64),
                &cancel,
            )
            .await
    })?;

    let text = match result {
        Ok(text) => {
            pb.finish_and_clear();
            text
        }
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };

    if text.is_empty() {
        eprintln!(
            "{} No extractable text in {}",
            "Note:".yellow(),
            path.display()
        );
    }

    let rendered = if json {
        serde_json::to_string_pretty(&ExtractReport::new(path, media_type, &text))?
    } else {
        text
    };

    match output {
        Some(out) => {
            std::fs::write(&out, &rendered)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!(
                "{} Wrote {} characters to {}",
                "✓".green(),
                rendered.chars().count(),
                out.display()
            );
        }
        None if rendered.is_empty() => {}
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Run `task` on a fresh runtime, raising its token on Ctrl-C.
///
/// The runtime is shut down without waiting on blocking work, so an
/// extraction abandoned after cancellation does not keep the process alive.
fn run_interruptible<T, F, Fut>(task: F) -> Result<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = T>,
{
    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let cancel = CancellationToken::new();

    let output = rt.block_on(async {
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    debug!("Interrupt received, cancelling");
                    cancel.cancel();
                }
            })
        };

        let output = task(cancel).await;
        interrupt.abort();
        output
    });

    rt.shutdown_background();
    Ok(output)
}

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use watch_core::{MigrationOutcome, MigrationProgress};

/// Progress display for a migration run.
///
/// Draws a bar on a terminal; otherwise emits one structured log line per item.
pub struct MigrateUI {
    bar: ProgressBar,
    interactive: bool,
}

impl MigrateUI {
    pub fn new() -> Self {
        let interactive = is_interactive();
        let bar = if interactive {
            ProgressBar::new(0)
        } else {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bar disabled, using structured logging"
            );
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        bar.set_message("Starting migration...");

        Self { bar, interactive }
    }

    /// Callback for `MigrationEngine::with_progress`
    pub fn observer(&self) -> impl Fn(&MigrationProgress) + Send + Sync + 'static {
        let bar = self.bar.clone();
        let interactive = self.interactive;
        move |progress| {
            if interactive {
                bar.set_length(progress.total as u64);
                bar.set_position(progress.current as u64);
                let marker = match progress.outcome {
                    MigrationOutcome::Updated => "updated",
                    MigrationOutcome::Skipped => "skipped",
                    MigrationOutcome::Failed => "FAILED",
                };
                bar.set_message(format!("{} ({})", progress.title, marker));
            } else {
                tracing::info!(
                    operation = "progress",
                    current = progress.current,
                    total = progress.total,
                    title = %progress.title,
                    outcome = %progress.outcome,
                    "Migration progress update"
                );
            }
        }
    }

    pub fn finish(&self) {
        if self.interactive {
            self.bar.finish_with_message("Done");
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

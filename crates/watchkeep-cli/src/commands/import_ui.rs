use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use watch_state_models::{ImportClassification, ImportOutcome};

/// Progress bar for an import run; falls back to structured logs off a terminal.
pub struct ImportUi {
    bar: Option<ProgressBar>,
    total: usize,
}

impl ImportUi {
    pub fn new(total: usize, quiet: bool) -> Self {
        let bar = (is_interactive() && !quiet).then(|| {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
            }
            bar.set_message("Reconciling...");
            bar
        });
        if bar.is_none() {
            tracing::info!(
                operation = "import_ui",
                mode = "non_interactive",
                total = total,
                "Progress bar disabled"
            );
        }
        Self { bar, total }
    }

    pub fn record(&self, index: usize, outcome: &ImportOutcome) {
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                if outcome.classification() != ImportClassification::Success {
                    bar.set_message(format!("#{} {}", index + 1, outcome.classification()));
                }
            }
            None => tracing::debug!(
                operation = "import_progress",
                current = index + 1,
                total = self.total,
                outcome = %outcome.classification(),
                "Entry reconciled"
            ),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

//! Progress spinner for long-running walks
//!
//! The walk has no known total up front, so progress is an indeterminate
//! spinner with a running object count. In quiet or JSON mode the spinner is
//! suppressed and record lines are printed plainly.

use super::OutputConfig;

/// Spinner shown while the walker is running
#[derive(Debug)]
pub struct ProgressSpinner {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressSpinner {
    /// Create a spinner, suppressed in quiet/JSON/no-progress modes
    pub fn new(config: &OutputConfig, message: &str) -> Self {
        let bar = if config.quiet || config.json || config.no_progress {
            None
        } else {
            let bar = indicatif::ProgressBar::new_spinner();
            bar.set_style(
                indicatif::ProgressStyle::default_spinner()
                    .template("{spinner:.green} {pos} objects {msg}")
                    .expect("valid template"),
            );
            bar.set_message(message.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(bar)
        };

        Self { bar }
    }

    /// Count one discovered object
    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Print a line without garbling the spinner redraw
    pub fn println(&self, message: &str) {
        match &self.bar {
            Some(bar) => bar.println(message),
            None => println!("{message}"),
        }
    }

    /// Remove the spinner once the walk is done
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

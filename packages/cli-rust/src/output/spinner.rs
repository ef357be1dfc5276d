//! Spinner shown while tunnels open and hosts answer

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK_CHARS: &str = "\u{28CB}\u{2819}\u{2839}\u{2838}\u{283C}\u{2834}\u{2826}\u{2827}\u{2807}\u{280F}";

/// Spinner with elapsed time, silent in quiet mode
///
/// Waiting on a forwarder can take the whole readiness timeout, so the
/// elapsed time is shown next to the message.
pub struct CommandSpinner {
    bar: Option<ProgressBar>,
}

impl CommandSpinner {
    /// Start ticking with `message`, or do nothing at all when `quiet`
    pub fn new_maybe(message: &str, quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }

        let style = ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed:.dim})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS);
        let bar = ProgressBar::new_spinner().with_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    /// Leave a green check and `message`
    pub fn success(self, message: &str) {
        self.finish(format!("{} {message}", style("\u{2713}").green()));
    }

    /// Leave a red cross and `message`
    pub fn fail(self, message: &str) {
        self.finish(format!("{} {message}", style("\u{2717}").red()));
    }

    /// Erase the spinner line so ssh gets a clean terminal
    pub fn clear(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }

    fn finish(self, line: String) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(line);
        }
    }
}

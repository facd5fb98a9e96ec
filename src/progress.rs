//! Terminal progress on stderr
//!
//! A hidden indicatif bar stands in whenever progress is turned off (quiet
//! mode, JSON output, or stderr not a terminal), so callers never branch.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const STEPS_TEMPLATE: &str = "{spinner:.cyan} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg:.dim}";
const TICK: Duration = Duration::from_millis(100);

pub struct Progress {
    visible: bool,
    bar: ProgressBar,
}

impl Progress {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            bar: ProgressBar::hidden(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.visible
    }

    /// Replace the current display with a spinner
    pub fn spinner(&mut self, message: &str) {
        self.replace(ProgressBar::new_spinner(), SPINNER_TEMPLATE);
        self.bar.set_message(message.to_string());
    }

    /// Replace the current display with a bar of `total` steps
    pub fn start_steps(&mut self, total: u64, title: &str) {
        self.replace(ProgressBar::new(total), STEPS_TEMPLATE);
        self.bar.set_prefix(title.to_string());
    }

    /// Label the step in progress
    pub fn step(&self, label: &str) {
        self.bar.set_message(label.to_string());
    }

    pub fn advance(&self) {
        self.bar.inc(1);
    }

    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    fn replace(&mut self, bar: ProgressBar, template: &str) {
        self.bar.finish_and_clear();
        if !self.visible {
            return;
        }
        // Templates are constants; a parse failure keeps indicatif's default.
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style.progress_chars("█▓░"));
        }
        bar.enable_steady_tick(TICK);
        self.bar = bar;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_progress_stays_hidden() {
        let mut progress = Progress::disabled();
        assert!(!progress.is_enabled());

        progress.start_steps(3, "Running image tests");
        progress.step("runtime");
        progress.advance();
        assert!(progress.bar.is_hidden());
        progress.clear();
    }

    #[test]
    fn test_steps_count_advances() {
        let mut progress = Progress::new(true);
        progress.start_steps(2, "Running image tests");
        progress.step("sdk");
        progress.advance();
        assert_eq!(progress.bar.position(), 1);
        assert_eq!(progress.bar.length(), Some(2));
        progress.clear();
        progress.clear();
    }

    #[test]
    fn test_spinner_replaces_bar() {
        let mut progress = Progress::new(true);
        progress.start_steps(5, "steps");
        progress.spinner("Resolving manifest.versions.json");
        assert_eq!(progress.bar.length(), None);
        progress.clear();
    }
}

//! Observers for live process output

/// Receives process output one line at a time, as it is produced
pub trait OutputObserver: Send + Sync {
    /// Called for each stdout line
    fn on_stdout(&self, line: &str);

    /// Called for each stderr line
    fn on_stderr(&self, line: &str);
}

/// Observer that discards output
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl OutputObserver for NullObserver {
    fn on_stdout(&self, _line: &str) {}

    fn on_stderr(&self, _line: &str) {}
}

/// Observer that forwards each line as a tracing event
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    /// Create an observer tagging events with `label`
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl OutputObserver for TracingObserver {
    fn on_stdout(&self, line: &str) {
        tracing::info!(target: "image_harness::output", source = %self.label, "{}", line);
    }

    fn on_stderr(&self, line: &str) {
        tracing::info!(target: "image_harness::output", source = %self.label, stream = "stderr", "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observers_accept_lines() {
        let observers: Vec<Box<dyn OutputObserver>> =
            vec![Box::new(NullObserver), Box::new(TracingObserver::new("docker"))];
        for observer in &observers {
            observer.on_stdout("Step 1/4");
            observer.on_stderr("warning");
        }
    }
}

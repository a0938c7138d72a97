//! Output sinks: where diagnostics and verbose step lines go.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use flowcheck_core::OutputSink;

/// Writes each line to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&mut self, line: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(err) = writeln!(out, "{line}") {
            tracing::warn!("Failed to write to stdout: {err}");
        }
    }
}

/// Captures lines in memory.
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to a `FlowRunner`.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return all captured lines.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl OutputSink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_sink_writes_lines() {
        let mut sink = StdoutSink;
        sink.write_line("transition seed: ok");
        sink.write_line("");
    }

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write_line("first");
        writer.write_line("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn memory_sink_take_drains() {
        let mut sink = MemorySink::new();
        sink.write_line("only");
        assert_eq!(sink.take(), vec!["only"]);
        assert!(sink.lines().is_empty());
    }
}

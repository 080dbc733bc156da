// src/engine/queue.rs

use tracing::debug;

use super::FlushReport;

/// Ordered commands waiting for the engine to become ready.
///
/// Semantics:
/// - Commands are handed out exactly once, in declaration order, by
///   [`CommandQueue::begin_flush`].
/// - The result of the write is recorded with [`CommandQueue::record_flush`],
///   so callers can tell how many commands actually reached the engine (zero
///   when the engine exited before readiness).
#[derive(Debug, Clone)]
pub struct CommandQueue {
    commands: Vec<String>,
    flush_started: bool,
    flushed: usize,
    stdin_closed: bool,
}

impl CommandQueue {
    pub fn new(commands: Vec<String>) -> Self {
        Self {
            commands,
            flush_started: false,
            flushed: 0,
            stdin_closed: false,
        }
    }

    /// Start the one and only flush. Returns `None` if it already started.
    pub fn begin_flush(&mut self) -> Option<Vec<String>> {
        if self.flush_started {
            debug!("command queue already flushed; ignoring");
            return None;
        }
        self.flush_started = true;
        Some(self.commands.clone())
    }

    pub fn record_flush(&mut self, report: FlushReport) {
        self.flushed = report.written.min(self.commands.len());
        self.stdin_closed = report.stdin_closed;
    }

    pub fn flush_started(&self) -> bool {
        self.flush_started
    }

    /// Commands confirmed written to stdin.
    pub fn flushed(&self) -> usize {
        self.flushed
    }

    /// Commands that never reached the engine.
    pub fn unsent(&self) -> usize {
        self.commands.len() - self.flushed
    }

    pub fn stdin_closed(&self) -> bool {
        self.stdin_closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_hands_out_commands_once_in_order() {
        let mut q = CommandQueue::new(vec!["a".into(), "b".into()]);
        assert_eq!(q.unsent(), 2);

        assert_eq!(q.begin_flush(), Some(vec!["a".to_string(), "b".to_string()]));
        assert!(q.begin_flush().is_none());

        q.record_flush(FlushReport {
            written: 2,
            stdin_closed: true,
        });
        assert_eq!(q.flushed(), 2);
        assert_eq!(q.unsent(), 0);
        assert!(q.stdin_closed());
    }

    #[test]
    fn partial_flush_is_recorded() {
        let mut q = CommandQueue::new(vec!["a".into(), "b".into(), "c".into()]);
        q.begin_flush();
        q.record_flush(FlushReport {
            written: 1,
            stdin_closed: true,
        });
        assert_eq!(q.flushed(), 1);
        assert_eq!(q.unsent(), 2);
    }
}

use std::sync::{Arc, Mutex};
use std::time::Instant;

use engine_supervisor::exec::{CommandSink, SinkFuture, WriteError};

/// One operation observed by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    /// A command line, including its `\n` terminator.
    Write(String),
    Close,
}

/// A sink operation with the moment it happened.
#[derive(Debug, Clone)]
pub struct SinkRecord {
    pub op: SinkOp,
    pub at: Instant,
}

/// A fake engine stdin that:
/// - records every write and close, with timestamps
/// - behaves like a real pipe after close (`WriteError::Closed`)
/// - can simulate the engine going away after `fail_after` writes
/// - can simulate an engine that stops reading (`stall_after`), leaving the
///   next write pending forever like a full pipe.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<SinkRecord>>>,
    closed: bool,
    fail_after: Option<usize>,
    stall_after: Option<usize>,
    writes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            closed: false,
            fail_after: None,
            stall_after: None,
            writes: 0,
        }
    }

    /// Fail every write after the first `n` with a broken-pipe error.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Block every write after the first `n` forever.
    pub fn stalling_after(mut self, n: usize) -> Self {
        self.stall_after = Some(n);
        self
    }

    /// Shared handle to the records; stays valid after the sink is moved.
    pub fn records(&self) -> Arc<Mutex<Vec<SinkRecord>>> {
        Arc::clone(&self.records)
    }

    fn push(&self, op: SinkOp) {
        let mut guard = self.records.lock().unwrap();
        guard.push(SinkRecord {
            op,
            at: Instant::now(),
        });
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSink for RecordingSink {
    fn write_line<'a>(&'a mut self, command: &'a str) -> SinkFuture<'a> {
        Box::pin(async move {
            if self.closed {
                return Err(WriteError::Closed);
            }
            if self.fail_after.is_some_and(|n| self.writes >= n) {
                return Err(WriteError::TargetGone(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                )));
            }
            if self.stall_after.is_some_and(|n| self.writes >= n) {
                std::future::pending::<()>().await;
            }
            self.writes += 1;
            self.push(SinkOp::Write(format!("{command}\n")));
            Ok(())
        })
    }

    fn close(&mut self) -> SinkFuture<'_> {
        Box::pin(async move {
            if self.closed {
                return Err(WriteError::Closed);
            }
            self.closed = true;
            self.push(SinkOp::Close);
            Ok(())
        })
    }
}

/// Just the operations, without timestamps.
pub fn ops(records: &Arc<Mutex<Vec<SinkRecord>>>) -> Vec<SinkOp> {
    records.lock().unwrap().iter().map(|r| r.op.clone()).collect()
}

//! Runs one relational load off the calling thread.
//!
//! The worker owns its own copy of the source and sends exactly one result
//! over a channel. The caller polls on a fixed interval so it can keep its own
//! loop (progress output, input handling) running, then installs the dataset
//! itself; the worker never touches the coordinator.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::db::RelationalSource;
use crate::error::{Result, SourceError};
use crate::models::Dataset;

/// Interval used by [`PendingLoad::wait_default`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a single poll.
#[derive(Debug)]
pub enum Poll {
    Pending,
    Ready(Result<Dataset>),
}

/// Handle to an in-flight load. No cancellation: once spawned, the worker
/// runs to completion.
#[derive(Debug)]
pub struct PendingLoad {
    receiver: Receiver<Result<Dataset>>,
    worker: Option<JoinHandle<()>>,
    finished: bool,
}

/// Start loading `source` on a new thread.
pub fn spawn_load(source: RelationalSource) -> PendingLoad {
    let (sender, receiver) = mpsc::channel();
    let worker = thread::spawn(move || {
        debug!(table = %source.params().qualified_table(), "background load started");
        let result = source.load_dataset();
        // The receiver may already be gone if the caller gave up; nothing to do then.
        let _ = sender.send(result);
    });

    PendingLoad {
        receiver,
        worker: Some(worker),
        finished: false,
    }
}

impl PendingLoad {
    /// Check for a result without blocking. `Ready` is returned at most once;
    /// polls after that report `WorkerLost`.
    pub fn poll(&mut self) -> Poll {
        if self.finished {
            return Poll::Ready(Err(SourceError::WorkerLost));
        }

        match self.receiver.try_recv() {
            Ok(result) => {
                self.finish();
                Poll::Ready(result)
            }
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => {
                warn!("background load ended without sending a result");
                self.finish();
                Poll::Ready(Err(SourceError::WorkerLost))
            }
        }
    }

    /// Poll every `interval`, calling `on_tick` between polls, until the
    /// worker reports.
    pub fn wait(mut self, interval: Duration, mut on_tick: impl FnMut()) -> Result<Dataset> {
        loop {
            match self.poll() {
                Poll::Ready(result) => return result,
                Poll::Pending => {
                    on_tick();
                    thread::sleep(interval);
                }
            }
        }
    }

    pub fn wait_default(self, on_tick: impl FnMut()) -> Result<Dataset> {
        self.wait(DEFAULT_POLL_INTERVAL, on_tick)
    }

    fn finish(&mut self) {
        self.finished = true;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("background load thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{ConnectionParams, TableSchema};
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn delivers_the_dataset_once() {
        let dir = TempDir::new().unwrap();
        let host = dir.path().to_string_lossy().into_owned();
        let source = RelationalSource::new(ConnectionParams::new(host, "u", "p", "s", "t"));
        source
            .create_table(&TableSchema::all_text(&strings(&["a", "b"])))
            .unwrap();
        source.insert_records(&[strings(&["1", "2"])]).unwrap();

        let mut pending = spawn_load(source);
        let dataset = loop {
            match pending.poll() {
                Poll::Ready(result) => break result.unwrap(),
                Poll::Pending => thread::sleep(Duration::from_millis(5)),
            }
        };
        assert_eq!(dataset.header, strings(&["a", "b"]));
        assert_eq!(dataset.rows, vec![strings(&["1", "2"])]);

        match pending.poll() {
            Poll::Ready(Err(SourceError::WorkerLost)) => {}
            other => panic!("expected WorkerLost after completion, got {other:?}"),
        }
    }

    #[test]
    fn errors_reach_the_poller() {
        let dir = TempDir::new().unwrap();
        let host = dir.path().to_string_lossy().into_owned();
        let source = RelationalSource::new(ConnectionParams::new(host, "u", "p", "none", "t"));

        let err = spawn_load(source)
            .wait(Duration::from_millis(1), || {})
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
    }
}

//! Background inversion runs reporting back over a channel.
//!
//! A run owns its input and output documents for its whole lifetime. The
//! only thing that crosses the thread boundary is [`WorkerEvent`]s, sent
//! without blocking; the receiving side decides when to look at them.

use crate::error::InvertError;
use crate::file_ops::invert_pdf_file;
use crate::{InvertOptions, ProgressEvent};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// One input file and where its inverted copy goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct InvertSummary {
    pub page_count: usize,
    pub elapsed: Duration,
    pub output: PathBuf,
}

/// Messages from a worker to whoever launched it.
///
/// A run sends zero or more `Progress` events followed by exactly one
/// `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress(ProgressEvent),
    Completed(InvertSummary),
    Failed(InvertError),
}

impl WorkerEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerEvent::Progress(_))
    }
}

/// The launching side of a running worker.
pub struct WorkerHandle {
    events: Receiver<WorkerEvent>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Wait for the thread to exit. Only call after a terminal event.
    pub fn join(self) {
        if self.thread.join().is_err() {
            log::error!("[Worker] Worker thread panicked");
        }
    }
}

/// Run `job` to completion on the current thread, reporting into `events`.
///
/// A dropped receiver is not an error: the run still finishes and writes
/// its output.
pub fn run(job: &Job, options: &InvertOptions, events: &Sender<WorkerEvent>) {
    let start = Instant::now();

    let result = invert_pdf_file(&job.input, &job.output, options, |progress| {
        let _ = events.send(WorkerEvent::Progress(progress));
    });

    let event = match result {
        Ok(result) => {
            let elapsed = start.elapsed();
            log::info!(
                "[Worker] Done in {:.2}s: {} pages saved to {:?}",
                elapsed.as_secs_f64(),
                result.page_count,
                job.output
            );
            WorkerEvent::Completed(InvertSummary {
                page_count: result.page_count,
                elapsed,
                output: job.output.clone(),
            })
        }
        Err(e) => {
            log::warn!("[Worker] {:?} failed: {}", job.input, e);
            WorkerEvent::Failed(e)
        }
    };

    let _ = events.send(event);
}

/// Start a fresh worker thread for `job`.
pub fn spawn(job: Job, options: InvertOptions) -> std::io::Result<WorkerHandle> {
    let (tx, rx) = unbounded();

    let thread = thread::Builder::new()
        .name("pdf-invert-worker".to_string())
        .spawn(move || run(&job, &options, &tx))?;

    Ok(WorkerHandle { events: rx, thread })
}

//! Toolkit-independent front-end state.
//!
//! The shell owns the current file selection and the status line, turns a
//! "process" trigger into a worker run, and folds worker events back into
//! the status line. Front-ends only draw [`Shell::status`] and forward
//! clicks; they poll once per frame (GUI) or block on [`Shell::wait`]
//! (CLI).

use crate::config::ShellConfig;
use crate::worker::{self, Job, WorkerEvent, WorkerHandle};
use crossbeam_channel::TryRecvError;
use std::path::{Path, PathBuf};

pub const STATUS_IDLE: &str = "Select a PDF to process.";
pub const STATUS_NO_FILE: &str = "No file selected.";
pub const STATUS_PROCESSING: &str = "Processing...";

const PDF_EXTENSION: &str = "pdf";
const OUTPUT_SUFFIX: &str = "_processed.pdf";

/// What a trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started(Job),
    NoFileSelected,
    /// A run is still in progress; the trigger was ignored.
    Busy,
    /// The worker thread could not be launched.
    NotStarted(String),
}

pub struct Shell {
    config: ShellConfig,
    selection: Vec<PathBuf>,
    status: String,
    active: Option<WorkerHandle>,
    failed: bool,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            selection: Vec::new(),
            status: STATUS_IDLE.to_string(),
            active: None,
            failed: false,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn selection(&self) -> &[PathBuf] {
        &self.selection
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the most recent run ended in failure.
    pub fn last_run_failed(&self) -> bool {
        self.failed
    }

    /// Replace the selection, keeping only PDF files.
    pub fn select<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.selection = paths
            .into_iter()
            .map(|p| -> PathBuf { p.into() })
            .filter(|p| is_pdf_path(p))
            .collect();
    }

    /// Start processing the first selected file.
    pub fn trigger(&mut self) -> TriggerOutcome {
        if self.is_busy() {
            return TriggerOutcome::Busy;
        }

        let Some(input) = self.selection.first().cloned() else {
            self.status = STATUS_NO_FILE.to_string();
            return TriggerOutcome::NoFileSelected;
        };

        let job = Job {
            output: self.config.output_dir.join(output_file_name(&input)),
            input,
        };
        log::info!("[Shell] Processing {:?} -> {:?}", job.input, job.output);

        match worker::spawn(job.clone(), self.config.options.clone()) {
            Ok(handle) => {
                self.status = STATUS_PROCESSING.to_string();
                self.active = Some(handle);
                self.failed = false;
                TriggerOutcome::Started(job)
            }
            Err(e) => {
                self.failed = true;
                self.status = format!("Failed: could not start worker: {}", e);
                TriggerOutcome::NotStarted(e.to_string())
            }
        }
    }

    /// Apply every event the worker has sent so far without blocking.
    ///
    /// Returns true when the status text changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;

        while let Some(handle) = &self.active {
            match handle.events().try_recv() {
                Ok(event) => {
                    self.apply(event);
                    changed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.worker_vanished();
                    changed = true;
                }
            }
        }

        changed
    }

    /// Block until the current run ends, reporting every status change.
    pub fn wait(&mut self, mut on_status: impl FnMut(&str)) {
        while let Some(handle) = &self.active {
            match handle.events().recv() {
                Ok(event) => self.apply(event),
                Err(_) => self.worker_vanished(),
            }
            on_status(&self.status);
        }
    }

    fn apply(&mut self, event: WorkerEvent) {
        if event.is_terminal() {
            if let Some(handle) = self.active.take() {
                handle.join();
            }
        }

        self.status = match event {
            WorkerEvent::Progress(p) => format!("Processed page {}/{}", p.current, p.total),
            WorkerEvent::Completed(summary) => format!(
                "Done in {:.2} seconds\nSaved to {}",
                summary.elapsed.as_secs_f64(),
                summary.output.display()
            ),
            WorkerEvent::Failed(e) => {
                self.failed = true;
                format!("Failed: {}", e)
            }
        };
    }

    fn worker_vanished(&mut self) {
        log::warn!("[Shell] Worker exited without reporting a result");
        if let Some(handle) = self.active.take() {
            handle.join();
        }
        self.failed = true;
        self.status = "Failed: worker stopped unexpectedly".to_string();
    }
}

/// Whether `path` looks like something the PDF chooser would offer.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

/// `report.pdf` -> `report_processed.pdf`, from the input's base name.
pub fn output_file_name(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let suffix_len = PDF_EXTENSION.len() + 1;
    let stem = match name.len().checked_sub(suffix_len) {
        Some(split)
            if name.is_char_boundary(split)
                && name[split..].eq_ignore_ascii_case(".pdf") =>
        {
            &name[..split]
        }
        _ => name.as_str(),
    };

    format!("{}{}", stem, OUTPUT_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::InvertSummary;
    use crate::{InvertError, ProgressEvent};
    use std::time::Duration;

    fn shell_in(dir: &Path) -> Shell {
        Shell::new(ShellConfig::with_output_dir(dir))
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(Path::new("/a/b/report.pdf")), "report_processed.pdf");
        assert_eq!(output_file_name(Path::new("Scan.PDF")), "Scan_processed.pdf");
        assert_eq!(
            output_file_name(Path::new("my.pdf.notes.pdf")),
            "my.pdf.notes_processed.pdf"
        );
        assert_eq!(output_file_name(Path::new("noext")), "noext_processed.pdf");
    }

    #[test]
    fn test_select_keeps_only_pdfs() {
        let mut shell = shell_in(Path::new("."));
        shell.select(["a.pdf", "b.txt", "C.PDF", "pdf"]);
        assert_eq!(
            shell.selection(),
            &[PathBuf::from("a.pdf"), PathBuf::from("C.PDF")]
        );
    }

    #[test]
    fn test_starts_idle() {
        let shell = shell_in(Path::new("."));
        assert_eq!(shell.status(), STATUS_IDLE);
        assert!(!shell.is_busy());
    }

    #[test]
    fn test_trigger_without_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell_in(dir.path());

        assert_eq!(shell.trigger(), TriggerOutcome::NoFileSelected);
        assert_eq!(shell.status(), STATUS_NO_FILE);
        assert!(!shell.is_busy());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_apply_formats_status() {
        let mut shell = shell_in(Path::new("."));

        shell.apply(WorkerEvent::Progress(ProgressEvent { current: 2, total: 5 }));
        assert_eq!(shell.status(), "Processed page 2/5");

        shell.apply(WorkerEvent::Completed(InvertSummary {
            page_count: 5,
            elapsed: Duration::from_millis(1234),
            output: PathBuf::from("/home/me/x_processed.pdf"),
        }));
        assert_eq!(
            shell.status(),
            "Done in 1.23 seconds\nSaved to /home/me/x_processed.pdf"
        );

        shell.apply(WorkerEvent::Failed(InvertError::Save("disk full".to_string())));
        assert_eq!(shell.status(), "Failed: Failed to save PDF: disk full");
    }

    #[test]
    fn test_failed_run_frees_the_shell() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.pdf");
        std::fs::write(&input, b"garbage").unwrap();

        let mut shell = shell_in(dir.path());
        shell.select([input]);

        let outcome = shell.trigger();
        assert!(matches!(outcome, TriggerOutcome::Started(_)));
        assert_eq!(shell.status(), STATUS_PROCESSING);

        let mut seen = Vec::new();
        shell.wait(|status| seen.push(status.to_string()));

        assert!(!shell.is_busy());
        assert!(shell.last_run_failed());
        assert_eq!(seen.len(), 1);
        assert!(shell.status().starts_with("Failed: Failed to open PDF"));
        assert!(!dir.path().join("broken_processed.pdf").exists());
    }
}

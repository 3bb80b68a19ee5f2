/// Per-file batch execution with a summary report.
///
/// Every file is processed independently: a failure is recorded and the
/// batch moves on unless `fail_fast` is set.
use std::fmt;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::annotator::AnnotateOutcome;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Done(String),
    Skipped(String),
    Failed(String),
}

impl From<AnnotateOutcome> for FileStatus {
    fn from(outcome: AnnotateOutcome) -> Self {
        if outcome.is_skipped() {
            FileStatus::Skipped(outcome.to_string())
        } else {
            FileStatus::Done(outcome.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            FileStatus::Done(msg) | FileStatus::Skipped(msg) => f.write_str(msg),
            FileStatus::Failed(err) => write!(f, "FAILED {}: {err}", self.path.display()),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    /// Set when `fail_fast` stopped the batch early
    pub aborted: bool,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn done(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Done(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} done, {} skipped, {} failed",
            self.done(),
            self.skipped(),
            self.failed()
        )?;
        if self.aborted {
            f.write_str(" (stopped at first failure)")?;
        }
        Ok(())
    }
}

pub struct BatchRunner {
    fail_fast: bool,
    progress: Option<ProgressBar>,
}

impl BatchRunner {
    pub fn new(fail_fast: bool) -> Self {
        Self {
            fail_fast,
            progress: None,
        }
    }

    /// Show a progress bar over `total` files on stderr.
    pub fn with_progress(mut self, total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("█▓░"),
        );
        self.progress = Some(pb);
        self
    }

    /// Apply `f` to every item, collecting one outcome per processed file.
    pub fn run<I, T, F>(&self, items: I, mut f: F) -> BatchReport
    where
        I: IntoIterator<Item = T>,
        T: AsRef<Path>,
        F: FnMut(&T) -> Result<FileStatus>,
    {
        let mut report = BatchReport::default();

        for item in items {
            let path = item.as_ref().to_path_buf();
            if let Some(pb) = &self.progress {
                pb.set_message(path.display().to_string());
            }

            let status = match f(&item) {
                Ok(status) => status,
                Err(e) => {
                    error!("{}: {e}", path.display());
                    FileStatus::Failed(e.to_string())
                }
            };
            let failed = matches!(status, FileStatus::Failed(_));
            report.outcomes.push(FileOutcome { path, status });

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
            if failed && self.fail_fast {
                report.aborted = true;
                break;
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
        info!("Batch finished: {report}");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScribeError;

    fn process(path: &&str) -> Result<FileStatus> {
        match *path {
            p if p.starts_with("bad") => Err(ScribeError::MissingIndex { dir: p.into() }),
            p if p.starts_with("old") => Ok(FileStatus::Skipped(format!("skip {p}"))),
            p => Ok(FileStatus::Done(format!("did {p}"))),
        }
    }

    #[test]
    fn test_continue_on_failure() {
        let report = BatchRunner::new(false).run(["a.f90", "bad.f90", "old.f90", "b.f90"], process);
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.done(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.has_failures());
        assert!(!report.aborted);
    }

    #[test]
    fn test_fail_fast_stops() {
        let report = BatchRunner::new(true).run(["a.f90", "bad.f90", "b.f90"], process);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.aborted);
        assert_eq!(report.to_string(), "1 done, 0 skipped, 1 failed (stopped at first failure)");
    }

    #[test]
    fn test_failed_outcome_display() {
        let report = BatchRunner::new(false).run(["bad.f90"], process);
        let line = report.outcomes[0].to_string();
        assert!(line.starts_with("FAILED bad.f90"));
    }

    #[test]
    fn test_from_annotate_outcome() {
        let skipped: FileStatus = AnnotateOutcome::Skipped("x.scribe".into()).into();
        assert!(matches!(skipped, FileStatus::Skipped(_)));
        let done: FileStatus = AnnotateOutcome::Generated("x.scribe".into()).into();
        assert!(matches!(done, FileStatus::Done(_)));
    }
}

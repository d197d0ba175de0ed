use crate::checkers::Checker;
use crate::model::{Submission, Verdict};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Items a stage boundary holds before the sender has to wait.
pub const STAGE_CAPACITY: usize = 1;

/// Spawn one worker that applies `checker` to every unchecked submission
/// read from `unchecked`, in order, and forwards the result.
///
/// Checked submissions are forwarded untouched. The returned stream closes
/// once `unchecked` closes and the last item has been handed off.
pub fn spawn_stage(
    checker: Arc<dyn Checker>,
    mut unchecked: mpsc::Receiver<Submission>,
) -> mpsc::Receiver<Submission> {
    let (tx, checked) = mpsc::channel(STAGE_CAPACITY);
    let kind = checker.kind();

    tokio::spawn(async move {
        while let Some(submission) = unchecked.recv().await {
            let submission = if submission.is_checked() {
                submission
            } else {
                run_check(&checker, submission).await
            };

            if tx.send(submission).await.is_err() {
                warn!(kind, "downstream closed, dropping remaining submissions");
                break;
            }
        }
        info!(kind, "stopped checker");
    });

    info!(kind, "started checker");
    checked
}

/// Checks do blocking database work, so they run off the async workers.
async fn run_check(checker: &Arc<dyn Checker>, submission: Submission) -> Submission {
    let fallback = submission.clone();
    let worker = Arc::clone(checker);
    match tokio::task::spawn_blocking(move || worker.check(submission)).await {
        Ok(checked) => checked,
        Err(e) => {
            let kind = checker.kind();
            error!(kind, submission_id = fallback.id, error = %e, "checker task failed");
            let mut failed = fallback;
            failed.status = Verdict::ExecutionError;
            failed.checker_message = format!("checker error: {} checker panicked", kind);
            failed
        }
    }
}

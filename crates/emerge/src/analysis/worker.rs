//! Running a unit of work on the rayon pool with a wall-clock budget.

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    time::Duration,
};

use crate::{Error, Result};

/// Run `job` on the rayon pool and wait at most `budget` for its result.
///
/// Without a budget the job runs on the calling thread. A job that overruns
/// its budget is abandoned: it keeps running on the pool and its result is
/// dropped when it finishes.
///
/// # Arguments
///
/// * `task`: a name for logs and errors.
/// * `budget`: the longest to wait, or `None` to wait indefinitely.
/// * `job`: the work to run.
///
/// # Errors
///
/// * `Timeout` if the budget expires first.
/// * `Aborted` if the job ended without sending a result.
pub fn run_with_timeout<T, F>(task: &str, budget: Option<Duration>, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let Some(budget) = budget else {
        return Ok(job());
    };

    let (sender, receiver) = mpsc::channel();
    rayon::spawn(move || {
        // The receiver is gone if the caller already gave up.
        let _ = sender.send(job());
    });

    receiver.recv_timeout(budget).map_err(|e| match e {
        RecvTimeoutError::Timeout => {
            ftlog::warn!("`{task}` exceeded its budget of {}ms and was abandoned", budget.as_millis());
            Error::Timeout {
                task: task.to_string(),
                budget_ms: budget.as_millis(),
            }
        }
        RecvTimeoutError::Disconnected => {
            ftlog::warn!("`{task}` ended without a result");
            Error::Aborted(task.to_string())
        }
    })
}

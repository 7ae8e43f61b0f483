//! Asynchronous task polling
//!
//! Every mutating call answers with a task UUID; the caller blocks on it until
//! Prism Central reports a terminal state. Transport blips during polling are
//! retried on the same cadence instead of aborting a mutation that already
//! happened server-side.

use crate::error::PrismError;
use crate::models::{Task, TaskStatus};
use crate::prism_trait::PrismApi;
use std::time::Duration;
use tracing::{debug, warn};

/// Polling cadence and budget.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Sleep between polls
    pub interval: Duration,
    /// Polls issued before giving up with [`PrismError::PollTimeout`]
    pub max_attempts: u32,
    /// Consecutive transport errors tolerated before escalating
    pub max_transport_errors: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 600,
            max_transport_errors: 5,
        }
    }
}

/// Block until the task reaches a terminal state.
///
/// # Errors
/// [`PrismError::TaskFailed`] carrying the provider's `error_detail` when the
/// task fails, [`PrismError::PollTimeout`] when the budget runs out, or the
/// underlying transport error once retries are exhausted.
pub async fn poll_task(
    api: &dyn PrismApi,
    task_uuid: &str,
    opts: &PollOptions,
) -> Result<Task, PrismError> {
    let mut transport_errors = 0u32;

    for attempt in 1..=opts.max_attempts {
        match api.get_task(task_uuid).await {
            Ok(task) => {
                transport_errors = 0;
                match task.status {
                    TaskStatus::Succeeded => {
                        debug!("Task {} succeeded after {} poll(s)", task_uuid, attempt);
                        return Ok(task);
                    }
                    TaskStatus::Failed => {
                        return Err(PrismError::TaskFailed {
                            task_uuid: task_uuid.to_string(),
                            detail: task
                                .error_detail
                                .unwrap_or_else(|| "task failed without detail".to_string()),
                        });
                    }
                    status => {
                        debug!("Task {} still {:?} (poll {})", task_uuid, status, attempt);
                    }
                }
            }
            Err(e) if e.is_transient() => {
                transport_errors += 1;
                if transport_errors > opts.max_transport_errors {
                    return Err(e);
                }
                warn!(
                    "Transient error polling task {} ({}/{}): {}",
                    task_uuid, transport_errors, opts.max_transport_errors, e
                );
            }
            Err(e) => return Err(e),
        }

        tokio::time::sleep(opts.interval).await;
    }

    Err(PrismError::PollTimeout {
        task_uuid: task_uuid.to_string(),
        attempts: opts.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPrismClient;

    fn fast_opts(max_attempts: u32) -> PollOptions {
        PollOptions {
            interval: Duration::ZERO,
            max_attempts,
            max_transport_errors: 5,
        }
    }

    #[tokio::test]
    async fn succeeds_after_two_non_terminal_polls() {
        let mock = MockPrismClient::new();
        mock.script_task(
            "task-1",
            vec![TaskStatus::Pending, TaskStatus::Pending, TaskStatus::Succeeded],
        );

        let task = poll_task(&mock, "task-1", &fast_opts(10)).await.unwrap();
        assert_eq!(task.status, TaskStatus::Succeeded);
        // Two non-terminal polls plus the terminal one.
        assert_eq!(mock.task_poll_count("task-1"), 3);
    }

    #[tokio::test]
    async fn failure_surfaces_provider_detail_verbatim() {
        let mock = MockPrismClient::new();
        mock.script_task_with_detail(
            "task-2",
            vec![TaskStatus::Running, TaskStatus::Failed],
            "NIC quota exhausted on cluster",
        );

        let err = poll_task(&mock, "task-2", &fast_opts(10)).await.unwrap_err();
        match err {
            PrismError::TaskFailed { task_uuid, detail } => {
                assert_eq!(task_uuid, "task-2");
                assert_eq!(detail, "NIC quota exhausted on cluster");
            }
            other => panic!("expected TaskFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn transient_poll_errors_within_budget_are_retried() {
        let mock = MockPrismClient::new();
        mock.script_task("task-4", vec![TaskStatus::Succeeded]);
        mock.fail_task_polls("task-4", 3, "503 gateway unavailable");

        let task = poll_task(&mock, "task-4", &fast_opts(10)).await.unwrap();
        assert_eq!(task.status, TaskStatus::Succeeded);
        // Three failed polls plus the successful one.
        assert_eq!(mock.task_poll_count("task-4"), 4);
    }

    #[tokio::test]
    async fn consecutive_transient_errors_past_budget_escalate() {
        let mock = MockPrismClient::new();
        mock.script_task("task-5", vec![TaskStatus::Succeeded]);
        mock.fail_task_polls("task-5", 6, "503 gateway unavailable");

        let opts = PollOptions {
            interval: Duration::ZERO,
            max_attempts: 20,
            max_transport_errors: 5,
        };
        let err = poll_task(&mock, "task-5", &opts).await.unwrap_err();
        match err {
            PrismError::Api(message) => assert_eq!(message, "503 gateway unavailable"),
            other => panic!("expected Api, got {other}"),
        }
        // Escalated on the sixth consecutive failure.
        assert_eq!(mock.task_poll_count("task-5"), 6);
    }

    #[tokio::test]
    async fn successful_poll_resets_the_transient_error_count() {
        let mock = MockPrismClient::new();
        mock.script_task(
            "task-6",
            vec![TaskStatus::Running, TaskStatus::Succeeded],
        );
        mock.fail_task_polls("task-6", 2, "connection reset");

        let opts = PollOptions {
            interval: Duration::ZERO,
            max_attempts: 20,
            max_transport_errors: 2,
        };
        // 2 failures, then a non-terminal poll clears the count; the poll
        // after it succeeds.
        let task = poll_task(&mock, "task-6", &opts).await.unwrap();
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(mock.task_poll_count("task-6"), 4);
    }

    #[tokio::test]
    async fn exhausted_budget_is_poll_timeout() {
        let mock = MockPrismClient::new();
        mock.script_task("task-3", vec![TaskStatus::Running]);

        let err = poll_task(&mock, "task-3", &fast_opts(3)).await.unwrap_err();
        match err {
            PrismError::PollTimeout {
                task_uuid,
                attempts,
            } => {
                assert_eq!(task_uuid, "task-3");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected PollTimeout, got {other}"),
        }
    }
}

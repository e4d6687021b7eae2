//! Async action execution with timeout protection.
//!
//! This module contains the [`AsyncActionRunner`], which executes a
//! side-effecting action with a per-action-key loading flag and a timeout
//! race. The runner tracks one in-flight state per action key; distinct
//! keys may be in flight simultaneously with no global lock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::warn;

use crate::error::{WorkflowError, WorkflowResult};
use crate::workflow::ActionKey;

/// Executes side-effecting actions with timeout protection and
/// idempotent loading-state tracking.
///
/// The loading map is owned by the runner instance and lives as long as
/// the session that owns the engine; it is never persisted.
///
/// Timeout semantics: the wrapped operation is spawned onto the runtime
/// and raced against a timer. On expiry the loading flag is force-reset
/// and a [`WorkflowError::Timeout`] is returned, but the spawned
/// operation is *not* cancelled and may still complete server-side. The
/// next refetch is the source of truth for whether it did.
///
/// Concurrency discipline: at most one in-flight invocation per action
/// key is tracked. A second invocation of an already-loading key is not
/// blocked here; callers are expected to disable the triggering control
/// while [`AsyncActionRunner::is_loading`] reports true.
#[derive(Debug, Default)]
pub struct AsyncActionRunner {
    loading: Mutex<HashMap<ActionKey, bool>>,
}

impl AsyncActionRunner {
    /// Creates a runner with no actions in flight.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<ActionKey, bool>> {
        self.loading
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_loading(&self, key: ActionKey, value: bool) {
        self.guard().insert(key, value);
    }

    /// Whether the given action key is currently in flight.
    pub fn is_loading(&self, key: ActionKey) -> bool {
        self.guard().get(&key).copied().unwrap_or(false)
    }

    /// The action keys currently in flight, in registry string order.
    pub fn loading_actions(&self) -> Vec<ActionKey> {
        let mut keys: Vec<ActionKey> = self
            .guard()
            .iter()
            .filter(|(_, loading)| **loading)
            .map(|(key, _)| *key)
            .collect();
        keys.sort_by_key(|key| key.as_str());
        keys
    }

    /// Runs an operation under the given action key and timeout.
    ///
    /// Sets `loading[key] = true` before invocation, races the operation
    /// against the timer, and clears the flag on success, error, or
    /// expiry before returning.
    ///
    /// # Arguments
    ///
    /// * `key` - The action key to track loading state under
    /// * `timeout` - How long to wait before surfacing a timeout error
    /// * `op` - The side-effecting operation to execute
    ///
    /// # Returns
    ///
    /// The operation's result, or [`WorkflowError::Timeout`] if the timer
    /// expired first.
    pub async fn run<T, F>(&self, key: ActionKey, timeout: Duration, op: F) -> WorkflowResult<T>
    where
        T: Send + 'static,
        F: Future<Output = WorkflowResult<T>> + Send + 'static,
    {
        self.set_loading(key, true);

        // Spawn rather than await in place: a timed-out operation keeps
        // running and may still take effect server-side.
        let handle = tokio::spawn(op);

        let result = match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => Err(WorkflowError::Internal {
                message: format!("action '{}' task failed: {}", key.as_str(), join_error),
            }),
            Err(_elapsed) => {
                warn!(
                    action = key.as_str(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Action timed out; the dispatched operation may still complete"
                );
                Err(WorkflowError::Timeout {
                    action: key.as_str().to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        self.set_loading(key, false);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_successful_op_returns_value_and_clears_loading() {
        let runner = AsyncActionRunner::new();
        let result = runner
            .run(ActionKey::RunAudit, Duration::from_secs(30), async {
                Ok(42u32)
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert!(!runner.is_loading(ActionKey::RunAudit));
    }

    #[tokio::test]
    async fn test_failing_op_propagates_error_and_clears_loading() {
        let runner = AsyncActionRunner::new();
        let result: WorkflowResult<u32> = runner
            .run(ActionKey::RunAudit, Duration::from_secs(30), async {
                Err(WorkflowError::Remote {
                    code: "AUDIT_DOWN".to_string(),
                    message: "audit subsystem unavailable".to_string(),
                })
            })
            .await;
        assert!(matches!(result, Err(WorkflowError::Remote { .. })));
        assert!(!runner.is_loading(ActionKey::RunAudit));
    }

    /// RN-001: a never-resolving op times out and resets loading
    #[tokio::test(start_paused = true)]
    async fn test_never_resolving_op_times_out() {
        let runner = AsyncActionRunner::new();
        let result: WorkflowResult<()> = runner
            .run(
                ActionKey::RunAudit,
                Duration::from_millis(100),
                std::future::pending(),
            )
            .await;

        match result {
            Err(WorkflowError::Timeout { action, timeout_ms }) => {
                assert_eq!(action, "run_audit");
                assert_eq!(timeout_ms, 100);
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert!(!runner.is_loading(ActionKey::RunAudit));
    }

    /// RN-002: distinct keys may be in flight simultaneously
    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_load_concurrently() {
        let runner = Arc::new(AsyncActionRunner::new());

        let audit_runner = Arc::clone(&runner);
        let audit = tokio::spawn(async move {
            audit_runner
                .run(ActionKey::RunAudit, Duration::from_secs(30), async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(())
                })
                .await
        });

        let bank_runner = Arc::clone(&runner);
        let bank = tokio::spawn(async move {
            bank_runner
                .run(ActionKey::GenerateBankFile, Duration::from_secs(30), async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(())
                })
                .await
        });

        // Let both invocations start before inspecting the loading map.
        tokio::task::yield_now().await;
        assert!(runner.is_loading(ActionKey::RunAudit));
        assert!(runner.is_loading(ActionKey::GenerateBankFile));
        assert_eq!(runner.loading_actions().len(), 2);

        audit.await.unwrap().unwrap();
        bank.await.unwrap().unwrap();
        assert!(runner.loading_actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_operation_keeps_running() {
        let runner = AsyncActionRunner::new();
        let (sender, receiver) = tokio::sync::oneshot::channel::<u8>();

        let result: WorkflowResult<()> = runner
            .run(ActionKey::MarkAsPaid, Duration::from_millis(10), async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let _ = sender.send(1);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(WorkflowError::Timeout { .. })));
        // The spawned operation outlives the timeout and still completes.
        assert_eq!(receiver.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_is_loading_false_for_untracked_key() {
        let runner = AsyncActionRunner::new();
        assert!(!runner.is_loading(ActionKey::ArchiveData));
        assert!(runner.loading_actions().is_empty());
    }
}

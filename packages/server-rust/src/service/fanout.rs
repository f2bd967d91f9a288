//! Concurrent fan-out with a strict join.
//!
//! Every operation runs on its own tokio task and reports exactly one result
//! over a channel sized to the number of operations. The join drains one
//! result per task before returning, even after it has already seen an
//! error, so no task is left with an unconsumed result.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::Instrument;

/// A side effect ready to be spawned.
pub type BoxedOperation<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send + 'static>>;

/// Outcome of a failed [`fan_out`].
#[derive(Debug, thiserror::Error)]
pub enum FanOutError<E> {
    /// At least one operation returned an error. When several fail, which one
    /// is reported is unspecified.
    #[error("operation failed: {0}")]
    Failed(E),
    /// A task ended (panicked) without reporting a result.
    #[error("{lost} of {expected} operations ended without a result")]
    Aborted { expected: usize, lost: usize },
}

/// Runs every operation concurrently and waits for all of them.
///
/// A failing operation never cancels the others. Returns `Ok(())` only if
/// every operation succeeded.
///
/// # Errors
///
/// Returns [`FanOutError::Failed`] with the first error received, or
/// [`FanOutError::Aborted`] if a task died before reporting.
pub async fn fan_out<E>(operations: Vec<BoxedOperation<E>>) -> Result<(), FanOutError<E>>
where
    E: Send + 'static,
{
    let expected = operations.len();
    if expected == 0 {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel::<Result<(), E>>(expected);
    for operation in operations {
        let tx = tx.clone();
        tokio::spawn(
            async move {
                let result = operation.await;
                // Capacity equals the task count, so this send never waits.
                let _ = tx.send(result).await;
            }
            .in_current_span(),
        );
    }
    // Only the tasks hold senders now: `recv` yields `None` once every task
    // has either reported or died.
    drop(tx);

    let mut received = 0;
    let mut first_error = None;
    while received < expected {
        match rx.recv().await {
            Some(result) => {
                received += 1;
                if let Err(err) = result {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
            None => break,
        }
    }

    if let Some(err) = first_error {
        return Err(FanOutError::Failed(err));
    }
    if received < expected {
        return Err(FanOutError::Aborted {
            expected,
            lost: expected - received,
        });
    }
    Ok(())
}

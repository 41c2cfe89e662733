//! The four classification stages, in pipeline order.

pub mod messages;
pub mod report;
pub mod spam;
pub mod users;

pub use messages::MessageLookup;
pub use report::ResultAggregation;
pub use spam::SpamCheck;
pub use users::UserResolution;

use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;

/// Collect sub-tasks that already finished without waiting for the rest.
///
/// Keeps the set bounded by the work still in flight and surfaces a
/// panicking sub-task while the stage is still reading input.
pub(crate) fn reap(tasks: &mut JoinSet<()>) -> Result<()> {
    while let Some(joined) = tasks.try_join_next() {
        joined?;
    }
    Ok(())
}

/// Wait for every sub-task a stage spawned.
///
/// Returns `Ok(false)` when cancelled first; the caller drops `tasks`, which
/// aborts whatever is still running. A panicking sub-task fails the stage.
pub(crate) async fn join_all(
    stage: &'static str,
    tasks: &mut JoinSet<()>,
    cancel: &CancelToken,
) -> Result<bool> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::DEBUG, event = "spampipe.cancelled", stage = stage, where_ = "join", "spampipe.cancelled");
                #[cfg(not(feature = "tracing"))]
                let _ = stage;
                return Ok(false);
            }
            joined = tasks.join_next() => match joined {
                None => return Ok(true),
                Some(Ok(())) => {}
                Some(Err(err)) => return Err(Error::from(err)),
            }
        }
    }
}

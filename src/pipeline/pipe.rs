use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};

use crate::error::Result;
use crate::pipeline::cancel::CancelToken;

/// One pipeline element: consumes `input` until it closes, writes zero or
/// more items to `output`.
///
/// `output` is dropped when `process` returns, which closes the stream for
/// the next stage. Implementations must not return before the sub-tasks
/// they spawned have finished writing.
#[async_trait]
pub trait Pipe<I: Send + 'static, O: Send + 'static>: Send + Sync {
    fn stage_name(&self) -> &'static str {
        "stage"
    }

    async fn process(
        &self,
        input: Receiver<I>,
        output: Sender<O>,
        buffer: usize,
        cancel: CancelToken,
    ) -> Result<()>;
}

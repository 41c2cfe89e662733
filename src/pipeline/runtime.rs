use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::config::DEFAULT_BUFFER;
use crate::pipeline::pipe::Pipe;

pub struct Runtime {
    buffer: usize,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            buffer: DEFAULT_BUFFER,
        }
    }

    pub fn buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Launch `pipe` and hand back both ends of the pipeline.
    ///
    /// Dropping the returned sender closes the first stream. The receiver
    /// must be drained, otherwise the last stage suspends once the edge
    /// buffer is full.
    pub fn spawn<I, O, P>(
        &self,
        pipe: P,
    ) -> (
        mpsc::Sender<I>,
        mpsc::Receiver<O>,
        CancelToken,
        JoinHandle<Result<()>>,
    )
    where
        I: Send + 'static,
        O: Send + 'static,
        P: Pipe<I, O> + 'static,
    {
        let (tx_in, rx_in) = mpsc::channel::<I>(self.buffer);
        let (tx_out, rx_out) = mpsc::channel::<O>(self.buffer);

        let cancel = CancelToken::default();
        let handle = launch(Arc::new(pipe), rx_in, tx_out, self.buffer, cancel.clone());

        (tx_in, rx_out, cancel, handle)
    }

    /// Feed `items` through `pipe`, close the input and collect everything
    /// the last stage emits.
    ///
    /// Returns only after every stage has terminated. The first stage
    /// failure is returned instead of the collected output. Dropping the
    /// returned future before it completes cancels the pipeline.
    pub async fn run<I, O, P, It>(&self, pipe: P, items: It) -> Result<Vec<O>>
    where
        I: Send + 'static,
        O: Send + 'static,
        P: Pipe<I, O> + 'static,
        It: IntoIterator<Item = I>,
    {
        let (tx, mut rx, cancel, handle) = self.spawn(pipe);
        let guard = cancel.drop_guard();

        let items: Vec<I> = items.into_iter().collect();
        let feed = tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        let mut collected = Vec::new();
        while let Some(item) = rx.recv().await {
            collected.push(item);
        }

        feed.await?;
        handle.await??;
        guard.disarm();
        Ok(collected)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one stage on its own task. `output` is dropped when the stage
/// returns or unwinds.
pub(crate) fn launch<I, O, P>(
    pipe: Arc<P>,
    input: mpsc::Receiver<I>,
    output: mpsc::Sender<O>,
    buffer: usize,
    cancel: CancelToken,
) -> JoinHandle<Result<()>>
where
    I: Send + 'static,
    O: Send + 'static,
    P: Pipe<I, O> + 'static,
{
    #[cfg(feature = "tracing")]
    let handle = {
        use tracing::Instrument;
        let stage = pipe.stage_name();
        let span = tracing::info_span!("spampipe.stage", stage = stage, buffer = buffer);
        tokio::spawn(
            async move { pipe.process(input, output, buffer, cancel).await }.instrument(span),
        )
    };

    #[cfg(not(feature = "tracing"))]
    let handle = tokio::spawn(async move { pipe.process(input, output, buffer, cancel).await });

    handle
}

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::model::{MessageId, User};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;
use crate::service::MailService;
use crate::stage::{join_all, reap};

const STAGE: &str = "message_lookup";

/// Groups users into batches of `batch_size` and looks up each batch's
/// messages on its own task.
///
/// A trailing partial batch is flushed when the input closes. A failed batch
/// is logged and contributes no ids; other batches are unaffected.
pub struct MessageLookup<S> {
    service: Arc<S>,
    batch_size: usize,
}

impl<S> MessageLookup<S> {
    pub fn new(service: Arc<S>, batch_size: usize) -> Self {
        Self {
            service,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl<S> MessageLookup<S>
where
    S: MailService + 'static,
{
    fn dispatch(
        &self,
        lookups: &mut JoinSet<()>,
        batch: Vec<User>,
        output: &Sender<MessageId>,
        cancel: &CancelToken,
    ) {
        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::DEBUG, event = "spampipe.batch.dispatched", stage = STAGE, batch_len = batch.len(), "spampipe.batch.dispatched");

        let service = Arc::clone(&self.service);
        let output = output.clone();
        let cancel = cancel.clone();
        lookups.spawn(async move {
            if cancel.is_cancelled() {
                return;
            }
            let ids = match service.lookup_messages(&batch).await {
                Ok(ids) => ids,
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::WARN, event = "spampipe.messages.lookup_failed", stage = STAGE, batch_len = batch.len(), error = %_err, "spampipe.messages.lookup_failed");
                    return;
                }
            };

            for id in ids {
                if cancel.is_cancelled() {
                    return;
                }
                if output.send(id).await.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::INFO, event = "spampipe.downstream.closed", stage = STAGE, "spampipe.downstream.closed");
                    return;
                }
            }
        });
    }
}

#[async_trait]
impl<S> Pipe<User, MessageId> for MessageLookup<S>
where
    S: MailService + 'static,
{
    fn stage_name(&self) -> &'static str {
        STAGE
    }

    async fn process(
        &self,
        mut input: Receiver<User>,
        output: Sender<MessageId>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        let mut lookups = JoinSet::new();
        let mut batch = Vec::with_capacity(self.batch_size);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "spampipe.cancelled", stage = STAGE, where_ = "recv", "spampipe.cancelled");
                    return Ok(());
                },
                msg = input.recv() => {
                    let Some(user) = msg else { break; };
                    batch.push(user);
                    if batch.len() == self.batch_size {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
                        reap(&mut lookups)?;
                        self.dispatch(&mut lookups, full, &output, &cancel);
                    }
                }
            }
        }

        if !batch.is_empty() {
            self.dispatch(&mut lookups, batch, &output, &cancel);
        }

        join_all(STAGE, &mut lookups, &cancel).await?;
        Ok(())
    }
}

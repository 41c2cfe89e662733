use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::model::{MessageId, MsgData};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;
use crate::service::MailService;
use crate::stage::{join_all, reap};

const STAGE: &str = "spam_check";

/// Classifies each message on its own task, with at most `max_in_flight`
/// external checks running at once.
///
/// A permit is taken before the task is spawned and released as soon as the
/// check returns, before the result is written downstream. Output order is
/// unconstrained. Messages whose check fails are logged and dropped.
pub struct SpamCheck<S> {
    service: Arc<S>,
    max_in_flight: usize,
}

impl<S> SpamCheck<S> {
    pub fn new(service: Arc<S>, max_in_flight: usize) -> Self {
        Self {
            service,
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

#[async_trait]
impl<S> Pipe<MessageId, MsgData> for SpamCheck<S>
where
    S: MailService + 'static,
{
    fn stage_name(&self) -> &'static str {
        STAGE
    }

    async fn process(
        &self,
        mut input: Receiver<MessageId>,
        output: Sender<MsgData>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        let guard = Arc::new(Semaphore::new(self.max_in_flight));
        let mut checks = JoinSet::new();

        loop {
            let id = tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "spampipe.cancelled", stage = STAGE, where_ = "recv", "spampipe.cancelled");
                    return Ok(());
                },
                msg = input.recv() => match msg {
                    Some(id) => id,
                    None => break,
                },
            };

            let permit = tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "spampipe.cancelled", stage = STAGE, where_ = "acquire", "spampipe.cancelled");
                    return Ok(());
                },
                permit = Arc::clone(&guard).acquire_owned() => {
                    permit.map_err(|_| Error::pipeline("spam check guard closed"))?
                }
            };

            if cancel.is_cancelled() {
                return Ok(());
            }
            reap(&mut checks)?;

            let service = Arc::clone(&self.service);
            let output = output.clone();
            let task_cancel = cancel.clone();
            checks.spawn(async move {
                if task_cancel.is_cancelled() {
                    return;
                }
                let checked = tokio::select! {
                    _ = task_cancel.cancelled() => return,
                    checked = service.check_spam(id) => checked,
                };
                drop(permit);

                match checked {
                    Ok(has_spam) => {
                        if output.send(MsgData { id, has_spam }).await.is_err() {
                            #[cfg(feature = "tracing")]
                            tracing::event!(tracing::Level::INFO, event = "spampipe.downstream.closed", stage = STAGE, "spampipe.downstream.closed");
                        }
                    }
                    Err(_err) => {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::WARN, event = "spampipe.spam.check_failed", stage = STAGE, message_id = %id, error = %_err, "spampipe.spam.check_failed");
                    }
                }
            });
        }

        join_all(STAGE, &mut checks, &cancel).await?;
        Ok(())
    }
}

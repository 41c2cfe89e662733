use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::model::{EmailAddress, User};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;
use crate::service::MailService;
use crate::stage::{join_all, reap};

const STAGE: &str = "user_resolution";

/// Resolves every incoming address on its own task and emits each distinct
/// user once.
///
/// Users are keyed by id; when several addresses resolve to the same id the
/// last lookup to finish decides which email is kept. Output order is
/// arbitrary. Addresses that fail to resolve are logged and contribute
/// nothing.
pub struct UserResolution<S> {
    service: Arc<S>,
}

impl<S> UserResolution<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> Pipe<EmailAddress, User> for UserResolution<S>
where
    S: MailService + 'static,
{
    fn stage_name(&self) -> &'static str {
        STAGE
    }

    async fn process(
        &self,
        mut input: Receiver<EmailAddress>,
        output: Sender<User>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        let resolved: Arc<DashMap<u64, EmailAddress>> = Arc::new(DashMap::new());
        let mut lookups = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "spampipe.cancelled", stage = STAGE, where_ = "recv", "spampipe.cancelled");
                    return Ok(());
                },
                msg = input.recv() => {
                    let Some(email) = msg else { break; };
                    reap(&mut lookups)?;
                    let service = Arc::clone(&self.service);
                    let resolved = Arc::clone(&resolved);
                    let task_cancel = cancel.clone();
                    lookups.spawn(async move {
                        if task_cancel.is_cancelled() {
                            return;
                        }
                        match service.resolve_user(&email).await {
                            Ok(user) => {
                                resolved.insert(user.id, user.email);
                            }
                            Err(_err) => {
                                #[cfg(feature = "tracing")]
                                {
                                    tracing::event!(tracing::Level::WARN, event = "spampipe.user.lookup_failed", stage = STAGE, "spampipe.user.lookup_failed");
                                    tracing::event!(tracing::Level::DEBUG, event = "spampipe.user.lookup_failed", stage = STAGE, email = %email, error = %_err, "spampipe.user.lookup_failed");
                                }
                            }
                        }
                    });
                }
            }
        }

        if !join_all(STAGE, &mut lookups, &cancel).await? {
            return Ok(());
        }

        let users: Vec<User> = resolved
            .iter()
            .map(|entry| User::new(*entry.key(), entry.value().clone()))
            .collect();

        for user in users {
            if cancel.is_cancelled() {
                break;
            }
            if output.send(user).await.is_err() {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::INFO, event = "spampipe.downstream.closed", stage = STAGE, "spampipe.downstream.closed");
                break;
            }
        }
        Ok(())
    }
}

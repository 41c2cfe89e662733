use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{MessageId, User};
use crate::pipeline::config::DEFAULT_BATCH_SIZE;
use crate::service::MailService;

/// In-memory [`MailService`] with deterministic answers.
///
/// Besides answering lookups it records what the pipeline asked for: the
/// size of every message lookup batch and the highest number of spam checks
/// that were running at the same time.
///
/// ```
/// use spampipe::service::memory::MemoryDirectory;
///
/// let directory = MemoryDirectory::new()
///     .user("a@x", 1)
///     .messages(1, [10, 11])
///     .spam(10, true)
///     .spam(11, false);
/// # let _ = directory;
/// ```
pub struct MemoryDirectory {
    users: HashMap<String, u64>,
    messages: HashMap<u64, Vec<MessageId>>,
    spam: HashMap<MessageId, bool>,
    max_batch: usize,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    spam_calls: AtomicUsize,
    batches: Mutex<Vec<usize>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            messages: HashMap::new(),
            spam: HashMap::new(),
            max_batch: DEFAULT_BATCH_SIZE,
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            spam_calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn user(mut self, email: impl Into<String>, id: u64) -> Self {
        self.users.insert(email.into(), id);
        self
    }

    pub fn messages<It>(mut self, user_id: u64, ids: It) -> Self
    where
        It: IntoIterator<Item = u64>,
    {
        self.messages
            .entry(user_id)
            .or_default()
            .extend(ids.into_iter().map(MessageId));
        self
    }

    pub fn spam(mut self, id: u64, has_spam: bool) -> Self {
        self.spam.insert(MessageId(id), has_spam);
        self
    }

    /// Largest batch `lookup_messages` accepts.
    pub fn max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch;
        self
    }

    /// Artificial delay applied to every call.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sizes of every batch passed to `lookup_messages`, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn peak_spam_checks(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn spam_calls(&self) -> usize {
        self.spam_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailService for MemoryDirectory {
    async fn resolve_user(&self, email: &str) -> Result<User> {
        self.delay().await;
        match self.users.get(email) {
            Some(&id) => Ok(User::new(id, email)),
            None => Err(Error::UserNotFound {
                email: email.to_owned(),
            }),
        }
    }

    async fn lookup_messages(&self, users: &[User]) -> Result<Vec<MessageId>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(users.len());

        if users.len() > self.max_batch {
            return Err(Error::BatchTooLarge {
                len: users.len(),
                max: self.max_batch,
            });
        }

        self.delay().await;
        Ok(users
            .iter()
            .filter_map(|user| self.messages.get(&user.id))
            .flatten()
            .copied()
            .collect())
    }

    async fn check_spam(&self, id: MessageId) -> Result<bool> {
        self.spam_calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.peak_in_flight);

        self.delay().await;
        self.spam
            .get(&id)
            .copied()
            .ok_or(Error::UnknownMessage(id))
    }
}

/// Counts one running call for as long as it is alive.
struct InFlight<'a> {
    active: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(active: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

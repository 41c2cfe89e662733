//! Lookups the stages delegate to.
//!
//! Each call is opaque I/O with its own latency and failure behavior. Failures
//! are scoped to the item or batch that was passed in; the stages log them and
//! drop the item.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{MessageId, User};

#[async_trait]
pub trait MailService: Send + Sync {
    /// Resolve one address to its user.
    async fn resolve_user(&self, email: &str) -> Result<User>;

    /// Message ids across every user in `users`.
    ///
    /// `users` is never empty when called by the pipeline. Implementations
    /// reject batches above their accepted size with
    /// [`Error::BatchTooLarge`](crate::error::Error::BatchTooLarge).
    async fn lookup_messages(&self, users: &[User]) -> Result<Vec<MessageId>>;

    async fn check_spam(&self, id: MessageId) -> Result<bool>;
}

//! # spampipe
//!
//! **Staged, concurrent spam classification over Tokio channels.**
//!
//! `spampipe` turns a stream of email addresses into a sorted report of
//! `"<has_spam> <message id>"` lines. It is built as a chain of independent
//! stages, each with its own concurrency policy, connected by typed streams.
//!
//! ---
//!
//! ## Core Model
//!
//! ```text
//! EmailAddress → UserResolution → MessageLookup → SpamCheck → ResultAggregation → ReportLine
//!                (task per item)   (fixed batches)  (bounded)   (sort once)
//! ```
//!
//! Every stage implements the [`Pipe`] trait: it reads its input stream until
//! it closes, waits for the work it spawned, and returns. Returning drops the
//! stage's output sender, which closes the stream for the next stage.
//!
//! - [`UserResolution`](stage::UserResolution) resolves every address on its
//!   own task and emits each user id once.
//! - [`MessageLookup`](stage::MessageLookup) groups users into batches of
//!   `batch_size` and looks up each batch concurrently.
//! - [`SpamCheck`](stage::SpamCheck) checks every message, with at most
//!   `max_in_flight` checks running at once.
//! - [`ResultAggregation`](stage::ResultAggregation) drains everything,
//!   sorts spam first and by ascending id, and formats the report.
//!
//! ---
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use spampipe::prelude::*;
//! use spampipe::service::memory::MemoryDirectory;
//!
//! #[tokio::main]
//! async fn main() -> spampipe::error::Result<()> {
//!     let directory = MemoryDirectory::new()
//!         .user("a@x", 1)
//!         .user("b@x", 2)
//!         .messages(1, [10])
//!         .messages(2, [11])
//!         .spam(10, true)
//!         .spam(11, false);
//!
//!     let classifier = SpamClassifier::new(
//!         Arc::new(directory),
//!         PipelineConfig::new().batch_size(2).max_in_flight(5),
//!     )?;
//!
//!     let report = classifier.run(["a@x", "b@x", "a@x"]).await?;
//!     assert_eq!(report, vec!["true 10", "false 11"]);
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Error Handling Contract
//!
//! - Lookup failures (unknown user, oversized batch, unknown message) are
//!   logged and the affected item or batch is dropped. The report silently
//!   omits it.
//! - A stage that fails or panics trips the shared [`CancelToken`]; the
//!   remaining stages stop, every stream is closed, and the failure is
//!   returned once all stages have been joined.
//! - Downstream closed: a stage that can no longer send stops without error.
//!
//! ---
//!
//! ## Observability
//!
//! With the default `tracing` feature every stage runs in a
//! `spampipe.stage` span and emits structured events such as
//! `spampipe.user.lookup_failed`, `spampipe.messages.lookup_failed`,
//! `spampipe.spam.check_failed`, `spampipe.batch.dispatched`,
//! `spampipe.report.sorted`, `spampipe.stage.failed`,
//! `spampipe.downstream.closed` and `spampipe.cancelled`.
//!
//! ```ignore
//! use tracing_subscriber::fmt;
//!
//! fn main() {
//!     fmt()
//!         .with_target(false)
//!         .with_env_filter("spampipe=info")
//!         .init();
//! }
//! ```
//!
//! ---
//!
//! [`Pipe`]: pipeline::pipe::Pipe
//! [`CancelToken`]: pipeline::cancel::CancelToken

// Public modules
pub mod classify;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod stage;

pub mod prelude {
    //! Convenient imports for most `spampipe` users.

    pub use crate::classify::SpamClassifier;
    pub use crate::model::{EmailAddress, MessageId, MsgData, ReportLine, User};
    pub use crate::pipeline::cancel::CancelToken;
    pub use crate::pipeline::chain::PipeExt;
    pub use crate::pipeline::config::PipelineConfig;
    pub use crate::pipeline::runtime::Runtime;
    pub use crate::service::MailService;
}

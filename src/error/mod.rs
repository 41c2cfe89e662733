use thiserror::Error;

use crate::model::MessageId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("pipeline error: {context}")]
    Pipeline { context: &'static str },

    #[error("invalid configuration for `{field}`: {reason}")]
    Config {
        field: &'static str,
        reason: &'static str,
    },

    #[error("no user registered for {email}")]
    UserNotFound { email: String },

    #[error("batch of {len} users exceeds the accepted limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("unknown message {0}")]
    UnknownMessage(MessageId),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn pipeline(context: &'static str) -> Self {
        Self::Pipeline { context }
    }

    pub fn config(field: &'static str, reason: &'static str) -> Self {
        Self::Config { field, reason }
    }
}

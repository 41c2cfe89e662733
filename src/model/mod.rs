//! Items that flow across the stage boundaries.
//!
//! ```text
//! EmailAddress → User → MessageId → MsgData → ReportLine
//! ```

use std::cmp::Ordering;
use std::fmt;

/// Opaque address identifying a user. Element type of the input stream.
pub type EmailAddress = String;

/// One formatted report entry, `"<has_spam> <id>"`.
pub type ReportLine = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: u64,
    pub email: EmailAddress,
}

impl User {
    pub fn new(id: u64, email: impl Into<EmailAddress>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl MessageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message together with its spam classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MsgData {
    pub id: MessageId,
    pub has_spam: bool,
}

impl MsgData {
    pub fn new(id: u64, has_spam: bool) -> Self {
        Self {
            id: MessageId(id),
            has_spam,
        }
    }

    /// Final report ordering: spam before non-spam, then ascending id.
    pub fn report_order(&self, other: &Self) -> Ordering {
        other
            .has_spam
            .cmp(&self.has_spam)
            .then_with(|| self.id.cmp(&other.id))
    }

    pub fn report_line(&self) -> ReportLine {
        self.to_string()
    }
}

impl fmt::Display for MsgData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.has_spam, self.id)
    }
}

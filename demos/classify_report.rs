//! Classify a handful of addresses and print the report.
//!
//! Run with:
//!   cargo run --example classify_report
//!
//! Set `RUST_LOG=spampipe=debug` to watch batches being dispatched and
//! lookups failing.
//!
//! The directory below contains:
//! - two addresses for the same user (collapsed into one)
//! - an address nobody owns (dropped)
//! - a message without a classification (dropped)

use std::sync::Arc;

use spampipe::error::Result;
use spampipe::prelude::*;
use spampipe::service::memory::MemoryDirectory;

fn directory() -> MemoryDirectory {
    MemoryDirectory::new()
        .user("alice@example.com", 1)
        .user("alice.work@example.com", 1)
        .user("bob@example.com", 2)
        .user("carol@example.com", 3)
        .messages(1, [104, 101])
        .messages(2, [202])
        .messages(3, [303, 399])
        .spam(101, false)
        .spam(104, true)
        .spam(202, true)
        .spam(303, false)
        .max_batch(2)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("spampipe=info")),
        )
        .init();

    let addresses = [
        "alice@example.com",
        "bob@example.com",
        "alice.work@example.com",
        "mallory@example.com",
        "carol@example.com",
    ];

    let classifier = SpamClassifier::new(Arc::new(directory()), PipelineConfig::new())?;

    println!("Classifying {} addresses…\n", addresses.len());
    let report = classifier.run(addresses).await?;

    for line in &report {
        println!("  {line}");
    }
    println!("\n{} messages reported.", report.len());
    Ok(())
}

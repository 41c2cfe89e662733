//! Demonstrates how `batch_size` and `max_in_flight` shape a run.
//!
//! Run with:
//!   cargo run --example runtime_config
//!
//! The same slow directory is classified with different tunables. Larger
//! batches mean fewer message lookups; a higher cap lets more spam checks
//! overlap. The report itself never changes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use spampipe::error::Result;
use spampipe::prelude::*;
use spampipe::service::memory::MemoryDirectory;

const USERS: u64 = 12;
const MESSAGES_PER_USER: u64 = 4;

fn slow_directory() -> MemoryDirectory {
    let mut directory = MemoryDirectory::new()
        .max_batch(8)
        .latency(Duration::from_millis(10));
    for user in 1..=USERS {
        let ids: Vec<u64> = (0..MESSAGES_PER_USER).map(|n| user * 100 + n).collect();
        for &id in &ids {
            directory = directory.spam(id, id % 3 == 0);
        }
        directory = directory.user(format!("user{user}@example.com"), user).messages(user, ids);
    }
    directory
}

async fn run_with(batch_size: usize, max_in_flight: usize) -> Result<Vec<ReportLine>> {
    let directory = Arc::new(slow_directory());
    let config = PipelineConfig::new()
        .batch_size(batch_size)
        .max_in_flight(max_in_flight)
        .buffer(16);
    let classifier = SpamClassifier::new(directory.clone(), config)?;

    let addresses = (1..=USERS).map(|user| format!("user{user}@example.com"));

    let started = Instant::now();
    let report = classifier.run(addresses).await?;

    println!(
        "  batch_size={batch_size:>2} max_in_flight={max_in_flight:>2} | {:>4}ms | lookups={:>2} | peak checks={}",
        started.elapsed().as_millis(),
        directory.batch_sizes().len(),
        directory.peak_spam_checks(),
    );
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    println!(
        "{} users × {} messages, 10ms per external call\n",
        USERS, MESSAGES_PER_USER
    );

    let baseline = run_with(1, 1).await?;
    for (batch_size, max_in_flight) in [(2, 5), (4, 5), (8, 16)] {
        let report = run_with(batch_size, max_in_flight).await?;
        assert_eq!(report, baseline, "tunables must not change the report");
    }

    println!("\nFirst lines of the report:");
    for line in baseline.iter().take(5) {
        println!("  {line}");
    }
    Ok(())
}

#![allow(dead_code)]

use std::sync::Arc;

use spampipe::error::Result;
use spampipe::pipeline::pipe::Pipe;
use spampipe::pipeline::runtime::Runtime;
use spampipe::service::memory::MemoryDirectory;

/// Route `spampipe` events to the test harness output. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// `a@x → 1`, `b@x → 2`; user 1 owns message 10 (spam), user 2 owns 11.
pub fn scenario_directory() -> MemoryDirectory {
    MemoryDirectory::new()
        .user("a@x", 1)
        .user("b@x", 2)
        .messages(1, [10])
        .messages(2, [11])
        .spam(10, true)
        .spam(11, false)
        .max_batch(2)
}

/// `count` users `user{i}@x → i`, each owning messages `i * 100 .. i * 100 + per_user`.
/// Even message ids are spam.
pub fn bulk_directory(count: u64, per_user: u64) -> MemoryDirectory {
    let mut directory = MemoryDirectory::new().max_batch(usize::MAX);
    for i in 1..=count {
        let ids: Vec<u64> = (0..per_user).map(|n| i * 100 + n).collect();
        for &id in &ids {
            directory = directory.spam(id, id % 2 == 0);
        }
        directory = directory.user(format!("user{i}@x"), i).messages(i, ids);
    }
    directory
}

pub fn bulk_addresses(count: u64) -> Vec<String> {
    (1..=count).map(|i| format!("user{i}@x")).collect()
}

/// Run a single stage to completion over `items`.
pub async fn run_stage<I, O, P>(pipe: P, items: Vec<I>) -> Result<Vec<O>>
where
    I: Send + 'static,
    O: Send + 'static,
    P: Pipe<I, O> + 'static,
{
    Runtime::new().buffer(8).run(pipe, items).await
}

pub fn shared(directory: MemoryDirectory) -> Arc<MemoryDirectory> {
    Arc::new(directory)
}

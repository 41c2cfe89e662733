use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use proptest::prelude::*;
use spampipe::model::{MessageId, MsgData, User};
use spampipe::service::memory::MemoryDirectory;
use spampipe::stage::{MessageLookup, ResultAggregation, UserResolution};

mod common;
use common::run_stage;

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
        .block_on(fut)
}

proptest! {
    #[test]
    fn report_is_sorted_and_complete(
        input in proptest::collection::vec((any::<u64>(), any::<bool>()), 0..256)
    ) {
        let data: Vec<MsgData> = input.iter().map(|&(id, spam)| MsgData::new(id, spam)).collect();
        let lines = block_on(run_stage(ResultAggregation::new(), data.clone())).expect("aggregation failed");

        prop_assert_eq!(lines.len(), data.len());

        let parsed: Vec<(bool, u64)> = lines
            .iter()
            .map(|line| {
                let (flag, id) = line.split_once(' ').expect("two fields");
                (flag.parse().expect("bool"), id.parse().expect("u64"))
            })
            .collect();

        for pair in parsed.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(a.0 >= b.0, "spam must precede non-spam");
            if a.0 == b.0 {
                prop_assert!(a.1 <= b.1, "ids must be non-decreasing within a group");
            }
        }
    }

    #[test]
    fn batching_is_lossless(
        user_count in 0u64..40,
        per_user in 0u64..4,
        batch_size in 1usize..8
    ) {
        let mut directory = MemoryDirectory::new().max_batch(batch_size);
        for i in 1..=user_count {
            directory = directory.messages(i, (0..per_user).map(|n| i * 10 + n));
        }
        let directory = Arc::new(directory);
        let users: Vec<User> = (1..=user_count).map(|i| User::new(i, format!("u{i}@x"))).collect();

        let ids = block_on(run_stage(MessageLookup::new(directory.clone(), batch_size), users))
            .expect("lookup failed");

        let expected: BTreeSet<MessageId> = (1..=user_count)
            .flat_map(|i| (0..per_user).map(move |n| MessageId(i * 10 + n)))
            .collect();
        prop_assert_eq!(ids.len(), expected.len());
        prop_assert_eq!(ids.into_iter().collect::<BTreeSet<_>>(), expected);
        prop_assert!(directory.batch_sizes().iter().all(|&len| len >= 1 && len <= batch_size));
    }

    #[test]
    fn resolved_user_ids_are_unique(
        picks in proptest::collection::vec(0usize..12, 0..64)
    ) {
        // 12 addresses mapping onto 4 ids.
        let mut directory = MemoryDirectory::new();
        for n in 0..12u64 {
            directory = directory.user(format!("m{n}@x"), n % 4);
        }
        let addresses: Vec<String> = picks.iter().map(|n| format!("m{n}@x")).collect();
        let expected: HashSet<u64> = picks.iter().map(|&n| n as u64 % 4).collect();

        let users = block_on(run_stage(UserResolution::new(Arc::new(directory)), addresses))
            .expect("resolution failed");

        let ids: HashSet<u64> = users.iter().map(|u| u.id).collect();
        prop_assert_eq!(ids.len(), users.len());
        prop_assert_eq!(ids, expected);
    }
}

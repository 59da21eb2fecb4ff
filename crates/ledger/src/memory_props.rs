//! Property-based tests for optimistic commits on the in-memory ledger.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use exportflow_core::clock::SystemClock;
use proptest::prelude::*;

use crate::events::RecordingEventSink;
use crate::memory::MemoryLedger;
use crate::store::{RecordStore, StoreError, Version, Write, WriteBatch};

const KEY: &str = "EXP-PROP";
const WRITERS: usize = 4;

#[derive(Debug, Clone, Copy)]
enum Step {
    Read(usize),
    Commit(usize),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..WRITERS).prop_map(Step::Read),
        (0..WRITERS).prop_map(Step::Commit),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Writers that observed the same version race; at most one of them
    /// commits, and every successful commit leaves exactly one history entry.
    #[test]
    fn prop_one_winner_per_observed_version(
        steps in prop::collection::vec(arb_step(), 1..60),
    ) {
        let ledger = MemoryLedger::new(Arc::new(SystemClock), Arc::new(RecordingEventSink::new()));
        let mut observed: Vec<Option<Option<Version>>> = vec![None; WRITERS];
        let mut winners: HashMap<Option<Version>, usize> = HashMap::new();
        let mut commits = 0usize;

        for (n, step) in steps.into_iter().enumerate() {
            match step {
                Step::Read(writer) => {
                    observed[writer] = Some(ledger.read(KEY).unwrap().map(|v| v.version));
                }
                Step::Commit(writer) => {
                    let Some(seen) = observed[writer].take() else {
                        continue;
                    };
                    let current = ledger.read(KEY).unwrap().map(|v| v.version);
                    let batch = WriteBatch {
                        tx_id: format!("tx-{n}"),
                        reads: BTreeMap::from([(KEY.to_string(), seen)]),
                        writes: BTreeMap::from([(
                            KEY.to_string(),
                            Write::Put(format!("writer-{writer}").into_bytes()),
                        )]),
                        event: None,
                    };
                    match ledger.commit(batch) {
                        Ok(receipt) => {
                            prop_assert_eq!(seen, current);
                            prop_assert!(current.is_none_or(|v| receipt.version > v));
                            *winners.entry(seen).or_default() += 1;
                            commits += 1;
                        }
                        Err(err) => {
                            prop_assert_ne!(seen, current);
                            prop_assert_eq!(err, StoreError::Conflict { key: KEY.to_string() });
                        }
                    }
                }
            }
        }

        prop_assert!(winners.values().all(|&count| count == 1));
        prop_assert_eq!(ledger.history(KEY).unwrap().len(), commits);
        prop_assert_eq!(ledger.len().unwrap(), usize::from(commits > 0));
    }
}

use std::collections::BTreeSet;
use std::thread;

use proptest::prelude::*;
use tally::{Outcome, Shared, Tally};

fn option() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("A"), Just("B"), Just("C")]
}

/// Registers every ballot from its own thread and returns the outcomes.
fn register_concurrently(shared: &Shared, ballots: &[(String, &'static str)]) -> Vec<Outcome> {
    thread::scope(|scope| {
        let handles = ballots.iter()
            .map(|(voter, option)| scope.spawn(move || shared.try_register(voter, option)))
            .collect::<Vec<_>>();
        handles.into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    })
}

fn accepted(outcomes: Vec<Outcome>) -> Vec<Tally> {
    outcomes.into_iter()
        .filter_map(|outcome| match outcome {
        | Outcome::Accepted(tally) => Some(tally),
        | _ => None,
        })
        .collect()
}

/// Accepted snapshots must form a chain: ordered by total, each one
/// dominates the previous option by option.
fn assert_chain(mut snapshots: Vec<Tally>) {
    snapshots.sort_by_key(|tally| tally.values().sum::<usize>());
    for (i, tally) in snapshots.iter().enumerate() {
        assert_eq!(tally.values().sum::<usize>(), i + 1);
    }
    for pair in snapshots.windows(2) {
        for (option, count) in &pair[0] {
            assert!(pair[1][option] >= *count, "{:?} then {:?}", pair[0], pair[1]);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn distinct_voters_are_all_counted(options in prop::collection::vec(option(), 1..64)) {
        let shared = Shared::default();
        let ballots = options.iter()
            .enumerate()
            .map(|(i, option)| (format!("voter-{}", i), *option))
            .collect::<Vec<_>>();

        let snapshots = accepted(register_concurrently(&shared, &ballots));
        prop_assert_eq!(snapshots.len(), ballots.len());
        prop_assert_eq!(shared.snapshot().values().sum::<usize>(), ballots.len());
        prop_assert_eq!(shared.voters(), ballots.len());

        for option in &["A", "B", "C"] {
            let expected = options.iter().filter(|chosen| *chosen == option).count();
            prop_assert_eq!(shared.snapshot()[*option], expected);
        }
        assert_chain(snapshots);
    }

    #[test]
    fn repeat_voters_count_once(
        ballots in prop::collection::vec((0usize..16, option()), 1..64),
    ) {
        let shared = Shared::default();
        let ballots = ballots.into_iter()
            .map(|(voter, option)| (format!("voter-{}", voter), option))
            .collect::<Vec<_>>();
        let distinct = ballots.iter()
            .map(|(voter, _)| voter.clone())
            .collect::<BTreeSet<_>>();

        let outcomes = register_concurrently(&shared, &ballots);
        let repeats = outcomes.iter()
            .filter(|outcome| **outcome == Outcome::AlreadyVoted)
            .count();
        let snapshots = accepted(outcomes);

        prop_assert_eq!(snapshots.len(), distinct.len());
        prop_assert_eq!(repeats, ballots.len() - distinct.len());
        prop_assert_eq!(shared.snapshot().values().sum::<usize>(), shared.voters());
        assert_chain(snapshots);
    }

    #[test]
    fn invalid_options_never_count(
        voters in prop::collection::btree_set("[a-z]{1,8}", 1..32),
        option in "[D-Z]|[a-z]|",
    ) {
        let shared = Shared::default();
        let ballots = voters.iter()
            .map(|voter| (voter.clone(), "A"))
            .collect::<Vec<_>>();
        let before = accepted(register_concurrently(&shared, &ballots));
        prop_assert_eq!(before.len(), voters.len());

        let snapshot = shared.snapshot();
        for voter in &voters {
            prop_assert_eq!(shared.try_register(voter, &option), Outcome::AlreadyVoted);
            prop_assert_eq!(shared.try_register(&format!("{}-new", voter), &option), Outcome::InvalidOption);
        }
        prop_assert_eq!(shared.snapshot(), snapshot);
        prop_assert_eq!(shared.voters(), voters.len());
    }
}

//! # Summary
//!
//! This module implements the tally store shared by every worker. The
//! central `State` type is wrapped with Arc<Mutex<T>> and never handed out:
//! callers only get the atomic `try_register` and value snapshots, so the
//! voter map and the counters can never be observed out of step.

use std::sync::Arc;

use hashbrown::HashMap as Map;
use parking_lot::Mutex;

use crate::state::{Outcome, Tally};

/// Thread-safe handle to the poll's tally. All clones share the same state.
#[derive(Clone, Debug)]
pub struct Shared(Arc<Mutex<State>>);

/// Voters who have cast a ballot and the per-option counters.
#[derive(Debug)]
struct State {
    /// Option chosen by each registered voter
    cast_by: Map<String, String>,

    /// Number of registered voters per option
    counts: Tally,
}

impl Shared {
    /// Creates a tally with every option at zero and no voters.
    pub fn new<I, O>(options: I) -> Self
    where I: IntoIterator<Item = O>,
          O: Into<String>,
    {
        let counts = options.into_iter()
            .map(|option| (option.into(), 0))
            .collect();
        Shared(Arc::new(Mutex::new(State {
            cast_by: Map::default(),
            counts,
        })))
    }

    /// Records `voter`'s ballot for `option` if this is its first one and
    /// the option exists. Returns the counts right after the increment.
    pub fn try_register(&self, voter: &str, option: &str) -> Outcome {
        let mut state = self.0.lock();
        if state.cast_by.contains_key(voter) {
            return Outcome::AlreadyVoted
        }
        match state.counts.get_mut(option) {
        | Some(count) => *count += 1,
        | None => return Outcome::InvalidOption,
        }
        state.cast_by.insert(voter.to_string(), option.to_string());
        Outcome::Accepted(state.counts.clone())
    }

    /// Copies the current counts.
    pub fn snapshot(&self) -> Tally {
        self.0.lock().counts.clone()
    }

    /// Number of registered voters.
    pub fn voters(&self) -> usize {
        self.0.lock().cast_by.len()
    }

    /// Options accepted by this poll.
    pub fn options(&self) -> Vec<String> {
        self.0.lock().counts.keys().cloned().collect()
    }
}

impl Default for Shared {
    fn default() -> Self {
        Shared::new(crate::state::DEFAULT_OPTIONS.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(a: usize, b: usize, c: usize) -> Tally {
        vec![("A", a), ("B", b), ("C", c)]
            .into_iter()
            .map(|(option, count)| (option.to_string(), count))
            .collect()
    }

    #[test]
    fn starts_empty() {
        let shared = Shared::default();
        assert_eq!(shared.snapshot(), tally(0, 0, 0));
        assert_eq!(shared.voters(), 0);
        assert_eq!(shared.options(), vec!["A", "B", "C"]);
    }

    #[test]
    fn basic_flow() {
        let shared = Shared::default();
        assert_eq!(shared.try_register("alice", "A"), Outcome::Accepted(tally(1, 0, 0)));
        assert_eq!(shared.try_register("alice", "B"), Outcome::AlreadyVoted);
        assert_eq!(shared.snapshot(), tally(1, 0, 0));
        assert_eq!(shared.try_register("bob", "Z"), Outcome::InvalidOption);
        assert_eq!(shared.snapshot(), tally(1, 0, 0));
        assert_eq!(shared.try_register("bob", "B"), Outcome::Accepted(tally(1, 1, 0)));
        assert_eq!(shared.voters(), 2);
    }

    #[test]
    fn repeat_voter_is_rejected_for_any_option() {
        let shared = Shared::default();
        assert!(shared.try_register("carol", "C").is_accepted());
        for option in &["A", "B", "C", "Z", ""] {
            assert_eq!(shared.try_register("carol", option), Outcome::AlreadyVoted);
        }
        assert_eq!(shared.snapshot(), tally(0, 0, 1));
    }

    #[test]
    fn invalid_option_leaves_voter_free_to_vote() {
        let shared = Shared::default();
        assert_eq!(shared.try_register("dave", "a"), Outcome::InvalidOption);
        assert_eq!(shared.voters(), 0);
        assert_eq!(shared.try_register("dave", "A"), Outcome::Accepted(tally(1, 0, 0)));
    }

    #[test]
    fn accepted_snapshot_is_detached() {
        let shared = Shared::default();
        let first = match shared.try_register("erin", "B") {
        | Outcome::Accepted(tally) => tally,
        | other => panic!("unexpected outcome {:?}", other),
        };
        shared.try_register("frank", "B");
        assert_eq!(first, tally(0, 1, 0));
        assert_eq!(shared.snapshot(), tally(0, 2, 0));
    }

    #[test]
    fn counts_match_voters() {
        let shared = Shared::default();
        let options = ["A", "B", "C", "Q"];
        for i in 0..100 {
            shared.try_register(&format!("voter-{}", i % 60), options[i % options.len()]);
            let sum: usize = shared.snapshot().values().sum();
            assert_eq!(sum, shared.voters());
        }
    }

    #[test]
    fn custom_options() {
        let shared = Shared::new(vec!["yes", "no"]);
        assert!(shared.try_register("gina", "yes").is_accepted());
        assert_eq!(shared.try_register("hal", "A"), Outcome::InvalidOption);
        assert_eq!(shared.options(), vec!["no", "yes"]);
    }
}

use std::collections::BTreeMap;

/// Options accepted by a poll unless configured otherwise.
pub const DEFAULT_OPTIONS: [&str; 3] = ["A", "B", "C"];

/// Vote count per option. Ordered so that serialized tallies are stable.
pub type Tally = BTreeMap<String, usize>;

/// Result of attempting to register a single vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Vote was recorded. Carries a copy of the counts right after the increment.
    Accepted(Tally),

    /// Voter was already registered; nothing changed.
    AlreadyVoted,

    /// First-time voter picked an option outside the poll; nothing changed.
    InvalidOption,
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        match self {
        | Outcome::Accepted(_) => true,
        | _ => false,
        }
    }
}

//! Majority-vote tie conventions.
//!
//! Leaves and forests resolve ties in opposite directions. Both conventions
//! are kept as separate named policies so neither silently absorbs the other.

/// How a positive/negative tally becomes a boolean decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePolicy {
    /// `true` only when positives strictly outnumber negatives; a tie is `false`.
    StrictMajority,
    /// `true` when positives are at least as many as negatives; a tie is `true`.
    MajorityOrTie,
}

impl VotePolicy {
    /// Turn a tally into a decision.
    #[must_use]
    pub fn decide(self, pos: usize, neg: usize) -> bool {
        match self {
            VotePolicy::StrictMajority => pos > neg,
            VotePolicy::MajorityOrTie => pos >= neg,
        }
    }
}

/// Tie convention at a decision-tree leaf.
pub const LEAF_VOTE: VotePolicy = VotePolicy::StrictMajority;

/// Tie convention across the trees of a forest.
pub const FOREST_VOTE: VotePolicy = VotePolicy::MajorityOrTie;

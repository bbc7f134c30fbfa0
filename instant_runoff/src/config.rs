// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// The identifier of a candidate.
///
/// Identifiers are compared numerically when a tie between candidates has to
/// be broken with [TieBreakMode::LowestId].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub u32);

impl Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
}

impl Candidate {
    pub fn new(id: u32, name: &str) -> Candidate {
        Candidate {
            id: CandidateId(id),
            name: name.to_string(),
        }
    }
}

/// A single entry on a ballot. Lower ranks are preferred.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Ranking {
    pub candidate: CandidateId,
    pub rank: u32,
}

/// The preferences of one voter.
///
/// The rankings do not need to be sorted, complete or contiguous, and they may
/// mention candidates that are not running. Such entries are simply never
/// counted.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Ballot {
    pub rankings: Vec<Ranking>,
}

impl Ballot {
    /// Creates a ballot from candidate ids listed from the most preferred to
    /// the least preferred one. The first id gets rank 1.
    pub fn from_preferences(ids: &[u32]) -> Ballot {
        Ballot {
            rankings: ids
                .iter()
                .enumerate()
                .map(|(idx, id)| Ranking {
                    candidate: CandidateId(*id),
                    rank: (idx + 1) as u32,
                })
                .collect(),
        }
    }
}

// ******** Output data structures *********

/// What happened to the candidates at the end of a round.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RoundOutcome {
    /// The candidate holds a majority of the votes counted in this round.
    Elected(CandidateId),
    /// The candidate had the fewest votes and is removed from the next rounds.
    Eliminated(CandidateId),
}

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundResult {
    /// Starts at 1.
    pub round: u32,
    /// The vote count of every candidate still running in this round,
    /// including the ones without any vote.
    pub votes: BTreeMap<CandidateId, u64>,
    pub total_votes: u64,
    /// Ballots without any candidate still running.
    pub exhausted: u64,
    pub outcome: RoundOutcome,
}

impl RoundResult {
    pub fn winner(&self) -> Option<CandidateId> {
        match self.outcome {
            RoundOutcome::Elected(cid) => Some(cid),
            RoundOutcome::Eliminated(_) => None,
        }
    }

    pub fn eliminated(&self) -> Option<CandidateId> {
        match self.outcome {
            RoundOutcome::Eliminated(cid) => Some(cid),
            RoundOutcome::Elected(_) => None,
        }
    }

    /// The number of votes a candidate needed to win this round outright.
    pub fn majority_threshold(&self) -> u64 {
        crate::majority_threshold(self.total_votes)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TabulationResult {
    pub rounds: Vec<RoundResult>,
    /// Absent when there are no ballots, no candidates, or when the
    /// tabulation hit the maximum number of rounds.
    pub winner: Option<Candidate>,
    pub total_ballots: u64,
}

impl TabulationResult {
    /// A result without a winner must be treated as inconclusive.
    pub fn is_conclusive(&self) -> bool {
        self.winner.is_some()
    }
}

/// Reasons for refusing a ballot when assembling an election with the builder.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotError {
    EmptyBallot,
    /// Ranks start at 1.
    InvalidRank { candidate: CandidateId },
    DuplicateRank { rank: u32 },
}

impl Error for BallotError {}

impl Display for BallotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotError::EmptyBallot => write!(f, "the ballot does not rank any candidate"),
            BallotError::InvalidRank { candidate } => {
                write!(f, "candidate {} was given rank 0", candidate)
            }
            BallotError::DuplicateRank { rank } => {
                write!(f, "rank {} is used more than once", rank)
            }
        }
    }
}

// ********* Configuration **********

/// How to choose the candidate to eliminate when several candidates share the
/// lowest vote count.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Eliminates the candidate with the smallest id. This is reproducible but
    /// carries no notion of fairness: low ids always lose ties.
    LowestId,
    /// Orders the tied candidates with a cryptographic hash of the seed, the
    /// round and the candidate id. The same seed always gives the same order.
    Random(u32),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TabulationRules {
    pub tiebreak_mode: TieBreakMode,
    /// No round with a greater number is ever run.
    pub max_rounds: u32,
}

impl TabulationRules {
    pub const DEFAULT_MAX_ROUNDS: u32 = 100;

    pub const DEFAULT_RULES: TabulationRules = TabulationRules {
        tiebreak_mode: TieBreakMode::LowestId,
        max_rounds: TabulationRules::DEFAULT_MAX_ROUNDS,
    };
}

impl Default for TabulationRules {
    fn default() -> Self {
        TabulationRules::DEFAULT_RULES
    }
}

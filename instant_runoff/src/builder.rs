pub use crate::config::*;

use log::debug;
use std::collections::HashSet;

/// A builder for assembling the ballots of an election.
///
/// Unlike [crate::tabulate], which accepts anything, the builder refuses
/// ballots that a vote collection system should never have stored: empty
/// ballots, rank 0 and ranks used twice on the same ballot.
///
/// ```
/// use instant_runoff::builder::Builder;
/// use instant_runoff::{BallotError, Candidate, TabulationRules};
///
/// let mut builder = Builder::new(&TabulationRules::DEFAULT_RULES)
///     .candidates(&[Candidate::new(1, "Anna"), Candidate::new(2, "Bob")]);
///
/// builder.add_preferences(&[1, 2])?;
/// builder.add_ranked(&[(2, 1)])?;
/// builder.add_preferences(&[1])?;
///
/// let result = builder.tabulate();
/// assert_eq!(result.winner.map(|c| c.name), Some("Anna".to_string()));
///
/// # Ok::<(), BallotError>(())
/// ```
pub struct Builder {
    pub(crate) _rules: TabulationRules,
    pub(crate) _candidates: Vec<Candidate>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &TabulationRules) -> Builder {
        Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _ballots: Vec::new(),
        }
    }

    pub fn candidates(self, cands: &[Candidate]) -> Builder {
        Builder {
            _rules: self._rules,
            _candidates: cands.to_vec(),
            _ballots: self._ballots,
        }
    }

    /// Adds a ballot listing candidate ids from the most to the least preferred.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_preferences(&mut self, ids: &[u32]) -> Result<(), BallotError> {
        self.add_ballot(&Ballot::from_preferences(ids))
    }

    /// Adds a ballot made of `(candidate id, rank)` pairs, in any order.
    pub fn add_ranked(&mut self, rankings: &[(u32, u32)]) -> Result<(), BallotError> {
        let ballot = Ballot {
            rankings: rankings
                .iter()
                .map(|(cid, rank)| Ranking {
                    candidate: CandidateId(*cid),
                    rank: *rank,
                })
                .collect(),
        };
        self.add_ballot(&ballot)
    }

    /// Checks and adds a ballot.
    ///
    /// A candidate ranked several times on the same ballot is accepted: only its
    /// most preferred rank will ever matter. Candidates that are not registered
    /// are accepted too, they never receive votes.
    pub fn add_ballot(&mut self, ballot: &Ballot) -> Result<(), BallotError> {
        check_ballot(ballot)?;
        for r in ballot.rankings.iter() {
            if !self._candidates.iter().any(|c| c.id == r.candidate) {
                debug!(
                    "add_ballot: candidate {} is not registered, this ranking will not count",
                    r.candidate
                );
            }
        }
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self._ballots
    }

    pub fn tabulate(&self) -> TabulationResult {
        crate::tabulate_with_rules(&self._ballots, &self._candidates, &self._rules)
    }
}

/// The checks applied by [Builder::add_ballot].
///
/// [crate::tabulate] does not need them: it counts any ballot. This is for
/// callers that want to report doubtful ballots without refusing them.
pub fn check_ballot(ballot: &Ballot) -> Result<(), BallotError> {
    if ballot.rankings.is_empty() {
        return Err(BallotError::EmptyBallot);
    }
    let mut seen_ranks: HashSet<u32> = HashSet::new();
    for r in ballot.rankings.iter() {
        if r.rank == 0 {
            return Err(BallotError::InvalidRank {
                candidate: r.candidate,
            });
        }
        if !seen_ranks.insert(r.rank) {
            return Err(BallotError::DuplicateRank { rank: r.rank });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> Builder {
        Builder::new(&TabulationRules::DEFAULT_RULES)
            .candidates(&[Candidate::new(1, "Anna"), Candidate::new(2, "Bob")])
    }

    #[test]
    fn rejects_empty_ballot() {
        let mut b = builder();
        assert_eq!(b.add_preferences(&[]), Err(BallotError::EmptyBallot));
        assert!(b.ballots().is_empty());
    }

    #[test]
    fn rejects_rank_zero() {
        let mut b = builder();
        assert_eq!(
            b.add_ranked(&[(1, 1), (2, 0)]),
            Err(BallotError::InvalidRank {
                candidate: CandidateId(2)
            })
        );
    }

    #[test]
    fn rejects_duplicate_rank() {
        let mut b = builder();
        assert_eq!(
            b.add_ranked(&[(1, 2), (2, 2)]),
            Err(BallotError::DuplicateRank { rank: 2 })
        );
        assert!(b.ballots().is_empty());
    }

    #[test]
    fn accepts_duplicate_candidate_and_unknown_candidate() {
        let mut b = builder();
        assert!(b.add_preferences(&[2, 2, 1]).is_ok());
        assert!(b.add_preferences(&[7]).is_ok());
        assert_eq!(b.ballots().len(), 2);

        let res = b.tabulate();
        assert_eq!(res.total_ballots, 2);
        // Bob: 1 vote out of 1 counted vote, the unknown candidate is exhausted.
        assert_eq!(res.rounds.len(), 1);
        assert_eq!(res.rounds[0].winner(), Some(CandidateId(2)));
        assert_eq!(res.rounds[0].exhausted, 1);
    }

    #[test]
    fn candidates_keep_ballots() {
        let mut b = Builder::new(&TabulationRules::DEFAULT_RULES);
        b.add_preferences(&[1]).unwrap();
        let b = b.candidates(&[Candidate::new(1, "Anna")]);
        assert_eq!(b.ballots().len(), 1);
        assert_eq!(b.tabulate().winner, Some(Candidate::new(1, "Anna")));
    }

    #[test]
    fn check_ballot_does_not_need_candidates() {
        assert_eq!(check_ballot(&Ballot::default()), Err(BallotError::EmptyBallot));
        assert_eq!(check_ballot(&Ballot::from_preferences(&[5, 9])), Ok(()));
    }
}

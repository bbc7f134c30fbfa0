pub mod builder;
mod config;
pub mod manual;

use log::{debug, info, warn};

use std::collections::{BTreeMap, BTreeSet};

pub use crate::config::*;

// **** Private structures ****

type RoundId = u32;

// The candidates of a ballot, from the most preferred to the least preferred.
// Built once per tabulation: the ranks are not needed after sorting.
#[derive(Eq, PartialEq, Debug, Clone)]
struct RankedChoice(Vec<CandidateId>);

impl RankedChoice {
    fn from_ballot(ballot: &Ballot) -> RankedChoice {
        let mut rankings = ballot.rankings.clone();
        // Stable: rankings sharing a rank stay in input order.
        rankings.sort_by_key(|r| r.rank);
        RankedChoice(rankings.iter().map(|r| r.candidate).collect())
    }

    /// The most preferred candidate that is still running.
    /// Returns None for an exhausted ballot.
    fn first_active(&self, active: &BTreeSet<CandidateId>) -> Option<CandidateId> {
        self.0.iter().find(|cid| active.contains(cid)).cloned()
    }
}

/// Runs an instant-runoff tabulation with the default rules.
///
/// See [tabulate_with_rules].
pub fn tabulate(ballots: &[Ballot], candidates: &[Candidate]) -> TabulationResult {
    tabulate_with_rules(ballots, candidates, &TabulationRules::DEFAULT_RULES)
}

/// Runs an instant-runoff tabulation.
///
/// Arguments:
/// * `ballots` the ballots to count. Their order has no influence on the result.
/// * `candidates` the candidates running. Candidates sharing an id are counted once.
/// * `rules` the tie break policy and the maximum number of rounds.
///
/// Each round counts, for every ballot, its most preferred candidate still
/// running. A candidate reaching `floor(total / 2) + 1` votes wins and ends the
/// tabulation. Otherwise the candidate with the fewest votes is eliminated.
/// When a single candidate is left, it wins without an additional round.
///
/// This function never fails: missing ballots, missing candidates or unknown
/// candidates on ballots produce a result without rounds or without a winner.
pub fn tabulate_with_rules(
    ballots: &[Ballot],
    candidates: &[Candidate],
    rules: &TabulationRules,
) -> TabulationResult {
    info!(
        "Processing {:?} ballots, {:?} candidates, rules: {:?}",
        ballots.len(),
        candidates.len(),
        rules
    );

    if ballots.is_empty() {
        info!("No ballot to process");
        return TabulationResult {
            rounds: Vec::new(),
            winner: None,
            total_ballots: 0,
        };
    }
    let total_ballots = ballots.len() as u64;

    let ranked_choices: Vec<RankedChoice> = ballots.iter().map(RankedChoice::from_ballot).collect();

    // The first candidate registered with a given id provides its name.
    let mut candidates_by_id: BTreeMap<CandidateId, &str> = BTreeMap::new();
    for c in candidates.iter() {
        candidates_by_id.entry(c.id).or_insert(c.name.as_str());
    }
    for (cid, name) in candidates_by_id.iter() {
        info!("Candidate: {}: {}", cid, name);
    }

    let mut active: BTreeSet<CandidateId> = candidates_by_id.keys().cloned().collect();
    let mut rounds: Vec<RoundResult> = Vec::new();
    let mut winner: Option<CandidateId> = None;
    let mut round_id: RoundId = 1;

    while active.len() > 1 {
        if round_id > rules.max_rounds {
            warn!(
                "Stopping after {} rounds without a winner, {} candidates still running",
                rules.max_rounds,
                active.len()
            );
            break;
        }

        let round = run_one_round(
            &ranked_choices,
            &active,
            rules.tiebreak_mode,
            round_id,
            total_ballots,
        );
        log_round(&round, &candidates_by_id);

        let outcome = round.outcome;
        rounds.push(round);
        match outcome {
            RoundOutcome::Elected(cid) => {
                winner = Some(cid);
                break;
            }
            RoundOutcome::Eliminated(cid) => {
                active.remove(&cid);
            }
        }
        round_id += 1;
    }

    // Last candidate standing. It does not get a round of its own.
    if winner.is_none() && active.len() == 1 {
        winner = active.iter().next().cloned();
        debug!(
            "tabulate: {:?} is the only remaining candidate, declared winner",
            winner
        );
    }

    let winner: Option<Candidate> =
        winner.and_then(|cid| candidates.iter().find(|c| c.id == cid).cloned());
    match &winner {
        Some(c) => info!("Winner after {} rounds: {}: {}", rounds.len(), c.id, c.name),
        None => warn!("No winner after {} rounds", rounds.len()),
    }

    TabulationResult {
        rounds,
        winner,
        total_ballots,
    }
}

pub(crate) fn majority_threshold(total_votes: u64) -> u64 {
    (total_votes / 2) + 1
}

fn compute_tally(
    ranked_choices: &[RankedChoice],
    active: &BTreeSet<CandidateId>,
) -> BTreeMap<CandidateId, u64> {
    // Every running candidate appears, even without any vote.
    let mut tally: BTreeMap<CandidateId, u64> = active.iter().map(|cid| (*cid, 0)).collect();
    for rc in ranked_choices.iter() {
        if let Some(cid) = rc.first_active(active) {
            if let Some(count) = tally.get_mut(&cid) {
                *count += 1;
            }
        }
    }
    tally
}

fn run_one_round(
    ranked_choices: &[RankedChoice],
    active: &BTreeSet<CandidateId>,
    tiebreak: TieBreakMode,
    round_id: RoundId,
    total_ballots: u64,
) -> RoundResult {
    let tally = compute_tally(ranked_choices, active);
    debug!("run_one_round: round {} tally: {:?}", round_id, tally);

    let total_votes: u64 = tally.values().sum();
    let vote_threshold = majority_threshold(total_votes);
    debug!(
        "run_one_round: total_votes: {} vote_threshold: {}",
        total_votes, vote_threshold
    );

    let outcome = match find_majority(&tally, total_votes, vote_threshold) {
        Some(cid) => RoundOutcome::Elected(cid),
        None => RoundOutcome::Eliminated(find_eliminated_candidate(&tally, tiebreak, round_id)),
    };

    RoundResult {
        round: round_id,
        votes: tally,
        total_votes,
        exhausted: total_ballots - total_votes,
        outcome,
    }
}

fn find_majority(
    tally: &BTreeMap<CandidateId, u64>,
    total_votes: u64,
    vote_threshold: u64,
) -> Option<CandidateId> {
    // Without any vote, nobody can claim a majority.
    if total_votes == 0 {
        return None;
    }
    tally
        .iter()
        .find(|(_, count)| **count >= vote_threshold)
        .map(|(cid, _)| *cid)
}

// Called with at least two running candidates.
fn find_eliminated_candidate(
    tally: &BTreeMap<CandidateId, u64>,
    tiebreak: TieBreakMode,
    round_id: RoundId,
) -> CandidateId {
    let min_count: u64 = tally.values().cloned().min().unwrap_or(0);

    // In increasing id order, since the tally is sorted.
    let all_smallest: Vec<CandidateId> = tally
        .iter()
        .filter_map(|(cid, count)| if *count == min_count { Some(*cid) } else { None })
        .collect();
    debug!(
        "find_eliminated_candidate: min_count: {} all_smallest: {:?}",
        min_count, all_smallest
    );

    if all_smallest.len() > 1 {
        info!(
            "Round {}: tie between {:?} with {} votes, resolved with {:?}",
            round_id, all_smallest, min_count, tiebreak
        );
    }

    let sorted_candidates: Vec<CandidateId> = match tiebreak {
        TieBreakMode::LowestId => all_smallest,
        TieBreakMode::Random(seed) => candidate_permutation_crypto(&all_smallest, seed, round_id),
    };
    // The tally is never empty here: more than one candidate is running.
    sorted_candidates[0]
}

/// Generates a "random" permutation of the candidates. Random in this context means hard to guess in advance.
/// This uses a cryptographic hash, so that two candidates never collide in practice.
fn candidate_permutation_crypto(
    candidates: &[CandidateId],
    seed: u32,
    round_id: RoundId,
) -> Vec<CandidateId> {
    let mut data: Vec<(CandidateId, String)> = candidates
        .iter()
        .map(|cid| {
            let key = format!("{:08}{:08}{:010}", seed, round_id, cid.0);
            (*cid, sha256::digest(key.as_str()))
        })
        .collect();
    // The id settles the (theoretical) case of two identical digests.
    data.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    data.iter().map(|p| p.0).collect()
}

fn log_round(round: &RoundResult, candidates_by_id: &BTreeMap<CandidateId, &str>) {
    info!(
        "Round {} (winning threshold: {})",
        round.round,
        round.majority_threshold()
    );
    for (cid, count) in round.votes.iter() {
        let name = candidates_by_id.get(cid).cloned().unwrap_or("?");
        let status = match round.outcome {
            RoundOutcome::Elected(x) if x == *cid => " -> elected",
            RoundOutcome::Eliminated(x) if x == *cid => " -> eliminated",
            _ => "",
        };
        info!("{:>7} {}{}", count, name, status);
    }
    if round.exhausted > 0 {
        info!("{:>7} exhausted", round.exhausted);
    }
}

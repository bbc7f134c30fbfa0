// Primitives for the JSON documents: ballots from the vote storage and the results.

use std::collections::BTreeMap;
use std::fs;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::rcv::{io_common::make_default_id, *};

pub const NO_VOTES_MESSAGE: &str = "No votes have been cast yet";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ContestantJs {
    pub id: u32,
    pub name: String,
    /// Description, picture, creation date... Copied untouched to the results.
    #[serde(flatten)]
    pub extra: JSMap<String, JSValue>,
}

impl ContestantJs {
    pub fn from_candidate(c: &Candidate) -> ContestantJs {
        ContestantJs {
            id: c.id.0,
            name: c.name.clone(),
            extra: JSMap::new(),
        }
    }

    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: CandidateId(self.id),
            name: self.name.clone(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankingJs {
    #[serde(rename = "contestantId")]
    pub contestant_id: u32,
    pub rank: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotJs {
    #[serde(default)]
    pub id: Option<JSValue>,
    pub rankings: Vec<RankingJs>,
}

/// The content of a JSON ballot file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionJs {
    #[serde(default, alias = "candidates")]
    pub contestants: Vec<ContestantJs>,
    #[serde(default, alias = "votes")]
    pub ballots: Vec<BallotJs>,
}

pub fn read_json_election(path: &str) -> RcvResult<(Vec<ContestantJs>, Vec<ParsedBallot>)> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let election: ElectionJs = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!(
        "read_json_election: {:?}: {} contestants, {} ballots",
        path,
        election.contestants.len(),
        election.ballots.len()
    );

    let default_id = make_default_id(path);
    let ballots: Vec<ParsedBallot> = election
        .ballots
        .iter()
        .enumerate()
        .map(|(idx, b)| {
            let id = match &b.id {
                Some(JSValue::String(s)) => s.clone(),
                Some(JSValue::Null) | None => default_id(idx + 1),
                Some(v) => v.to_string(),
            };
            ParsedBallot {
                id: Some(id),
                rankings: b
                    .rankings
                    .iter()
                    .map(|r| (r.contestant_id, r.rank))
                    .collect(),
            }
        })
        .collect();
    Ok((election.contestants, ballots))
}

pub fn read_contestants(path: &str) -> RcvResult<Vec<ContestantJs>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

// ******** Results *********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RoundResultJs {
    pub round: u32,
    pub votes: BTreeMap<u32, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eliminated: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<u32>,
    #[serde(rename = "totalVotes")]
    pub total_votes: u64,
    #[serde(default)]
    pub exhausted: u64,
}

impl RoundResultJs {
    pub fn from_round(r: &RoundResult) -> RoundResultJs {
        RoundResultJs {
            round: r.round,
            votes: r.votes.iter().map(|(cid, count)| (cid.0, *count)).collect(),
            eliminated: r.eliminated().map(|cid| cid.0),
            winner: r.winner().map(|cid| cid.0),
            total_votes: r.total_votes,
            exhausted: r.exhausted,
        }
    }

    pub fn to_round(&self) -> RcvResult<RoundResult> {
        let outcome = match (self.winner, self.eliminated) {
            (Some(cid), None) => RoundOutcome::Elected(CandidateId(cid)),
            (None, Some(cid)) => RoundOutcome::Eliminated(CandidateId(cid)),
            x => whatever!(
                "Round {}: expected either a winner or an eliminated contestant, found {:?}",
                self.round,
                x
            ),
        };
        Ok(RoundResult {
            round: self.round,
            votes: self
                .votes
                .iter()
                .map(|(cid, count)| (CandidateId(*cid), *count))
                .collect(),
            total_votes: self.total_votes,
            exhausted: self.exhausted,
            outcome,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TabulationResultJs {
    pub rounds: Vec<RoundResultJs>,
    pub winner: Option<ContestantJs>,
    #[serde(rename = "totalBallots")]
    pub total_ballots: u64,
}

impl TabulationResultJs {
    /// The winner is reported with all the fields of its contestant entry.
    pub fn from_result(res: &TabulationResult, contestants: &[ContestantJs]) -> TabulationResultJs {
        let winner = res.winner.as_ref().map(|w| {
            contestants
                .iter()
                .find(|c| c.id == w.id.0)
                .cloned()
                .unwrap_or_else(|| ContestantJs::from_candidate(w))
        });
        TabulationResultJs {
            rounds: res.rounds.iter().map(RoundResultJs::from_round).collect(),
            winner,
            total_ballots: res.total_ballots,
        }
    }

    pub fn library_rounds(&self) -> RcvResult<Vec<RoundResult>> {
        self.rounds.iter().map(|r| r.to_round()).collect()
    }
}

/// The complete document written at the end of the tabulation.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub config: OutputConfig,
    pub results: Option<TabulationResultJs>,
    pub contestants: Vec<ContestantJs>,
    #[serde(rename = "totalVotes")]
    pub total_votes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

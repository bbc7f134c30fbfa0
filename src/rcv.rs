use log::{debug, info, warn};

use instant_runoff::builder::check_ballot;
use instant_runoff::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::rcv::config_reader::*;
use crate::rcv::io_common::{simplify_file_name, summary_file_name};
use crate::rcv::io_json::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
pub enum RcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Column {column} not found in CSV file {path}"))]
    CsvMissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno}: expected a number in column {column}, found {value:?}"))]
    CsvBadNumber {
        lineno: usize,
        column: String,
        value: String,
    },
    #[snafu(display("Could not find the directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("Error writing the results to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RcvResult<T> = Result<T, RcvError>;

/// A ballot, as parsed by the readers.
/// This is before checking the ranks.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    /// (contestant id, rank), in the order found in the file.
    pub rankings: Vec<(u32, u32)>,
}

impl ParsedBallot {
    pub fn to_ballot(&self) -> Ballot {
        Ballot {
            rankings: self
                .rankings
                .iter()
                .map(|(cid, rank)| Ranking {
                    candidate: CandidateId(*cid),
                    rank: *rank,
                })
                .collect(),
        }
    }
}

fn read_ranking_data(
    cfs: &FileSource,
    found_contestants: &mut Vec<ContestantJs>,
) -> RcvResult<Vec<ParsedBallot>> {
    info!("Attempting to read ballot file {:?}", cfs.file_path);
    match cfs.provider.as_str() {
        "json" => {
            let (mut contestants, ballots) = io_json::read_json_election(&cfs.file_path)?;
            found_contestants.append(&mut contestants);
            Ok(ballots)
        }
        "csv" => io_csv::read_csv_ballots(&cfs.file_path, cfs),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

// The first contestant with a given id is kept.
fn unique_contestants(contestants: Vec<ContestantJs>) -> Vec<ContestantJs> {
    let mut seen: HashSet<u32> = HashSet::new();
    contestants
        .into_iter()
        .filter(|c| seen.insert(c.id))
        .collect()
}

fn build_summary(
    settings: &OutputSettings,
    ballots: &[Ballot],
    rules: &TabulationRules,
    contestants: &[ContestantJs],
) -> ElectionSummary {
    let config = OutputConfig::from_settings(settings);
    let mut sorted_contestants = contestants.to_vec();
    sorted_contestants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    // Nothing to tabulate: this is a normal state before the first vote.
    if ballots.is_empty() {
        info!("{}", NO_VOTES_MESSAGE);
        return ElectionSummary {
            config,
            results: None,
            contestants: sorted_contestants,
            total_votes: 0,
            message: Some(NO_VOTES_MESSAGE.to_string()),
        };
    }

    let candidates: Vec<Candidate> = contestants.iter().map(|c| c.to_candidate()).collect();
    let result = tabulate_with_rules(ballots, &candidates, rules);
    if !result.is_conclusive() {
        warn!(
            "The tabulation is inconclusive: no winner after {} rounds",
            result.rounds.len()
        );
    }
    ElectionSummary {
        config,
        results: Some(TabulationResultJs::from_result(&result, contestants)),
        contestants: sorted_contestants,
        total_votes: result.total_ballots,
        message: None,
    }
}

fn first_differing_round(reference: &JSValue, computed: &ElectionSummary) -> RcvResult<Option<u32>> {
    let ref_results: Option<TabulationResultJs> =
        serde_json::from_value(reference["results"].clone()).context(ParsingJsonSnafu {})?;
    let ref_rounds: Vec<RoundResult> = match ref_results {
        Some(r) => r.library_rounds()?,
        None => Vec::new(),
    };
    let rounds: Vec<RoundResult> = match &computed.results {
        Some(r) => r.library_rounds()?,
        None => Vec::new(),
    };
    let num_rounds = ref_rounds.len().max(rounds.len());
    Ok((0..num_rounds)
        .find(|idx| ref_rounds.get(*idx) != rounds.get(*idx))
        .map(|idx| (idx + 1) as u32))
}

fn write_summary(out_path: Option<String>, pretty_js_stats: &str) -> RcvResult<()> {
    match out_path.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(p) => {
            info!("Writing results to {:?}", p);
            if let Some(dir) = Path::new(p).parent() {
                if !dir.as_os_str().is_empty() {
                    fs::create_dir_all(dir).context(WritingOutputSnafu { path: p })?;
                }
            }
            fs::write(p, pretty_js_stats).context(WritingOutputSnafu { path: p })?;
        }
    }
    Ok(())
}

pub fn run_election(
    config_path: Option<String>,
    check_summary_path: Option<String>,
    out_path: Option<String>,
    in_path: Option<String>,
    input_type: Option<String>,
    contestants_path: Option<String>,
) -> RcvResult<()> {
    // Relative paths in the configuration are resolved against its directory.
    let (config, root_p): (RcvConfig, PathBuf) = match (config_path.clone(), in_path.clone()) {
        (Some(p), _) => {
            let config = read_config(&p)?;
            let root_p = Path::new(&p)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        (None, Some(p)) => {
            let provider = input_type.clone().unwrap_or_else(|| "json".to_string());
            (RcvConfig::from_input(&p, &provider), PathBuf::new())
        }
        (None, None) => {
            whatever!("No election to tabulate: use --config or --input")
        }
    };
    info!("config: {:?}", config);

    // Validate the rules:
    let rules = match &config.rules {
        Some(r) => validate_rules(r)?,
        None => TabulationRules::DEFAULT_RULES,
    };

    // The input file on the command line replaces the sources of the configuration.
    let sources: Vec<FileSource> = match in_path {
        Some(p) if config_path.is_some() => {
            let provider = input_type.unwrap_or_else(|| "json".to_string());
            vec![FileSource::new(&provider, &p)]
        }
        _ => config
            .ballot_sources
            .iter()
            .map(|cfs| cfs.relative_to(&root_p))
            .collect(),
    };
    if sources.is_empty() {
        whatever!("No ballot source found in the configuration");
    }

    let mut found_contestants: Vec<ContestantJs> = Vec::new();
    let mut parsed_ballots: Vec<ParsedBallot> = Vec::new();
    for cfs in sources.iter() {
        let mut file_data = read_ranking_data(cfs, &mut found_contestants)?;
        parsed_ballots.append(&mut file_data);
    }
    debug!("parsed ballots: {:?}", parsed_ballots);

    let contestants: Vec<ContestantJs> = match (contestants_path, config.contestants.clone()) {
        (Some(p), _) => read_contestants(&p)?,
        (None, Some(cs)) => cs,
        (None, None) => found_contestants,
    };
    let contestants = unique_contestants(contestants);
    if contestants.is_empty() {
        warn!("No contestant found, no winner can be declared");
    }

    // Stored ballots are all counted. A doubtful one is only reported.
    let ballots: Vec<Ballot> = parsed_ballots.iter().map(ParsedBallot::to_ballot).collect();
    for (idx, (pb, ballot)) in parsed_ballots.iter().zip(ballots.iter()).enumerate() {
        if let Err(e) = check_ballot(ballot) {
            let ballot_id = pb.id.clone().unwrap_or_else(|| format!("#{}", idx + 1));
            warn!("Ballot {}: {}, counted anyway", ballot_id, e);
        }
    }

    let summary = build_summary(&config.output_settings, &ballots, &rules, &contestants);
    let result_js = serde_json::to_value(&summary).context(ParsingJsonSnafu {})?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out_path = out_path.or_else(|| {
        config.output_settings.output_directory.as_ref().map(|d| {
            root_p
                .join(d)
                .join(summary_file_name(&config.output_settings.contest_name))
                .display()
                .to_string()
        })
    });
    write_summary(out_path, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        debug!("summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            match first_differing_round(&summary_ref, &summary) {
                Ok(Some(round)) => warn!("The rounds differ from round {}", round),
                Ok(None) => {}
                Err(e) => warn!("Could not compare the rounds with the reference: {}", e),
            }
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
        info!(
            "Results match the reference {}",
            simplify_file_name(&summary_p)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(test_name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name)
    }

    fn run_election_test(
        test_name: &str,
        config_lpath: &str,
        summary_lpath: &str,
    ) -> RcvResult<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = test_dir(test_name);
        info!("Running test {}", test_name);
        run_election(
            Some(format!("{}/{}", dir, config_lpath)),
            Some(format!("{}/{}", dir, summary_lpath)),
            Some("stdout".to_string()),
            None,
            None,
            None,
        )
    }

    fn test_wrapper(test_name: &str) {
        let res = run_election_test(
            test_name,
            format!("{}_config.json", test_name).as_str(),
            format!("{}_expected_summary.json", test_name).as_str(),
        );
        if let Err(e) = &res {
            eprintln!("An error occured {}", e);
        }
        assert!(res.is_ok(), "{:?}", res);
    }

    #[test]
    fn majority_first_round() {
        test_wrapper("majority_first_round");
    }

    #[test]
    fn transfer_second_round() {
        test_wrapper("transfer_second_round");
    }

    #[test]
    fn tie_lowest_id() {
        test_wrapper("tie_lowest_id");
    }

    #[test]
    fn no_votes_yet() {
        test_wrapper("no_votes_yet");
    }

    #[test]
    fn undeclared_contestants() {
        test_wrapper("undeclared_contestants");
    }

    #[test]
    fn csv_rankings() {
        test_wrapper("csv_rankings");
    }

    #[test]
    fn input_without_config() {
        let dir = test_dir("transfer_second_round");
        let res = run_election(
            None,
            Some(format!("{}/ballots_expected_summary.json", dir)),
            Some("stdout".to_string()),
            Some(format!("{}/ballots.json", dir)),
            Some("json".to_string()),
            None,
        );
        assert!(res.is_ok(), "{:?}", res);
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let res = run_election_test(
            "majority_first_round",
            "majority_first_round_config.json",
            "../tie_lowest_id/tie_lowest_id_expected_summary.json",
        );
        assert!(matches!(res, Err(RcvError::Whatever { .. })), "{:?}", res);
    }

    #[test]
    fn stored_malformed_ballots() {
        test_wrapper("stored_malformed_ballots");
    }

    #[test]
    fn unreadable_reference_rounds_still_show_the_diff() {
        let res = run_election_test(
            "majority_first_round",
            "majority_first_round_config.json",
            "reference_without_outcome.json",
        );
        match res {
            Err(RcvError::Whatever { message, .. }) => {
                assert!(message.starts_with("Difference detected"), "{}", message)
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn missing_source_is_an_error() {
        let res = run_election(None, None, None, None, None, None);
        assert!(res.is_err());
    }

    #[test]
    fn reading_rules() {
        let rules: RcvRules =
            serde_json::from_str(r#"{"tiebreakMode": "random", "randomSeed": "17", "maxRounds": 12}"#)
                .unwrap();
        assert_eq!(
            validate_rules(&rules).unwrap(),
            TabulationRules {
                tiebreak_mode: TieBreakMode::Random(17),
                max_rounds: 12
            }
        );

        let rules: RcvRules = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(validate_rules(&rules).unwrap(), TabulationRules::DEFAULT_RULES);

        let rules: RcvRules = serde_json::from_str(r#"{"tiebreakMode": "random"}"#).unwrap();
        assert!(validate_rules(&rules).is_err());

        let rules: RcvRules = serde_json::from_str(r#"{"tiebreakMode": "coinToss"}"#).unwrap();
        assert!(validate_rules(&rules).is_err());

        let rules: RcvRules = serde_json::from_str(r#"{"maxRounds": 0}"#).unwrap();
        assert!(validate_rules(&rules).is_err());
    }

    #[test]
    fn round_shapes_convert_back() {
        let candidates = vec![
            Candidate::new(1, "Apple"),
            Candidate::new(2, "Banana"),
            Candidate::new(3, "Cherry"),
        ];
        let ballots = vec![
            Ballot::from_preferences(&[1, 2]),
            Ballot::from_preferences(&[1, 2]),
            Ballot::from_preferences(&[2, 3]),
            Ballot::from_preferences(&[2, 3]),
            Ballot::from_preferences(&[3, 1]),
            Ballot::from_preferences(&[9]),
        ];
        let result = tabulate(&ballots, &candidates);
        let contestants: Vec<ContestantJs> = candidates.iter().map(ContestantJs::from_candidate).collect();

        let js = TabulationResultJs::from_result(&result, &contestants);
        let text = serde_json::to_string(&js).unwrap();
        let back: TabulationResultJs = serde_json::from_str(&text).unwrap();
        assert_eq!(back, js);
        assert_eq!(back.library_rounds().unwrap(), result.rounds);
        assert_eq!(
            back.winner.map(|c| c.to_candidate()),
            Some(Candidate::new(1, "Apple"))
        );
        assert_eq!(back.total_ballots, 6);

        let raw: JSValue = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["rounds"][0]["votes"]["3"], 1);
        assert_eq!(raw["rounds"][0]["eliminated"], 3);
        assert!(raw["rounds"][0].get("winner").is_none());
        assert_eq!(raw["rounds"][1]["totalVotes"], 5);
        assert_eq!(raw["rounds"][1]["exhausted"], 1);
    }

    #[test]
    fn round_without_outcome_is_rejected() {
        let js: RoundResultJs =
            serde_json::from_str(r#"{"round": 1, "votes": {"1": 2}, "totalVotes": 2}"#).unwrap();
        assert!(js.to_round().is_err());
    }
}

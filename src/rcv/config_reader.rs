use crate::rcv::io_common::simplify_file_name;
use crate::rcv::io_json::ContestantJs;
use crate::rcv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
}

impl OutputConfig {
    pub fn from_settings(settings: &OutputSettings) -> OutputConfig {
        OutputConfig {
            contest: settings.contest_name.clone(),
            date: settings.contest_date.clone(),
            jurisdiction: settings.contest_jurisdiction.clone(),
            office: settings.contest_office.clone(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    // Only used by the csv provider.
    #[serde(rename = "ballotIdColumn")]
    pub ballot_id_column: Option<String>,
    #[serde(rename = "contestantIdColumn")]
    pub contestant_id_column: Option<String>,
    #[serde(rename = "rankColumn")]
    pub rank_column: Option<String>,
}

impl FileSource {
    pub fn new(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            ballot_id_column: None,
            contestant_id_column: None,
            rank_column: None,
        }
    }

    pub fn relative_to(&self, root: &Path) -> FileSource {
        let p: PathBuf = root.join(&self.file_path);
        FileSource {
            file_path: p.display().to_string(),
            ..self.clone()
        }
    }

    pub fn ballot_id_column(&self) -> &str {
        self.ballot_id_column.as_deref().unwrap_or("ballotId")
    }

    pub fn contestant_id_column(&self) -> &str {
        self.contestant_id_column
            .as_deref()
            .unwrap_or("contestantId")
    }

    pub fn rank_column(&self) -> &str {
        self.rank_column.as_deref().unwrap_or("rank")
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvRules {
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    _random_seed: Option<JSValue>,
    #[serde(rename = "maxRounds")]
    _max_rounds: Option<JSValue>,
}

impl RcvRules {
    pub fn random_seed(&self) -> RcvResult<Option<u32>> {
        read_js_opt_u32(&self._random_seed)
    }

    pub fn max_rounds(&self) -> RcvResult<Option<u32>> {
        read_js_opt_u32(&self._max_rounds)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "ballotSources", alias = "cvrFileSources", default)]
    pub ballot_sources: Vec<FileSource>,
    #[serde(alias = "candidates", default)]
    pub contestants: Option<Vec<ContestantJs>>,
    #[serde(default)]
    pub rules: Option<RcvRules>,
}

impl RcvConfig {
    /// The configuration used when only a ballot file is given.
    pub fn from_input(path: &str, provider: &str) -> RcvConfig {
        RcvConfig {
            output_settings: OutputSettings {
                contest_name: simplify_file_name(path),
                output_directory: None,
                contest_date: None,
                contest_jurisdiction: None,
                contest_office: None,
            },
            ballot_sources: vec![FileSource::new(provider, path)],
            contestants: None,
            rules: None,
        }
    }
}

pub fn read_config(path: &str) -> RcvResult<RcvConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: &str) -> RcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn validate_rules(rcv_rules: &RcvRules) -> RcvResult<TabulationRules> {
    let res = TabulationRules {
        tiebreak_mode: match rcv_rules.tiebreak_mode.as_deref().unwrap_or("lowestId") {
            "lowestId" => TieBreakMode::LowestId,
            "random" => {
                let seed = match rcv_rules.random_seed() {
                    Ok(Some(x)) => x,
                    x => {
                        whatever!("Cannot use tiebreak mode random without a randomSeed: {:?}", x)
                    }
                };
                TieBreakMode::Random(seed)
            }
            x => {
                whatever!(
                    "Cannot use tiebreak mode {:?} (currently not implemented)",
                    x
                )
            }
        },
        max_rounds: match rcv_rules.max_rounds()? {
            None => TabulationRules::DEFAULT_MAX_ROUNDS,
            Some(x) if x > 0 => x,
            x => {
                whatever!("Failed to understand maxRounds option: {:?}", x)
            }
        },
    };
    Ok(res)
}

fn read_js_int(x: &Option<JSValue>) -> RcvResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

fn read_js_opt_u32(x: &Option<JSValue>) -> RcvResult<Option<u32>> {
    match x {
        None | Some(JSValue::Null) => Ok(None),
        _ => {
            let v = read_js_int(x)?;
            u32::try_from(v).ok().context(ParsingJsonNumberSnafu {}).map(Some)
        }
    }
}

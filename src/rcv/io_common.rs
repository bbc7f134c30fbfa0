use std::collections::HashMap;
use std::path::Path;

use crate::rcv::ParsedBallot;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The name of the results file for a contest, with anything but letters and digits replaced.
pub fn summary_file_name(contest_name: &str) -> String {
    let cleaned: String = contest_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_summary.json", cleaned)
}

/// Ids for the ballots that do not carry one, from their position in the file.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Assembles ballots from (ballot id, contestant id, rank) rows.
///
/// The rows of one ballot do not need to be consecutive. Ballots are returned
/// in the order of their first row.
pub fn group_rankings(rows: &[(String, u32, u32)]) -> Vec<ParsedBallot> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut res: Vec<ParsedBallot> = Vec::new();
    for (ballot_id, contestant_id, rank) in rows.iter() {
        let pos = *positions.entry(ballot_id.as_str()).or_insert_with(|| {
            res.push(ParsedBallot {
                id: Some(ballot_id.clone()),
                rankings: Vec::new(),
            });
            res.len() - 1
        });
        res[pos].rankings.push((*contestant_id, *rank));
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_keeps_first_appearance_order() {
        let rows: Vec<(String, u32, u32)> = vec![
            ("b".to_string(), 2, 1),
            ("a".to_string(), 1, 2),
            ("b".to_string(), 1, 2),
            ("a".to_string(), 3, 1),
        ];
        let ballots = group_rankings(&rows);
        assert_eq!(
            ballots,
            vec![
                ParsedBallot {
                    id: Some("b".to_string()),
                    rankings: vec![(2, 1), (1, 2)],
                },
                ParsedBallot {
                    id: Some("a".to_string()),
                    rankings: vec![(1, 2), (3, 1)],
                },
            ]
        );
    }

    #[test]
    fn names() {
        assert_eq!(simplify_file_name("/tmp/votes/ballots.csv"), "ballots.csv");
        assert_eq!(summary_file_name("Best pie 2024"), "Best_pie_2024_summary.json");
        assert_eq!(make_default_id("dir/ballots.json")(3), "ballots.json-00000003");
    }
}

// Primitives for reading CSV files.

use csv::StringRecord;
use log::debug;

use crate::rcv::{
    io_common::{group_rankings, make_default_id},
    *,
};

/// Reads a file with one ranking per line.
///
/// A line without ballot id is a ballot of its own.
pub fn read_csv_ballots(path: &str, cfs: &FileSource) -> RcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let headers: StringRecord = rdr.headers().context(CsvOpenSnafu { path })?.clone();
    debug!("read_csv_ballots: headers: {:?}", headers);

    let id_idx = find_column(&headers, cfs.ballot_id_column(), path)?;
    let contestant_idx = find_column(&headers, cfs.contestant_id_column(), path)?;
    let rank_idx = find_column(&headers, cfs.rank_column(), path)?;

    let mut rows: Vec<(String, u32, u32)> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("{:?} {:?}", lineno, line);

        let ballot_id = match line.get(id_idx) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => default_id(lineno),
        };
        let contestant_id = read_number(&line, contestant_idx, cfs.contestant_id_column(), lineno)?;
        let rank = read_number(&line, rank_idx, cfs.rank_column(), lineno)?;
        rows.push((ballot_id, contestant_id, rank));
    }
    Ok(group_rankings(&rows))
}

fn find_column(headers: &StringRecord, column: &str, path: &str) -> RcvResult<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .context(CsvMissingColumnSnafu { column, path })
}

fn read_number(line: &StringRecord, idx: usize, column: &str, lineno: usize) -> RcvResult<u32> {
    let value = line.get(idx).unwrap_or("");
    value.parse::<u32>().ok().context(CsvBadNumberSnafu {
        lineno,
        column,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_path(file_name: &str) -> String {
        format!(
            "{}/tests/data/csv_errors/{}",
            env!("CARGO_MANIFEST_DIR"),
            file_name
        )
    }

    #[test]
    fn missing_rank_column() {
        let path = data_path("missing_column.csv");
        let res = read_csv_ballots(&path, &FileSource::new("csv", &path));
        match res {
            Err(RcvError::CsvMissingColumn { column, .. }) => assert_eq!(column, "rank"),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn rank_is_not_a_number() {
        let path = data_path("bad_number.csv");
        let res = read_csv_ballots(&path, &FileSource::new("csv", &path));
        match res {
            Err(RcvError::CsvBadNumber {
                lineno,
                column,
                value,
            }) => {
                assert_eq!(lineno, 3);
                assert_eq!(column, "rank");
                assert_eq!(value, "second");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }
}

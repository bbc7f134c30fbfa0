use clap::Parser;

/// This is a ranked choice (instant-runoff) tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file describing the election: contestants, ballot files and rules,
    /// in JSON format. See the manual of the instant_runoff crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the expected results in JSON format. If provided, rcvtally will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the results will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the file containing the ballots. Setting this option overrides the
    /// ballot sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the input: json or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path or empty) A JSON list of contestants. It replaces any other list of contestants.
    #[clap(long, value_parser)]
    pub contestants: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

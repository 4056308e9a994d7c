//! Command-line surface.
//!
//! Output options are positional in spirit: `-k`, `-r`, `-a`, `-D` and `-Q`
//! refine the output declared by the closest preceding `-f`, or a
//! standard-output output when no `-f` came first. `-d` and `-q` may be
//! repeated: each sets the input character and, once an output exists, that
//! output's character too. The last one wins for the input.
//!
//! ```text
//! csvreo -d , -f names.csv -k 2 -k 1 -f everything.txt -a -D ';' < in.csv
//! ```
//!
//! clap keeps each option's values in a separate list, so the command-line
//! order is recovered from `ArgMatches::indices_of` and replayed into a
//! [`ConfigBuilder`].

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::config::{
    Config, ConfigBuilder, DEFAULT_PROGRESS_INTERVAL, DEFAULT_SLOT_CAPACITY, SinkTarget,
    delimiter_byte, quote_byte,
};
use crate::error::ConfigError;

/// Reorder the columns of a delimited file read from stdin.
///
/// Every output needs a key set (-k), or -r, or -a. Keys start at 1.
/// It is not recommended to use the same file for input and output.
#[derive(Parser, Debug, Clone)]
#[command(name = "csvreo", version, disable_help_flag = true)]
pub struct Cli {
    /// Quote character used in the input, also applied to the current output [default: "]
    #[arg(short = 'q', long = "quote", value_name = "CHAR", action = ArgAction::Append)]
    pub quote: Vec<char>,

    /// Delimiter used in the input, also applied to the current output [default: |]
    #[arg(short = 'd', long = "delim", value_name = "CHAR", action = ArgAction::Append)]
    pub delim: Vec<char>,

    /// Output file ("-" for stdout); following options apply to it
    #[arg(short = 'f', short_alias = 'F', long = "file", value_name = "PATH")]
    pub files: Vec<String>,

    /// Column to write, starting at 1; repeat for more columns
    #[arg(
        short = 'k',
        short_alias = 'K',
        long = "keys",
        value_name = "KEY",
        allow_negative_numbers = true
    )]
    pub keys: Vec<i64>,

    /// Write all columns in reverse order (keys are ignored)
    #[arg(
        short = 'r',
        short_alias = 'R',
        long = "reverse",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        hide_possible_values = true,
        action = ArgAction::Append
    )]
    pub reverse: Vec<bool>,

    /// Write all columns in input order (keys are ignored)
    #[arg(
        short = 'a',
        short_alias = 'A',
        long = "all",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        hide_possible_values = true,
        action = ArgAction::Append
    )]
    pub all: Vec<bool>,

    /// Delimiter for the current output [default: input delimiter]
    #[arg(short = 'D', long = "outdelim", value_name = "CHAR")]
    pub outdelim: Vec<char>,

    /// Quote for the current output [default: input quote]
    #[arg(short = 'Q', long = "outquote", value_name = "CHAR")]
    pub outquote: Vec<char>,

    /// Records between progress messages; 0 turns them off
    #[arg(short = 'p', short_alias = 'P', long = "progress", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress: u64,

    /// Size in bytes of each of the two read buffers
    #[arg(long = "buffer-size", value_name = "BYTES", default_value_t = DEFAULT_SLOT_CAPACITY)]
    pub buffer_size: usize,

    /// Treat fields longer than this as a parse error
    #[arg(long = "max-field-bytes", value_name = "BYTES")]
    pub max_field_bytes: Option<usize>,

    /// Log debug detail to stderr
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(long)]
    pub quiet: bool,

    /// Print help
    #[arg(short = 'h', short_alias = 'H', long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// An option that applies to the current output.
#[derive(Debug, Clone, PartialEq)]
enum OutputOption {
    InputDelimiter(char),
    InputQuote(char),
    File(String),
    Key(i64),
    Reverse,
    All,
    Delimiter(char),
    Quote(char),
}

/// Parsed arguments plus the order output options appeared in.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub cli: Cli,
    ordered: Vec<(usize, OutputOption)>,
}

impl Invocation {
    /// Parse `std::env::args_os`, exiting with usage on error.
    pub fn parse() -> Self {
        let matches = Cli::command().get_matches();
        Self::from_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Cli::command().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let cli = Cli::from_arg_matches(matches)?;

        let mut ordered = Vec::new();
        ordered.extend(indexed(matches, "delim", |c| Some(OutputOption::InputDelimiter(c))));
        ordered.extend(indexed(matches, "quote", |c| Some(OutputOption::InputQuote(c))));
        ordered.extend(indexed(matches, "files", |path| Some(OutputOption::File(path))));
        ordered.extend(indexed(matches, "keys", |key| Some(OutputOption::Key(key))));
        // `--reverse=false` and `--all=false` leave the output alone.
        ordered.extend(indexed(matches, "reverse", |on: bool| on.then_some(OutputOption::Reverse)));
        ordered.extend(indexed(matches, "all", |on: bool| on.then_some(OutputOption::All)));
        ordered.extend(indexed(matches, "outdelim", |c| Some(OutputOption::Delimiter(c))));
        ordered.extend(indexed(matches, "outquote", |c| Some(OutputOption::Quote(c))));
        ordered.sort_by_key(|(index, _)| *index);

        Ok(Self { cli, ordered })
    }

    /// Replay the options into a validated [`Config`].
    pub fn config(&self) -> Result<Config, ConfigError> {
        let cli = &self.cli;
        let mut builder = ConfigBuilder::new();
        builder
            .progress_interval(cli.progress)
            .slot_capacity(cli.buffer_size)
            .max_field_len(cli.max_field_bytes);

        for (_, option) in &self.ordered {
            match option {
                OutputOption::InputDelimiter(c) => {
                    builder.delimiter(delimiter_byte(*c)?);
                }
                OutputOption::InputQuote(c) => {
                    builder.quote(quote_byte(*c)?);
                }
                OutputOption::File(path) => {
                    builder.output(sink_target(path));
                }
                OutputOption::Key(key) => {
                    builder.key(*key)?;
                }
                OutputOption::Reverse => {
                    builder.reverse();
                }
                OutputOption::All => {
                    builder.all();
                }
                OutputOption::Delimiter(c) => {
                    builder.output_delimiter(delimiter_byte(*c)?);
                }
                OutputOption::Quote(c) => {
                    builder.output_quote(quote_byte(*c)?);
                }
            }
        }

        builder.build()
    }
}

fn sink_target(path: &str) -> SinkTarget {
    if path == "-" {
        SinkTarget::Stdout
    } else {
        SinkTarget::File(PathBuf::from(path))
    }
}

/// Pair every value of `id` with its position on the command line.
/// Values that `wrap` maps to `None` are dropped.
fn indexed<T, F>(matches: &ArgMatches, id: &str, wrap: F) -> Vec<(usize, OutputOption)>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> Option<OutputOption>,
{
    match (matches.indices_of(id), matches.get_many::<T>(id)) {
        (Some(indices), Some(values)) => indices
            .zip(values.cloned())
            .filter_map(|(index, value)| wrap(value).map(|option| (index, option)))
            .collect(),
        _ => Vec::new(),
    }
}

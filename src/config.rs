//! Run configuration.
//!
//! A [`Config`] is built once, validated, and then treated as read-only by
//! the pipeline. [`ConfigBuilder`] mirrors the way outputs are declared on
//! the command line: options that refine an output always apply to the most
//! recently declared one, and a standard-output output is created on demand
//! when nothing has been declared yet.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Default input (and output) delimiter.
pub const DEFAULT_DELIMITER: u8 = b'|';
/// Default input (and output) quote character.
pub const DEFAULT_QUOTE: u8 = b'"';
/// Records between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;
/// Capacity of each of the two read buffers (1 MiB).
pub const DEFAULT_SLOT_CAPACITY: usize = 1 << 20;

/// Which columns an output renders, and in what order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Zero-based column indices, in output order. Repeats are allowed.
    Keys(Vec<usize>),
    /// Every column, last to first.
    Reverse,
    /// Every column in input order.
    All,
}

/// Where an output's lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Stdout,
    File(PathBuf),
}

/// One fully resolved output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub target: SinkTarget,
    pub selection: Selection,
    pub delimiter: u8,
    pub quote: u8,
}

/// Everything the pipeline needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input_delimiter: u8,
    pub input_quote: u8,
    /// Emit a progress report every this many records; 0 disables reports.
    pub progress_interval: u64,
    pub slot_capacity: usize,
    /// Fields longer than this are a parse failure.
    pub max_field_len: Option<usize>,
    pub outputs: Vec<OutputSpec>,
}

impl Config {
    /// Check every invariant that must hold before input is touched.
    ///
    /// Order of checks: output count, buffer size, delimiters, quotes,
    /// delimiter/quote collisions, then selections. The first violation
    /// wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outputs.is_empty() {
            return Err(ConfigError::NoOutputs);
        }
        if self.slot_capacity == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }

        check_delimiter(self.input_delimiter)?;
        for output in &self.outputs {
            check_delimiter(output.delimiter)?;
        }

        check_quote(self.input_quote)?;
        for output in &self.outputs {
            check_quote(output.quote)?;
        }

        if self.input_delimiter == self.input_quote {
            return Err(ConfigError::DelimiterEqualsQuote(char::from(self.input_quote)));
        }
        for output in &self.outputs {
            if output.delimiter == output.quote {
                return Err(ConfigError::DelimiterEqualsQuote(char::from(output.quote)));
            }
        }

        for (index, output) in self.outputs.iter().enumerate() {
            if let Selection::Keys(keys) = &output.selection
                && keys.is_empty()
            {
                return Err(ConfigError::NoKeys { output: index });
            }
        }

        Ok(())
    }
}

fn is_reserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'\n' || byte == b'\r'
}

fn check_delimiter(byte: u8) -> Result<(), ConfigError> {
    if is_reserved(byte) {
        return Err(ConfigError::InvalidDelimiter(char::from(byte)));
    }
    Ok(())
}

fn check_quote(byte: u8) -> Result<(), ConfigError> {
    if is_reserved(byte) {
        return Err(ConfigError::InvalidQuote(char::from(byte)));
    }
    Ok(())
}

/// Convert a user-supplied character to the single byte the tokenizer uses.
pub fn delimiter_byte(c: char) -> Result<u8, ConfigError> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(ConfigError::InvalidDelimiter(c))
}

/// Like [`delimiter_byte`], for quote characters.
pub fn quote_byte(c: char) -> Result<u8, ConfigError> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(ConfigError::InvalidQuote(c))
}

/// An output still being declared.
#[derive(Debug, Clone)]
struct OutputDraft {
    target: SinkTarget,
    keys: Vec<usize>,
    reverse: bool,
    all: bool,
    delimiter: u8,
    quote: u8,
}

impl OutputDraft {
    fn new(target: SinkTarget, delimiter: u8, quote: u8) -> Self {
        Self {
            target,
            keys: Vec::new(),
            reverse: false,
            all: false,
            delimiter,
            quote,
        }
    }

    fn finish(self) -> OutputSpec {
        let selection = if self.all {
            Selection::All
        } else if self.reverse {
            Selection::Reverse
        } else {
            Selection::Keys(self.keys)
        };
        OutputSpec {
            target: self.target,
            selection,
            delimiter: self.delimiter,
            quote: self.quote,
        }
    }
}

/// Incremental construction of a [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    input_delimiter: u8,
    input_quote: u8,
    progress_interval: u64,
    slot_capacity: usize,
    max_field_len: Option<usize>,
    outputs: Vec<OutputDraft>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            input_delimiter: DEFAULT_DELIMITER,
            input_quote: DEFAULT_QUOTE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            slot_capacity: DEFAULT_SLOT_CAPACITY,
            max_field_len: None,
            outputs: Vec::new(),
        }
    }

    pub fn input_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.input_delimiter = delimiter;
        self
    }

    pub fn input_quote(&mut self, quote: u8) -> &mut Self {
        self.input_quote = quote;
        self
    }

    pub fn progress_interval(&mut self, interval: u64) -> &mut Self {
        self.progress_interval = interval;
        self
    }

    pub fn slot_capacity(&mut self, capacity: usize) -> &mut Self {
        self.slot_capacity = capacity;
        self
    }

    pub fn max_field_len(&mut self, limit: Option<usize>) -> &mut Self {
        self.max_field_len = limit;
        self
    }

    /// Set the input delimiter and, if an output has been declared, the
    /// current output's delimiter too. This is what `-d` does.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.input_delimiter = delimiter;
        if let Some(current) = self.outputs.last_mut() {
            current.delimiter = delimiter;
        }
        self
    }

    /// Quote counterpart of [`ConfigBuilder::delimiter`].
    pub fn quote(&mut self, quote: u8) -> &mut Self {
        self.input_quote = quote;
        if let Some(current) = self.outputs.last_mut() {
            current.quote = quote;
        }
        self
    }

    /// Start a new output; later refinements apply to it.
    ///
    /// The output starts with the input delimiter and quote in effect now.
    pub fn output(&mut self, target: SinkTarget) -> &mut Self {
        self.outputs.push(OutputDraft::new(
            target,
            self.input_delimiter,
            self.input_quote,
        ));
        self
    }

    /// Append a 1-based column key to the current output.
    pub fn key(&mut self, key: i64) -> Result<&mut Self, ConfigError> {
        let index = usize::try_from(key)
            .ok()
            .and_then(|k| k.checked_sub(1))
            .ok_or(ConfigError::KeyOutOfRange(key))?;
        self.current().keys.push(index);
        Ok(self)
    }

    pub fn reverse(&mut self) -> &mut Self {
        self.current().reverse = true;
        self
    }

    pub fn all(&mut self) -> &mut Self {
        self.current().all = true;
        self
    }

    pub fn output_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.current().delimiter = delimiter;
        self
    }

    pub fn output_quote(&mut self, quote: u8) -> &mut Self {
        self.current().quote = quote;
        self
    }

    fn current(&mut self) -> &mut OutputDraft {
        if self.outputs.is_empty() {
            self.output(SinkTarget::Stdout);
        }
        let last = self.outputs.len() - 1;
        &mut self.outputs[last]
    }

    /// Resolve drafts into a validated [`Config`].
    ///
    /// With no declared output, a single standard-output output is used.
    pub fn build(mut self) -> Result<Config, ConfigError> {
        self.current();
        let outputs = self
            .outputs
            .into_iter()
            .map(OutputDraft::finish)
            .collect();
        let config = Config {
            input_delimiter: self.input_delimiter,
            input_quote: self.input_quote,
            progress_interval: self.progress_interval,
            slot_capacity: self.slot_capacity,
            max_field_len: self.max_field_len,
            outputs,
        };
        config.validate()?;
        Ok(config)
    }
}

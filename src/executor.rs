//! Pipeline executor.
//!
//! Wires the pieces together for one run:
//!
//! ```text
//! input -> DoubleBuffer -> Tokenizer -> FieldAccumulator -> Fanout -> sinks
//! ```
//!
//! Reading happens on the calling thread. Tokenizing, accumulation and
//! rendering all happen on the scheduler's parser thread, which owns the
//! sinks for the whole run.

use std::io::Read;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::accumulator::FieldAccumulator;
use crate::config::Config;
use crate::error::Result;
use crate::fanout::Fanout;
use crate::progress::ProgressMeter;
use crate::record::RecordSink;
use crate::scheduler::DoubleBuffer;
use crate::tokenizer::{CsvTokenizer, Tokenizer};

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub records: u64,
    pub ragged_records: u64,
    pub bytes: u64,
    pub chunks: u64,
    pub elapsed: Duration,
}

/// Run `config` over `input`, writing to the sinks the config names.
///
/// The config is validated and every sink opened before the first byte of
/// `input` is read.
pub fn execute<R: Read>(config: &Config, input: R) -> Result<Summary> {
    config.validate()?;
    let fanout = Fanout::open(&config.outputs)?;
    debug!(outputs = fanout.len(), "sinks open");
    let tokenizer = CsvTokenizer::new(config.input_delimiter, config.input_quote)
        .with_max_field_len(config.max_field_len);
    execute_with(config, input, tokenizer, fanout)
}

/// Like [`execute`], with a caller-supplied tokenizer and record sink.
///
/// `config.outputs` is only validated here; rendering is up to `sink`.
pub fn execute_with<R, T, S>(config: &Config, input: R, mut tokenizer: T, sink: S) -> Result<Summary>
where
    R: Read,
    T: Tokenizer + Send,
    S: RecordSink + Send,
{
    config.validate()?;
    let started = Instant::now();

    let mut accumulator = FieldAccumulator::new(sink, ProgressMeter::new(config.progress_interval));
    let schedule = DoubleBuffer::new(config.slot_capacity).run(input, |chunk| {
        tokenizer.feed(chunk.bytes, &mut accumulator)
    })?;
    tokenizer.finish(&mut accumulator)?;
    let stats = accumulator.finish()?;

    if stats.ragged > 0 {
        warn!(
            ragged = stats.ragged,
            width = stats.width.unwrap_or(0),
            "records with an unexpected field count were padded or truncated"
        );
    }

    Ok(Summary {
        records: stats.records,
        ragged_records: stats.ragged,
        bytes: schedule.bytes,
        chunks: schedule.chunks,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigBuilder, Selection};
    use crate::error::{ConfigError, ReoError};
    use crate::projection::Projection;
    use crate::record::Record;
    use crate::tokenizer::FieldHandler;
    use std::io;

    /// Renders every record with one projection into memory.
    struct Rendered {
        projection: Projection,
        out: Vec<u8>,
        flushed: bool,
    }

    impl Rendered {
        fn new(selection: Selection) -> Self {
            Self {
                projection: Projection::new(selection, b'|', b'"'),
                out: Vec::new(),
                flushed: false,
            }
        }

        fn text(&self) -> &str {
            std::str::from_utf8(&self.out).unwrap()
        }
    }

    impl RecordSink for Rendered {
        fn write_record(&mut self, record: &Record<'_>) -> Result<()> {
            self.projection.render(record, &mut self.out)?;
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.flushed = true;
            Ok(())
        }
    }

    fn all_config(capacity: usize) -> Config {
        let mut builder = ConfigBuilder::new();
        builder.all().slot_capacity(capacity).progress_interval(0);
        builder.build().unwrap()
    }

    fn run(config: &Config, input: &[u8], sink: &mut Rendered) -> Summary {
        let tokenizer = CsvTokenizer::new(config.input_delimiter, config.input_quote);
        execute_with(config, input, tokenizer, sink).unwrap()
    }

    #[test]
    fn test_round_trip_identity() {
        let input = b"id|name|note\n1|alice|\"a|b\"\n2|bob|\"say \"\"hi\"\"\"\n3||\n";
        for capacity in [1, 3, 16, 1 << 20] {
            let mut sink = Rendered::new(Selection::All);
            let summary = run(&all_config(capacity), input, &mut sink);
            assert_eq!(sink.out, input, "capacity {capacity}");
            assert_eq!(summary.records, 4);
            assert_eq!(summary.bytes, input.len() as u64);
            assert!(sink.flushed);
        }
    }

    #[test]
    fn test_records_split_across_slots() {
        let input = b"aaaa|bbbb|cccc\ndddd|eeee|ffff\n";
        let mut sink = Rendered::new(Selection::Keys(vec![2, 0]));
        let summary = run(&all_config(5), input, &mut sink);
        assert_eq!(sink.text(), "cccc|aaaa\nffff|dddd\n");
        assert_eq!(summary.chunks, 6);
    }

    #[test]
    fn test_ragged_rows_counted() {
        let mut sink = Rendered::new(Selection::All);
        let summary = run(&all_config(64), b"a|b\nc\nd|e|f\n", &mut sink);
        assert_eq!(summary.ragged_records, 2);
        assert_eq!(sink.text(), "a|b\nc|\nd|e\n");
    }

    /// Counts how many times the pipeline touched the input.
    struct CountingReader {
        reads: usize,
    }

    impl Read for CountingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            Ok(0)
        }
    }

    #[test]
    fn test_invalid_config_reads_nothing() {
        let mut config = all_config(64);
        config.input_quote = config.input_delimiter;

        let mut input = CountingReader { reads: 0 };
        let mut sink = Rendered::new(Selection::All);
        let tokenizer = CsvTokenizer::new(b'|', b'"');
        let err = execute_with(&config, &mut input, tokenizer, &mut sink).unwrap_err();

        assert!(matches!(
            err,
            ReoError::Config(ConfigError::DelimiterEqualsQuote('|'))
        ));
        assert_eq!(input.reads, 0);
        assert!(sink.out.is_empty());
    }

    #[test]
    fn test_missing_selection_reads_nothing() {
        let mut config = all_config(64);
        config.outputs[0].selection = Selection::Keys(Vec::new());

        let mut input = CountingReader { reads: 0 };
        let err = execute(&config, &mut input).unwrap_err();
        assert!(matches!(err, ReoError::Config(ConfigError::NoKeys { output: 0 })));
        assert_eq!(input.reads, 0);
    }

    /// Fails on the second chunk it sees.
    struct Brittle {
        chunks: usize,
    }

    impl Tokenizer for Brittle {
        fn feed<H: FieldHandler>(&mut self, chunk: &[u8], handler: &mut H) -> Result<()> {
            self.chunks += 1;
            if self.chunks == 2 {
                return Err(ReoError::Parse {
                    line: 2,
                    message: "unexpected byte".to_string(),
                });
            }
            handler.on_field(chunk)?;
            handler.on_record_end()
        }

        fn finish<H: FieldHandler>(&mut self, _handler: &mut H) -> Result<()> {
            panic!("finish must not run after a parse failure");
        }
    }

    #[test]
    fn test_parse_failure_aborts() {
        let mut sink = Rendered::new(Selection::All);
        let err = execute_with(
            &all_config(4),
            io::repeat(b'q'),
            Brittle { chunks: 0 },
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, ReoError::Parse { line: 2, .. }));
        assert_eq!(sink.text(), "qqqq\n");
        assert!(!sink.flushed);
    }
}

//! Tokenizer seam.
//!
//! A [`Tokenizer`] turns raw chunks into field and record-boundary
//! callbacks on a [`FieldHandler`]. Chunks may split a field or a quoted
//! section anywhere; the tokenizer carries that state between calls.
//!
//! [`CsvTokenizer`] is the shipped implementation, backed by `csv-core`.

use csv_core::{ReadFieldResult, Reader, ReaderBuilder};

use crate::error::{ReoError, Result};

/// Receives the output of a [`Tokenizer`].
pub trait FieldHandler {
    /// One complete, unquoted field of the current record.
    fn on_field(&mut self, field: &[u8]) -> Result<()>;

    /// The current record ended after its last field.
    fn on_record_end(&mut self) -> Result<()>;
}

/// Splits a byte stream into fields and records.
pub trait Tokenizer {
    /// Consume one chunk of input.
    fn feed<H: FieldHandler>(&mut self, chunk: &[u8], handler: &mut H) -> Result<()>;

    /// Signal end of input, flushing a final record that lacks a trailing
    /// newline.
    fn finish<H: FieldHandler>(&mut self, handler: &mut H) -> Result<()>;
}

const INITIAL_FIELD_CAPACITY: usize = 256;

/// RFC 4180 style tokenizer with configurable delimiter and quote.
///
/// Quoted fields may contain delimiters, newlines and doubled quotes.
/// Blank lines are skipped. `\n`, `\r` and `\r\n` all end a record.
pub struct CsvTokenizer {
    reader: Reader,
    field: Vec<u8>,
    /// Bytes of the current field already decoded into `field`.
    pending: usize,
    max_field_len: Option<usize>,
}

impl CsvTokenizer {
    pub fn new(delimiter: u8, quote: u8) -> Self {
        Self {
            reader: ReaderBuilder::new()
                .delimiter(delimiter)
                .quote(quote)
                .build(),
            field: vec![0; INITIAL_FIELD_CAPACITY],
            pending: 0,
            max_field_len: None,
        }
    }

    /// Reject fields longer than `limit` bytes with a parse error.
    pub fn with_max_field_len(mut self, limit: Option<usize>) -> Self {
        self.max_field_len = limit;
        self
    }

    /// Run the state machine once. Returns bytes consumed and whether the
    /// reader reached the end of input.
    fn step<H: FieldHandler>(&mut self, input: &[u8], handler: &mut H) -> Result<(usize, bool)> {
        let (result, nin, nout) = self.reader.read_field(input, &mut self.field[self.pending..]);
        self.pending += nout;

        if let Some(limit) = self.max_field_len
            && self.pending > limit
        {
            return Err(ReoError::Parse {
                line: self.reader.line(),
                message: format!("field exceeds {limit} bytes"),
            });
        }

        match result {
            ReadFieldResult::InputEmpty => {}
            ReadFieldResult::OutputFull => self.grow()?,
            ReadFieldResult::Field { record_end } => {
                handler.on_field(&self.field[..self.pending])?;
                self.pending = 0;
                if record_end {
                    handler.on_record_end()?;
                }
            }
            ReadFieldResult::End => return Ok((nin, true)),
        }
        Ok((nin, false))
    }

    fn grow(&mut self) -> Result<()> {
        let len = self.field.len().max(INITIAL_FIELD_CAPACITY / 2);
        self.field.try_reserve_exact(len)?;
        self.field.resize(len * 2, 0);
        Ok(())
    }
}

impl Tokenizer for CsvTokenizer {
    fn feed<H: FieldHandler>(&mut self, mut chunk: &[u8], handler: &mut H) -> Result<()> {
        // An empty slice means end of input to csv-core, so never pass one here.
        while !chunk.is_empty() {
            let (consumed, _) = self.step(chunk, handler)?;
            chunk = &chunk[consumed..];
        }
        Ok(())
    }

    fn finish<H: FieldHandler>(&mut self, handler: &mut H) -> Result<()> {
        loop {
            let (_, end) = self.step(&[], handler)?;
            if end {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records as vectors of strings.
    #[derive(Default)]
    struct Collect {
        current: Vec<String>,
        records: Vec<Vec<String>>,
    }

    impl FieldHandler for Collect {
        fn on_field(&mut self, field: &[u8]) -> Result<()> {
            self.current.push(String::from_utf8_lossy(field).into_owned());
            Ok(())
        }

        fn on_record_end(&mut self) -> Result<()> {
            self.records.push(std::mem::take(&mut self.current));
            Ok(())
        }
    }

    fn tokenize(input: &[u8], chunk_size: usize) -> Vec<Vec<String>> {
        let mut tokenizer = CsvTokenizer::new(b'|', b'"');
        let mut out = Collect::default();
        for chunk in input.chunks(chunk_size) {
            tokenizer.feed(chunk, &mut out).unwrap();
        }
        tokenizer.finish(&mut out).unwrap();
        out.records
    }

    #[test]
    fn test_simple_records() {
        let records = tokenize(b"a|b|c\n1|2|3\n", 1024);
        assert_eq!(records, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_missing_trailing_newline() {
        let records = tokenize(b"a|b\nc|d", 1024);
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_quoted_fields() {
        let records = tokenize(b"\"x|y\"|\"say \"\"hi\"\"\"|\"two\nlines\"\n", 1024);
        assert_eq!(records, vec![vec!["x|y", "say \"hi\"", "two\nlines"]]);
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        let input = b"alpha|\"be|ta\"|gamma\r\none|two|\"th\"\"ree\"\n\nlast|row|x";
        let whole = tokenize(input, input.len());
        for size in 1..8 {
            assert_eq!(tokenize(input, size), whole, "chunk size {size}");
        }
        assert_eq!(whole.len(), 3);
    }

    #[test]
    fn test_field_longer_than_initial_buffer() {
        let long = "z".repeat(INITIAL_FIELD_CAPACITY * 5 + 3);
        let input = format!("{long}|short\n");
        let records = tokenize(input.as_bytes(), 100);
        assert_eq!(records, vec![vec![long, "short".to_string()]]);
    }

    #[test]
    fn test_max_field_len_is_parse_error() {
        let mut tokenizer = CsvTokenizer::new(b',', b'"').with_max_field_len(Some(4));
        let mut out = Collect::default();
        tokenizer.feed(b"abcd,ef\n", &mut out).unwrap();
        let err = tokenizer.feed(b"abcdefgh\n", &mut out).unwrap_err();
        assert!(matches!(err, ReoError::Parse { .. }));
    }

    #[test]
    fn test_custom_delimiter_and_quote() {
        let mut tokenizer = CsvTokenizer::new(b'\t', b'\'');
        let mut out = Collect::default();
        tokenizer.feed(b"'a\tb'\tc\n", &mut out).unwrap();
        tokenizer.finish(&mut out).unwrap();
        assert_eq!(out.records, vec![vec!["a\tb", "c"]]);
    }
}

//! Rendering one record as one output line.
//!
//! A [`Projection`] picks the columns to emit (see [`Selection`]) and
//! re-serializes them with its own delimiter and quote:
//!
//! - a field is quoted only when it contains the delimiter, the quote,
//!   `\n` or `\r`;
//! - quotes inside a quoted field are doubled;
//! - every line ends with a single `\n`.
//!
//! Rendering is a pure function of the record and the projection, so the
//! same record can be written to any number of sinks independently.

use std::io::{self, Write};

use memchr::{memchr, memchr_iter, memchr3};

use crate::config::{OutputSpec, Selection};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub selection: Selection,
    pub delimiter: u8,
    pub quote: u8,
}

impl Projection {
    pub fn new(selection: Selection, delimiter: u8, quote: u8) -> Self {
        Self {
            selection,
            delimiter,
            quote,
        }
    }

    /// Write `record` as one line.
    pub fn render<W: Write + ?Sized>(&self, record: &Record<'_>, out: &mut W) -> io::Result<()> {
        let width = record.width();
        match &self.selection {
            Selection::All => self.write_fields(out, (0..width).map(|i| record.get(i)))?,
            Selection::Reverse => self.write_fields(out, (0..width).rev().map(|i| record.get(i)))?,
            Selection::Keys(keys) => self.write_fields(out, keys.iter().map(|&k| record.get(k)))?,
        }
        out.write_all(b"\n")
    }

    fn write_fields<'a, W, I>(&self, out: &mut W, fields: I) -> io::Result<()>
    where
        W: Write + ?Sized,
        I: Iterator<Item = &'a [u8]>,
    {
        for (i, field) in fields.enumerate() {
            if i > 0 {
                out.write_all(&[self.delimiter])?;
            }
            self.write_field(out, field)?;
        }
        Ok(())
    }

    fn write_field<W: Write + ?Sized>(&self, out: &mut W, field: &[u8]) -> io::Result<()> {
        if !self.needs_quotes(field) {
            return out.write_all(field);
        }

        out.write_all(&[self.quote])?;
        let mut start = 0;
        for pos in memchr_iter(self.quote, field) {
            // Write through the quote, then write it again.
            out.write_all(&field[start..=pos])?;
            out.write_all(&[self.quote])?;
            start = pos + 1;
        }
        out.write_all(&field[start..])?;
        out.write_all(&[self.quote])
    }

    fn needs_quotes(&self, field: &[u8]) -> bool {
        memchr3(self.delimiter, self.quote, b'\n', field).is_some() || memchr(b'\r', field).is_some()
    }
}

impl From<&OutputSpec> for Projection {
    fn from(spec: &OutputSpec) -> Self {
        Projection::new(spec.selection.clone(), spec.delimiter, spec.quote)
    }
}

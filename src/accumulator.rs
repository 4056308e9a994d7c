//! Per-record field assembly.
//!
//! The accumulator keeps one byte buffer per column and reuses it for every
//! record. The first record fixes the number of columns. Buffers are sized
//! exactly to the first record's fields and afterwards only grow, and only
//! to the exact length a longer field needs.
//!
//! Records that disagree with the first record's field count are accepted:
//! extra fields are dropped, missing ones render as empty. They are counted
//! as ragged.

use tracing::debug;

use crate::error::Result;
use crate::progress::ProgressMeter;
use crate::record::{Record, RecordSink};
use crate::tokenizer::FieldHandler;

/// Totals reported when the accumulator is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatorStats {
    pub records: u64,
    /// Records whose field count differed from the first record's.
    pub ragged: u64,
    /// Field count fixed by the first record, if any record was seen.
    pub width: Option<usize>,
}

pub struct FieldAccumulator<S> {
    fields: Vec<Vec<u8>>,
    width: Option<usize>,
    cursor: usize,
    ragged: u64,
    progress: ProgressMeter,
    sink: S,
}

impl<S: RecordSink> FieldAccumulator<S> {
    pub fn new(sink: S, progress: ProgressMeter) -> Self {
        Self {
            fields: Vec::new(),
            width: None,
            cursor: 0,
            ragged: 0,
            progress,
            sink,
        }
    }

    /// Capacity of each column buffer, in column order.
    pub fn capacities(&self) -> Vec<usize> {
        self.fields.iter().map(Vec::capacity).collect()
    }

    /// Flush the sink and report totals.
    pub fn finish(mut self) -> Result<AccumulatorStats> {
        self.sink.flush()?;
        Ok(AccumulatorStats {
            records: self.progress.records(),
            ragged: self.ragged,
            width: self.width,
        })
    }
}

impl<S: RecordSink> FieldHandler for FieldAccumulator<S> {
    fn on_field(&mut self, field: &[u8]) -> Result<()> {
        match self.width {
            None => {
                let mut buf = Vec::new();
                buf.try_reserve_exact(field.len())?;
                buf.extend_from_slice(field);
                self.fields.try_reserve(1)?;
                self.fields.push(buf);
            }
            Some(width) if self.cursor < width => {
                let buf = &mut self.fields[self.cursor];
                buf.clear();
                // No-op unless the field outgrew the buffer.
                buf.try_reserve_exact(field.len())?;
                buf.extend_from_slice(field);
            }
            Some(_) => {}
        }
        self.cursor += 1;
        Ok(())
    }

    fn on_record_end(&mut self) -> Result<()> {
        let width = *self.width.get_or_insert(self.cursor);
        if self.cursor != width {
            self.ragged += 1;
            debug!(
                record = self.progress.records() + 1,
                fields = self.cursor,
                expected = width,
                "ragged record"
            );
        }

        self.progress.tick();
        let record = Record::new(&self.fields, self.cursor, width);
        self.sink.write_record(&record)?;
        self.cursor = 0;
        Ok(())
    }
}

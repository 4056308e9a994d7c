//! Borrowed view of one parsed record.
//!
//! A [`Record`] points into the accumulator's reusable field buffers and
//! only lives for the duration of a single [`RecordSink::write_record`]
//! call.

use crate::error::Result;

/// One record, padded or truncated to the run's fixed field count.
///
/// `width` is the field count fixed by the first record. Fields past the
/// end of a short record read as empty.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    fields: &'a [Vec<u8>],
    present: usize,
    width: usize,
}

impl<'a> Record<'a> {
    /// `present` fields of `fields` belong to this record; `width` is the
    /// number of columns every record is rendered with.
    pub fn new(fields: &'a [Vec<u8>], present: usize, width: usize) -> Self {
        Self {
            fields,
            present: present.min(fields.len()).min(width),
            width,
        }
    }

    /// Number of columns rendered by whole-record projections.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Fields actually supplied by the input for this record.
    pub fn present(&self) -> usize {
        self.present
    }

    /// Field `index`, or an empty slice when the record has no such field.
    pub fn get(&self, index: usize) -> &'a [u8] {
        let fields: &'a [Vec<u8>] = self.fields;
        if index < self.present {
            &fields[index]
        } else {
            &[]
        }
    }
}

/// Consumer of completed records.
pub trait RecordSink {
    fn write_record(&mut self, record: &Record<'_>) -> Result<()>;

    /// Push out anything buffered. Called once after the last record.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn write_record(&mut self, record: &Record<'_>) -> Result<()> {
        (**self).write_record(record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

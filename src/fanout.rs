//! Fan-out of each record to every configured output.
//!
//! Outputs are written in declaration order. Outputs that target standard
//! output share a single buffered writer, so their lines interleave record
//! by record instead of block by block.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::config::{OutputSpec, SinkTarget};
use crate::error::{ReoError, Result};
use crate::projection::Projection;
use crate::record::{Record, RecordSink};

type Writer = BufWriter<Box<dyn Write + Send>>;

struct Output {
    projection: Projection,
    sink: usize,
}

/// Ordered outputs plus the writers they render into.
#[derive(Default)]
pub struct Fanout {
    outputs: Vec<Output>,
    sinks: Vec<Writer>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every sink named by `specs`.
    ///
    /// Files are created (with missing parent directories) and truncated
    /// up front, so an unwritable path fails before any input is read.
    pub fn open(specs: &[OutputSpec]) -> Result<Self> {
        let mut fanout = Self::new();
        let mut stdout_sink = None;

        for spec in specs {
            let projection = Projection::from(spec);
            match &spec.target {
                SinkTarget::Stdout => match stdout_sink {
                    Some(sink) => fanout.outputs.push(Output { projection, sink }),
                    None => {
                        let sink = fanout.push(projection, Box::new(io::stdout()));
                        stdout_sink = Some(sink);
                    }
                },
                SinkTarget::File(path) => {
                    let file = create_file(path)?;
                    debug!(path = %path.display(), "opened output file");
                    fanout.push(projection, Box::new(file));
                }
            }
        }

        Ok(fanout)
    }

    /// Add an output with its own writer. Returns the writer's index.
    pub fn push(&mut self, projection: Projection, writer: Box<dyn Write + Send>) -> usize {
        let sink = self.sinks.len();
        self.sinks.push(BufWriter::new(writer));
        self.outputs.push(Output { projection, sink });
        sink
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

fn create_file(path: &Path) -> Result<File> {
    let unavailable = |source| ReoError::SinkUnavailable {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(unavailable)?;
    }
    File::create(path).map_err(unavailable)
}

impl RecordSink for Fanout {
    fn write_record(&mut self, record: &Record<'_>) -> Result<()> {
        let Self { outputs, sinks } = self;
        for output in outputs.iter() {
            output.projection.render(record, &mut sinks[output.sink])?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

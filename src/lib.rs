//! # csvreo
//!
//! Streaming column reordering for large delimited files.
//!
//! A single pass over the input feeds any number of outputs. Each output
//! picks its own columns (an explicit key list, every column reversed, or
//! every column as-is) and its own delimiter and quote character.
//!
//! ## Overview
//!
//! - **Double buffering**: input is read into two alternating buffers on the
//!   calling thread while a worker thread parses the previous one
//! - **Reusable field storage**: one buffer per column, grown only when a
//!   longer field shows up
//! - **Fan-out**: every record is rendered once per output, in order
//!
//! ## Example
//!
//! ```no_run
//! use csvreo::{ConfigBuilder, SinkTarget};
//!
//! let mut builder = ConfigBuilder::new();
//! builder.input_delimiter(b',');
//! builder.output(SinkTarget::File("names.csv".into()));
//! builder.key(2)?.key(1)?;
//! builder.output(SinkTarget::File("flipped.csv".into()));
//! builder.reverse();
//! let config = builder.build()?;
//!
//! let summary = csvreo::execute(&config, std::io::stdin().lock())?;
//! eprintln!("{} records", summary.records);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accumulator;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod fanout;
pub mod progress;
pub mod projection;
pub mod record;
pub mod scheduler;
pub mod slot;
pub mod tokenizer;

pub use accumulator::{AccumulatorStats, FieldAccumulator};
pub use config::{Config, ConfigBuilder, OutputSpec, Selection, SinkTarget};
pub use error::{ConfigError, ErrorCategory, ReoError, Result};
pub use executor::{Summary, execute, execute_with};
pub use fanout::Fanout;
pub use progress::ProgressMeter;
pub use projection::Projection;
pub use record::{Record, RecordSink};
pub use scheduler::{Chunk, DoubleBuffer, ScheduleStats};
pub use slot::{Slot, SlotState};
pub use tokenizer::{CsvTokenizer, FieldHandler, Tokenizer};

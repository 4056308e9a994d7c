//! Double-buffered hand-off between input reading and parsing.
//!
//! Two [`Slot`]s circulate between the controlling thread, which reads
//! input, and a parser thread. Ownership moves through two bounded
//! channels: `empty` carries slots back to the reader, `full` carries
//! filled slots to the parser. Both channels are FIFO and only two slots
//! exist, so chunks are parsed strictly in read order and the slots
//! alternate 0, 1, 0, 1, ...
//!
//! End of input is signalled by the reader dropping its `full` sender
//! once a fill comes back short or empty. The parser drains whatever is
//! still queued and then sees the channel disconnect.

use std::io::Read;
use std::panic;
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, trace};

use crate::error::{ReoError, Result};
use crate::slot::Slot;

/// Number of buffers in flight.
pub const SLOT_COUNT: usize = 2;

/// One slot's bytes as seen by the parser.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Which slot the bytes came from.
    pub slot: usize,
    /// Position of this chunk in the input, starting at 0.
    pub sequence: u64,
    pub bytes: &'a [u8],
}

/// Counters from one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub chunks: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct DoubleBuffer {
    capacity: usize,
}

impl DoubleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Read `input` to the end, handing every chunk to `consume` on a
    /// dedicated parser thread.
    ///
    /// The first error from `consume` stops the run and is returned. Bytes
    /// already read but not yet parsed are discarded in that case.
    pub fn run<R, F>(&self, input: R, consume: F) -> Result<ScheduleStats>
    where
        R: Read,
        F: FnMut(Chunk<'_>) -> Result<()> + Send,
    {
        let (full_tx, full_rx) = channel::bounded::<Slot>(SLOT_COUNT);
        let (empty_tx, empty_rx) = channel::bounded::<Slot>(SLOT_COUNT);
        for index in 0..SLOT_COUNT {
            // Sized for every slot and both ends alive, so this cannot fail.
            let _ = empty_tx.send(Slot::new(index, self.capacity)?);
        }

        thread::scope(|scope| -> Result<ScheduleStats> {
            let parser = thread::Builder::new()
                .name("csvreo-parse".to_string())
                .spawn_scoped(scope, move || parse_slots(full_rx, empty_tx, consume))
                .map_err(ReoError::Thread)?;

            let read = read_slots(input, &empty_rx, full_tx);
            let parsed = match parser.join() {
                Ok(parsed) => parsed,
                Err(payload) => panic::resume_unwind(payload),
            };

            let chunks = parsed?;
            let stats = read?;
            debug_assert_eq!(chunks, stats.chunks);
            debug!(chunks = stats.chunks, bytes = stats.bytes, "input drained");
            Ok(stats)
        })
    }
}

/// Reader side. Runs on the calling thread.
fn read_slots<R: Read>(
    mut input: R,
    empty_rx: &Receiver<Slot>,
    full_tx: Sender<Slot>,
) -> Result<ScheduleStats> {
    let mut stats = ScheduleStats::default();

    // recv only fails once the parser has quit.
    while let Ok(mut slot) = empty_rx.recv() {
        let n = slot.fill_from(&mut input)?;
        if n == 0 {
            trace!(slot = slot.index(), "end of input");
            break;
        }
        stats.chunks += 1;
        stats.bytes += n as u64;

        let last = slot.is_short();
        if full_tx.send(slot).is_err() || last {
            break;
        }
    }

    Ok(stats)
}

/// Parser side. Runs on the worker thread until the reader hangs up.
fn parse_slots<F>(full_rx: Receiver<Slot>, empty_tx: Sender<Slot>, mut consume: F) -> Result<u64>
where
    F: FnMut(Chunk<'_>) -> Result<()>,
{
    let mut sequence = 0;
    for mut slot in full_rx {
        let index = slot.index();
        consume(Chunk {
            slot: index,
            sequence,
            bytes: slot.claim(),
        })?;
        slot.release();
        sequence += 1;

        // The reader may already be finished; queued slots still get parsed.
        let _ = empty_tx.send(slot);
    }
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn collect(capacity: usize, input: &[u8]) -> (Vec<(usize, u64, Vec<u8>)>, ScheduleStats) {
        let mut chunks = Vec::new();
        let stats = DoubleBuffer::new(capacity)
            .run(input, |chunk| {
                chunks.push((chunk.slot, chunk.sequence, chunk.bytes.to_vec()));
                Ok(())
            })
            .unwrap();
        (chunks, stats)
    }

    #[test]
    fn test_chunks_concatenate_to_input() {
        let input: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        for capacity in [1, 2, 7, 64, 999, 1000, 1001, 4096] {
            let (chunks, stats) = collect(capacity, &input);
            let joined: Vec<u8> = chunks.iter().flat_map(|c| c.2.clone()).collect();
            assert_eq!(joined, input, "capacity {capacity}");
            assert_eq!(stats.bytes, input.len() as u64);
            assert_eq!(stats.chunks, chunks.len() as u64);
        }
    }

    #[test]
    fn test_slots_alternate_in_order() {
        let (chunks, _) = collect(4, b"0123456789");
        let slots: Vec<usize> = chunks.iter().map(|c| c.0).collect();
        let sequences: Vec<u64> = chunks.iter().map(|c| c.1).collect();
        assert_eq!(slots, vec![0, 1, 0]);
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(chunks[2].2, b"89");
    }

    #[test]
    fn test_exact_multiple_of_capacity() {
        let (chunks, stats) = collect(5, b"abcdeABCDE");
        assert_eq!(chunks.len(), 2);
        assert_eq!(stats.bytes, 10);
    }

    #[test]
    fn test_empty_input() {
        let (chunks, stats) = collect(16, b"");
        assert!(chunks.is_empty());
        assert_eq!(stats, ScheduleStats::default());
    }

    #[test]
    fn test_consumer_error_aborts_endless_input() {
        let mut seen = 0;
        let err = DoubleBuffer::new(8)
            .run(io::repeat(b'x'), |_| {
                seen += 1;
                if seen == 3 {
                    return Err(ReoError::Parse {
                        line: 1,
                        message: "bad".to_string(),
                    });
                }
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, ReoError::Parse { .. }));
        assert_eq!(seen, 3);
    }

    struct FailAfter {
        remaining: usize,
        reads: Arc<AtomicUsize>,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(b'z');
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_read_error_after_draining() {
        let reads = Arc::new(AtomicUsize::new(0));
        let input = FailAfter {
            remaining: 8,
            reads: Arc::clone(&reads),
        };
        let mut parsed = Vec::new();
        let err = DoubleBuffer::new(4)
            .run(input, |chunk| {
                parsed.extend_from_slice(chunk.bytes);
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, ReoError::Io(_)));
        assert_eq!(parsed, b"zzzzzzzz");
        assert_eq!(reads.load(Ordering::SeqCst), 3);
    }
}

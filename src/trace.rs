use std::{
    fs,
    io::{ErrorKind, Read},
    path::PathBuf,
    thread::{self, JoinHandle},
};

use crossbeam::channel::{Receiver, Sender};
use xz2::read::XzDecoder;

use crate::error::{Result, SimError};

const WORD_SIZE: usize = std::mem::size_of::<u32>();

/// A trace of big-endian 32-bit addresses, decoded on a reader thread and
/// handed over in chunks. The channel closes at end of file.
pub struct Trace {
    pub rec: Receiver<Result<Vec<u32>>>,
    _thread: JoinHandle<()>,
}

impl Trace {
    pub fn read(path: PathBuf, words_per_block: usize, blocks_per_queue: usize) -> Result<Trace> {
        let file = fs::File::open(&path)
            .map_err(|err| SimError::io(format!("cannot open {}", path.display()), err))?;
        let stream: Box<dyn Read + Send> = if path.extension().is_some_and(|ext| ext == "xz") {
            Box::new(XzDecoder::new(file))
        } else {
            Box::new(file)
        };
        log::info!("reading trace {}", path.display());
        Ok(Trace::from_reader(stream, words_per_block, blocks_per_queue))
    }

    pub fn from_reader(
        stream: Box<dyn Read + Send>,
        words_per_block: usize,
        blocks_per_queue: usize,
    ) -> Trace {
        let (sender, receiver) = crossbeam::channel::bounded(blocks_per_queue.max(1));
        let words_per_block = words_per_block.max(1);
        let t = thread::spawn(move || Trace::run_thread(stream, words_per_block, sender));
        Trace {
            rec: receiver,
            _thread: t,
        }
    }

    fn run_thread(mut stream: Box<dyn Read + Send>, words_per_block: usize, queue: Sender<Result<Vec<u32>>>) {
        let mut buffer = vec![0u8; words_per_block * WORD_SIZE];
        let mut total = 0u64;
        loop {
            let filled = match fill(&mut stream, &mut buffer) {
                Ok(n) => n,
                Err(err) => {
                    let _ = queue.send(Err(SimError::io("reading trace", err)));
                    return;
                }
            };
            if filled == 0 {
                break;
            }
            let words = &buffer[..filled];
            let block: Vec<u32> = words
                .chunks_exact(WORD_SIZE)
                .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
                .collect();
            total += block.len() as u64;
            let trailing = filled % WORD_SIZE;
            if !block.is_empty() && queue.send(Ok(block)).is_err() {
                // Consumer went away
                return;
            }
            if filled < buffer.len() {
                if trailing != 0 {
                    log::warn!("ignoring {trailing} trailing bytes at end of trace");
                }
                break;
            }
        }
        log::info!("trace exhausted after {total} addresses");
    }
}

/// Reads until `buf` is full or the stream ends, returning the bytes read.
fn fill(stream: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

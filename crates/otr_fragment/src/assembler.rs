//! `accumulate(line)` (§4.2): reassemble inbound fragments into a complete
//! encoded message, honoring per-remote-instance-tag buffers.

use std::collections::HashMap;

use crate::error::FragmentError;
use crate::header::parse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulated {
    /// `line` was not a fragment at all; the caller should handle it as an
    /// ordinary (possibly complete) message.
    NotAFragment,
    /// More fragments are expected before the message is complete.
    Partial,
    /// The message is complete; this is the original encoded envelope.
    Complete(String),
    /// The fragment's receiver tag names a different local instance; it was
    /// dropped without mutating any in-progress buffer.
    UnknownInstance,
}

struct InProgress {
    n: u16,
    next_k: u16,
    pieces: Vec<String>,
}

/// One buffer per remote instance tag (§4.2); keyed by `0` for v2 fragments,
/// which carry no instance tags.
pub struct Assembler {
    local_instance_tag: u32,
    buffers: HashMap<u32, InProgress>,
}

impl Assembler {
    pub fn new(local_instance_tag: u32) -> Self {
        Self { local_instance_tag, buffers: HashMap::new() }
    }

    pub fn accumulate(&mut self, line: &str) -> Result<Accumulated, FragmentError> {
        let Some(parsed) = parse(line) else {
            return Ok(Accumulated::NotAFragment);
        };
        let (header, piece) = parsed?;

        if header.receiver != 0 && header.receiver != self.local_instance_tag {
            return Ok(Accumulated::UnknownInstance);
        }
        if header.k == 0 || header.n == 0 || header.k > header.n {
            return Err(FragmentError::Malformed(format!(
                "invalid fragment index k={} of n={}",
                header.k, header.n
            )));
        }

        let key = header.sender;

        if header.k == 1 {
            self.buffers.insert(
                key,
                InProgress { n: header.n, next_k: 2, pieces: vec![piece] },
            );
            return self.maybe_complete(key);
        }

        match self.buffers.get_mut(&key) {
            Some(buf) if buf.n == header.n && buf.next_k == header.k => {
                buf.pieces.push(piece);
                buf.next_k += 1;
                self.maybe_complete(key)
            }
            other => {
                let expected = other.map(|b| b.next_k).unwrap_or(1);
                self.buffers.remove(&key);
                Err(FragmentError::OutOfOrder { expected, got: header.k })
            }
        }
    }

    fn maybe_complete(&mut self, key: u32) -> Result<Accumulated, FragmentError> {
        let done = matches!(self.buffers.get(&key), Some(buf) if buf.next_k - 1 == buf.n);
        if done {
            let buf = self.buffers.remove(&key).expect("checked present above");
            Ok(Accumulated::Complete(buf.pieces.concat()))
        } else {
            Ok(Accumulated::Partial)
        }
    }
}

//! In-memory duplex pipe.
//!
//! Two [`PipeEnd`]s share a pair of byte queues. Reads block until the peer
//! writes or hangs up, so the ends can live on different threads. Writes
//! never block.
//!
//! The harness also uses the pipe as a wire tap: [`PipeEnd::pending`] shows
//! what is in flight towards an end and [`PipeEnd::tamper`] corrupts it.

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
    sync::Arc,
};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Queue {
    bytes: VecDeque<u8>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Channel {
    queue: Mutex<Queue>,
    ready: Condvar,
}

impl Channel {
    fn close(&self) {
        self.queue.lock().closed = true;
        self.ready.notify_all();
    }
}

/// One end of an in-memory duplex pipe.
#[derive(Debug)]
pub struct PipeEnd {
    inbound: Arc<Channel>,
    outbound: Arc<Channel>,
    total_written: usize,
}

/// Create a connected pair of pipe ends.
pub fn pipe() -> (PipeEnd, PipeEnd) {
    let a_to_b = Arc::new(Channel::default());
    let b_to_a = Arc::new(Channel::default());

    (
        PipeEnd { inbound: Arc::clone(&b_to_a), outbound: Arc::clone(&a_to_b), total_written: 0 },
        PipeEnd { inbound: a_to_b, outbound: b_to_a, total_written: 0 },
    )
}

impl PipeEnd {
    /// Copy of the bytes waiting to be read by this end.
    pub fn pending(&self) -> Vec<u8> {
        self.inbound.queue.lock().bytes.iter().copied().collect()
    }

    /// XOR `mask` into the pending inbound byte at `offset`.
    ///
    /// Returns `false` when fewer than `offset + 1` bytes are pending.
    pub fn tamper(&self, offset: usize, mask: u8) -> bool {
        let mut queue = self.inbound.queue.lock();
        match queue.bytes.get_mut(offset) {
            Some(byte) => {
                *byte ^= mask;
                true
            },
            None => false,
        }
    }

    /// Discard all pending inbound bytes. Returns how many were dropped.
    pub fn drop_pending(&self) -> usize {
        let mut queue = self.inbound.queue.lock();
        let dropped = queue.bytes.len();
        queue.bytes.clear();
        dropped
    }

    /// Bytes this end has written so far.
    pub fn total_written(&self) -> usize {
        self.total_written
    }
}

impl Read for PipeEnd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut queue = self.inbound.queue.lock();
        while queue.bytes.is_empty() {
            if queue.closed {
                return Ok(0);
            }
            self.inbound.ready.wait(&mut queue);
        }

        let n = buf.len().min(queue.bytes.len());
        for (dst, src) in buf.iter_mut().zip(queue.bytes.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for PipeEnd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut queue = self.outbound.queue.lock();
            if queue.closed {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            queue.bytes.extend(buf);
        }
        self.outbound.ready.notify_all();
        self.total_written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeEnd {
    fn drop(&mut self) {
        self.outbound.close();
        self.inbound.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_cross_in_order() {
        let (mut a, mut b) = pipe();
        a.write_all(b"hello").unwrap();
        a.write_all(b" world").unwrap();

        let mut buf = [0u8; 11];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello world");
        assert_eq!(a.total_written(), 11);
    }

    #[test]
    fn reads_block_until_peer_writes() {
        let (mut a, mut b) = pipe();

        let reader = std::thread::spawn(move || {
            let mut buf = [0u8; 4];
            b.read_exact(&mut buf).map(|()| buf)
        });

        a.write_all(b"late").unwrap();
        assert_eq!(&reader.join().unwrap().unwrap(), b"late");
    }

    #[test]
    fn hang_up_is_eof() {
        let (a, mut b) = pipe();
        drop(a);

        let mut buf = [0u8; 1];
        assert_eq!(b.read(&mut buf).unwrap(), 0);
        assert_eq!(b.write(b"x").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn tamper_flips_pending_bytes() {
        let (mut a, b) = pipe();
        a.write_all(&[0, 0, 0]).unwrap();

        assert!(b.tamper(1, 0x80));
        assert!(!b.tamper(3, 0x80));
        assert_eq!(b.pending(), vec![0, 0x80, 0]);
        assert_eq!(b.drop_pending(), 3);
        assert!(b.pending().is_empty());
    }
}

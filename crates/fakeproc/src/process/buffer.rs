// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Stream buffers backing simulated stdout / stderr.

use crate::error::{FakeProcessError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use tokio::sync::Notify;

/// Separator used when rendering line-list output.
pub const LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

#[derive(Debug, Default)]
struct MemoryBuffer {
    data: Vec<u8>,
    pos: usize,
}

/// Seekable in-memory pipe of a synchronous simulated process.
///
/// Writes move the cursor to the end; finishing the process rewinds it so
/// readers see everything written.
#[derive(Clone, Debug, Default)]
pub struct PipeReader {
    inner: Arc<Mutex<MemoryBuffer>>,
}

impl PipeReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, data: &[u8]) {
        let mut buffer = self.inner.lock();
        buffer.data.extend_from_slice(data);
        buffer.pos = buffer.data.len();
    }

    pub(crate) fn rewind(&self) {
        self.inner.lock().pos = 0;
    }

    /// Everything written so far, regardless of the read position.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().data.clone()
    }

    pub fn position(&self) -> usize {
        self.inner.lock().pos
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut buffer = self.inner.lock();
        let start = buffer.pos.min(buffer.data.len());
        let available = &buffer.data[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        buffer.pos = start + n;
        Ok(n)
    }
}

#[derive(Debug, Default)]
struct StreamState {
    buffer: VecDeque<u8>,
    eof: bool,
}

#[derive(Default)]
struct StreamInner {
    state: Mutex<StreamState>,
    notify: Notify,
}

/// Asynchronous byte stream of an async simulated process.
///
/// Fed by the engine, read by the caller; reads wait until data or
/// end-of-stream arrives.
#[derive(Clone, Default)]
pub struct StreamReader {
    inner: Arc<StreamInner>,
}

impl StreamReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn feed_data(&self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        {
            let mut state = self.inner.state.lock();
            if state.eof {
                return Err(FakeProcessError::internal("feed_data after feed_eof"));
            }
            state.buffer.extend(data);
        }
        self.inner.notify.notify_waiters();
        Ok(())
    }

    pub(crate) fn feed_eof(&self) {
        self.inner.state.lock().eof = true;
        self.inner.notify.notify_waiters();
    }

    /// End-of-stream was fed and every byte has been read.
    pub fn at_eof(&self) -> bool {
        let state = self.inner.state.lock();
        state.eof && state.buffer.is_empty()
    }

    /// Read until end-of-stream.
    pub async fn read(&self) -> Vec<u8> {
        self.read_when(|state| state.eof.then(|| state.buffer.drain(..).collect()))
            .await
    }

    /// Read up to `limit` bytes, waiting for at least one unless at end-of-stream.
    pub async fn read_chunk(&self, limit: usize) -> Vec<u8> {
        self.read_when(|state| {
            if !state.buffer.is_empty() {
                let n = limit.min(state.buffer.len());
                Some(state.buffer.drain(..n).collect())
            } else if state.eof {
                Some(Vec::new())
            } else {
                None
            }
        })
        .await
    }

    /// Read one line including its `\n`, or the remainder at end-of-stream.
    pub async fn readline(&self) -> Vec<u8> {
        self.read_when(|state| {
            let newline = state.buffer.iter().position(|&b| b == b'\n');
            match newline {
                Some(idx) => Some(state.buffer.drain(..=idx).collect()),
                None if state.eof => Some(state.buffer.drain(..).collect()),
                None => None,
            }
        })
        .await
    }

    async fn read_when<F>(&self, mut take: F) -> Vec<u8>
    where
        F: FnMut(&mut StreamState) -> Option<Vec<u8>>,
    {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let taken = {
                let mut state = self.inner.state.lock();
                take(&mut state)
            };
            if let Some(data) = taken {
                return data;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("StreamReader")
            .field("buffered", &state.buffer.len())
            .field("eof", &state.eof)
            .finish()
    }
}

/// Output pipe of a simulated process
#[derive(Clone, Debug)]
pub(crate) enum Pipe {
    Memory(PipeReader),
    Stream(StreamReader),
}

impl Pipe {
    pub(crate) fn write(&self, data: &[u8]) -> Result<()> {
        match self {
            Self::Memory(reader) => {
                reader.append(data);
                Ok(())
            }
            Self::Stream(reader) => reader.feed_data(data),
        }
    }

    /// Make the pipe's contents visible to readers.
    pub(crate) fn seal(&self) {
        match self {
            Self::Memory(reader) => reader.rewind(),
            Self::Stream(reader) => reader.feed_eof(),
        }
    }
}

/// Turn `\r\n` line endings into `\n`.
pub(crate) fn normalize_newlines(data: Vec<u8>) -> Vec<u8> {
    if !data.windows(2).any(|w| w == b"\r\n") {
        return data;
    }
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();
    while let Some(&byte) = iter.next() {
        if byte == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(byte);
    }
    out
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;

//! Byte-stream collaborators.
//!
//! The engine reads whatever bytes are already available and never waits
//! for more. Writes go out as whole lines followed by a flush.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tracing::{debug, warn};

/// Non-blocking byte source with a flushable sink.
pub trait ByteStream {
    /// Next available byte, or `None` when nothing is available right now.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write a complete chunk of output.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Push buffered output to the peer. May block.
    fn flush(&mut self) -> io::Result<()>;
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

#[derive(Debug, Default)]
struct MemoryBuffers {
    input: VecDeque<u8>,
    output: Vec<u8>,
    flushes: usize,
}

/// In-memory loopback stream.
///
/// Clones share the same buffers, so one handle can be given to the engine
/// while another feeds input and inspects output.
///
/// # Examples
///
/// ```
/// use bevy_keyhole::core::{ByteStream, MemoryStream};
///
/// let stream = MemoryStream::new();
/// let mut engine_side = stream.clone();
/// stream.push_input("x;");
/// assert_eq!(engine_side.read_byte(), Some(b'x'));
/// assert_eq!(stream.pending_input(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    buffers: Arc<Mutex<MemoryBuffers>>,
}

impl MemoryStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryBuffers> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue bytes for the engine to read.
    pub fn push_input(&self, bytes: impl AsRef<[u8]>) {
        self.lock().input.extend(bytes.as_ref());
    }

    /// Number of queued bytes not yet read.
    pub fn pending_input(&self) -> usize {
        self.lock().input.len()
    }

    /// Take everything written so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().output)
    }

    /// Take everything written so far as (lossy) UTF-8.
    pub fn take_output_string(&self) -> String {
        String::from_utf8_lossy(&self.take_output()).into_owned()
    }

    /// Number of flushes requested so far.
    pub fn flush_count(&self) -> usize {
        self.lock().flushes
    }
}

impl ByteStream for MemoryStream {
    fn read_byte(&mut self) -> Option<u8> {
        self.lock().input.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.lock().output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flushes += 1;
        Ok(())
    }
}

/// Blocking reader turned non-blocking by a background thread.
///
/// The thread moves whatever the reader yields into a channel; the engine
/// side only ever polls the channel. Output goes straight to `W`.
pub struct ChannelStream<W> {
    receiver: Mutex<Receiver<Vec<u8>>>,
    buffered: VecDeque<u8>,
    closed: bool,
    writer: W,
}

impl<W: Write> ChannelStream<W> {
    /// Spawn a reader thread for `reader` and write output to `writer`.
    pub fn spawn<R>(reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let _handle = thread::spawn(move || pump(reader, sender));

        Self {
            receiver: Mutex::new(receiver),
            buffered: VecDeque::new(),
            closed: false,
            writer,
        }
    }

    /// Check if the reader reached end of input and everything was consumed.
    pub fn is_closed(&self) -> bool {
        self.closed && self.buffered.is_empty()
    }

    /// The output sink.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the stream, returning the output sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl ChannelStream<io::Stdout> {
    /// Stream over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::spawn(io::stdin(), io::stdout())
    }
}

impl<W: Write> ByteStream for ChannelStream<W> {
    fn read_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.buffered.pop_front() {
            return Some(byte);
        }
        if self.closed {
            return None;
        }

        let receiver = self.receiver.get_mut().unwrap_or_else(PoisonError::into_inner);
        loop {
            match receiver.try_recv() {
                Ok(chunk) => {
                    self.buffered.extend(chunk);
                    if !self.buffered.is_empty() {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        self.buffered.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn pump<R: Read>(mut reader: R, sender: Sender<Vec<u8>>) {
    let mut buf = [0u8; 256];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("keyhole input reached end of stream");
                break;
            }
            Ok(n) => {
                if sender.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("keyhole input read failed: {}", err);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Poll until `count` bytes were read or a second has passed.
    fn read_n<S: ByteStream>(stream: &mut S, count: usize) -> Vec<u8> {
        let deadline = Instant::now() + Duration::from_secs(1);
        let mut bytes = Vec::new();
        while bytes.len() < count && Instant::now() < deadline {
            match stream.read_byte() {
                Some(byte) => bytes.push(byte),
                None => thread::sleep(Duration::from_millis(1)),
            }
        }
        bytes
    }

    #[test]
    fn test_memory_stream_shared_buffers() {
        let stream = MemoryStream::new();
        let mut engine_side = stream.clone();

        stream.push_input(b"ab");
        assert_eq!(engine_side.read_byte(), Some(b'a'));
        assert_eq!(engine_side.read_byte(), Some(b'b'));
        assert_eq!(engine_side.read_byte(), None);

        engine_side.write_all(b"out\n").unwrap();
        engine_side.flush().unwrap();
        assert_eq!(stream.flush_count(), 1);
        assert_eq!(stream.take_output_string(), "out\n");
        assert!(stream.take_output().is_empty());
    }

    #[test]
    fn test_boxed_and_borrowed_streams() {
        let stream = MemoryStream::new();
        stream.push_input("xy");

        let mut boxed: Box<dyn ByteStream + Send + Sync> = Box::new(stream.clone());
        assert_eq!(boxed.read_byte(), Some(b'x'));

        let mut inner = stream.clone();
        let mut borrowed = &mut inner;
        assert_eq!(ByteStream::read_byte(&mut borrowed), Some(b'y'));
    }

    #[test]
    fn test_channel_stream_reads_everything() {
        let mut stream = ChannelStream::spawn(io::Cursor::new(b"a = 1;\n".to_vec()), Vec::new());
        assert_eq!(read_n(&mut stream, 7), b"a = 1;\n");

        let deadline = Instant::now() + Duration::from_secs(1);
        while !stream.is_closed() && Instant::now() < deadline {
            let _ = stream.read_byte();
            thread::sleep(Duration::from_millis(1));
        }
        assert!(stream.is_closed());
        assert_eq!(stream.read_byte(), None);
    }

    #[test]
    fn test_channel_stream_writes_to_sink() {
        let mut stream = ChannelStream::spawn(io::empty(), Vec::new());
        stream.write_all(b"{\"a\": 1}\n").unwrap();
        stream.flush().unwrap();
        assert_eq!(stream.get_ref(), b"{\"a\": 1}\n");
        assert_eq!(stream.into_inner(), b"{\"a\": 1}\n");
    }
}

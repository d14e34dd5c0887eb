use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;
pub const DEFAULT_IDLE_RETRY: Duration = Duration::from_millis(100);

/// What the [`LineReader`] produced on one pull
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    /// A complete line, without its terminating newline. The last
    /// line of a stream may lack the newline.
    Line(String),
    /// A receive attempt timed out or would have blocked. The reader
    /// sleeps before the next attempt.
    Idle,
}

/// Reassembles newline-delimited lines from a byte stream that is
/// delivered in arbitrary chunks.
///
/// The wrapped reader is expected to return `TimedOut` or
/// `WouldBlock` errors after a bounded wait (see
/// [`UnixStream::set_read_timeout`](std::os::unix::net::UnixStream::set_read_timeout));
/// those are reported as [`Input::Idle`] and retried indefinitely.
/// End of stream, any other read error and a raised stop flag end the
/// sequence, after whatever text is still buffered has been returned
/// as a last line.
pub struct LineReader<R> {
    inner: R,
    buffer: Vec<u8>,
    /// Receive buffer, its length bounds a single read
    chunk: Vec<u8>,
    idle_retry: Duration,
    stop: Arc<AtomicBool>,
    /// Set after [`Input::Idle`] has been handed out; the next pull
    /// sleeps before reading.
    idle: bool,
    done: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        LineReader {
            inner,
            buffer: Vec::new(),
            chunk: vec![0; DEFAULT_CHUNK_SIZE],
            idle_retry: DEFAULT_IDLE_RETRY,
            stop: Arc::new(AtomicBool::new(false)),
            idle: false,
            done: false,
        }
    }

    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk.resize(n.max(1), 0);
        self
    }
    pub fn with_idle_retry(mut self, d: Duration) -> Self {
        self.idle_retry = d;
        self
    }
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Removes the first complete line from the buffer
    fn take_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|c| *c == b'\n')?;
        let line = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
        self.buffer.drain(..=pos);
        Some(line)
    }

    /// Ends the sequence, returning residual text if there is any
    fn finish(&mut self) -> Option<Input> {
        self.done = true;
        if self.buffer.is_empty() {
            return None;
        }
        let rest = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Some(Input::Line(rest))
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = Input;

    fn next(&mut self) -> Option<Input> {
        if self.done {
            return None;
        }
        loop {
            if let Some(line) = self.take_line() {
                return Some(Input::Line(line));
            }
            if self.idle {
                self.idle = false;
                if self.stop.load(Ordering::Relaxed) {
                    log::info!("Stop requested, ending input");
                    return self.finish();
                }
                thread::sleep(self.idle_retry);
            }
            match self.inner.read(&mut self.chunk) {
                Ok(0) => {
                    log::debug!("End of stream");
                    return self.finish();
                }
                Ok(n) => self.buffer.extend_from_slice(&self.chunk[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    self.idle = true;
                    return Some(Input::Idle);
                }
                Err(e) => {
                    log::warn!("read: {}", e);
                    return self.finish();
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Replays a script of read results
    struct Script(VecDeque<io::Result<Vec<u8>>>);

    impl Script {
        fn new(steps: Vec<io::Result<&[u8]>>) -> Self {
            Script(steps.into_iter().map(|s| s.map(Vec::from)).collect())
        }
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(mut data)) => {
                    if data.len() > buf.len() {
                        let rest = data.split_off(buf.len());
                        self.0.push_front(Ok(rest));
                    }
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
            }
        }
    }

    fn data(b: &[u8]) -> io::Result<&[u8]> {
        Ok(b)
    }

    fn timeout() -> io::Result<&'static [u8]> {
        Err(io::Error::new(ErrorKind::WouldBlock, "timeout"))
    }

    fn line(s: &str) -> Input {
        Input::Line(s.into())
    }

    fn reader(steps: Vec<io::Result<&[u8]>>) -> LineReader<Script> {
        LineReader::new(Script::new(steps)).with_idle_retry(Duration::ZERO)
    }

    #[test]
    fn drains_buffered_lines() {
        let got: Vec<_> = reader(vec![data(b"a=1\nb=2\nc=3\n")]).collect();
        assert_eq!(got, vec![line("a=1"), line("b=2"), line("c=3")]);
    }

    #[test]
    fn reassembles_chunks() {
        let text = b"type=execve a0=\"x\"\n";
        for i in 1..text.len() {
            for j in i + 1..text.len() {
                let got: Vec<_> =
                    reader(vec![data(&text[..i]), data(&text[i..j]), data(&text[j..])]).collect();
                assert_eq!(got, vec![line(r#"type=execve a0="x""#)], "split at {i},{j}");
            }
        }
    }

    #[test]
    fn small_chunks() {
        let got: Vec<_> = LineReader::new(Script::new(vec![data(b"type=execve a0=x\na1")]))
            .with_chunk_size(3)
            .collect();
        assert_eq!(got, vec![line("type=execve a0=x"), line("a1")]);
    }

    #[test]
    fn residual_on_close() {
        let got: Vec<_> = reader(vec![data(b"a=1\ntype=exe"), data(b"cve a0=x")]).collect();
        assert_eq!(got, vec![line("a=1"), line("type=execve a0=x")]);

        let got: Vec<_> = reader(vec![]).collect();
        assert_eq!(got, vec![]);
    }

    #[test]
    fn idle_is_retried() {
        let got: Vec<_> = reader(vec![
            data(b"a=1"),
            timeout(),
            Err(io::Error::new(ErrorKind::TimedOut, "timeout")),
            Err(io::Error::new(ErrorKind::Interrupted, "signal")),
            data(b"\n"),
        ])
        .collect();
        assert_eq!(got, vec![Input::Idle, Input::Idle, Input::Idle, line("a=1")]);
    }

    #[test]
    fn hard_error_ends_input() {
        let got: Vec<_> = reader(vec![
            data(b"a=1\nb=2"),
            Err(io::Error::new(ErrorKind::ConnectionReset, "reset")),
            data(b"\nc=3\n"),
        ])
        .collect();
        assert_eq!(got, vec![line("a=1"), line("b=2")]);
    }

    #[test]
    fn stop_flag_checked_when_idle() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut r = reader(vec![data(b"a=1\npartial"), timeout(), data(b"\nnever\n")])
            .with_stop_flag(stop.clone());
        assert_eq!(r.next(), Some(line("a=1")));
        assert_eq!(r.next(), Some(Input::Idle));
        stop.store(true, Ordering::Relaxed);
        assert_eq!(r.next(), Some(line("partial")));
        assert_eq!(r.next(), None);
        assert_eq!(r.next(), None);
    }

    #[test]
    fn multibyte_split() {
        let got: Vec<_> = reader(vec![data(b"a0=\xc3"), data(b"\xa4\n")]).collect();
        assert_eq!(got, vec![line("a0=ä")]);
    }
}

use std::fmt;
use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::connector::{connect, ConnectError};
use crate::parser::{tokenize, EventFilter};
use crate::reader::{Input, LineReader};
use crate::report::Reporter;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error("write output: {0}")]
    Output(#[from] io::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub lines: u64,
    pub captures: u64,
    pub unparseable: u64,
    pub unmatched: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} lines, {} captures, {} unparseable, {} unmatched",
            self.lines, self.captures, self.unparseable, self.unmatched
        )
    }
}

/// Feeds every line from `input` through tokenizer and filter and
/// reports the matches. Returns once the reader is exhausted.
pub fn pump<R: Read, W: Write>(
    input: LineReader<R>,
    filter: &EventFilter,
    reporter: &mut Reporter<W>,
) -> io::Result<Stats> {
    let mut stats = Stats::default();
    for item in input {
        let line = match item {
            Input::Idle => {
                reporter.idle()?;
                continue;
            }
            Input::Line(line) => line,
        };
        stats.lines += 1;
        let record = match tokenize(&line) {
            Some(record) => record,
            None => {
                stats.unparseable += 1;
                log::debug!("Skipping unparseable line: {}", &line);
                continue;
            }
        };
        match filter.apply(&record) {
            Some(fields) => {
                if reporter.capture(&fields)? {
                    stats.captures += 1;
                }
            }
            None => {
                stats.unmatched += 1;
                log::trace!("Skipping unmatched line: {}", &line);
            }
        }
    }
    reporter.status("END LOOP")?;
    Ok(stats)
}

/// An open connection. Dropping it announces and performs the
/// shutdown of the socket, whichever way the capture loop ended.
struct Session<W: Write> {
    stream: UnixStream,
    reporter: Reporter<W>,
}

impl<W: Write> Drop for Session<W> {
    fn drop(&mut self) {
        if let Err(e) = self.reporter.status("Closing socket") {
            log::warn!("write output: {}", e);
        }
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            log::debug!("shutdown: {}", e);
        }
    }
}

/// Connects to the configured socket and prints captures to `output`
/// until the stream ends or `stop` is raised.
pub fn run<W: Write>(
    config: &Config,
    stop: Arc<AtomicBool>,
    output: W,
) -> Result<Stats, SessionError> {
    let stream = connect(&config.input.socket, config.read_timeout())?;

    let mut reporter = Reporter::new(output);
    reporter.waiting = config.output.waiting;
    reporter.dump_fields = config.output.dump_fields;

    let mut session = Session { stream, reporter };
    session.reporter.status("Connected socket")?;

    let input = LineReader::new(&session.stream)
        .with_chunk_size(config.input.chunk_size)
        .with_idle_retry(config.idle_retry())
        .with_stop_flag(stop);
    let stats = pump(input, &config.make_filter(), &mut session.reporter)?;

    log::info!("Stopped: {}", &stats);
    Ok(stats)
}

//! Log output. Everything goes to stderr, except while the TUI owns the
//! terminal: then lines are held back and printed once it is restored.

use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

static BUFFER: Mutex<Option<Vec<String>>> = Mutex::new(None);

/// Activate buffering. While active, log lines are stored instead of
/// printed to stderr.
pub fn activate() {
    *BUFFER.lock().unwrap_or_else(|e| e.into_inner()) = Some(Vec::new());
}

/// Deactivate buffering and return all collected lines.
pub fn drain() -> Vec<String> {
    BUFFER
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .take()
        .unwrap_or_default()
}

/// Store a line if buffering is active, otherwise print it immediately.
fn emit(line: String) {
    let mut guard = BUFFER.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(buf) = guard.as_mut() {
        buf.push(line);
    } else {
        drop(guard);
        eprintln!("{}", line);
    }
}

/// Collects one formatted event and hands it to [`emit`] when dropped
#[derive(Debug, Default)]
pub struct LineWriter {
    buf: Vec<u8>,
}

impl Write for LineWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf).trim_end().to_string();
        if !line.is_empty() {
            emit(line);
        }
    }
}

/// Writer factory for the fmt subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferedStderr;

impl<'a> MakeWriter<'a> for BufferedStderr {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter::default()
    }
}

/// Filter used when RUST_LOG is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "live_standings=debug"
    } else {
        "live_standings=warn"
    }
}

/// Install the global subscriber. RUST_LOG overrides the default filter.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(BufferedStderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

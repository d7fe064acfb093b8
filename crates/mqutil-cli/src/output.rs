//! Destination of command output (stdout in the binary).
//!
//! Diagnostics go through the logging macros to stderr; only results land
//! here. The handle is shared with receive-loop handlers, which run on the
//! blocking pool; each record is written whole while the lock is held.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use mqutil::Delivery;
use parking_lot::Mutex;

use crate::error::CliError;

#[derive(Clone)]
pub struct Output {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Output {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// An output whose contents can be read back.
    pub fn capture() -> (Self, Captured) {
        let captured = Captured::default();
        (Self::new(captured.clone()), captured)
    }

    pub fn line(&self, args: fmt::Arguments<'_>) -> Result<(), CliError> {
        self.write_line(args)
            .map_err(|e| CliError::io("write output", e))
    }

    fn write_line(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_fmt(args)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    /// Print a received message: its id, then the raw payload.
    ///
    /// The record is built before locking and written with a single call,
    /// so concurrent deliveries never interleave.
    pub fn delivery(&self, delivery: &Delivery) -> io::Result<()> {
        let header = format!("message received {}\n", delivery.id);
        let mut record = Vec::with_capacity(header.len() + delivery.data.len() + 1);
        record.extend_from_slice(header.as_bytes());
        record.extend_from_slice(&delivery.data);
        record.push(b'\n');

        let mut writer = self.writer.lock();
        writer.write_all(&record)?;
        writer.flush()
    }
}

#[derive(Clone, Default)]
pub struct Captured {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Captured {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

//! Swappable output destination for the formatting subscriber.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

type Sink = Box<dyn Write + Send>;

/// Cloneable handle to a log destination shared by a logger and its
/// subscriber.
#[derive(Clone)]
pub(crate) struct SharedWriter(Arc<Mutex<Sink>>);

impl SharedWriter {
    pub(crate) fn new<W>(sink: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self(Arc::new(Mutex::new(Box::new(sink))))
    }

    pub(crate) fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

pub(crate) struct SinkGuard<'a>(MutexGuard<'a, Sink>);

impl Write for SinkGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SinkGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkGuard(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

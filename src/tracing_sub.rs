use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

/// Env var that overrides the default `term_dock=debug` filter.
pub const LOG_ENV: &str = "TERM_DOCK_LOG";

/// Writes to a shared log file when one is configured, otherwise to stderr.
///
/// While the demo owns the alternate screen, stderr output would corrupt the
/// display, so the binary always passes a file.
pub enum DelegatingWriter {
    File(Arc<Mutex<File>>),
    Stderr(io::Stderr),
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            DelegatingWriter::File(file) => file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .write(buf),
            DelegatingWriter::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            DelegatingWriter::File(file) => file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .flush(),
            DelegatingWriter::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SubscriberMakeWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl SubscriberMakeWriter {
    pub fn to_file(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(Arc::new(Mutex::new(file))),
        })
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match &self.file {
            Some(file) => DelegatingWriter::File(Arc::clone(file)),
            None => DelegatingWriter::Stderr(io::stderr()),
        }
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("term_dock=debug"))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_default() {
    init_with(SubscriberMakeWriter::default());
}

pub fn init_with(writer: SubscriberMakeWriter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_target(false)
        .with_thread_names(false)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn file_writer_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dock.log");
        let make = SubscriberMakeWriter::to_file(&path).unwrap();
        make.make_writer().write_all(b"one\n").unwrap();
        make.make_writer().write_all(b"two\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}

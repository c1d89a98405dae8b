//! Optional protocol log: a line-appending file mirroring every inbound
//! and outbound protocol line, prefixed with a direction tag.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use log::{Level, Metadata, Record};
use parking_lot::Mutex;

struct FileLogger {
    file: Mutex<File>,
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(self.file.lock(), "{}", record.args());
        }
    }

    fn flush(&self) {
        let _ = self.file.lock().flush();
    }
}

/// Install a file logger appending to `path`. Called at most once, before
/// the protocol loop starts.
pub fn init(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let logger: &'static FileLogger = Box::leak(Box::new(FileLogger {
        file: Mutex::new(file),
    }));
    log::set_logger(logger)
        .map_err(|err| io::Error::new(io::ErrorKind::AlreadyExists, err.to_string()))?;
    log::set_max_level(log::LevelFilter::Info);
    Ok(())
}

/// Mirror a line received from the GUI.
pub(crate) fn incoming(line: &str) {
    log::info!(target: "protocol", ">> {line}");
}

/// Mirror a line sent to the GUI.
pub(crate) fn outgoing(line: &str) {
    log::info!(target: "protocol", "<< {line}");
}

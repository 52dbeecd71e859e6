// Goalfinder - Queued Logger
//
// `log` backend for the firmware. Records are formatted on the calling task
// and handed to a bounded queue; the Logger task prints one per tick so that
// console output never stalls the detection or audio loops. A full (or
// abandoned) queue falls back to printing in place.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use log::{LevelFilter, Log, Metadata, Record};

use crate::config::{LOG_MAX_LEVEL, LOG_QUEUE_CAPACITY};

pub struct QueuedLogger {
    queue: SyncSender<String>,
    level: LevelFilter,
}

/// Consumer side of the log queue, owned by the Logger task.
pub struct LogDrain {
    queue: Receiver<String>,
}

/// Create a logger/drain pair without installing it.
pub fn queued(capacity: usize, level: LevelFilter) -> (QueuedLogger, LogDrain) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (QueuedLogger { queue: tx, level }, LogDrain { queue: rx })
}

/// Install the queued logger as the global `log` backend.
pub fn init() -> anyhow::Result<LogDrain> {
    let (logger, drain) = queued(LOG_QUEUE_CAPACITY, LOG_MAX_LEVEL);
    log::set_logger(Box::leak(Box::new(logger)))
        .map_err(|e| anyhow::anyhow!("installing logger: {}", e))?;
    log::set_max_level(LOG_MAX_LEVEL);
    Ok(drain)
}

pub fn format_record(record: &Record) -> String {
    format!("[{}][{}] {}", record.level(), record.target(), record.args())
}

impl Log for QueuedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match self.queue.try_send(format_record(record)) {
            Ok(()) => {}
            Err(TrySendError::Full(line)) | Err(TrySendError::Disconnected(line)) => {
                println!("{}", line);
            }
        }
    }

    fn flush(&self) {}
}

impl LogDrain {
    /// Print the oldest queued record to `out`. Returns `false` when the
    /// queue was empty.
    pub fn drain_one(&self, out: &mut impl Write) -> io::Result<bool> {
        match self.queue.try_recv() {
            Ok(line) => {
                writeln!(out, "{}", line)?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn emit(logger: &QueuedLogger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target("goalfinder::detection")
                .args(format_args!("{}", message))
                .build(),
        );
    }

    #[test]
    fn drains_in_order_one_per_call() {
        let (logger, drain) = queued(4, LevelFilter::Debug);
        emit(&logger, Level::Info, "shot detected");
        emit(&logger, Level::Warn, "miss");

        let mut out = Vec::new();
        assert!(drain.drain_one(&mut out).unwrap());
        assert_eq!(String::from_utf8_lossy(&out), "[INFO][goalfinder::detection] shot detected\n");
        assert!(drain.drain_one(&mut out).unwrap());
        assert!(!drain.drain_one(&mut out).unwrap());
        assert!(String::from_utf8_lossy(&out).ends_with("[WARN][goalfinder::detection] miss\n"));
    }

    #[test]
    fn full_queue_does_not_block() {
        let (logger, drain) = queued(1, LevelFilter::Debug);
        emit(&logger, Level::Info, "first");
        emit(&logger, Level::Info, "printed in place");

        let mut out = Vec::new();
        assert!(drain.drain_one(&mut out).unwrap());
        assert!(!drain.drain_one(&mut out).unwrap());
        assert_eq!(String::from_utf8_lossy(&out), "[INFO][goalfinder::detection] first\n");
    }

    #[test]
    fn filters_below_max_level() {
        let (logger, drain) = queued(4, LevelFilter::Info);
        emit(&logger, Level::Trace, "noise");
        assert!(!drain.drain_one(&mut Vec::new()).unwrap());
    }
}

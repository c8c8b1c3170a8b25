use log::{LevelFilter, Metadata, Record};

/// Where formatted log lines end up; on hardware this is the debug serial
/// port, in tests a capturing closure.
type LogSink = fn(&str);

static mut SINK: Option<LogSink> = None;

// A dummy struct to help us write to the sink using the 'write!' macro
struct SinkWriter;
impl core::fmt::Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        // SAFETY: SINK is written once in init() before any logging happens
        let sink = unsafe { SINK };
        if let Some(sink) = sink {
            sink(s);
        }
        Ok(())
    }
}

// Logger implementation
struct Logger;
static LOGGER: Logger = Logger;

impl log::Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            use core::fmt::Write;
            let _ = write!(SinkWriter, "{}: {}\r\n", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the logger. Call once at startup, before anything logs; records
/// above `level` are dropped at the facade.
pub fn init(sink: LogSink, level: LevelFilter) {
    unsafe {
        SINK = Some(sink);
        let _ = log::set_logger_racy(&LOGGER);
        log::set_max_level_racy(level);
    }
}

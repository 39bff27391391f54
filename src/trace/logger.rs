use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};

use tracing::warn;

use crate::trace::trace::TraceEvent;

/// Appends [`TraceEvent`]s to a JSON-lines file, one line per lifecycle
/// transition.
///
/// Shared through `Rc` by the submissions of one navigator. A file that
/// cannot be opened, or that fails a write, turns the logger into a sink
/// that drops every later event.
pub struct TraceLogger {
    sink: RefCell<Option<LineWriter<File>>>,
    written: Cell<usize>,
}

impl TraceLogger {
    pub fn new(path: &str) -> Self {
        let sink = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(LineWriter::new(file)),
            Err(e) => {
                warn!(path, error = %e, "could not open trace file; tracing disabled");
                None
            }
        };

        Self {
            sink: RefCell::new(sink),
            written: Cell::new(0),
        }
    }

    /// Lines successfully appended so far.
    pub fn lines_written(&self) -> usize {
        self.written.get()
    }

    pub fn log(&self, event: &TraceEvent) {
        let mut sink = self.sink.borrow_mut();
        let Some(writer) = sink.as_mut() else { return };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(submission = %event.submission, error = %e, "failed to serialize trace event");
                return;
            }
        };

        match writeln!(writer, "{}", line) {
            Ok(()) => self.written.set(self.written.get() + 1),
            Err(e) => {
                warn!(error = %e, "trace write failed; tracing disabled");
                *sink = None;
            }
        }
    }
}

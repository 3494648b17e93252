//! Status reporting to an optional console
//!
//! Purely observational. Formatting happens into a fixed buffer and long
//! lines truncate; a reporter can never fail or block the scheduler.

use core::fmt;

use hal_abstractions::Console;

/// Line buffer size. Progress lines are short; anything longer truncates.
const LINE_CAPACITY: usize = 96;

/// Forwards progress lines to a console when enabled, drops them when not.
pub struct StatusReporter<C: Console> {
    console: C,
    enabled: bool,
}

impl<C: Console> StatusReporter<C> {
    pub fn new(console: C, enabled: bool) -> Self {
        Self { console, enabled }
    }

    /// Format and emit one line.
    pub fn line(&mut self, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        let mut buf = Truncating(heapless::String::new());
        let _ = fmt::write(&mut buf, args);
        self.console.write_line(&buf.0);
    }
}

/// `heapless::String` refuses a write that does not fit whole; this keeps
/// the part that does and drops the rest.
struct Truncating(heapless::String<LINE_CAPACITY>);

impl fmt::Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    #[derive(Default)]
    struct RecordingConsole {
        lines: RefCell<Vec<String>>,
    }

    impl Console for RecordingConsole {
        fn write_line(&mut self, line: &str) {
            self.lines.borrow_mut().push(line.into());
        }
    }

    #[test]
    fn forwards_when_enabled() {
        let mut console = RecordingConsole::default();
        let mut reporter = StatusReporter::new(&mut console, true);
        reporter.line(format_args!("attempt {}", 2));
        drop(reporter);
        assert_eq!(console.lines.borrow().as_slice(), ["attempt 2"]);
    }

    #[test]
    fn silent_when_disabled() {
        let mut console = RecordingConsole::default();
        let mut reporter = StatusReporter::new(&mut console, false);
        reporter.line(format_args!("attempt {}", 2));
        drop(reporter);
        assert!(console.lines.borrow().is_empty());
    }

    #[test]
    fn long_lines_truncate_instead_of_failing() {
        let mut console = RecordingConsole::default();
        let mut reporter = StatusReporter::new(&mut console, true);
        let long = "x".repeat(200);
        reporter.line(format_args!("{}", long));
        drop(reporter);
        let lines = console.lines.borrow();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), LINE_CAPACITY);
    }
}

//! Debug console sink
//!
//! Purely observational: consumers of `Console` may drop output on the
//! floor, but they must never block or fail the caller.

/// Line-oriented text sink.
pub trait Console {
    /// Emit one line. Infallible from the caller's point of view.
    fn write_line(&mut self, line: &str);
}

impl<C: Console> Console for &mut C {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line);
    }
}

/// Adapter from any blocking byte writer (UART, RTT, ...) to `Console`.
/// I/O errors are swallowed: a wedged console must not stall the loop.
pub struct WriteConsole<W> {
    inner: W,
}

impl<W: embedded_io::Write> WriteConsole<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: embedded_io::Write> Console for WriteConsole<W> {
    fn write_line(&mut self, line: &str) {
        let _ = self.inner.write_all(line.as_bytes());
        let _ = self.inner.write_all(b"\r\n");
    }
}

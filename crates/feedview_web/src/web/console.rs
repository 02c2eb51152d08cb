use std::io;

use tracing_subscriber::fmt::MakeWriter;

/// Buffers one formatted event and hands it to `console.log` on drop.
pub(super) struct ConsoleWriter(Vec<u8>);

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.0);
        let line = line.trim_end();
        if !line.is_empty() {
            web_sys::console::log_1(&line.into());
        }
    }
}

pub(super) struct Console;

impl<'a> MakeWriter<'a> for Console {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter(Vec::new())
    }
}

/// Routes `tracing` output to the browser console. The wasm clock is not
/// available to the formatter, so events carry no timestamp.
pub(super) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(Console)
        .with_ansi(false)
        .without_time()
        .try_init();
}

//! Per-agent capture of diagnostic output.
//!
//! While a hook runs muted, the executing thread's default `tracing`
//! dispatcher is replaced by a formatter that writes into the agent's buffer.
//! The replacement lives in a [`DefaultGuard`], so it is undone when the guard
//! drops, whichever way the hook exits.

use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::{subscriber::DefaultGuard, Level};
use tracing_subscriber::fmt::MakeWriter;

/// Shared buffer collecting one agent's diagnostic output.
#[derive(Clone, Debug, Default)]
pub struct OutputCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl OutputCapture {
    /// Routes the current thread's diagnostics into this buffer until the
    /// returned guard drops.
    #[must_use]
    pub fn scoped(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Everything captured so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writer handed to the formatter for a single event.
#[derive(Debug)]
pub struct CaptureWriter {
    capture: OutputCapture,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.capture.lock().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for OutputCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            capture: self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_captured_only_while_scoped() {
        let capture = OutputCapture::default();
        {
            let _guard = capture.scoped();
            tracing::info!(depth = 3, "expanding search");
        }
        tracing::info!("after the guard");

        let text = capture.contents();
        assert!(text.contains("expanding search"));
        assert!(text.contains("depth=3"));
        assert!(!text.contains("after the guard"));
    }

    #[test]
    fn guard_is_released_when_the_scope_panics() {
        let capture = OutputCapture::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = capture.scoped();
            tracing::warn!("before panic");
            panic!("agent bug");
        }));
        assert!(result.is_err());
        tracing::warn!("outside");
        let text = capture.contents();
        assert!(text.contains("before panic"));
        assert!(!text.contains("outside"));
    }
}

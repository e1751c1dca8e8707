//! Wire-level diagnostic echoes
//!
//! Clients can be given a [`DiagnosticSink`] at construction. It receives the
//! serialized request bodies, raw response bodies and resolved query strings.
//! Sinks are observers only: nothing they do changes the outcome of a request.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Receiver of diagnostic strings
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic line
    fn emit(&self, label: &str, message: &str);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _label: &str, _message: &str) {}
}

/// Sink forwarding to `tracing` at debug level under the `apiai::wire` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, label: &str, message: &str) {
        debug!(target: "apiai::wire", label, "{message}");
    }
}

/// Shared handle to the sink configured on a client
#[derive(Clone)]
pub(crate) struct Diagnostics(Arc<dyn DiagnosticSink>);

impl Diagnostics {
    pub(crate) fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self(sink)
    }

    pub(crate) fn emit(&self, label: &str, message: &str) {
        self.0.emit(label, message);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self(Arc::new(NoopSink))
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Diagnostics")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Sink that remembers everything, for assertions
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub(crate) lines: Mutex<Vec<(String, String)>>,
    }

    impl DiagnosticSink for RecordingSink {
        fn emit(&self, label: &str, message: &str) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push((label.to_string(), message.to_string()));
            }
        }
    }

    #[test]
    fn default_diagnostics_discard_output() {
        Diagnostics::default().emit("label", "message");
    }

    #[test]
    fn diagnostics_forward_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let diagnostics = Diagnostics::new(sink.clone());

        diagnostics.emit("request body", "{}");

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.as_slice(), &[("request body".to_string(), "{}".to_string())]);
    }
}

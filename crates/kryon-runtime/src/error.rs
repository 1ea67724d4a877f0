// crates/kryon-runtime/src/error.rs
//
// Frame-layer errors (§7), distinct from `kryon_core::KryonError` (which
// covers only the KRB loader). Loader errors abort the load; everything
// here is recoverable per-frame except `BackendSurfaceLost`, which only
// aborts the current frame.

use kryon_render::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Container(#[from] kryon_core::KryonError),

    #[error("out of resource: {0}")]
    OutOfResource(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("render backend surface lost")]
    BackendSurfaceLost,

    #[error("directive misuse: {0}")]
    DirectiveMisuse(String),
}

impl From<RenderError> for RuntimeError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::SurfaceLost => RuntimeError::BackendSurfaceLost,
            RenderError::Fatal(msg) => RuntimeError::OutOfResource(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// A single drained error entry. Sequence-numbered rather than
/// timestamped: the runtime never reads the wall clock (it would break
/// workflow-style replay of the update loop).
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoggedError {
    pub sequence: u64,
    pub message: String,
}

/// A bounded, drainable error log (§7). Callers may `drain` and `clear`
/// it; the runtime never panics on a recoverable fault, it logs here and
/// (additionally) emits a `tracing` event so a host with its own
/// subscriber sees it too.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Vec<LoggedError>,
    next_sequence: u64,
    capacity: usize,
}

const DEFAULT_CAPACITY: usize = 256;

impl ErrorLog {
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_sequence: 0, capacity: DEFAULT_CAPACITY }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "runtime error logged");
        if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(LoggedError { sequence: self.next_sequence, message });
        self.next_sequence += 1;
    }

    pub fn drain(&mut self) -> Vec<LoggedError> {
        std::mem::take(&mut self.entries)
    }

    pub fn entries(&self) -> &[LoggedError] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_bounds_capacity_by_dropping_oldest() {
        let mut log = ErrorLog { capacity: 2, ..ErrorLog::new() };
        log.push("a");
        log.push("b");
        log.push("c");
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[0].message, "b");
    }

    #[test]
    fn drain_empties_and_clear_is_idempotent() {
        let mut log = ErrorLog::new();
        log.push("oops");
        let drained = log.drain();
        assert_eq!(drained.len(), 1);
        assert!(log.is_empty());
        log.clear();
        assert!(log.is_empty());
    }
}

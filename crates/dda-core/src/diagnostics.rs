//! Explicit, construction-time logger handle: an alternative to a global
//! conditional logger, passed into each component at construction, whose
//! enabled flag is process-wide state toggled once at startup (the `-l`
//! CLI flag) and never again. `Logger` wraps `tracing` so diagnostic
//! chatter and the request's output sink never mix.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    enabled: bool,
}

impl Logger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Diagnostic chatter, gated by the `-l` flag.
    pub fn diag(&self, message: impl std::fmt::Display) {
        if self.enabled {
            tracing::info!("{}", message);
        }
    }

    /// State-transition / warning-level diagnostics, gated by the `-l` flag.
    pub fn warn(&self, message: impl std::fmt::Display) {
        if self.enabled {
            tracing::warn!("{}", message);
        }
    }

    /// Always emitted, regardless of the flag — fatal/unexpected conditions.
    pub fn error(&self, message: impl std::fmt::Display) {
        tracing::error!("{}", message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

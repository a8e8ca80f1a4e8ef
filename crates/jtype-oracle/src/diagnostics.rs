use jtype_types::{Diagnostic, Severity};

/// Receiver of build diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Forwards every diagnostic to `tracing` before handing it on.
pub struct TracingSink<S> {
    inner: S,
    default_location: Option<String>,
}

impl<S: DiagnosticSink> TracingSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            default_location: None,
        }
    }

    /// Attaches `location` to diagnostics that do not carry one.
    pub(crate) fn set_location(&mut self, location: Option<String>) {
        self.default_location = location;
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DiagnosticSink> DiagnosticSink for TracingSink<S> {
    fn report(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.location.is_none() {
            diagnostic.location = self.default_location.clone();
        }
        let location = diagnostic.location.as_deref().unwrap_or("");
        let cause = diagnostic.cause.as_deref().unwrap_or("");
        match diagnostic.severity {
            Severity::Error => tracing::error!(
                target: "jtype::oracle",
                code = diagnostic.code,
                location,
                cause,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => tracing::warn!(
                target: "jtype::oracle",
                code = diagnostic.code,
                location,
                cause,
                "{}",
                diagnostic.message
            ),
            Severity::Info => tracing::info!(
                target: "jtype::oracle",
                code = diagnostic.code,
                location,
                "{}",
                diagnostic.message
            ),
            Severity::Debug => tracing::debug!(
                target: "jtype::oracle",
                code = diagnostic.code,
                location,
                "{}",
                diagnostic.message
            ),
        }
        self.inner.report(diagnostic);
    }
}

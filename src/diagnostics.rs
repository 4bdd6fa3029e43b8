//! Structured, injectable diagnostics.
//!
//! Registration keeps going when a module redefines an existing getter,
//! mutation or action type; the collision is reported here instead of
//! failing the registration. The sink is injectable so the transform layer
//! stays pure and tests can assert on structured records rather than on
//! log output.

use std::sync::Mutex;

use serde::Serialize;

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DuplicateGetter,
    DuplicateMutation,
    DuplicateAction,
    DuplicateModule,
    DeprecatedOption,
}

/// A single warning emitted during registration or commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Sink for non-fatal store diagnostics.
pub trait Diagnostics: Send + Sync {
    fn warn(&self, diagnostic: Diagnostic);
}

/// Default sink: forwards every record to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, diagnostic: Diagnostic) {
        tracing::warn!(kind = ?diagnostic.kind, "{}", diagnostic.detail);
    }
}

/// Collecting sink; useful for asserting on diagnostics in tests.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    records: Mutex<Vec<Diagnostic>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record warned so far.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.lock().unwrap().clone()
    }

    /// Whether any record of the given kind has been warned.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.records.lock().unwrap().iter().any(|d| d.kind == kind)
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn warn(&self, diagnostic: Diagnostic) {
        self.records.lock().unwrap().push(diagnostic);
    }
}

//! Human-readable diagnostics written while a run progresses.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::config::SEED_VAR;

const RULE: &str = "==============================================================";

/// Destination for diagnostic lines
pub trait DiagnosticSink {
    /// Write one line of text
    fn emit(&mut self, line: &str);
}

/// Writes diagnostics to standard error
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&mut self, line: &str) {
        eprintln!("{}", line);
    }
}

/// Discards diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _line: &str) {}
}

/// Collects diagnostics in memory.
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to the run.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line emitted so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// All lines joined with newlines
    pub fn contents(&self) -> String {
        self.lines.borrow().join("\n")
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn emit(&mut self, line: &str) {
        (**self).emit(line);
    }
}

/// Everything printed about a failed property
pub(crate) struct FailureReport<'a, T, E> {
    pub iteration: usize,
    pub seed: u64,
    pub error: &'a E,
    pub original: &'a T,
    pub minimal: &'a T,
    pub shrink_steps: usize,
    pub shrink_attempts: usize,
}

impl<T: fmt::Debug, E: fmt::Display> FailureReport<'_, T, E> {
    pub fn write_to(&self, sink: &mut dyn DiagnosticSink) {
        sink.emit(RULE);
        sink.emit("PROPERTY FAILED");
        sink.emit(RULE);
        sink.emit(&format!("failed on run {}", self.iteration));
        sink.emit(&format!("error: {}", self.error));
        sink.emit(&format!("seed: {}", self.seed));
        sink.emit(&format!("original input: {:?}", self.original));
        sink.emit(&format!(
            "shrunk in {} steps ({} attempts)",
            self.shrink_steps, self.shrink_attempts
        ));
        sink.emit(&format!("minimal input: {:?}", self.minimal));
        write_rerun(sink, self.seed);
        sink.emit(RULE);
    }
}

/// Everything printed when generation itself fails
pub(crate) fn write_generation_failure(
    sink: &mut dyn DiagnosticSink,
    iteration: usize,
    seed: u64,
    error: &dyn fmt::Display,
) {
    sink.emit(RULE);
    sink.emit("GENERATION FAILED");
    sink.emit(RULE);
    sink.emit(&format!("failed on run {}", iteration));
    sink.emit(&format!("error: {}", error));
    sink.emit(&format!("seed: {}", seed));
    write_rerun(sink, seed);
    sink.emit(RULE);
}

fn write_rerun(sink: &mut dyn DiagnosticSink, seed: u64) {
    sink.emit(&format!(
        "re-run with: RunOptions::default().seed({}) or {}={}",
        seed, SEED_VAR, seed
    ));
}

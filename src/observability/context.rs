//! Thread-local context tracking for crash reports.
//!
//! Each rayon worker carries its own context (phase and file), and global
//! atomic counters track overall progress. Guards restore the previous
//! context on drop.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

static FILES_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static FILES_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<AnalysisContext> = const { RefCell::new(AnalysisContext::new()) };
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisContext {
    pub phase: Option<AnalysisPhase>,
    /// Relative path of the file being processed
    pub current_file: Option<String>,
}

impl AnalysisContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    FileDiscovery,
    Extraction,
    GraphBuilding,
    Aggregation,
    OutputGeneration,
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FileDiscovery => "file_discovery",
            Self::Extraction => "extraction",
            Self::GraphBuilding => "graph_building",
            Self::Aggregation => "aggregation",
            Self::OutputGeneration => "output_generation",
        };
        f.write_str(name)
    }
}

/// Restores the previous context when dropped.
#[must_use = "the context is restored as soon as the guard is dropped"]
pub struct ContextGuard {
    previous: AnalysisContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        CURRENT_CONTEXT.with(|ctx| *ctx.borrow_mut() = previous);
    }
}

fn update(change: impl FnOnce(&mut AnalysisContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        change(&mut *ctx.borrow_mut());
        ContextGuard { previous }
    })
}

pub fn set_phase(phase: AnalysisPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

pub fn set_current_file(relative_path: impl Into<String>) -> ContextGuard {
    let relative_path = relative_path.into();
    update(|ctx| ctx.current_file = Some(relative_path))
}

#[must_use]
pub fn get_current_context() -> AnalysisContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

pub fn set_progress(processed: usize, total: usize) {
    FILES_PROCESSED.store(processed, Ordering::Relaxed);
    FILES_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    FILES_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

/// (processed, total)
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        FILES_PROCESSED.load(Ordering::Relaxed),
        FILES_TOTAL.load(Ordering::Relaxed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_guard_restores_previous() {
        let _outer = set_phase(AnalysisPhase::Extraction);
        {
            let _inner = set_phase(AnalysisPhase::GraphBuilding);
            let _file = set_current_file("src/app.tsx");
            let ctx = get_current_context();
            assert_eq!(ctx.phase, Some(AnalysisPhase::GraphBuilding));
            assert_eq!(ctx.current_file.as_deref(), Some("src/app.tsx"));
        }
        let ctx = get_current_context();
        assert_eq!(ctx.phase, Some(AnalysisPhase::Extraction));
        assert!(ctx.current_file.is_none());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(AnalysisPhase::FileDiscovery.to_string(), "file_discovery");
        assert_eq!(AnalysisPhase::OutputGeneration.to_string(), "output_generation");
    }
}

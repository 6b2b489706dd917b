//! Thread-local context tracking for crash reports.
//!
//! The injection pipeline is strictly sequential, so a single thread-local
//! slot records which state it is in, which project it works on and which
//! symbol is being invoked. Guards restore the previous context on drop.

use std::cell::RefCell;
use std::path::PathBuf;

thread_local! {
    static CURRENT_CONTEXT: RefCell<InjectContext> = const { RefCell::new(InjectContext::new()) };
}

/// Snapshot of what gyv was doing.
#[derive(Debug, Clone, Default)]
pub struct InjectContext {
    pub phase: Option<InjectPhase>,
    /// Target project directory
    pub project: Option<PathBuf>,
    /// Injected symbol being resolved or invoked
    pub symbol: Option<String>,
}

impl InjectContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            project: None,
            symbol: None,
        }
    }
}

/// States of the injection pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InjectPhase {
    Created,
    ManifestValidated,
    VersionChecked,
    CallSiteResolved,
    TemplateRendered,
    TempFileWritten,
    DependenciesEnsured,
    Built,
    Cleanup,
    Loaded,
    SymbolResolved,
    /// The resolved symbol is running in the project
    Invoking,
}

impl std::fmt::Display for InjectPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::ManifestValidated => "manifest_validated",
            Self::VersionChecked => "version_checked",
            Self::CallSiteResolved => "call_site_resolved",
            Self::TemplateRendered => "template_rendered",
            Self::TempFileWritten => "temp_file_written",
            Self::DependenciesEnsured => "dependencies_ensured",
            Self::Built => "built",
            Self::Cleanup => "cleanup",
            Self::Loaded => "loaded",
            Self::SymbolResolved => "symbol_resolved",
            Self::Invoking => "invoking",
        };
        f.write_str(name)
    }
}

/// Restores the previous context on drop.
pub struct ContextGuard {
    previous: InjectContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(apply: impl FnOnce(&mut InjectContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut *ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Enter `phase` until the guard drops.
#[must_use]
pub fn set_phase(phase: InjectPhase) -> ContextGuard {
    log::debug!("Entering phase {phase}");
    update(|ctx| ctx.phase = Some(phase))
}

/// Move to `phase` without restoring the previous one. Used for the
/// transitions inside a single pipeline run.
pub fn advance_phase(phase: InjectPhase) {
    log::debug!("Entering phase {phase}");
    CURRENT_CONTEXT.with(|ctx| ctx.borrow_mut().phase = Some(phase));
}

#[must_use]
pub fn set_project(directory: impl Into<PathBuf>) -> ContextGuard {
    let directory = directory.into();
    update(|ctx| ctx.project = Some(directory))
}

#[must_use]
pub fn set_symbol(name: impl Into<String>) -> ContextGuard {
    let name = name.into();
    update(|ctx| ctx.symbol = Some(name))
}

#[must_use]
pub fn get_current_context() -> InjectContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

pub fn reset_context() {
    CURRENT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = InjectContext::new();
    });
}

//! Crash reporting and pipeline context tracking.
//!
//! ```ignore
//! use gyv::observability::{install_panic_hook, set_phase, InjectPhase};
//!
//! fn main() {
//!     install_panic_hook();
//!     let _phase = set_phase(InjectPhase::Created);
//!     // a panic here reports the phase
//! }
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    advance_phase, get_current_context, set_phase, set_project, set_symbol, ContextGuard,
    InjectContext, InjectPhase,
};
pub use panic_hook::install_panic_hook;

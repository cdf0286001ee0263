//! Error kinds for the synthesizer, grounded on `satgalaxy`'s `errors::parser::ParserError`
//! pattern (one `thiserror` enum per failure family) and on spec §7.

mod qdimacs;

pub use qdimacs::QdimacsError;

use thiserror::Error;

/// Top-level error returned by anything that can fail at load time or at
/// configuration time. Per spec §7, these are the only *recoverable*
/// error paths in the system: everything else either succeeds (producing
/// `W`/`¬W`) or reports `realizability = false`, which is a result, not an
/// error, or aborts the process via [`invariant!`](crate::invariant).
#[derive(Debug, Error)]
pub enum DemiurgeError {
    /// Malformed AIGER, malformed DIMACS/QDIMACS, or a missing input file.
    #[error("input error: {0}")]
    Input(String),

    #[error("input error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input error: {0}")]
    Qdimacs(#[from] QdimacsError),

    /// Unknown back-end, solver, or extractor name supplied on the CLI.
    #[error("configuration error: {0}")]
    Config(String),

    /// External solver binary missing, a nonzero/unknown exit code, or a
    /// timeout. May be caught by an orchestrator that tries an alternative
    /// solver; otherwise fatal for the current query.
    #[error("solver unavailable: {0}")]
    SolverUnavailable(String),

    /// A post-hoc cross-check between a preprocessor and a reference
    /// solver disagreed. Treated as a solver bug: logged with the
    /// offending QDIMACS dumped, and aborted (debug builds only).
    #[error("solver inconsistency: {0}")]
    SolverInconsistency(String),
}

/// Panics with a formatted message, used for the *InternalInvariantViolation*
/// error kind of spec §7: a cube expected to be UNSAT turned out SAT, a
/// clause expected to be a subset of another was not, frame monotonicity was
/// broken, etc. These are bugs, not recoverable errors, so the core never
/// propagates them as `Result`.
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            panic!("internal invariant violated: {}", format!($($arg)+));
        }
    };
}

pub type Result<T> = std::result::Result<T, DemiurgeError>;

//! Error types for the epilogue entry point.

use simt_epilogue_types::OutputLayout;
use thiserror::Error;

/// Errors reported when binding an epilogue invocation to its inputs.
///
/// These cover configuration mismatches only; within a validated pass the
/// pipeline has no runtime error path (boundary handling is predicated,
/// not reported).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EpilogueError {
    /// Inconsistent shape or layout configuration.
    #[error("invalid epilogue configuration: {0}")]
    Config(&'static str),

    /// Wrong number of warp accumulator sets for the configuration.
    #[error("expected {expected} warp accumulator sets, got {actual}")]
    WarpCountMismatch {
        /// Warps the configuration calls for, split-K replicas included.
        expected: usize,
        /// Warps supplied by the caller.
        actual: usize,
    },

    /// A warp's accumulator tiles were shaped by a different policy.
    #[error("warp accumulator policy does not match the epilogue configuration")]
    PolicyMismatch,

    /// Destination tensor layout differs from the configured layout.
    #[error("destination layout {actual:?} does not match configured layout {expected:?}")]
    LayoutMismatch {
        /// Layout the epilogue was configured for.
        expected: OutputLayout,
        /// Layout of the supplied destination view.
        actual: OutputLayout,
    },
}

/// Result type for epilogue operations.
pub type Result<T> = std::result::Result<T, EpilogueError>;

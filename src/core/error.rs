use std::fmt;

use thiserror::Error;

/// A capability this crate never provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    MultiProcAnalysis,
    Gradients,
    Hessians,
    DeferredEvaluation,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::MultiProcAnalysis => "multiprocessor analyses",
            Capability::Gradients => "analytic gradients",
            Capability::Hessians => "analytic Hessians",
            Capability::DeferredEvaluation => "asynchronous (deferred) evaluation",
        };
        f.write_str(s)
    }
}

/// Fatal error classes surfaced by a run.
///
/// A halt requested by the host is not an error and never appears here;
/// it travels as the `Halted` variant of the evaluation and run outcomes.
#[derive(Debug, Error)]
pub enum RunError {
    /// Bad options, label/index validation, driver mismatch, or failure
    /// to wire the bridge into the engine.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The engine asked for something this bridge never does.
    #[error("{0} not supported")]
    Unsupported(Capability),

    /// The host returned a different number of responses than declared.
    #[error("mismatch in the number of responses: declared {declared}, returned {returned}")]
    ResponseMismatch { declared: usize, returned: usize },

    /// The host reported success but handed back no values.
    #[error("evaluator returned no results")]
    EmptyEvaluation,

    /// The host reported a failure of its own.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// The run finished without a single mapped evaluation.
    #[error("algorithm returned no results")]
    NoResults,

    /// Any other engine failure raised while the run was not halted.
    #[error("engine failure: {0}")]
    Engine(String),
}

use std::path::Path;

use thiserror::Error;

use crate::core::domain::{RequestFlags, RunOptions};
use crate::core::error::{Capability, RunError};

pub mod bridge;
pub mod mapping;

/// Analysis driver identifier this crate's backend answers to.
pub const DRIVER_NAME: &str = "optbridge";

// --- Evaluation Request Types ---

/// Borrowed view of the engine's per-class variable storage for one
/// evaluation. Label slices run parallel to the value slices.
#[derive(Debug, Clone, Copy)]
pub struct VariableView<'a> {
    pub continuous: &'a [f64],
    pub continuous_labels: &'a [String],
    pub discrete_int: &'a [i64],
    pub discrete_int_labels: &'a [String],
    pub discrete_real: &'a [f64],
    pub discrete_real_labels: &'a [String],
}

impl VariableView<'_> {
    /// Total number of design variables across all classes.
    pub fn len(&self) -> usize {
        self.continuous.len() + self.discrete_int.len() + self.discrete_real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One evaluation request from the engine to its backend.
#[derive(Debug)]
pub struct EvaluationRequest<'a> {
    /// Analysis driver the engine resolved for this evaluation.
    pub driver: &'a str,
    /// Set when the engine partitioned the analysis across processes.
    pub multiproc: bool,
    /// Current variable storage.
    pub variables: VariableView<'a>,
    /// Per-response request flags; the length is the declared response count.
    pub asv: &'a [RequestFlags],
}

/// Classified result of one evaluation.
#[derive(Debug)]
pub enum EvaluationOutcome {
    /// Response values, one slot per declared output. Slots whose value
    /// bit was not set are left at zero and ignored by the engine.
    Values(Vec<f64>),
    /// The host asked for a controlled stop.
    Halted,
    /// The evaluation, and with it the run, is lost.
    Failed(RunError),
}

/// What a backend can actually compute, declared up front so an engine
/// can refuse a misconfigured study at registration time.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendCapabilities {
    pub function_values: bool,
    pub gradients: bool,
    pub hessians: bool,
    pub deferred: bool,
}

/// Backend the engine calls for every evaluation.
pub trait EvaluationBackend {
    /// Evaluates one design point synchronously.
    fn evaluate(&mut self, request: EvaluationRequest<'_>) -> EvaluationOutcome;

    /// Declared capabilities of this backend.
    fn capabilities(&self) -> BackendCapabilities;

    /// Entry point for engines that schedule a deferred evaluation
    /// queue. Synchronous backends fail here.
    fn evaluate_deferred(&mut self) -> Result<(), RunError> {
        Err(RunError::Unsupported(Capability::DeferredEvaluation))
    }
}

// --- Engine Seam ---

/// Registration coordinates for an evaluation backend. An empty model
/// string matches any model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSlot {
    pub model: String,
    pub interface: String,
    pub driver: String,
}

impl BackendSlot {
    /// The direct-interface slot this crate plugs into.
    pub fn direct(driver: &str) -> Self {
        Self {
            model: String::new(),
            interface: "direct".to_string(),
            driver: driver.to_string(),
        }
    }
}

/// Options handed to the engine at construction. Paths are already
/// normalized to forward-slash form, which the engine requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub input_file: String,
    pub output_file: Option<String>,
    pub error_file: Option<String>,
    pub write_restart_file: Option<String>,
    pub read_restart_file: Option<String>,
    /// Raise failures instead of aborting the process.
    pub raise_on_error: bool,
    /// Echo the input file into the log.
    pub echo_input: bool,
}

impl EngineOptions {
    /// Normalizes caller-facing run options into engine form.
    pub fn from_run_options(options: &RunOptions) -> Result<Self, RunError> {
        if options.input_file.as_os_str().is_empty() {
            return Err(RunError::Configuration("input file is required".to_string()));
        }
        Ok(Self {
            input_file: engine_path(&options.input_file),
            output_file: options.log_file.as_deref().map(engine_path),
            error_file: options.error_file.as_deref().map(engine_path),
            write_restart_file: options.write_restart_file.as_deref().map(engine_path),
            read_restart_file: options.read_restart_file.as_deref().map(engine_path),
            raise_on_error: true,
            echo_input: false,
        })
    }
}

/// The engine accepts forward slashes only, on every platform.
fn engine_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Failure raised by the engine during execution.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct EngineFailure(pub String);

/// Final per-class variable values read back after execution.
#[derive(Debug, Clone, Default)]
pub struct FinalVariables {
    pub continuous: Vec<f64>,
    pub discrete_int: Vec<i64>,
    pub discrete_real: Vec<f64>,
}

/// The optimization engine proper, wrapped behind a seam so the
/// orchestrator never depends on a concrete engine.
pub trait Engine {
    /// Registers `backend` as the sole evaluation backend for `slot`.
    /// Returns false when the engine has no matching interface.
    fn plugin_backend(&mut self, slot: &BackendSlot, backend: Box<dyn EvaluationBackend>) -> bool;

    /// Runs the configured strategy to completion. The engine calls back
    /// into the registered backend zero or more times.
    fn execute(&mut self) -> Result<(), EngineFailure>;

    /// Final variable values per storage class. Valid after `execute`.
    fn variables_results(&self) -> FinalVariables;

    /// Final response values in declaration order. Valid after `execute`.
    fn response_results(&self) -> Vec<f64>;
}

/// Builds a concrete engine from normalized options.
pub trait EngineFactory {
    type Engine: Engine;

    fn create(&self, options: EngineOptions) -> Result<Self::Engine, RunError>;
}

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::RunError;

// --- Variable Types ---

/// Storage class of a design variable inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableClass {
    Continuous,
    DiscreteInteger,
    DiscreteReal,
}

/// A design variable in its native representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VariableValue {
    Continuous(f64),
    DiscreteInt(i64),
    DiscreteReal(f64),
}

impl VariableValue {
    pub fn class(&self) -> VariableClass {
        match self {
            VariableValue::Continuous(_) => VariableClass::Continuous,
            VariableValue::DiscreteInt(_) => VariableClass::DiscreteInteger,
            VariableValue::DiscreteReal(_) => VariableClass::DiscreteReal,
        }
    }
}

// --- Request Flags ---

/// Per-response request bits from the engine's active-set vector:
/// 1 = function value, 2 = gradient, 4 = Hessian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags(u8);

impl RequestFlags {
    pub const VALUE: u8 = 1;
    pub const GRADIENT: u8 = 2;
    pub const HESSIAN: u8 = 4;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Function value only, the common case.
    pub fn value_only() -> Self {
        Self(Self::VALUE)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn wants_value(&self) -> bool {
        self.0 & Self::VALUE != 0
    }

    #[inline]
    pub fn wants_gradient(&self) -> bool {
        self.0 & Self::GRADIENT != 0
    }

    #[inline]
    pub fn wants_hessian(&self) -> bool {
        self.0 & Self::HESSIAN != 0
    }
}

// --- Run Configuration ---

/// Paths and switches for a single engine run.
/// Optional paths left as `None` fall back to the engine defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOptions {
    /// Engine input (problem definition) file. Required.
    pub input_file: PathBuf,
    /// Restart file to be written during the run.
    #[serde(default)]
    pub write_restart_file: Option<PathBuf>,
    /// Restart file to resume from.
    #[serde(default)]
    pub read_restart_file: Option<PathBuf>,
    /// Engine log output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Engine error output.
    #[serde(default)]
    pub error_file: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(input_file: impl Into<PathBuf>) -> Self {
        Self {
            input_file: input_file.into(),
            ..Default::default()
        }
    }

    /// Loads run options from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, RunError> {
        let data = fs::read_to_string(path).map_err(|e| {
            RunError::Configuration(format!("cannot read options file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            RunError::Configuration(format!("malformed options file {}: {}", path.display(), e))
        })
    }
}

// --- Results ---

/// The best design found by a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestDesign {
    /// Variable values in flat order, each in its native representation.
    pub variables: Vec<VariableValue>,
    /// Response values in declaration order.
    pub responses: Vec<f64>,
}

/// Caller-visible terminal state of a run.
/// Failures travel separately as `Err(RunError)`.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The engine finished and delivered a best design.
    Complete(BestDesign),
    /// The host asked for a controlled stop. Not an error.
    Halted,
}

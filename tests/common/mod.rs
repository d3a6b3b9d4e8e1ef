#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::Result;

use optbridge::core::domain::{BestDesign, RequestFlags};
use optbridge::core::error::RunError;
use optbridge::engine::{
    BackendSlot, Engine, EngineFactory, EngineFailure, EngineOptions, EvaluationBackend,
    EvaluationOutcome, EvaluationRequest, FinalVariables, VariableView, DRIVER_NAME,
};
use optbridge::host::{DesignHost, DesignReply};

// --- Mock Host ---

type ReplyFn = Box<dyn Fn(usize, &[f64]) -> Result<DesignReply> + Send + Sync>;

/// Stand-in for the external algorithm host. Records every design point
/// it sees and the delivered best design.
pub struct MockHost {
    reply: ReplyFn,
    pub points: Mutex<Vec<Vec<f64>>>,
    pub best: Mutex<Option<BestDesign>>,
}

impl MockHost {
    /// `reply` receives the zero-based call number and the design point.
    pub fn with(reply: impl Fn(usize, &[f64]) -> Result<DesignReply> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            points: Mutex::new(Vec::new()),
            best: Mutex::new(None),
        }
    }

    /// Replies with the same response values on every call.
    pub fn returning(values: Vec<f64>) -> Self {
        Self::with(move |_, _| Ok(DesignReply::Responses(values.clone())))
    }

    /// Asks for a halt on every call.
    pub fn halting() -> Self {
        Self::with(|_, _| Ok(DesignReply::Halt))
    }

    pub fn calls(&self) -> usize {
        self.points.lock().unwrap().len()
    }
}

impl DesignHost for MockHost {
    fn evaluate_design(&self, point: &[f64]) -> Result<DesignReply> {
        let mut points = self.points.lock().unwrap();
        let call = points.len();
        points.push(point.to_vec());
        drop(points);
        (self.reply)(call, point)
    }

    fn update_best_design(&self, best: &BestDesign) {
        *self.best.lock().unwrap() = Some(best.clone());
    }
}

// --- Scripted Engine ---

/// One evaluation the scripted engine will ask its backend for.
#[derive(Debug, Clone)]
pub struct ScriptedEval {
    pub driver: String,
    pub multiproc: bool,
    pub continuous: Vec<f64>,
    pub continuous_labels: Vec<String>,
    pub discrete_int: Vec<i64>,
    pub discrete_int_labels: Vec<String>,
    pub discrete_real: Vec<f64>,
    pub discrete_real_labels: Vec<String>,
    pub asv: Vec<RequestFlags>,
}

impl Default for ScriptedEval {
    fn default() -> Self {
        Self {
            driver: DRIVER_NAME.to_string(),
            multiproc: false,
            continuous: Vec::new(),
            continuous_labels: Vec::new(),
            discrete_int: Vec::new(),
            discrete_int_labels: Vec::new(),
            discrete_real: Vec::new(),
            discrete_real_labels: Vec::new(),
            asv: vec![RequestFlags::value_only()],
        }
    }
}

impl ScriptedEval {
    /// The three-variable layout used across the tests:
    /// labels x2, x0 -> continuous, x1 -> discrete integer.
    pub fn scrambled() -> Self {
        Self {
            continuous: vec![10.0, 20.0],
            continuous_labels: vec!["x2".to_string(), "x0".to_string()],
            discrete_int: vec![5],
            discrete_int_labels: vec!["x1".to_string()],
            ..Default::default()
        }
    }

    pub fn with_outputs(mut self, count: usize) -> Self {
        self.asv = vec![RequestFlags::value_only(); count];
        self
    }

    pub fn view(&self) -> VariableView<'_> {
        VariableView {
            continuous: &self.continuous,
            continuous_labels: &self.continuous_labels,
            discrete_int: &self.discrete_int,
            discrete_int_labels: &self.discrete_int_labels,
            discrete_real: &self.discrete_real,
            discrete_real_labels: &self.discrete_real_labels,
        }
    }

    pub fn request(&self) -> EvaluationRequest<'_> {
        EvaluationRequest {
            driver: &self.driver,
            multiproc: self.multiproc,
            variables: self.view(),
            asv: &self.asv,
        }
    }
}

/// Minimal engine stand-in: plays a fixed list of evaluations against
/// the registered backend and keeps the final state for reading back.
pub struct ScriptedEngine {
    evals: Vec<ScriptedEval>,
    finals: FinalVariables,
    backend: Option<Box<dyn EvaluationBackend>>,
    responses: Vec<f64>,
    /// Refuse backend registration, to exercise the plug-in failure path.
    pub reject_backend: bool,
    /// Treat a halt as an ordinary end of execution instead of raising.
    pub swallow_halt: bool,
}

impl ScriptedEngine {
    pub fn new(evals: Vec<ScriptedEval>, finals: FinalVariables) -> Self {
        Self {
            evals,
            finals,
            backend: None,
            responses: Vec::new(),
            reject_backend: false,
            swallow_halt: false,
        }
    }
}

impl Engine for ScriptedEngine {
    fn plugin_backend(&mut self, _slot: &BackendSlot, backend: Box<dyn EvaluationBackend>) -> bool {
        if self.reject_backend {
            return false;
        }
        self.backend = Some(backend);
        true
    }

    fn execute(&mut self) -> Result<(), EngineFailure> {
        let mut backend = self
            .backend
            .take()
            .ok_or_else(|| EngineFailure("no backend registered".to_string()))?;

        let mut result = Ok(());
        for eval in &self.evals {
            match backend.evaluate(eval.request()) {
                EvaluationOutcome::Values(values) => self.responses = values,
                EvaluationOutcome::Halted => {
                    if !self.swallow_halt {
                        result = Err(EngineFailure("evaluation halted".to_string()));
                    }
                    break;
                }
                EvaluationOutcome::Failed(e) => {
                    result = Err(EngineFailure(e.to_string()));
                    break;
                }
            }
        }

        self.backend = Some(backend);
        result
    }

    fn variables_results(&self) -> FinalVariables {
        self.finals.clone()
    }

    fn response_results(&self) -> Vec<f64> {
        self.responses.clone()
    }
}

/// Factory handing out one prepared engine, recording the options it was
/// created with.
pub struct ScriptedFactory {
    engine: Mutex<Option<ScriptedEngine>>,
    pub options: Mutex<Option<EngineOptions>>,
}

impl ScriptedFactory {
    pub fn new(engine: ScriptedEngine) -> Self {
        Self {
            engine: Mutex::new(Some(engine)),
            options: Mutex::new(None),
        }
    }
}

impl EngineFactory for ScriptedFactory {
    type Engine = ScriptedEngine;

    fn create(&self, options: EngineOptions) -> Result<ScriptedEngine, RunError> {
        *self.options.lock().unwrap() = Some(options);
        self.engine
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| RunError::Configuration("factory already used".to_string()))
    }
}

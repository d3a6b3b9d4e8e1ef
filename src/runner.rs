use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use log::{info, warn};
use uuid::Uuid;

use crate::core::domain::{BestDesign, RunOptions, RunOutcome, VariableClass, VariableValue};
use crate::core::error::RunError;
use crate::engine::bridge::DirectBridge;
use crate::engine::mapping::{MappingEntry, VariableMapping};
use crate::engine::{
    BackendSlot, Engine, EngineFactory, EngineOptions, FinalVariables, DRIVER_NAME,
};
use crate::host::DesignHost;

// --- Run Context ---

/// Shared per-run state between the orchestrator and the bridge.
///
/// One context per run: the halt flag is set at most once and never
/// reset, and the mapping lock is written at most once. Instances are
/// never reused across runs, so concurrent runs in one process cannot
/// interfere.
#[derive(Debug)]
pub struct RunContext {
    run_id: Uuid,
    halted: AtomicBool,
    mapping: OnceLock<VariableMapping>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            halted: AtomicBool::new(false),
            mapping: OnceLock::new(),
        }
    }

    /// Identifier correlating log lines of one run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Records that the host asked for a controlled stop.
    pub fn signal_halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// The run-wide variable mapping, once built.
    pub fn mapping(&self) -> Option<&VariableMapping> {
        self.mapping.get()
    }

    /// Stores the mapping built from the first evaluation request.
    /// A mapping already in place wins.
    pub(crate) fn init_mapping(&self, mapping: VariableMapping) -> &VariableMapping {
        self.mapping.get_or_init(|| mapping)
    }
}

// --- Orchestrator ---

/// Configures the engine, registers the bridge and drives one run.
///
/// `run` consumes the runner: run state is instance-scoped and dies with
/// it. Callers wanting to observe the halt flag mid-run should grab
/// [`Runner::context`] first.
pub struct Runner {
    host: Arc<dyn DesignHost>,
    ctx: Arc<RunContext>,
    variable_order: Option<Vec<MappingEntry>>,
}

impl Runner {
    pub fn new(host: Arc<dyn DesignHost>) -> Self {
        Self {
            host,
            ctx: Arc::new(RunContext::new()),
            variable_order: None,
        }
    }

    /// Supplies the flat-order slot list up front, instead of recovering
    /// the order from the `x<index>` label convention on the first
    /// evaluation.
    pub fn with_variable_order(mut self, order: Vec<MappingEntry>) -> Self {
        self.variable_order = Some(order);
        self
    }

    /// Handle for observing run state (halt flag, mapping) from outside.
    pub fn context(&self) -> Arc<RunContext> {
        self.ctx.clone()
    }

    /// Drives one full run: configure, execute, reconcile.
    pub fn run<F: EngineFactory>(
        mut self,
        factory: &F,
        options: &RunOptions,
    ) -> Result<RunOutcome, RunError> {
        // Configure.
        let engine_options = EngineOptions::from_run_options(options)?;
        if let Some(order) = self.variable_order.take() {
            let mapping = VariableMapping::from_entries(order)?;
            self.ctx.init_mapping(mapping);
        }
        info!(
            "run {}: starting engine for {}",
            self.ctx.run_id(),
            engine_options.input_file
        );

        let mut engine = factory.create(engine_options)?;
        let bridge = DirectBridge::new(self.host.clone(), self.ctx.clone());
        let slot = BackendSlot::direct(DRIVER_NAME);
        if !engine.plugin_backend(&slot, Box::new(bridge)) {
            return Err(RunError::Configuration(
                "failed to plug in evaluator backend".to_string(),
            ));
        }

        // Execute. A failure raised after the host signalled a halt is a
        // graceful stop, not an error.
        if let Err(failure) = engine.execute() {
            if self.ctx.is_halted() {
                warn!("run {}: halted", self.ctx.run_id());
                return Ok(RunOutcome::Halted);
            }
            return Err(RunError::Engine(failure.to_string()));
        }
        if self.ctx.is_halted() {
            warn!("run {}: halted", self.ctx.run_id());
            return Ok(RunOutcome::Halted);
        }

        // Completed: read the best design back out of the engine.
        let mapping = match self.ctx.mapping() {
            Some(mapping) if !mapping.is_empty() => mapping,
            _ => return Err(RunError::NoResults),
        };

        let finals = engine.variables_results();
        let mut variables = Vec::with_capacity(mapping.len());
        for entry in mapping.iter() {
            variables.push(final_value(&entry, &finals)?);
        }

        let best = BestDesign {
            variables,
            responses: engine.response_results(),
        };
        self.host.update_best_design(&best);
        info!(
            "run {}: complete, {} responses",
            self.ctx.run_id(),
            best.responses.len()
        );
        Ok(RunOutcome::Complete(best))
    }
}

/// Converts one mapped slot of the final engine state to its native
/// representation.
fn final_value(entry: &MappingEntry, finals: &FinalVariables) -> Result<VariableValue, RunError> {
    let value = match entry.class {
        VariableClass::Continuous => finals
            .continuous
            .get(entry.position)
            .map(|v| VariableValue::Continuous(*v)),
        VariableClass::DiscreteInteger => finals
            .discrete_int
            .get(entry.position)
            .map(|v| VariableValue::DiscreteInt(*v)),
        VariableClass::DiscreteReal => finals
            .discrete_real
            .get(entry.position)
            .map(|v| VariableValue::DiscreteReal(*v)),
    };
    value.ok_or_else(|| {
        RunError::Engine(format!(
            "final variables hold no {:?} position {}",
            entry.class, entry.position
        ))
    })
}

use std::sync::Arc;

use log::{debug, info};

use crate::core::domain::VariableClass;
use crate::core::error::{Capability, RunError};
use crate::engine::mapping::{MappingEntry, VariableMapping};
use crate::engine::{
    BackendCapabilities, EvaluationBackend, EvaluationOutcome, EvaluationRequest, VariableView,
    DRIVER_NAME,
};
use crate::host::{DesignHost, DesignReply};
use crate::runner::RunContext;

/// Evaluation backend that forwards every engine request to the external
/// design host.
///
/// The bridge owns flat-vector assembly: on the first request it builds
/// the variable mapping from the labels it sees (unless an explicit
/// order was configured up front) and reuses that mapping for the rest
/// of the run, whatever labels later requests carry.
pub struct DirectBridge {
    host: Arc<dyn DesignHost>,
    ctx: Arc<RunContext>,
}

impl DirectBridge {
    pub fn new(host: Arc<dyn DesignHost>, ctx: Arc<RunContext>) -> Self {
        Self { host, ctx }
    }

    /// Returns the run-wide mapping, building it from `vars` labels on
    /// the first request.
    fn ensure_mapping(&self, vars: &VariableView<'_>) -> Result<&VariableMapping, RunError> {
        if let Some(mapping) = self.ctx.mapping() {
            return Ok(mapping);
        }
        let built = VariableMapping::from_labels(vars)?;
        info!(
            "run {}: variable mapping built for {} variables",
            self.ctx.run_id(),
            built.len()
        );
        Ok(self.ctx.init_mapping(built))
    }

    /// Assembles the flat design point in mapping order.
    fn assemble_point(
        &self,
        mapping: &VariableMapping,
        vars: &VariableView<'_>,
    ) -> Result<Vec<f64>, RunError> {
        let mut point = Vec::with_capacity(mapping.len());
        for entry in mapping.iter() {
            point.push(read_slot(&entry, vars)?);
        }
        Ok(point)
    }

    fn try_evaluate(&self, request: &EvaluationRequest<'_>) -> Result<EvaluationOutcome, RunError> {
        // Capability gates before any work.
        if request.multiproc {
            return Err(RunError::Unsupported(Capability::MultiProcAnalysis));
        }
        if request.driver != DRIVER_NAME {
            return Err(RunError::Configuration(format!(
                "error evaluating analysis driver `{}`",
                request.driver
            )));
        }

        let mapping = self.ensure_mapping(&request.variables)?;
        let point = self.assemble_point(mapping, &request.variables)?;
        debug!(
            "run {}: evaluating design point of {} variables",
            self.ctx.run_id(),
            point.len()
        );

        // Cross the boundary. The reply buffer is owned from here on and
        // dropped on every exit path.
        let declared = request.asv.len();
        let values = match self.host.evaluate_design(&point) {
            Ok(DesignReply::Responses(values)) => values,
            Ok(DesignReply::Halt) => {
                self.ctx.signal_halt();
                info!("run {}: halt requested by host", self.ctx.run_id());
                return Ok(EvaluationOutcome::Halted);
            }
            Err(e) => return Err(RunError::Evaluation(e.to_string())),
        };

        if values.is_empty() {
            return Err(RunError::EmptyEvaluation);
        }
        if values.len() != declared {
            return Err(RunError::ResponseMismatch {
                declared,
                returned: values.len(),
            });
        }

        // Copy requested values into the response slots.
        let mut responses = vec![0.0; declared];
        for (i, flags) in request.asv.iter().enumerate() {
            if flags.wants_value() {
                responses[i] = values[i];
            }
            if flags.wants_gradient() {
                return Err(RunError::Unsupported(Capability::Gradients));
            }
            if flags.wants_hessian() {
                return Err(RunError::Unsupported(Capability::Hessians));
            }
        }

        Ok(EvaluationOutcome::Values(responses))
    }
}

impl EvaluationBackend for DirectBridge {
    fn evaluate(&mut self, request: EvaluationRequest<'_>) -> EvaluationOutcome {
        match self.try_evaluate(&request) {
            Ok(outcome) => outcome,
            Err(e) => EvaluationOutcome::Failed(e),
        }
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            function_values: true,
            ..Default::default()
        }
    }
}

/// Reads one storage slot, widening discrete integers to reals.
fn read_slot(entry: &MappingEntry, vars: &VariableView<'_>) -> Result<f64, RunError> {
    let value = match entry.class {
        VariableClass::Continuous => vars.continuous.get(entry.position).copied(),
        // Implicit widening from integer to real.
        VariableClass::DiscreteInteger => vars.discrete_int.get(entry.position).map(|v| *v as f64),
        VariableClass::DiscreteReal => vars.discrete_real.get(entry.position).copied(),
    };
    value.ok_or_else(|| {
        RunError::Configuration(format!(
            "variable mapping points at {:?} position {} which the engine does not hold",
            entry.class, entry.position
        ))
    })
}

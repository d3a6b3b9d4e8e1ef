use anyhow::Result;

use crate::core::domain::BestDesign;

/// Reply from the algorithm host for one design point.
/// Ownership of the response buffer transfers to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignReply {
    /// Response values in declaration order.
    Responses(Vec<f64>),
    /// The host declines to continue; the run stops cleanly.
    Halt,
}

/// The external side of the evaluation boundary.
///
/// One design point in, one reply out; calls are strictly sequential and
/// the bridge blocks on each one. Hosts may retry internally, the bridge
/// never does.
pub trait DesignHost: Send + Sync {
    /// Evaluates a single flat design point.
    fn evaluate_design(&self, point: &[f64]) -> Result<DesignReply>;

    /// Receives the best design found, once, after a successful run.
    fn update_best_design(&self, best: &BestDesign);
}

/// Settings and history of the fixed point iteration
#[derive(Clone, Debug)]
pub struct Convergence {
    maximum_iterations: usize,
    tolerance: Option<f64>,
    /// Mean absolute change of the perturbation on the first band, one entry per iteration
    history: Vec<f64>,
}

impl Convergence {
    pub(crate) fn new(maximum_iterations: usize, tolerance: Option<f64>) -> Self {
        Self {
            maximum_iterations,
            tolerance,
            history: Vec::with_capacity(maximum_iterations),
        }
    }

    /// The number of iterations run when no tolerance is reached
    pub fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }

    /// The optional tolerance on the mean change
    pub fn tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    /// Mean absolute change of the perturbation recorded in each iteration
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// The change recorded in the latest iteration
    pub fn last_change(&self) -> Option<f64> {
        self.history.last().copied()
    }

    pub(crate) fn record(&mut self, change: f64) {
        self.history.push(change);
    }

    /// Whether the optional tolerance has been reached, always false without one
    pub fn is_within_tolerance(&self) -> bool {
        match (self.tolerance, self.last_change()) {
            (Some(tolerance), Some(change)) => change < tolerance,
            _ => false,
        }
    }
}

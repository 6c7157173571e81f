use super::BteSolver;
use crate::{error::BteError, scattering::PopInputs};
use nalgebra::Vector3;
use ndarray::{Array2, Zip};

/// Perturbations of the polar optical solution with a norm above this are unstable
const UNSTABLE_PERTURBATION: f64 = 1.;

/// Fixed point iteration of the Boltzmann equation
pub trait Iterate {
    /// Whether the optional tolerance on the change of the perturbation has been reached
    fn is_loop_converged(&self) -> bool;
    /// Update the scattering sums and the perturbation once
    fn single_iteration(&mut self, iteration: usize) -> Result<(), BteError>;
    /// Run the configured number of iterations, stopping early only once converged
    fn run_loop(&mut self) -> Result<(), BteError>;
}

impl Iterate for BteSolver<'_> {
    fn is_loop_converged(&self) -> bool {
        self.convergence.is_within_tolerance()
    }

    fn single_iteration(&mut self, iteration: usize) -> Result<(), BteError> {
        let carrier = self.grid.carrier();
        let seed = Vector3::repeat(self.seed);

        if let Some(polar_optical) = self.polar_optical {
            let out_scattering = !self.once_called;
            let perturbation = &self.perturbation;
            let inputs = PopInputs {
                f: perturbation.f.view(),
                f_th: perturbation.f_th.view(),
                g: perturbation.g.view(),
                g_th: perturbation.g_th.view(),
            };
            let sums = polar_optical.evaluate(&inputs, out_scattering, self.pool)?;
            self.perturbation.s_i = sums.map(|sums| sums.s_i);
            self.perturbation.s_i_th = sums.map(|sums| sums.s_i_th);
            if out_scattering {
                self.perturbation.s_o = sums.map(|sums| sums.s_o.unwrap_or(seed));
                self.perturbation.s_o_th = sums.map(|sums| sums.s_o_th.unwrap_or(seed));
                self.once_called = true;
            }
        }

        let perturbation = &mut self.perturbation;
        let forces = self.forces;
        let total = &self.elastic.total;
        // (S_i + F) / (S_o + rate), component by component
        let update = |s_i: &Array2<Vector3<f64>>,
                      force: &Array2<Vector3<f64>>,
                      s_o: &Array2<Vector3<f64>>,
                      rate: &Array2<Vector3<f64>>| {
            Zip::from(s_i)
                .and(force)
                .and(s_o)
                .and(rate)
                .map_collect(|s_i, force, s_o, rate| (s_i + force).component_div(&(s_o + rate)))
        };

        if self.polar_optical.is_some() {
            let pop_rate = Array2::from_elem(total.raw_dim(), seed);
            let mut g_pop = update(&perturbation.s_i, &forces.electric, &perturbation.s_o, &pop_rate);
            if iteration > 0 {
                g_pop
                    .iter_mut()
                    .filter(|g| g.norm() > UNSTABLE_PERTURBATION)
                    .for_each(|g| *g = seed);
            }
            perturbation.g_pop = g_pop;
        }
        let g = update(&perturbation.s_i, &forces.electric, &perturbation.s_o, total);
        let g_th = update(&perturbation.s_i_th, &forces.thermal, &perturbation.s_o_th, total);
        if g.iter().chain(g_th.iter()).any(|g| g.iter().any(|x| !x.is_finite())) {
            return Err(BteError::Diverged { carrier, iteration });
        }

        let change = g
            .row(0)
            .iter()
            .zip(perturbation.g.row(0).iter())
            .map(|(new, old)| (new - old).norm())
            .sum::<f64>()
            / g.ncols().max(1) as f64;
        tracing::info!("{carrier}-type iteration {iteration}: mean |Δg| = {change:.4e}");
        self.convergence.record(change);

        perturbation.f = Zip::from(&forces.f0).and(&g).map_collect(|f0, g| f0 + g);
        perturbation.f_th = Zip::from(&forces.f0).and(&g_th).map_collect(|f0, g| f0 + g);
        perturbation.g = g;
        perturbation.g_th = g_th;
        Ok(())
    }

    #[tracing::instrument(name = "BTE", level = "info", skip(self), fields(carrier = %self.grid.carrier()))]
    fn run_loop(&mut self) -> Result<(), BteError> {
        for iteration in 0..self.convergence.maximum_iterations() {
            self.single_iteration(iteration)?;
            if self.is_loop_converged() {
                tracing::info!("Converged after {} iterations", iteration + 1);
                break;
            }
        }
        Ok(())
    }
}

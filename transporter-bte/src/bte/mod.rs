//! # BTE
//!
//! The linearised Boltzmann transport equation for one carrier type at one condition, solved
//! by fixed point iteration.
//!
//! Elastic processes enter through their total rate alone. Polar optical scattering couples
//! every state to the perturbation of its partners one phonon energy away, so the in-scattering
//! sums are re-evaluated on every iteration while the out-scattering sums are evaluated on the
//! first and then held fixed. The loop runs a fixed number of iterations unless a tolerance is
//! configured.

mod convergence;
mod methods;

pub use convergence::Convergence;
pub use methods::Iterate;

use crate::{
    forces::DrivingForces, kgrid::CarrierGrid, scattering::ElasticRates,
    scattering::PolarOptical, workers::WorkerPool,
};
use nalgebra::Vector3;
use ndarray::Array2;
use serde::Deserialize;

/// Iteration settings of the Boltzmann equation solver
#[derive(Clone, Debug, Deserialize)]
pub struct BteSettings {
    /// Number of fixed point iterations
    pub iterations: usize,
    /// Stop early once the mean change of the perturbation drops below this
    #[serde(default)]
    pub tolerance: Option<f64>,
}

impl Default for BteSettings {
    fn default() -> Self {
        Self {
            iterations: 5,
            tolerance: None,
        }
    }
}

/// The iterated quantities, indexed by `(band, k)`
#[derive(Clone, Debug)]
pub struct Perturbation {
    /// Response to the electric field with all mechanisms
    pub g: Array2<Vector3<f64>>,
    /// Response to the temperature gradient
    pub g_th: Array2<Vector3<f64>>,
    /// Response to the electric field with polar optical scattering alone
    pub g_pop: Array2<Vector3<f64>>,
    /// The perturbed occupation `f0 + g`
    pub f: Array2<Vector3<f64>>,
    /// The perturbed occupation under the temperature gradient
    pub f_th: Array2<Vector3<f64>>,
    /// Polar optical in-scattering sum under the electric field, in 1/s
    pub s_i: Array2<Vector3<f64>>,
    /// Polar optical in-scattering sum under the temperature gradient
    pub s_i_th: Array2<Vector3<f64>>,
    /// Polar optical out-scattering sum, in 1/s
    pub s_o: Array2<Vector3<f64>>,
    /// Polar optical out-scattering sum under the temperature gradient
    pub s_o_th: Array2<Vector3<f64>>,
}

impl Perturbation {
    /// The unperturbed state, with the occupation at equilibrium and the sums at `seed`
    pub(crate) fn equilibrium(f0: &Array2<Vector3<f64>>, seed: f64) -> Self {
        let seeded = Array2::from_elem(f0.raw_dim(), Vector3::repeat(seed));
        Self {
            g: seeded.clone(),
            g_th: seeded.clone(),
            g_pop: seeded.clone(),
            f: f0.clone(),
            f_th: f0.clone(),
            s_i: seeded.clone(),
            s_i_th: seeded.clone(),
            s_o: seeded.clone(),
            s_o_th: seeded,
        }
    }
}

/// Builder for a `BteSolver`
pub struct BteSolverBuilder<RefGrid, RefForces, RefElastic, RefPolarOptical, RefSettings, RefPool> {
    grid: RefGrid,
    forces: RefForces,
    elastic: RefElastic,
    polar_optical: RefPolarOptical,
    settings: RefSettings,
    pool: RefPool,
}

impl BteSolverBuilder<(), (), (), (), (), ()> {
    /// An empty builder
    pub fn new() -> Self {
        Self {
            grid: (),
            forces: (),
            elastic: (),
            polar_optical: (),
            settings: (),
            pool: (),
        }
    }
}

impl Default for BteSolverBuilder<(), (), (), (), (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<RefGrid, RefForces, RefElastic, RefPolarOptical, RefSettings, RefPool>
    BteSolverBuilder<RefGrid, RefForces, RefElastic, RefPolarOptical, RefSettings, RefPool>
{
    /// Attach the states of the carrier type
    pub fn with_grid<Grid>(
        self,
        grid: &Grid,
    ) -> BteSolverBuilder<&Grid, RefForces, RefElastic, RefPolarOptical, RefSettings, RefPool> {
        BteSolverBuilder {
            grid,
            forces: self.forces,
            elastic: self.elastic,
            polar_optical: self.polar_optical,
            settings: self.settings,
            pool: self.pool,
        }
    }

    /// Attach the equilibrium occupation and driving terms
    pub fn with_forces<Forces>(
        self,
        forces: &Forces,
    ) -> BteSolverBuilder<RefGrid, &Forces, RefElastic, RefPolarOptical, RefSettings, RefPool> {
        BteSolverBuilder {
            grid: self.grid,
            forces,
            elastic: self.elastic,
            polar_optical: self.polar_optical,
            settings: self.settings,
            pool: self.pool,
        }
    }

    /// Attach the elastic rates
    pub fn with_elastic<Elastic>(
        self,
        elastic: &Elastic,
    ) -> BteSolverBuilder<RefGrid, RefForces, &Elastic, RefPolarOptical, RefSettings, RefPool> {
        BteSolverBuilder {
            grid: self.grid,
            forces: self.forces,
            elastic,
            polar_optical: self.polar_optical,
            settings: self.settings,
            pool: self.pool,
        }
    }

    /// Attach the polar optical scatterer, if the mechanism is enabled
    pub fn with_polar_optical<'p>(
        self,
        polar_optical: Option<&'p PolarOptical<'p>>,
    ) -> BteSolverBuilder<
        RefGrid,
        RefForces,
        RefElastic,
        Option<&'p PolarOptical<'p>>,
        RefSettings,
        RefPool,
    > {
        BteSolverBuilder {
            grid: self.grid,
            forces: self.forces,
            elastic: self.elastic,
            polar_optical,
            settings: self.settings,
            pool: self.pool,
        }
    }

    /// Attach the iteration settings
    pub fn with_settings<Settings>(
        self,
        settings: &Settings,
    ) -> BteSolverBuilder<RefGrid, RefForces, RefElastic, RefPolarOptical, &Settings, RefPool> {
        BteSolverBuilder {
            grid: self.grid,
            forces: self.forces,
            elastic: self.elastic,
            polar_optical: self.polar_optical,
            settings,
            pool: self.pool,
        }
    }

    /// Attach the worker pool evaluating the polar optical sums
    pub fn with_pool<Pool>(
        self,
        pool: &Pool,
    ) -> BteSolverBuilder<RefGrid, RefForces, RefElastic, RefPolarOptical, RefSettings, &Pool> {
        BteSolverBuilder {
            grid: self.grid,
            forces: self.forces,
            elastic: self.elastic,
            polar_optical: self.polar_optical,
            settings: self.settings,
            pool,
        }
    }
}

impl<'a>
    BteSolverBuilder<
        &'a CarrierGrid,
        &'a DrivingForces,
        &'a ElasticRates,
        Option<&'a PolarOptical<'a>>,
        &'a BteSettings,
        &'a WorkerPool,
    >
{
    /// Start the iteration from equilibrium, with every sum seeded at `seed`
    pub fn build(self, seed: f64) -> BteSolver<'a> {
        BteSolver {
            grid: self.grid,
            forces: self.forces,
            elastic: self.elastic,
            polar_optical: self.polar_optical,
            pool: self.pool,
            perturbation: Perturbation::equilibrium(&self.forces.f0, seed),
            convergence: Convergence::new(self.settings.iterations, self.settings.tolerance),
            once_called: false,
            seed,
        }
    }
}

/// The fixed point iteration of one carrier type at one condition
#[derive(Debug)]
pub struct BteSolver<'a> {
    grid: &'a CarrierGrid,
    forces: &'a DrivingForces,
    elastic: &'a ElasticRates,
    polar_optical: Option<&'a PolarOptical<'a>>,
    pool: &'a WorkerPool,
    perturbation: Perturbation,
    convergence: Convergence,
    /// Whether the out-scattering sums have been evaluated
    once_called: bool,
    seed: f64,
}

impl BteSolver<'_> {
    /// The perturbation after the iterations run so far
    pub fn perturbation(&self) -> &Perturbation {
        &self.perturbation
    }

    /// Consume the solver, returning the final perturbation
    pub fn into_perturbation(self) -> Perturbation {
        self.perturbation
    }

    /// The change history of the iteration
    pub fn convergence(&self) -> &Convergence {
        &self.convergence
    }
}

#[cfg(test)]
mod test {
    use super::{BteSettings, BteSolverBuilder, Iterate};
    use crate::{
        band::BandExtremum,
        carrier::CarrierType,
        constants::PhysicalConstants,
        fermi::SeebeckIntegrals,
        forces::{DrivingForces, DrivingSettings},
        kgrid::{CarrierGrid, KState},
        material::Material,
        neighbors::{NeighborSettings, NeighborTable},
        scattering::{ElasticMechanism, ElasticRates, PolarOptical, ScatteringContext},
        workers::WorkerPool,
    };
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};
    use ndarray::Array2;

    fn state(cartesian: Vector3<f64>, energy: f64, index: usize) -> KState {
        KState {
            fractional: cartesian / 10.,
            cartesian,
            old_cartesian: cartesian,
            energy,
            velocity: cartesian.abs() * 1e7 + Vector3::repeat(1e5),
            effective_mass: Matrix3::identity() * 0.067,
            a: 1.,
            c: 0.,
            mesh_index: index,
        }
    }

    fn grid(states: Vec<KState>) -> CarrierGrid {
        CarrierGrid::from_states(
            CarrierType::N,
            BandExtremum {
                energy: 0.,
                kpoint: Vector3::zeros(),
                effective_mass: Matrix3::identity() * 0.067,
            },
            1.,
            vec![states],
            Array2::zeros((1, 1)),
        )
        .unwrap()
    }

    /// Shells of three orthogonal states with energies quadratic in |k|
    fn shell_grid(num_shells: usize) -> CarrierGrid {
        let states = (0..num_shells)
            .flat_map(|shell| {
                let norm = 0.05 + 0.02 * shell as f64;
                let energy = 0.1 * norm * norm;
                (0..3).map(move |axis| {
                    let mut cartesian = Vector3::zeros();
                    cartesian[axis] = norm;
                    state(cartesian, energy, 3 * shell + axis)
                })
            })
            .collect();
        grid(states)
    }

    fn context<'a>(
        material: &'a crate::material::MaterialParameters<f64>,
        constants: &'a PhysicalConstants,
    ) -> ScatteringContext<'a> {
        ScatteringContext {
            carrier: CarrierType::N,
            temperature: 300.,
            inverse_screening_length: 0.1,
            impurity_concentration: 1e18,
            lattice_c: 5.65,
            material,
            constants,
        }
    }

    #[test]
    fn acoustic_only_toy_model() {
        let material = Material::GaAs.get_info::<f64>();
        let constants = PhysicalConstants::default();
        let context = context(&material, &constants);
        let grid = grid(vec![
            state(Vector3::new(0.1, 0., 0.), 0., 0),
            state(Vector3::new(0.2, 0., 0.), 0.01, 1),
        ]);
        let pool = WorkerPool::sequential().unwrap();
        let elastic =
            ElasticRates::evaluate(&context, &grid, None, &[ElasticMechanism::Acd], true, &pool)
                .unwrap();
        let acd = elastic.mechanism(ElasticMechanism::Acd).unwrap();
        for (tau, rate) in elastic.relaxation_time.iter().zip(acd.iter()) {
            assert_relative_eq!(tau.x, 1. / (rate.x + constants.gs), max_relative = 1e-12);
        }

        // Without a driving force the perturbation stays at zero
        let seebeck = SeebeckIntegrals {
            numerator: 0.,
            denominator: 1.,
        };
        let mut forces = DrivingForces::evaluate(
            &grid,
            -0.1,
            300.,
            &seebeck,
            &DrivingSettings::default(),
            &constants,
        );
        forces.electric.fill(Vector3::zeros());
        forces.thermal.fill(Vector3::zeros());
        let settings = BteSettings::default();
        let mut solver = BteSolverBuilder::new()
            .with_grid(&grid)
            .with_forces(&forces)
            .with_elastic(&elastic)
            .with_polar_optical(None)
            .with_settings(&settings)
            .with_pool(&pool)
            .build(constants.gs);
        solver.run_loop().unwrap();
        assert_eq!(solver.convergence().history().len(), 5);
        for g in solver.perturbation().g.iter() {
            assert!(g.norm() < 1e-30);
        }
    }

    #[test]
    fn elastic_solution_is_the_relaxation_time_approximation() {
        let material = Material::GaAs.get_info::<f64>();
        let constants = PhysicalConstants::default();
        let context = context(&material, &constants);
        let grid = shell_grid(4);
        let pool = WorkerPool::sequential().unwrap();
        let elastic = ElasticRates::evaluate(
            &context,
            &grid,
            None,
            &[ElasticMechanism::Acd, ElasticMechanism::Imp],
            true,
            &pool,
        )
        .unwrap();
        let seebeck = SeebeckIntegrals {
            numerator: 1.,
            denominator: 1.,
        };
        let forces = DrivingForces::evaluate(
            &grid,
            0.,
            300.,
            &seebeck,
            &DrivingSettings::default(),
            &constants,
        );
        let settings = BteSettings {
            iterations: 20,
            tolerance: Some(1e-30),
        };
        let mut solver = BteSolverBuilder::new()
            .with_grid(&grid)
            .with_forces(&forces)
            .with_elastic(&elastic)
            .with_polar_optical(None)
            .with_settings(&settings)
            .with_pool(&pool)
            .build(constants.gs);
        solver.run_loop().unwrap();
        // The elastic update does not depend on the previous perturbation
        assert_eq!(solver.convergence().history().len(), 2);
        let perturbation = solver.perturbation();
        for (((g, force), tau), (f, f0)) in perturbation
            .g
            .iter()
            .zip(forces.electric.iter())
            .zip(elastic.relaxation_time.iter())
            .zip(perturbation.f.iter().zip(forces.f0.iter()))
        {
            assert_relative_eq!(g.x, force.x * tau.x, max_relative = 1e-9);
            assert_relative_eq!(f.x, f0.x + g.x, max_relative = 1e-12);
        }
    }

    #[test]
    fn out_scattering_is_evaluated_once() {
        let mut material = Material::GaAs.get_info::<f64>();
        material.w_pop = 0.5;
        let constants = PhysicalConstants::default();
        let context = context(&material, &constants);
        let grid = shell_grid(12);
        let pool = WorkerPool::sequential().unwrap();
        let phonon_energy = constants.hbar * material.pop_angular_frequency();
        let table = NeighborTable::build(&grid, &NeighborSettings::default(), Some(phonon_energy));
        let elastic = ElasticRates::evaluate(
            &context,
            &grid,
            Some(&table),
            &[ElasticMechanism::Acd],
            true,
            &pool,
        )
        .unwrap();
        let polar_optical = PolarOptical::new(context.clone(), &grid, &table, true).unwrap();
        let seebeck = SeebeckIntegrals {
            numerator: 1.,
            denominator: 1.,
        };
        let forces = DrivingForces::evaluate(
            &grid,
            0.,
            300.,
            &seebeck,
            &DrivingSettings::default(),
            &constants,
        );
        let settings = BteSettings::default();
        let mut solver = BteSolverBuilder::new()
            .with_grid(&grid)
            .with_forces(&forces)
            .with_elastic(&elastic)
            .with_polar_optical(Some(&polar_optical))
            .with_settings(&settings)
            .with_pool(&pool)
            .build(constants.gs);

        solver.single_iteration(0).unwrap();
        let s_o = solver.perturbation().s_o.clone();
        let s_o_th = solver.perturbation().s_o_th.clone();
        let s_i = solver.perturbation().s_i.clone();
        assert!(s_o.iter().any(|s| s.x > constants.gs));
        for iteration in 1..3 {
            solver.single_iteration(iteration).unwrap();
            assert_eq!(solver.perturbation().s_o, s_o);
            assert_eq!(solver.perturbation().s_o_th, s_o_th);
        }
        // The in-scattering sums follow the perturbation
        assert_ne!(solver.perturbation().s_i, s_i);
        for g_pop in solver.perturbation().g_pop.iter() {
            assert!(g_pop.norm() <= 1.);
        }
    }
}

//! Polar optical phonon scattering
//!
//! The only inelastic mechanism. Each state scatters into the neighbour sets one phonon quantum
//! above it, absorbing a phonon, and one below it, emitting a phonon. The in-scattering sums
//! depend on the perturbation of the partner states and are re-evaluated on every iteration of
//! the Boltzmann equation. The out-scattering sums only depend on the occupation.

use super::{overlap, ScatteringContext};
use crate::{
    carrier::CarrierType,
    error::ScatteringError,
    integration::integrate_over_x,
    kgrid::CarrierGrid,
    neighbors::{Neighbor, NeighborTable},
    statistics::bose_einstein,
    workers::WorkerPool,
};
use nalgebra::Vector3;
use ndarray::{Array2, ArrayView2};
use std::f64::consts::PI;

/// Partners whose wavevector norm is this close to the state's, in 1/nm, are skipped in
/// isotropic mode
const NORM_COINCIDENCE: f64 = 1e-4;
/// Regularises the logarithm of the isotropic kernel, in 1/nm
const LOG_REGULARISATION: f64 = 1e-4;
/// Converts the isotropic coupling to 1/s
const ISOTROPIC_COUPLING_CONVERSION: f64 = 6.2415093e20;

/// The two polar optical phonon processes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhononProcess {
    /// The carrier gains one phonon quantum
    Absorption,
    /// The carrier loses one phonon quantum
    Emission,
}

impl PhononProcess {
    /// Both processes
    pub const ALL: [PhononProcess; 2] = [PhononProcess::Absorption, PhononProcess::Emission];

    /// The sign of the energy transferred to the carrier
    pub fn sign(&self) -> f64 {
        match self {
            PhononProcess::Absorption => 1.,
            PhononProcess::Emission => -1.,
        }
    }

    fn neighbours<'t>(&self, table: &'t NeighborTable) -> Option<&'t Array2<Vec<Neighbor>>> {
        match self {
            PhononProcess::Absorption => table.plus.as_ref(),
            PhononProcess::Emission => table.minus.as_ref(),
        }
    }
}

/// The condition dependent arrays the sums are built from, all indexed by `(band, k)`
#[derive(Copy, Clone, Debug)]
pub struct PopInputs<'a> {
    /// Perturbed occupation under the electric field
    pub f: ArrayView2<'a, Vector3<f64>>,
    /// Perturbed occupation under the temperature gradient
    pub f_th: ArrayView2<'a, Vector3<f64>>,
    /// Perturbation under the electric field
    pub g: ArrayView2<'a, Vector3<f64>>,
    /// Perturbation under the temperature gradient
    pub g_th: ArrayView2<'a, Vector3<f64>>,
}

/// The polar optical scattering sums of a single state, summed over both processes
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PopSums {
    /// In-scattering under the electric field
    pub s_i: Vector3<f64>,
    /// In-scattering under the temperature gradient
    pub s_i_th: Vector3<f64>,
    /// Present when the out-scattering sums were requested
    pub s_o: Option<Vector3<f64>>,
    /// Out-scattering under the temperature gradient, when requested
    pub s_o_th: Option<Vector3<f64>>,
}

/// Polar optical phonon scattering of one carrier type at one condition
#[derive(Clone, Debug)]
pub struct PolarOptical<'a> {
    context: ScatteringContext<'a>,
    grid: &'a CarrierGrid,
    plus: &'a Array2<Vec<Neighbor>>,
    minus: &'a Array2<Vec<Neighbor>>,
    isotropic: bool,
    /// Angular frequency in rad/s
    frequency: f64,
    /// Phonon energy in eV
    phonon_energy: f64,
    occupation: f64,
}

impl<'a> PolarOptical<'a> {
    /// `table` must hold the sets one phonon energy above and below every state
    pub fn new(
        context: ScatteringContext<'a>,
        grid: &'a CarrierGrid,
        table: &'a NeighborTable,
        isotropic: bool,
    ) -> Result<Self, ScatteringError> {
        let missing = ScatteringError::MissingNeighbours("polar optical");
        let plus = PhononProcess::Absorption.neighbours(table).ok_or(missing)?;
        let minus = PhononProcess::Emission
            .neighbours(table)
            .ok_or(ScatteringError::MissingNeighbours("polar optical"))?;
        let frequency = context.material.pop_angular_frequency();
        let phonon_energy = context.constants.hbar * frequency;
        let occupation = bose_einstein(phonon_energy, context.thermal_energy());
        tracing::debug!(
            "Polar optical phonon energy {phonon_energy:.4} eV, occupation {occupation:.4}"
        );
        Ok(Self {
            context,
            grid,
            plus,
            minus,
            isotropic,
            frequency,
            phonon_energy,
            occupation,
        })
    }

    /// Phonon energy in eV
    pub fn phonon_energy(&self) -> f64 {
        self.phonon_energy
    }

    /// The Bose-Einstein occupation of the phonon mode
    pub fn occupation(&self) -> f64 {
        self.occupation
    }

    /// Whether the final states of `process` exist for state `(band, k)`
    ///
    /// Electrons cannot emit below the conduction band minimum and holes cannot absorb above the
    /// valence band maximum.
    pub fn is_allowed(&self, process: PhononProcess, band: usize, k: usize) -> bool {
        let energy = self.grid.energy(band, k);
        let edge = self.grid.extremum().energy;
        match (self.context.carrier, process) {
            (CarrierType::N, PhononProcess::Emission) => energy - self.phonon_energy >= edge,
            (CarrierType::P, PhononProcess::Absorption) => energy + self.phonon_energy <= edge,
            _ => true,
        }
    }

    fn set(&self, process: PhononProcess, band: usize, k: usize) -> &[Neighbor] {
        match process {
            PhononProcess::Absorption => &self.plus[[band, k]],
            PhononProcess::Emission => &self.minus[[band, k]],
        }
    }

    /// The occupation of a partner as seen by the carrier, holes count empty states
    fn partner_occupation(&self, value: Vector3<f64>) -> Vector3<f64> {
        match self.context.carrier {
            CarrierType::N => value,
            CarrierType::P => Vector3::repeat(1.) - value,
        }
    }

    /// The sums of state `(band, k)`, with the out-scattering sums only if `out_scattering` is set
    pub fn sums(
        &self,
        inputs: &PopInputs,
        band: usize,
        k: usize,
        out_scattering: bool,
    ) -> Result<PopSums, ScatteringError> {
        if self.isotropic {
            Ok(self.isotropic_sums(inputs, band, k, out_scattering))
        } else {
            self.anisotropic_sums(inputs, band, k, out_scattering)
        }
    }

    /// The sums of every state of the grid, gathered in `(band, k)` order
    #[tracing::instrument(name = "Polar optical sums", level = "debug", skip_all, fields(carrier = %self.context.carrier))]
    pub fn evaluate(
        &self,
        inputs: &PopInputs,
        out_scattering: bool,
        pool: &WorkerPool,
    ) -> Result<Array2<PopSums>, ScatteringError> {
        let shape = (self.grid.num_bands(), self.grid.num_kpoints());
        let num_states = shape.0 * shape.1;
        let sums = pool.map_indices_sized(num_states, num_states, |index| {
            self.sums(inputs, index / shape.1, index % shape.1, out_scattering)
        })?;
        Array2::from_shape_vec(shape, sums)
            .map_err(|e| crate::error::BuildError::Mesh(e.to_string()).into())
    }

    fn isotropic_sums(&self, inputs: &PopInputs, band: usize, k: usize, out_scattering: bool) -> PopSums {
        let constants = self.context.constants;
        let material = self.context.material;
        let state = self.grid.state(band, k);
        let (norm_k, a, c) = (state.norm_k(), state.a, state.c);
        let n = self.occupation;
        let f = inputs.f[[band, k]];
        let f_th = inputs.f_th[[band, k]];
        let seed = Vector3::repeat(constants.gs);
        let mut sums = PopSums {
            s_i: seed,
            s_i_th: seed,
            s_o: out_scattering.then(|| seed),
            s_o_th: out_scattering.then(|| seed),
        };

        for (j, process) in PhononProcess::ALL.into_iter().enumerate() {
            if !self.is_allowed(process, band, k) {
                continue;
            }
            let set = self.set(process, band, k);
            let (j, sign_o) = (j as f64, if j == 0 { 1. } else { -1. });
            let sign_i = -sign_o;

            let mut counted = set.len() as f64;
            let zero = Vector3::zeros();
            let (mut s_i, mut s_i_th, mut s_o, mut s_o_th) = (zero, zero, zero, zero);
            for neighbor in set {
                let other = self.grid.state(neighbor.band, neighbor.k);
                let norm_pm = other.norm_k();
                if (norm_pm - norm_k).abs() < NORM_COINCIDENCE {
                    counted -= 1.;
                    continue;
                }
                let index = [neighbor.band, neighbor.k];
                let f_pm = self.partner_occupation(inputs.f[index]);
                let f_pm_th = self.partner_occupation(inputs.f_th[index]);
                let v_pm = other.norm_v() / 3_f64.sqrt();

                let mixing = a * other.a
                    + c * other.c * (norm_pm.powi(2) + norm_k.powi(2)) / (2. * norm_pm * norm_k);
                let coupling = constants.e.powi(2) * self.frequency / (4. * PI * constants.hbar * v_pm)
                    * (1. / (material.epsilon_inf * constants.epsilon_0)
                        - 1. / (material.epsilon_s * constants.epsilon_0))
                    * ISOTROPIC_COUPLING_CONVERSION;
                let log = ((norm_pm + norm_k) / ((norm_pm - norm_k).abs() + LOG_REGULARISATION)).ln();

                if out_scattering {
                    let lambda_o = coupling
                        * (mixing.powi(2) * log - mixing * c * other.c - a * other.a * c * other.c);
                    s_o += (Vector3::repeat(n + j) + f_pm * sign_o) * lambda_o;
                    s_o_th += (Vector3::repeat(n + j) + f_pm_th * sign_o) * lambda_o;
                }
                let lambda_i = coupling
                    * ((norm_pm.powi(2) + norm_k.powi(2)) / (2. * norm_k * norm_pm) * mixing.powi(2) * log
                        - mixing.powi(2)
                        - c.powi(2) * other.c.powi(2) / 3.);
                s_i += (Vector3::repeat(n + 1. - j) + f * sign_i)
                    .component_mul(&inputs.g[index])
                    * lambda_i;
                s_i_th += (Vector3::repeat(n + 1. - j) + f_th * sign_i)
                    .component_mul(&inputs.g_th[index])
                    * lambda_i;
            }

            if counted > 0. {
                sums.s_i += s_i / counted;
                sums.s_i_th += s_i_th / counted;
                if let (Some(total), Some(total_th)) = (sums.s_o.as_mut(), sums.s_o_th.as_mut()) {
                    *total += s_o / counted;
                    *total_th += s_o_th / counted;
                }
            }
        }
        sums
    }

    fn anisotropic_sums(
        &self,
        inputs: &PopInputs,
        band: usize,
        k: usize,
        out_scattering: bool,
    ) -> Result<PopSums, ScatteringError> {
        let constants = self.context.constants;
        let material = self.context.material;
        let state = self.grid.state(band, k);
        let n = self.occupation;
        let ones = Vector3::repeat(1.);
        let f = inputs.f[[band, k]];
        let f_th = inputs.f_th[[band, k]];
        let seed = Vector3::repeat(constants.gs);
        let mut sums = PopSums {
            s_i: seed,
            s_i_th: seed,
            s_o: out_scattering.then(|| seed),
            s_o_th: out_scattering.then(|| seed),
        };
        let prefactor = constants.e.powi(2) * self.frequency / (4. * PI * constants.hbar)
            * (1. / material.epsilon_inf - 1. / material.epsilon_s)
            / constants.epsilon_0
            * 100.
            / constants.e;
        let empty = || ScatteringError::EmptyNeighbourSet {
            carrier: self.context.carrier,
            band,
            k,
        };

        for process in PhononProcess::ALL {
            if !self.is_allowed(process, band, k) {
                continue;
            }
            let set = self.set(process, band, k);
            let kernel = |neighbor: &Neighbor| {
                let other = self.grid.state(neighbor.band, neighbor.k);
                if other.cartesian == state.cartesian {
                    return 0.;
                }
                other.norm_k().powi(2) * overlap(state, other, neighbor.cosine)
                    / (other.norm_v() * (state.cartesian - other.cartesian).norm_squared())
            };
            // The in-scattering weight of the state's own occupation
            let in_weight = |f: Vector3<f64>| match process {
                PhononProcess::Emission => (ones - f) * n + f * (1. + n),
                PhononProcess::Absorption => (ones - f) * (1. + n) + f * n,
            };
            // The out-scattering weight of the partner occupation
            let out_weight = |f_prime: Vector3<f64>| match process {
                PhononProcess::Emission => (ones - f_prime) * (1. + n) + f_prime * n,
                PhononProcess::Absorption => (ones - f_prime) * n + f_prime * (1. + n),
            };

            let in_term = |occupation: Vector3<f64>, g: ArrayView2<Vector3<f64>>| {
                integrate_over_x(set, |neighbor| {
                    (g[[neighbor.band, neighbor.k]] * neighbor.cosine).abs() * kernel(neighbor)
                })
                .map(|integral| integral.component_mul(&in_weight(occupation)))
            };
            sums.s_i += in_term(f, inputs.g).ok_or_else(empty)? * prefactor;
            sums.s_i_th += in_term(f_th, inputs.g_th).ok_or_else(empty)? * prefactor;

            if out_scattering {
                let out_term = |occupation: ArrayView2<Vector3<f64>>| {
                    integrate_over_x(set, |neighbor| {
                        let f_prime = self.partner_occupation(occupation[[neighbor.band, neighbor.k]]);
                        out_weight(f_prime) * kernel(neighbor)
                    })
                };
                let s_o = out_term(inputs.f).ok_or_else(empty)? * prefactor;
                let s_o_th = out_term(inputs.f_th).ok_or_else(empty)? * prefactor;
                if let (Some(total), Some(total_th)) = (sums.s_o.as_mut(), sums.s_o_th.as_mut()) {
                    *total += s_o;
                    *total_th += s_o_th;
                }
            }
        }
        Ok(sums)
    }
}

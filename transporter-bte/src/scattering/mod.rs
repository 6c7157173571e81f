//! # Scattering
//!
//! Scattering rates of the carriers retained on the k-grid.
//!
//! Elastic mechanisms each implement `ElasticScattering`. In isotropic mode their closed-form
//! rates are evaluated directly from the norm of the wavevector and velocity. Otherwise the
//! squared matrix element is integrated over the cosine of the scattering angle on the
//! equal-energy neighbour set of each state.
//!
//! Polar optical phonon scattering is inelastic and couples back into the Boltzmann equation.
//! It is evaluated by `PolarOptical`, separately for the in-scattering sum, which depends on the
//! perturbation, and the out-scattering sum, which does not.

mod elastic;
mod polar_optical;

pub use elastic::{AcousticDeformation, Dislocation, IonizedImpurity, Piezoelectric};
pub use polar_optical::{PhononProcess, PolarOptical, PopSums, PopInputs};

use crate::{
    carrier::CarrierType,
    constants::PhysicalConstants,
    error::ScatteringError,
    integration::integrate_over_x,
    kgrid::{CarrierGrid, KState},
    material::MaterialParameters,
    neighbors::{Neighbor, NeighborTable},
    workers::WorkerPool,
};
use nalgebra::Vector3;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Integrated anisotropic rates below this, in 1/s, are replaced by `RATE_FLOOR_FILL`
const RATE_FLOOR: f64 = 100.;
const RATE_FLOOR_FILL: f64 = 1e10;
/// Integrated anisotropic rates above this, in 1/s, are reported
const RATE_CEILING: f64 = 1e20;
/// Converts the angular integral of a squared matrix element to 1/s
const ANGULAR_RATE_CONVERSION: f64 = 2e-7;

/// The elastic mechanisms which can be enabled
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElasticMechanism {
    /// Acoustic deformation potential
    Acd,
    /// Ionized impurity
    Imp,
    /// Piezoelectric
    Pie,
    /// Charged dislocation
    Dis,
}

impl std::fmt::Display for ElasticMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ElasticMechanism::Acd => write!(f, "ACD"),
            ElasticMechanism::Imp => write!(f, "IMP"),
            ElasticMechanism::Pie => write!(f, "PIE"),
            ElasticMechanism::Dis => write!(f, "DIS"),
        }
    }
}

impl ElasticMechanism {
    /// The rate model of the mechanism
    pub fn scatterer(&self) -> &'static dyn ElasticScattering {
        match self {
            ElasticMechanism::Acd => &AcousticDeformation,
            ElasticMechanism::Imp => &IonizedImpurity,
            ElasticMechanism::Pie => &Piezoelectric,
            ElasticMechanism::Dis => &Dislocation,
        }
    }
}

/// The inelastic mechanisms which can be enabled
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InelasticMechanism {
    /// Polar optical phonon
    Pop,
}

impl std::fmt::Display for InelasticMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InelasticMechanism::Pop => write!(f, "POP"),
        }
    }
}

/// Everything a rate depends on beyond the states themselves, for one carrier type at one condition
#[derive(Clone, Debug)]
pub struct ScatteringContext<'a> {
    /// The scattered carrier type
    pub carrier: CarrierType,
    /// Temperature in K
    pub temperature: f64,
    /// Inverse screening length in 1/nm
    pub inverse_screening_length: f64,
    /// Ionised impurity density in 1/cm^3
    pub impurity_concentration: f64,
    /// Length of the third direct lattice vector in Angstrom
    pub lattice_c: f64,
    /// Scattering parameters
    pub material: &'a MaterialParameters<f64>,
    /// Physical constants
    pub constants: &'a PhysicalConstants,
}

impl ScatteringContext<'_> {
    /// kT in eV
    pub fn thermal_energy(&self) -> f64 {
        self.constants.thermal_energy(self.temperature)
    }
}

/// An elastic scattering mechanism
pub trait ElasticScattering: Sync {
    /// The mechanism this model evaluates
    fn mechanism(&self) -> ElasticMechanism;

    /// The part of the squared matrix element which does not depend on the wavevectors
    fn prefactor(&self, context: &ScatteringContext) -> f64;

    /// The squared matrix element between the Cartesian wavevectors `k` and `k_prime`, in 1/nm
    fn matrix_element(
        &self,
        context: &ScatteringContext,
        k: &Vector3<f64>,
        k_prime: &Vector3<f64>,
    ) -> f64;

    /// The closed-form rate in 1/s of a state of an isotropic band
    fn isotropic_rate(&self, context: &ScatteringContext, state: &KState) -> f64;

    /// Whether vanishing integrated rates are replaced by a floor value
    fn has_rate_floor(&self) -> bool {
        true
    }
}

/// The norm of `k - k_prime`, warning when two distinct states share a wavevector
pub(crate) fn wavevector_difference(k: &Vector3<f64>, k_prime: &Vector3<f64>) -> Option<f64> {
    let norm = (k - k_prime).norm();
    if norm == 0. {
        tracing::warn!("Identical wavevectors passed to an elastic matrix element");
        None
    } else {
        Some(norm)
    }
}

/// The orbital overlap `(a a' + X c c')^2` of two states
pub fn overlap(state: &KState, other: &KState, cosine: f64) -> f64 {
    (state.a * other.a + cosine * state.c * other.c).powi(2)
}

/// The angular integrand of an elastic rate from state `(band, k)` to `neighbor`
fn elastic_integrand(
    scatterer: &dyn ElasticScattering,
    context: &ScatteringContext,
    grid: &CarrierGrid,
    band: usize,
    k: usize,
    neighbor: &Neighbor,
) -> f64 {
    let state = grid.state(band, k);
    let other = grid.state(neighbor.band, neighbor.k);
    if state.cartesian == other.cartesian {
        return 0.;
    }
    (1. - neighbor.cosine)
        * other.norm_k().powi(2)
        * scatterer.matrix_element(context, &state.cartesian, &other.cartesian)
        * overlap(state, other, neighbor.cosine)
        / (other.norm_v() / 3_f64.sqrt())
}

/// The rate of a single state in 1/s, integrated over its equal-energy neighbour set
pub fn anisotropic_rate(
    scatterer: &dyn ElasticScattering,
    context: &ScatteringContext,
    grid: &CarrierGrid,
    neighbors: &[Neighbor],
    band: usize,
    k: usize,
) -> Result<f64, ScatteringError> {
    let integral = integrate_over_x(neighbors, |neighbor| {
        Vector3::repeat(elastic_integrand(scatterer, context, grid, band, k, neighbor))
    })
    .ok_or(ScatteringError::EmptyNeighbourSet {
        carrier: context.carrier,
        band,
        k,
    })?;
    let mut rate =
        integral.x.abs() * ANGULAR_RATE_CONVERSION * std::f64::consts::PI / context.constants.hbar;

    let mechanism = scatterer.mechanism();
    if rate < RATE_FLOOR && scatterer.has_rate_floor() {
        tracing::warn!(
            "{mechanism} rate of {}-type band {band} point {k} is only {rate:.3e} 1/s, replaced by {RATE_FLOOR_FILL:e}",
            context.carrier
        );
        rate = RATE_FLOOR_FILL;
    }
    if rate > RATE_CEILING {
        tracing::warn!(
            "{mechanism} rate of {}-type band {band} point {k} is very large, {rate:.3e} 1/s",
            context.carrier
        );
    }
    Ok(rate)
}

/// The elastic rates of every state of a carrier type at one condition
#[derive(Clone, Debug)]
pub struct ElasticRates {
    /// The rate of each enabled mechanism in 1/s
    pub mechanisms: Vec<(ElasticMechanism, Array2<Vector3<f64>>)>,
    /// The sum of all enabled mechanisms
    pub total: Array2<Vector3<f64>>,
    /// The inverse of the total rate in s
    pub relaxation_time: Array2<Vector3<f64>>,
}

impl ElasticRates {
    /// Evaluate every enabled mechanism on every state of `grid`
    ///
    /// `neighbors` must hold the equal-energy sets unless `isotropic` is set.
    #[tracing::instrument(name = "Elastic scattering", level = "info", skip_all, fields(carrier = %context.carrier, temperature = context.temperature))]
    pub fn evaluate(
        context: &ScatteringContext,
        grid: &CarrierGrid,
        neighbors: Option<&NeighborTable>,
        mechanisms: &[ElasticMechanism],
        isotropic: bool,
        pool: &WorkerPool,
    ) -> Result<Self, ScatteringError> {
        let shape = (grid.num_bands(), grid.num_kpoints());
        let num_states = shape.0 * shape.1;
        let mut total = Array2::from_elem(shape, Vector3::repeat(context.constants.gs));
        let mut rates = Vec::with_capacity(mechanisms.len());

        for &mechanism in mechanisms {
            let scatterer = mechanism.scatterer();
            let values = if isotropic {
                pool.map_indices_sized(num_states, num_states, |index| {
                    let (band, k) = (index / shape.1, index % shape.1);
                    Ok::<_, ScatteringError>(scatterer.isotropic_rate(context, grid.state(band, k)))
                })?
            } else {
                let table = neighbors.ok_or(ScatteringError::MissingNeighbours("anisotropic elastic"))?;
                pool.map_indices_sized(num_states, num_states, |index| {
                    let (band, k) = (index / shape.1, index % shape.1);
                    anisotropic_rate(scatterer, context, grid, &table.elastic[[band, k]], band, k)
                })?
            };
            let values = Array2::from_shape_vec(shape, values.into_iter().map(Vector3::repeat).collect())
                .map_err(|e| crate::error::BuildError::Mesh(e.to_string()))?;
            total.zip_mut_with(&values, |total, rate| *total += rate);
            tracing::debug!(
                "Mean {mechanism} rate {:.4e} 1/s",
                values.iter().map(|rate| rate.x).sum::<f64>() / num_states as f64
            );
            rates.push((mechanism, values));
        }

        let relaxation_time = total.map(|rate| rate.map(|r| 1. / r));
        Ok(Self {
            mechanisms: rates,
            total,
            relaxation_time,
        })
    }

    /// The rate of a single mechanism, if it was enabled
    pub fn mechanism(&self, mechanism: ElasticMechanism) -> Option<&Array2<Vector3<f64>>> {
        self.mechanisms
            .iter()
            .find(|(enabled, _)| *enabled == mechanism)
            .map(|(_, rates)| rates)
    }
}

#[cfg(test)]
mod test {
    use super::{
        anisotropic_rate, overlap, ElasticMechanism, ElasticRates, ElasticScattering,
        ScatteringContext,
    };
    use crate::{
        band::BandExtremum,
        carrier::CarrierType,
        constants::PhysicalConstants,
        kgrid::{CarrierGrid, KState},
        material::Material,
        neighbors::{NeighborSettings, NeighborTable},
        workers::WorkerPool,
    };
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};
    use ndarray::Array2;

    fn state(cartesian: Vector3<f64>, energy: f64) -> KState {
        KState {
            fractional: cartesian / 10.,
            cartesian,
            old_cartesian: cartesian,
            energy,
            velocity: Vector3::repeat(1e7),
            effective_mass: Matrix3::identity(),
            a: 1.,
            c: 0.,
            mesh_index: 0,
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

    #[test]
    fn mechanisms_are_named_in_upper_case() {
        let mechanisms: Vec<ElasticMechanism> =
            serde_json::from_str(r#"["ACD", "IMP", "PIE", "DIS"]"#).unwrap();
        assert_eq!(
            mechanisms,
            vec![
                ElasticMechanism::Acd,
                ElasticMechanism::Imp,
                ElasticMechanism::Pie,
                ElasticMechanism::Dis
            ]
        );
        assert_eq!(ElasticMechanism::Pie.to_string(), "PIE");
        for mechanism in mechanisms {
            assert_eq!(mechanism.scatterer().mechanism(), mechanism);
        }
    }

    #[test]
    fn overlap_of_s_like_states_is_unity() {
        let a = state(Vector3::new(1., 0., 0.), 0.);
        let b = state(Vector3::new(0., 1., 0.), 0.);
        assert_relative_eq!(overlap(&a, &b, 0.3), 1.);
    }

    #[test]
    fn a_state_alone_in_its_shell_is_floored() {
        let material = Material::GaAs.get_info::<f64>();
        let constants = PhysicalConstants::default();
        let context = ScatteringContext {
            carrier: CarrierType::N,
            temperature: 300.,
            inverse_screening_length: 0.1,
            impurity_concentration: 1e18,
            lattice_c: 5.65,
            material: &material,
            constants: &constants,
        };
        let grid = grid(vec![
            state(Vector3::new(0.1, 0., 0.), 0.01),
            state(Vector3::new(0.2, 0., 0.), 0.02),
        ]);
        // Only the state itself is in the set, so the integral vanishes
        let neighbors = vec![crate::neighbors::Neighbor {
            cosine: 1.,
            band: 0,
            k: 0,
            forced: false,
        }];
        let rate =
            anisotropic_rate(ElasticMechanism::Acd.scatterer(), &context, &grid, &neighbors, 0, 0).unwrap();
        assert_eq!(rate, 1e10);
        assert!(anisotropic_rate(ElasticMechanism::Acd.scatterer(), &context, &grid, &[], 0, 0).is_err());
    }

    #[test]
    fn relaxation_time_inverts_the_total_rate() {
        let material = Material::GaAs.get_info::<f64>();
        let constants = PhysicalConstants::default();
        let context = ScatteringContext {
            carrier: CarrierType::N,
            temperature: 300.,
            inverse_screening_length: 0.1,
            impurity_concentration: 1e18,
            lattice_c: 5.65,
            material: &material,
            constants: &constants,
        };
        let grid = grid(vec![
            state(Vector3::new(0.1, 0., 0.), 0.01),
            state(Vector3::new(0., 0.1, 0.), 0.01),
            state(Vector3::new(0., 0., 0.1), 0.01),
        ]);
        let table = NeighborTable::build(&grid, &NeighborSettings::default(), None);
        let pool = WorkerPool::sequential().unwrap();
        let mechanisms = [ElasticMechanism::Acd, ElasticMechanism::Pie];
        for isotropic in [true, false] {
            let rates =
                ElasticRates::evaluate(&context, &grid, Some(&table), &mechanisms, isotropic, &pool)
                    .unwrap();
            let acd = rates.mechanism(ElasticMechanism::Acd).unwrap();
            let pie = rates.mechanism(ElasticMechanism::Pie).unwrap();
            assert!(rates.mechanism(ElasticMechanism::Imp).is_none());
            for ((index, total), tau) in rates.total.indexed_iter().zip(rates.relaxation_time.iter()) {
                assert_relative_eq!(
                    total.x,
                    acd[index].x + pie[index].x + constants.gs,
                    max_relative = 1e-12
                );
                assert_relative_eq!(tau.x * total.x, 1., epsilon = 1e-12);
            }
        }
    }
}

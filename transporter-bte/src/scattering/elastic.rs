//! The four elastic mechanisms
//!
//! Matrix elements take Cartesian wavevectors in 1/nm. The isotropic rates treat the band as
//! one dimensional along each axis, using `|v| / √3` as the velocity.

use super::{wavevector_difference, ElasticMechanism, ElasticScattering, ScatteringContext};
use crate::kgrid::KState;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Converts the isotropic ionized impurity rate to 1/s
const IMPURITY_RATE_CONVERSION: f64 = 3.89564386e27;
/// Converts the isotropic dislocation rate to 1/s
const DISLOCATION_RATE_CONVERSION: f64 = 2.43146974985767e42 * 1.60217657 / 1e8;

/// The isotropic velocity and the mixing coefficient of the p-like component
fn isotropic_parameters(state: &KState) -> (f64, f64, f64) {
    (state.norm_v() / 3_f64.sqrt(), state.norm_k(), state.c)
}

/// Scattering by the deformation potential of longitudinal acoustic phonons, in the elastic limit
#[derive(Copy, Clone, Debug)]
pub struct AcousticDeformation;

impl ElasticScattering for AcousticDeformation {
    fn mechanism(&self) -> ElasticMechanism {
        ElasticMechanism::Acd
    }

    fn prefactor(&self, context: &ScatteringContext) -> f64 {
        let constants = context.constants;
        let deformation_potential = context.material.deformation_potential(context.carrier);
        1e18 * constants.e * context.thermal_energy() * deformation_potential.powi(2)
            / (4. * PI.powi(2) * constants.hbar * context.material.c_el)
    }

    fn matrix_element(
        &self,
        context: &ScatteringContext,
        k: &Vector3<f64>,
        k_prime: &Vector3<f64>,
    ) -> f64 {
        match wavevector_difference(k, k_prime) {
            Some(_) => self.prefactor(context),
            None => 0.,
        }
    }

    fn isotropic_rate(&self, context: &ScatteringContext, state: &KState) -> f64 {
        let (v, k, c) = isotropic_parameters(state);
        let constants = context.constants;
        let deformation_potential = context.material.deformation_potential(context.carrier);
        context.thermal_energy() * deformation_potential.powi(2) * k.powi(2)
            / (3. * PI * constants.hbar.powi(2) * context.material.c_el * 1e9 * v)
            * (3. - 8. * c.powi(2) + 6. * c.powi(4))
            * constants.e
            * 1e20
    }
}

/// Scattering by screened ionised donors and acceptors
#[derive(Copy, Clone, Debug)]
pub struct IonizedImpurity;

impl ElasticScattering for IonizedImpurity {
    fn mechanism(&self) -> ElasticMechanism {
        ElasticMechanism::Imp
    }

    fn prefactor(&self, context: &ScatteringContext) -> f64 {
        let constants = context.constants;
        0.001 / constants.e.powi(2) * constants.e.powi(4) * context.impurity_concentration
            / (4. * PI.powi(2)
                * context.material.epsilon_s.powi(2)
                * constants.epsilon_0.powi(2)
                * constants.hbar)
    }

    fn matrix_element(
        &self,
        context: &ScatteringContext,
        k: &Vector3<f64>,
        k_prime: &Vector3<f64>,
    ) -> f64 {
        match wavevector_difference(k, k_prime) {
            Some(difference) => {
                self.prefactor(context)
                    / (difference.powi(2) + context.inverse_screening_length.powi(2)).powi(2)
            }
            None => 0.,
        }
    }

    /// The Brooks-Herring rate with the admixture corrections of Dingle
    fn isotropic_rate(&self, context: &ScatteringContext, state: &KState) -> f64 {
        let (v, k, c) = isotropic_parameters(state);
        let constants = context.constants;
        let beta = context.inverse_screening_length;
        let (beta2, k2) = (beta.powi(2), k.powi(2));
        let b_ii = (4. * k2 / beta2) / (1. + 4. * k2 / beta2)
            + 8. * (beta2 + 2. * k2) / (beta2 + 4. * k2) * c.powi(2)
            + (3. * beta2.powi(2) + 6. * beta2 * k2 - 8. * k2.powi(2)) / ((beta2 + 4. * k2) * k2)
                * c.powi(4);
        let d_ii = 1. + 2. * beta2 * c.powi(2) / k2 + 3. * beta2.powi(2) * c.powi(4) / (4. * k2.powi(2));

        (constants.e.powi(4) * context.impurity_concentration.abs()
            / (8. * PI
                * v
                * context.material.epsilon_s.powi(2)
                * constants.epsilon_0.powi(2)
                * constants.hbar.powi(2)
                * k2)
            * (d_ii * (1. + 4. * k2 / beta2).ln() - b_ii)
            * IMPURITY_RATE_CONVERSION)
            .abs()
    }
}

/// Scattering by the piezoelectric field of acoustic phonons
#[derive(Copy, Clone, Debug)]
pub struct Piezoelectric;

impl ElasticScattering for Piezoelectric {
    fn mechanism(&self) -> ElasticMechanism {
        ElasticMechanism::Pie
    }

    fn prefactor(&self, context: &ScatteringContext) -> f64 {
        let constants = context.constants;
        1e9 / constants.e * constants.e.powi(2) * context.thermal_energy() * context.material.p_pie.powi(2)
            / (4. * PI.powi(2) * constants.hbar * constants.epsilon_0 * context.material.epsilon_s)
    }

    fn matrix_element(
        &self,
        context: &ScatteringContext,
        k: &Vector3<f64>,
        k_prime: &Vector3<f64>,
    ) -> f64 {
        match wavevector_difference(k, k_prime) {
            Some(difference) => self.prefactor(context) / difference.powi(2),
            None => 0.,
        }
    }

    fn isotropic_rate(&self, context: &ScatteringContext, state: &KState) -> f64 {
        let (v, _, c) = isotropic_parameters(state);
        let constants = context.constants;
        constants.e.powi(2) * context.thermal_energy() * context.material.p_pie.powi(2)
            / (6. * PI * constants.hbar.powi(2) * context.material.epsilon_s * constants.epsilon_0 * v)
            * (3. - 6. * c.powi(2) + 4. * c.powi(4))
            * 100.
            / constants.e
    }
}

/// Scattering by charged threading dislocations
///
/// Only the closed form is available, the angular matrix element is negligible.
#[derive(Copy, Clone, Debug)]
pub struct Dislocation;

impl ElasticScattering for Dislocation {
    fn mechanism(&self) -> ElasticMechanism {
        ElasticMechanism::Dis
    }

    fn prefactor(&self, context: &ScatteringContext) -> f64 {
        context.constants.gs
    }

    fn matrix_element(
        &self,
        context: &ScatteringContext,
        k: &Vector3<f64>,
        k_prime: &Vector3<f64>,
    ) -> f64 {
        match wavevector_difference(k, k_prime) {
            Some(_) => self.prefactor(context),
            None => 0.,
        }
    }

    fn isotropic_rate(&self, context: &ScatteringContext, state: &KState) -> f64 {
        let (v, k, _) = isotropic_parameters(state);
        let constants = context.constants;
        let beta = context.inverse_screening_length;
        let spacing = context.lattice_c * constants.angstrom_to_nanometre;
        context.material.n_dis * constants.e.powi(4) * k
            / (constants.hbar.powi(2)
                * constants.epsilon_0.powi(2)
                * context.material.epsilon_s.powi(2)
                * spacing.powi(2)
                * v)
            / (beta.powi(4) * (1. + 4. * k.powi(2) / beta.powi(2)).powf(1.5))
            * DISLOCATION_RATE_CONVERSION
    }

    fn has_rate_floor(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod test {
    use super::{AcousticDeformation, IonizedImpurity, Piezoelectric};
    use crate::{
        carrier::CarrierType,
        constants::PhysicalConstants,
        kgrid::KState,
        material::Material,
        scattering::{ElasticScattering, ScatteringContext},
    };
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};

    fn state(k: f64, v: f64, c: f64) -> KState {
        let cartesian = Vector3::new(k, 0., 0.);
        KState {
            fractional: cartesian,
            cartesian,
            old_cartesian: cartesian,
            energy: 0.,
            velocity: Vector3::repeat(v),
            effective_mass: Matrix3::identity(),
            a: (1. - c * c).sqrt(),
            c,
            mesh_index: 0,
        }
    }

    fn with_context<R>(f: impl FnOnce(&ScatteringContext) -> R) -> R {
        let material = Material::GaAs.get_info::<f64>();
        let constants = PhysicalConstants::default();
        let context = ScatteringContext {
            carrier: CarrierType::N,
            temperature: 300.,
            inverse_screening_length: 0.5,
            impurity_concentration: 1e18,
            lattice_c: 5.65,
            material: &material,
            constants: &constants,
        };
        f(&context)
    }

    #[test]
    fn acoustic_rate_scales_with_temperature_and_wavevector() {
        with_context(|context| {
            let base = AcousticDeformation.isotropic_rate(context, &state(0.5, 1e7, 0.));
            let hotter = ScatteringContext {
                temperature: 600.,
                ..context.clone()
            };
            assert_relative_eq!(
                AcousticDeformation.isotropic_rate(&hotter, &state(0.5, 1e7, 0.)),
                2. * base,
                max_relative = 1e-12
            );
            assert_relative_eq!(
                AcousticDeformation.isotropic_rate(context, &state(1., 1e7, 0.)),
                4. * base,
                max_relative = 1e-12
            );
            assert!(base > 0.);
        });
    }

    #[test]
    fn p_admixture_reduces_the_acoustic_rate() {
        with_context(|context| {
            let s_like = AcousticDeformation.isotropic_rate(context, &state(0.5, 1e7, 0.));
            let mixed = AcousticDeformation.isotropic_rate(context, &state(0.5, 1e7, 0.5));
            // 3 - 8 c^2 + 6 c^4 at c^2 = 1/4
            assert_relative_eq!(mixed / s_like, (3. - 2. + 0.375) / 3., max_relative = 1e-12);
        });
    }

    #[test]
    fn impurity_rate_grows_with_screening_length() {
        with_context(|context| {
            let state = state(0.5, 1e7, 0.);
            let screened = IonizedImpurity.isotropic_rate(context, &state);
            let weakly_screened = ScatteringContext {
                inverse_screening_length: 0.05,
                ..context.clone()
            };
            assert!(IonizedImpurity.isotropic_rate(&weakly_screened, &state) > screened);
            assert!(screened > 0.);
        });
    }

    #[test]
    fn matrix_elements_vanish_for_identical_wavevectors() {
        with_context(|context| {
            let k = Vector3::new(0.1, 0.2, 0.3);
            assert_eq!(Piezoelectric.matrix_element(context, &k, &k), 0.);
            assert_eq!(IonizedImpurity.matrix_element(context, &k, &k), 0.);
            let k_prime = Vector3::new(0.1, 0.2, 0.4);
            assert_relative_eq!(
                Piezoelectric.matrix_element(context, &k, &k_prime),
                Piezoelectric.prefactor(context) / 0.01,
                max_relative = 1e-10
            );
        });
    }
}

//! # Transport
//!
//! Macroscopic transport coefficients from the solved perturbations.
//!
//! Mobilities follow from the volume integral of the perturbation times the isotropic velocity,
//! normalised by the equilibrium carrier count. Each elastic mechanism is evaluated in the
//! relaxation time approximation, polar optical scattering from its own perturbation and the
//! overall value from the full solution. Where the full solution is unphysical the mechanisms are
//! combined by Matthiessen's rule instead.

use crate::{
    bte::Perturbation,
    carrier::{CarrierType, PerCarrier},
    constants::PhysicalConstants,
    fermi::SeebeckIntegrals,
    forces::DrivingForces,
    kgrid::KGrid,
    material::MaterialParameters,
    scattering::{ElasticRates, InelasticMechanism},
    statistics::{f0, fermi_integral, hole_occupation},
};
use nalgebra::Vector3;
use serde::Serialize;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Keeps the Matthiessen sum finite when a mechanism yields no mobility
const MOBILITY_GUARD: f64 = 1e-50;
/// Converts cm^2/Vs to m^2/Vs
const SQUARE_CENTIMETRE_TO_SQUARE_METRE: f64 = 1e-4;

/// The reciprocal sum of the mechanism mobilities
pub fn matthiessen<'a>(mobilities: impl IntoIterator<Item = &'a Vector3<f64>>) -> Vector3<f64> {
    mobilities
        .into_iter()
        .fold(Vector3::zeros(), |sum, mobility| {
            sum + mobility.map(|mu| 1. / (mu + MOBILITY_GUARD))
        })
        .map(|inverse| 1. / inverse)
}

/// The overall mobility if it is physical, otherwise the Matthiessen average
///
/// The full solution cannot vanish and cannot exceed the mobility limited by any single mechanism.
pub fn accept_overall(
    overall: Vector3<f64>,
    mechanisms: &[Vector3<f64>],
    average: Vector3<f64>,
) -> Vector3<f64> {
    let norm = overall.norm();
    let faulty = norm == 0.
        || mechanisms.iter().any(|mobility| norm > mobility.norm())
        || norm > average.norm();
    if faulty {
        tracing::debug!("Overall mobility {norm:.4e} replaced by the Matthiessen average");
        average
    } else {
        overall
    }
}

/// Mobilities of one carrier type at one condition in cm^2/Vs
#[derive(Clone, Debug, Serialize)]
pub struct Mobility {
    /// The mobility limited by each enabled mechanism
    pub mechanisms: BTreeMap<String, Vector3<f64>>,
    /// The mobility of the full solution, or the average where that is unphysical
    pub overall: Vector3<f64>,
    /// Matthiessen sum of the mechanisms
    pub average: Vector3<f64>,
    /// The single parabolic band acoustic phonon estimate
    pub spb_acd: f64,
}

/// The carrier dependent inputs of the transport integrals at one condition
#[derive(Copy, Clone, Debug)]
pub struct TransportInputs<'a> {
    /// The carrier type being integrated
    pub carrier: CarrierType,
    /// Fermi level in eV
    pub fermi: f64,
    /// Temperature in K
    pub temperature: f64,
    /// Reference electric field in eV/cm
    pub electric_field: f64,
    /// Driving forces of the same carrier and condition
    pub forces: &'a DrivingForces,
    /// Elastic rates of the same carrier and condition
    pub elastic: &'a ElasticRates,
    /// The converged solution
    pub perturbation: &'a Perturbation,
    /// Whether polar optical scattering was iterated
    pub polar_optical: bool,
}

impl Mobility {
    /// Integrate the mobility of every mechanism and of the full solution
    pub fn evaluate(
        kgrid: &KGrid,
        inputs: &TransportInputs,
        material: &MaterialParameters<f64>,
        constants: &PhysicalConstants,
    ) -> Self {
        let carrier = inputs.carrier;
        let thermal_energy = constants.thermal_energy(inputs.temperature);
        let occupied = kgrid.integrate_over_mesh(carrier, |energy| {
            match carrier {
                CarrierType::N => f0(energy, inputs.fermi, thermal_energy),
                CarrierType::P => hole_occupation(energy, inputs.fermi, thermal_energy),
            }
        });
        if occupied == 0. {
            tracing::warn!("No {carrier}-type carriers on the grid, mobilities are set to zero");
        }
        let denominator = 3. * inputs.electric_field * occupied;
        let sqrt_3 = 3_f64.sqrt();
        let integrate = |g: &dyn Fn(usize, usize) -> Vector3<f64>| {
            if denominator == 0. {
                return Vector3::zeros();
            }
            kgrid.integrate_over_states(carrier, |band, k, state| {
                g(band, k) * (state.norm_v() / sqrt_3)
            }) / denominator
        };

        let mut mechanisms = BTreeMap::new();
        for (mechanism, rates) in inputs.elastic.mechanisms.iter() {
            let mobility = integrate(&|band, k| {
                inputs.forces.electric[[band, k]].component_div(&rates[[band, k]])
            });
            mechanisms.insert(mechanism.to_string(), mobility);
        }
        if inputs.polar_optical {
            let mobility = integrate(&|band, k| inputs.perturbation.g_pop[[band, k]]);
            mechanisms.insert(InelasticMechanism::Pop.to_string(), mobility);
        }
        let overall = integrate(&|band, k| inputs.perturbation.g[[band, k]]);

        let average = matthiessen(mechanisms.values());
        let limits = mechanisms.values().copied().collect::<Vec<_>>();
        let overall = accept_overall(overall, &limits, average);
        let extremum = kgrid.carrier(carrier).extremum();
        let spb_acd = spb_acd(
            carrier,
            extremum.effective_mass[(0, 0)].abs(),
            extremum.energy,
            inputs.fermi,
            inputs.temperature,
            material,
            constants,
        );
        tracing::debug!("{carrier}-type overall mobility {overall:?} cm^2/Vs");

        Self {
            mechanisms,
            overall,
            average,
            spb_acd,
        }
    }
}

/// The acoustic phonon limited mobility of a single parabolic band in cm^2/Vs
///
/// `effective_mass` is in units of the free electron mass.
pub fn spb_acd(
    carrier: CarrierType,
    effective_mass: f64,
    band_edge: f64,
    fermi: f64,
    temperature: f64,
    material: &MaterialParameters<f64>,
    constants: &PhysicalConstants,
) -> f64 {
    let thermal_energy = constants.thermal_energy(temperature);
    // Holes are integrated downwards from the valence band maximum
    let (fermi, band_edge) = match carrier {
        CarrierType::N => (fermi, band_edge),
        CarrierType::P => (-fermi, -band_edge),
    };
    let ratio = fermi_integral(0., fermi, thermal_energy, band_edge)
        / fermi_integral(0.5, fermi, thermal_energy, band_edge);
    2_f64.sqrt() * PI * constants.hbar.powi(4) * constants.e * material.c_el * 1e9
        / (3.
            * (effective_mass * constants.m_e).powf(2.5)
            * thermal_energy.powf(1.5)
            * material.deformation_potential(carrier).powi(2))
        * ratio
        * constants.e.sqrt()
        * 1e4
}

/// The Seebeck coefficient of one carrier type in μV/K
pub fn seebeck(
    integrals: &SeebeckIntegrals,
    fermi: f64,
    band_edge: f64,
    temperature: f64,
    constants: &PhysicalConstants,
) -> f64 {
    -1e6 * constants.k_b
        * (integrals.ratio() - (fermi - band_edge) / constants.thermal_energy(temperature))
}

/// Transport coefficients of one carrier type at one condition
#[derive(Clone, Debug, Serialize)]
pub struct CarrierTransport {
    /// Mobilities in cm^2/Vs
    pub mobility: Mobility,
    /// μV/K
    pub seebeck: f64,
    /// S/cm
    pub conductivity: Vector3<f64>,
    /// μW/cm K^2
    pub power_factor: Vector3<f64>,
    /// Relaxation time implied by the overall mobility and the band edge mass, in s
    pub relaxation_time: Vector3<f64>,
}

impl CarrierTransport {
    /// `concentration` is the calculated signed concentration of the carrier type in 1/cm^3
    pub fn new(
        mobility: Mobility,
        seebeck: f64,
        concentration: f64,
        effective_mass: f64,
        constants: &PhysicalConstants,
    ) -> Self {
        let conductivity = mobility.overall * constants.e * concentration.abs();
        let relaxation_time = mobility.overall
            * (SQUARE_CENTIMETRE_TO_SQUARE_METRE * constants.m_e * effective_mass / constants.e);
        let finite = |values: &Vector3<f64>| values.iter().all(|value| value.is_finite());
        let (conductivity, relaxation_time) = if finite(&conductivity) && finite(&relaxation_time) {
            (conductivity, relaxation_time)
        } else {
            tracing::warn!(
                "Mobility {:?} at {concentration:.3e} cm^-3 is not finite, its conductivity is set to zero",
                mobility.overall
            );
            (Vector3::zeros(), Vector3::zeros())
        };
        let power_factor = conductivity * seebeck.powi(2) / 1e6;
        Self {
            mobility,
            seebeck,
            conductivity,
            power_factor,
            relaxation_time,
        }
    }

    /// The direction averaged conductivity
    pub fn mean_conductivity(&self) -> f64 {
        self.conductivity.mean()
    }
}

/// The Seebeck coefficient of both carrier types together, weighted by their conductivities
pub fn combined_seebeck(transport: &PerCarrier<CarrierTransport>) -> f64 {
    let (numerator, total) = CarrierType::ALL
        .into_iter()
        .filter_map(|carrier| {
            let sigma = transport[carrier].mean_conductivity();
            let seebeck = transport[carrier].seebeck;
            if sigma.is_finite() && seebeck.is_finite() {
                Some((sigma * seebeck, sigma))
            } else {
                tracing::warn!(
                    "Skipping the non-finite {carrier}-type contribution to the Seebeck coefficient"
                );
                None
            }
        })
        .fold((0_f64, 0_f64), |(numerator, total), (weighted, sigma)| {
            (numerator + weighted, total + sigma)
        });
    if total == 0. {
        return 0.;
    }
    numerator / total
}

#[cfg(test)]
mod test {
    use super::{
        accept_overall, combined_seebeck, matthiessen, seebeck, spb_acd, CarrierTransport,
        Mobility,
    };
    use crate::{
        carrier::{CarrierType, PerCarrier},
        constants::PhysicalConstants,
        fermi::SeebeckIntegrals,
        material::Material,
    };
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    proptest! {
        #[test]
        fn accepted_mobility_is_bounded_by_every_mechanism(
            limits in prop::collection::vec(1.0..1e5_f64, 1..5),
            overall in 0.0..2e5_f64,
        ) {
            let mechanisms = limits.iter().map(|&mu| Vector3::repeat(mu)).collect::<Vec<_>>();
            let average = matthiessen(mechanisms.iter());
            let accepted = accept_overall(Vector3::repeat(overall), &mechanisms, average);
            prop_assert!(accepted.norm() > 0.);
            prop_assert!(accepted.norm() <= average.norm() * (1. + 1e-12));
            for mechanism in mechanisms.iter() {
                prop_assert!(average.norm() <= mechanism.norm() * (1. + 1e-12));
            }
        }
    }

    #[test]
    fn matthiessen_adds_inverse_mobilities() {
        let mobilities = [Vector3::repeat(1000.), Vector3::repeat(3000.)];
        let average = matthiessen(mobilities.iter());
        assert_relative_eq!(average, Vector3::repeat(750.), max_relative = 1e-12);
    }

    #[test]
    fn overall_never_exceeds_the_average() {
        let mechanisms = [Vector3::repeat(1000.), Vector3::repeat(3000.)];
        let average = matthiessen(mechanisms.iter());
        // Physical overall values are kept
        let overall = Vector3::repeat(700.);
        assert_eq!(accept_overall(overall, &mechanisms, average), overall);
        // Too large, or vanishing, values are replaced
        for overall in [Vector3::repeat(900.), Vector3::repeat(5000.), Vector3::zeros()] {
            let accepted = accept_overall(overall, &mechanisms, average);
            assert_eq!(accepted, average);
            assert!(accepted.norm() <= average.norm());
        }
    }

    #[test]
    fn seebeck_of_a_degenerate_level_is_negative_for_electrons() {
        let constants = PhysicalConstants::default();
        let kt = constants.thermal_energy(300.);
        let integrals = SeebeckIntegrals {
            numerator: 2.,
            denominator: 1.,
        };
        // A Fermi level at the band edge leaves the mean carrier energy of 2 kT
        let value = seebeck(&integrals, 1., 1., 300., &constants);
        assert_relative_eq!(value, -2e6 * constants.k_b, max_relative = 1e-12);
        let deeper = seebeck(&integrals, 1. - kt, 1., 300., &constants);
        assert!(deeper < value);
    }

    #[test]
    fn single_band_mobility_falls_with_temperature() {
        let constants = PhysicalConstants::default();
        let gaas = Material::GaAs.get_info::<f64>();
        let cold = spb_acd(CarrierType::N, 0.067, 1.5, 1.3, 200., &gaas, &constants);
        let hot = spb_acd(CarrierType::N, 0.067, 1.5, 1.3, 400., &gaas, &constants);
        assert!(cold > hot);
        assert!(hot > 0.);
    }

    fn transport(mobility: f64, seebeck: f64, concentration: f64) -> CarrierTransport {
        let constants = PhysicalConstants::default();
        CarrierTransport::new(
            Mobility {
                mechanisms: BTreeMap::new(),
                overall: Vector3::repeat(mobility),
                average: Vector3::repeat(mobility),
                spb_acd: 0.,
            },
            seebeck,
            concentration,
            0.067,
            &constants,
        )
    }

    #[test]
    fn conductivity_and_combined_seebeck() {
        let constants = PhysicalConstants::default();
        let n = transport(1000., -200., -1e18);
        assert_relative_eq!(n.conductivity.x, 1000. * constants.e * 1e18, max_relative = 1e-12);
        assert_relative_eq!(n.power_factor.x, n.conductivity.x * 4e4 / 1e6, max_relative = 1e-12);

        let p = transport(100., 300., 1e17);
        let combined = combined_seebeck(&PerCarrier::new(n.clone(), p.clone()));
        let expected = (n.conductivity.x * -200. + p.conductivity.x * 300.)
            / (n.conductivity.x + p.conductivity.x);
        assert_relative_eq!(combined, expected, max_relative = 1e-12);
    }

    #[test]
    fn minority_carriers_without_mobility_do_not_poison_the_combined_seebeck() {
        let n = transport(1000., -200., -1e18);
        let p = transport(f64::INFINITY, 5000., 0.);
        assert_eq!(p.conductivity, Vector3::zeros());
        assert_eq!(p.relaxation_time, Vector3::zeros());
        assert!(p.power_factor.iter().all(|value| value.is_finite()));

        let combined = combined_seebeck(&PerCarrier::new(n.clone(), p.clone()));
        assert!(combined.is_finite());
        assert_relative_eq!(combined, -200., max_relative = 1e-12);

        let mut broken = p;
        broken.seebeck = f64::NAN;
        broken.conductivity = Vector3::repeat(1.);
        let combined = combined_seebeck(&PerCarrier::new(n, broken));
        assert_relative_eq!(combined, -200., max_relative = 1e-12);
    }
}

//! # Driving forces
//!
//! The equilibrium occupation of every state and the linear-response driving terms of the
//! Boltzmann equation, for a small reference electric field and temperature gradient.

use crate::{
    constants::PhysicalConstants,
    fermi::SeebeckIntegrals,
    kgrid::CarrierGrid,
    statistics::{df0_de, f0, hole_occupation},
};
use nalgebra::Vector3;
use ndarray::Array2;
use serde::Deserialize;

/// Magnitudes of the applied perturbations
#[derive(Clone, Debug, Deserialize)]
pub struct DrivingSettings {
    /// Reference electric field in eV/cm, the carrier charge is absorbed in the unit
    pub electric_field: f64,
    /// Reference temperature gradient in K/cm
    pub temperature_gradient: f64,
}

impl Default for DrivingSettings {
    fn default() -> Self {
        Self {
            electric_field: 1.,
            temperature_gradient: 10.,
        }
    }
}

/// The equilibrium occupation and driving terms of one carrier type at one condition
///
/// Every array is indexed by `(band, k)`. Scalars are stored as vectors with three equal
/// components so they combine directly with the per-direction perturbations.
#[derive(Clone, Debug)]
pub struct DrivingForces {
    /// Equilibrium occupation
    pub f0: Array2<Vector3<f64>>,
    /// Energy derivative of the equilibrium occupation in 1/eV
    pub df0_de: Array2<Vector3<f64>>,
    /// The electric field term `-df0/dE v E`
    pub electric: Array2<Vector3<f64>>,
    /// The temperature gradient term
    pub thermal: Array2<Vector3<f64>>,
}

impl DrivingForces {
    /// Evaluate the occupation and both driving terms on every state of `grid`
    pub fn evaluate(
        grid: &CarrierGrid,
        fermi: f64,
        temperature: f64,
        seebeck: &SeebeckIntegrals,
        settings: &DrivingSettings,
        constants: &PhysicalConstants,
    ) -> Self {
        let thermal_energy = constants.thermal_energy(temperature);
        let edge = grid.extremum().energy;
        let ratio = seebeck.ratio();
        let states = grid.states();

        let occupation =
            states.map(|state| Vector3::repeat(f0(state.energy, fermi, thermal_energy)));
        let derivative =
            states.map(|state| Vector3::repeat(df0_de(state.energy, fermi, thermal_energy)));
        let electric = states.map(|state| {
            -state.velocity * df0_de(state.energy, fermi, thermal_energy) * settings.electric_field
        });
        let thermal = states.map(|state| {
            let (energy, fermi) = (state.energy - edge, fermi - edge);
            -state.velocity
                * f0(energy, fermi, thermal_energy)
                * hole_occupation(energy, fermi, thermal_energy)
                * (energy / thermal_energy - ratio)
                * settings.temperature_gradient
                / temperature
        });

        Self {
            f0: occupation,
            df0_de: derivative,
            electric,
            thermal,
        }
    }
}

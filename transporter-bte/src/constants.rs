// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Constants
//!
//! Defines physical constants used in the simulation, and the immutable `PhysicalConstants`
//! value which is handed to every stage of the calculation.

/// The Boltzmann constant in eV / K
pub const BOLTZMANN_EV: f64 = 8.6173303e-5;
/// Single electron charge in C
pub const ELECTRON_CHARGE: f64 = 1.6021766208e-19;
/// Single electron mass in kg
pub const ELECTRON_MASS: f64 = 9.10938356e-31;
/// Permittivity of free space in F / m
pub const EPSILON_0: f64 = 8.854187817e-12;
/// Reduced Planck constant in J s
pub const HBAR: f64 = 1.0545718e-34;
/// Reduced Planck constant in eV s
pub const HBAR_EV: f64 = 6.582119514e-16;

/// Metres per Angstrom
pub const ANGSTROM_TO_METRE: f64 = 1e-10;
/// Centimetres per metre
pub const METRE_TO_CENTIMETRE: f64 = 100.0;
/// Nanometres per Angstrom
pub const ANGSTROM_TO_NANOMETRE: f64 = 0.1;

/// Added to denominators and used to seed accumulators
pub const GUARD_SMALL: f64 = 1e-32;
/// Stands in for divergent quantities
pub const GUARD_LARGE: f64 = 1e32;

/// Physical constants and unit conversions in the units used throughout the solver
///
/// Energies are in eV, wavevectors in 1/nm, velocities in cm/s and concentrations in 1/cm^3.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalConstants {
    /// Reduced Planck constant in eV s
    pub hbar: f64,
    /// Reduced Planck constant in J s
    pub hbar_si: f64,
    /// Boltzmann constant in eV / K
    pub k_b: f64,
    /// Elementary charge in C
    pub e: f64,
    /// Free electron mass in kg
    pub m_e: f64,
    /// Vacuum permittivity in F / m
    pub epsilon_0: f64,
    /// Angstrom to metre
    pub angstrom_to_metre: f64,
    /// Metre to centimetre
    pub metre_to_centimetre: f64,
    /// Angstrom to nanometre
    pub angstrom_to_nanometre: f64,
    /// A vanishing positive value used to seed sums and protect denominators
    pub gs: f64,
    /// A very large value standing in for divergent quantities
    pub gl: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            hbar: HBAR_EV,
            hbar_si: HBAR,
            k_b: BOLTZMANN_EV,
            e: ELECTRON_CHARGE,
            m_e: ELECTRON_MASS,
            epsilon_0: EPSILON_0,
            angstrom_to_metre: ANGSTROM_TO_METRE,
            metre_to_centimetre: METRE_TO_CENTIMETRE,
            angstrom_to_nanometre: ANGSTROM_TO_NANOMETRE,
            gs: GUARD_SMALL,
            gl: GUARD_LARGE,
        }
    }
}

impl PhysicalConstants {
    /// Thermal energy k_B T in eV
    pub fn thermal_energy(&self, temperature: f64) -> f64 {
        self.k_b * temperature
    }

    /// Converts a volume in cubic Angstrom to cubic centimetres
    pub fn cubic_angstrom_to_cubic_centimetre(&self) -> f64 {
        (self.angstrom_to_metre * self.metre_to_centimetre).powi(3)
    }
}

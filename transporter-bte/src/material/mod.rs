//! # Material
//!
//! Scattering-relevant material constants, either read from the input file or taken from one of
//! the built-in presets.

mod presets;

pub use presets::Material;

use crate::carrier::{CarrierType, PerCarrier};
use nalgebra::RealField;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: RealField + Deserialize<'de>"))]
/// Material parameters entering the scattering rates
pub struct MaterialParameters<T: RealField> {
    /// Static relative permittivity
    pub epsilon_s: T,
    /// High frequency relative permittivity
    pub epsilon_inf: T,
    /// Polar optical phonon frequency in THz
    pub w_pop: T,
    /// Elastic constant in GPa
    pub c_el: T,
    /// Acoustic deformation potential in eV for each carrier type
    #[serde(default = "default_deformation_potential")]
    pub deformation_potential: PerCarrier<T>,
    /// Dimensionless piezoelectric coefficient
    #[serde(default = "default_piezoelectric_coefficient")]
    pub p_pie: T,
    /// Dislocation density in 1/cm^2
    #[serde(default = "default_dislocation_density")]
    pub n_dis: T,
    /// Symmetric band gap correction in eV
    #[serde(default = "default_scissor")]
    pub scissor: T,
    /// Charge states of the scattering centres
    #[serde(default)]
    pub charges: Charges<T>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: RealField + Deserialize<'de>"))]
/// Charge states of the ionised scattering centres
pub struct Charges<T: RealField> {
    /// Charge of an ionised donor
    pub donor: T,
    /// Charge of an ionised acceptor
    pub acceptor: T,
    /// Charge per dislocation site
    pub dislocation: T,
}

impl<T: RealField> Default for Charges<T> {
    fn default() -> Self {
        Self {
            donor: T::one(),
            acceptor: T::one(),
            dislocation: T::one(),
        }
    }
}

fn default_deformation_potential<T: RealField>() -> PerCarrier<T> {
    let four = nalgebra::convert::<f64, T>(4.);
    PerCarrier::new(four.clone(), four)
}

fn default_piezoelectric_coefficient<T: RealField>() -> T {
    nalgebra::convert(0.15)
}

fn default_scissor<T: RealField>() -> T {
    T::zero()
}

fn default_dislocation_density<T: RealField>() -> T {
    nalgebra::convert(0.1)
}

impl<T: Copy + RealField> MaterialParameters<T> {
    /// The polar optical phonon angular frequency in rad/s
    pub fn pop_angular_frequency(&self) -> T {
        self.w_pop * nalgebra::convert(1e12) * T::two_pi()
    }

    /// The acoustic deformation potential felt by `carrier` in eV
    pub fn deformation_potential(&self, carrier: CarrierType) -> T {
        self.deformation_potential[carrier]
    }
}

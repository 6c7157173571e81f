//! # Band structure
//!
//! The band structure is consumed through the `BandSampler` trait, which evaluates the energy,
//! group velocity, effective mass and orbital character of a band at a fractional wavevector.
//! Fourier interpolated band structures live outside this crate, a parabolic model is provided
//! in `ParabolicBands`.

mod parabolic;

pub use parabolic::{BandModel, ParabolicBand, ParabolicBands};

use crate::carrier::CarrierType;
use nalgebra::{Matrix3, Vector3};

/// The s and p projections of a Bloch state
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitalCharacter {
    /// Weight of the s orbitals
    pub s: f64,
    /// Weight of the p orbitals
    pub p: f64,
}

impl OrbitalCharacter {
    /// A purely s-like state
    pub fn s_like() -> Self {
        Self { s: 1., p: 0. }
    }

    /// The normalised mixing coefficients `(a, c)` with `a^2 + c^2 = 1`
    pub fn mixing(&self) -> (f64, f64) {
        let norm = (self.s * self.s + self.p * self.p).sqrt();
        if norm == 0. {
            return (1., 0.);
        }
        let a = (self.s / norm).abs().min(1.);
        (a, (1. - a * a).sqrt())
    }
}

/// A single evaluation of the band structure
#[derive(Clone, Debug)]
pub struct BandSample {
    /// Energy in eV
    pub energy: f64,
    /// Magnitudes of the group velocity components in cm/s
    pub velocity: Vector3<f64>,
    /// Effective mass tensor in units of the free electron mass
    pub effective_mass: Matrix3<f64>,
    /// Orbital projections used by the overlap integrals
    pub orbital: OrbitalCharacter,
}

/// The extremum of the first band of a carrier type
#[derive(Clone, Debug)]
pub struct BandExtremum {
    /// Energy of the extremum in eV
    pub energy: f64,
    /// Fractional coordinate of the extremum
    pub kpoint: Vector3<f64>,
    /// Effective mass tensor at the extremum in units of the free electron mass
    pub effective_mass: Matrix3<f64>,
}

impl BandExtremum {
    /// The average of the diagonal effective mass components
    pub fn average_effective_mass(&self) -> f64 {
        self.effective_mass.trace().abs() / 3.
    }
}

/// Evaluates the band structure at arbitrary fractional wavevectors
///
/// Implementors are shared between worker threads and must give identical results for
/// identical inputs.
pub trait BandSampler: Sync {
    /// The number of bands of each carrier type, ordered away from the gap
    fn num_bands(&self, carrier: CarrierType) -> usize;
    /// The fractional coordinate of the extremum of the first band
    fn extremum_kpoint(&self, carrier: CarrierType) -> Vector3<f64>;
    /// Evaluate `band` of `carrier` at the fractional wavevector `k`
    fn sample(&self, k: &Vector3<f64>, band: usize, carrier: CarrierType) -> BandSample;

    /// Sample the first band at its extremum
    fn extremum(&self, carrier: CarrierType) -> BandExtremum {
        let kpoint = self.extremum_kpoint(carrier);
        let sample = self.sample(&kpoint, 0, carrier);
        BandExtremum {
            energy: sample.energy,
            kpoint,
            effective_mass: sample.effective_mass,
        }
    }
}

#[cfg(test)]
mod test {
    use super::OrbitalCharacter;
    use approx::assert_relative_eq;
    use rand::{thread_rng, Rng};

    #[test]
    fn mixing_coefficients_are_normalised() {
        let mut rng = thread_rng();
        for _ in 0..100 {
            let orbital = OrbitalCharacter {
                s: rng.gen_range(0.0..1.0),
                p: rng.gen_range(0.0..1.0),
            };
            let (a, c) = orbital.mixing();
            assert_relative_eq!(a * a + c * c, 1., epsilon = 1e-12);
        }
        assert_eq!(OrbitalCharacter { s: 0., p: 0. }.mixing(), (1., 0.));
        assert_eq!(OrbitalCharacter::s_like().mixing(), (1., 0.));
    }
}

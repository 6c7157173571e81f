//! # Density of states
//!
//! A tabulated density of states in states per eV per unit cell. Curves are either supplied
//! externally and normalised to a known number of states, or generated analytically for the
//! parabolic band model.

use crate::{
    band::ParabolicBands, carrier::CarrierType, constants::PhysicalConstants, error::BuildError,
};
use ndarray::Array1;
use ndarray_stats::QuantileExt;
use serde::Deserialize;

/// A density of states curve tabulated on an ascending energy mesh
#[derive(Clone, Debug)]
pub struct DensityOfStates {
    energies: Array1<f64>,
    values: Array1<f64>,
    vbm_index: usize,
    cbm_index: usize,
}

/// An externally computed curve, as read from the input file
#[derive(Clone, Debug, Deserialize)]
pub struct TabulatedDos {
    /// Ascending energies in eV
    pub energies: Vec<f64>,
    /// States per eV per unit cell
    pub values: Vec<f64>,
    /// The number of states the curve integrates to between `start` and `end`
    pub normalization_factor: f64,
    /// Lower bound of the normalisation window in eV
    pub start: f64,
    /// Upper bound of the normalisation window in eV
    pub end: f64,
}

impl DensityOfStates {
    /// Build a curve from tabulated values, locating the band edges on the mesh
    pub fn from_parts(
        energies: Vec<f64>,
        values: Vec<f64>,
        vbm: f64,
        cbm: f64,
    ) -> Result<Self, BuildError> {
        if energies.len() < 2 || energies.len() != values.len() {
            return Err(BuildError::DensityOfStates(format!(
                "a density of states needs matching energy and value arrays with at least two points, found {} and {}",
                energies.len(),
                values.len()
            )));
        }
        if energies.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(BuildError::DensityOfStates(
                "density of states energies must be strictly ascending".into(),
            ));
        }
        let mut dos = Self {
            energies: Array1::from(energies),
            values: Array1::from(values),
            vbm_index: 0,
            cbm_index: 0,
        };
        dos.vbm_index = dos.index_of(vbm);
        dos.cbm_index = dos.index_of(cbm);
        Ok(dos)
    }

    /// Build and normalise an externally supplied curve
    pub fn from_table(table: TabulatedDos, vbm: f64, cbm: f64) -> Result<Self, BuildError> {
        let mut dos = Self::from_parts(table.energies, table.values, vbm, cbm)?;
        dos.normalize(table.start, table.end, table.normalization_factor)?;
        Ok(dos)
    }

    /// The analytic density of states of a set of parabolic bands
    ///
    /// Every band contributes `g(E) = V / 2π² (2m*/ħ²)^(3/2) sqrt(|E - E_edge|)` beyond its edge, multiplied
    /// by its valley degeneracy and by the spin degeneracy.
    pub fn parabolic(
        bands: &ParabolicBands,
        window: f64,
        step: f64,
        soc: bool,
        constants: &PhysicalConstants,
    ) -> Result<Self, BuildError> {
        let vbm = bands.band_edge(CarrierType::P, 0);
        let cbm = bands.band_edge(CarrierType::N, 0);
        let emin = vbm - window;
        let emax = cbm + window;
        let num_points = ((emax - emin) / step).round() as usize + 1;
        let energies = Array1::linspace(emin, emax, num_points.max(2));

        // Direct cell volume in m^3
        let cell_volume = bands.lattice().direct_volume() * constants.angstrom_to_metre.powi(3);
        let spin = if soc { 1. } else { 2. };

        let mut values = Array1::zeros(energies.len());
        for carrier in CarrierType::ALL {
            for band in 0..crate::band::BandSampler::num_bands(bands, carrier) {
                let edge = bands.band_edge(carrier, band);
                let mass = bands.effective_mass(carrier, band) * constants.m_e;
                let prefactor = spin
                    * bands.valley_degeneracy(carrier, band) as f64
                    * cell_volume
                    / (2. * std::f64::consts::PI.powi(2))
                    * (2. * mass / constants.hbar_si.powi(2)).powf(1.5)
                    * constants.e.powf(1.5);
                values
                    .iter_mut()
                    .zip(energies.iter())
                    .for_each(|(value, &energy)| {
                        let depth = -carrier.sign() * (energy - edge);
                        if depth > 0. {
                            *value += prefactor * depth.sqrt();
                        }
                    });
            }
        }

        Self::from_parts(energies.to_vec(), values.to_vec(), vbm, cbm)
    }

    /// Rescale the curve so it integrates to `factor` states between the energies `start` and `end`
    pub fn normalize(&mut self, start: f64, end: f64, factor: f64) -> Result<(), BuildError> {
        let (start, end) = (self.index_of(start), self.index_of(end));
        let integral = (start..end)
            .map(|i| {
                (self.values[i + 1] + self.values[i]) / 2.
                    * (self.energies[i + 1] - self.energies[i])
            })
            .sum::<f64>();
        if integral <= 0. {
            return Err(BuildError::DensityOfStates(format!(
                "cannot normalise a density of states which integrates to {integral}"
            )));
        }
        tracing::debug!("DOS integral from index {start} to {end}: {integral}");
        self.values.mapv_inplace(|value| value / integral * factor);
        Ok(())
    }

    /// The index of the mesh point closest to `energy`
    pub fn index_of(&self, energy: f64) -> usize {
        self.energies
            .mapv(|e| (e - energy).abs())
            .argmin()
            .unwrap_or(0)
    }

    /// The density of states at the mesh point closest to `energy`
    pub fn value_at(&self, energy: f64) -> f64 {
        self.values[self.index_of(energy)]
    }

    /// Mesh energies in eV
    pub fn energies(&self) -> &Array1<f64> {
        &self.energies
    }

    /// States per eV per unit cell at each mesh energy
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// The mesh index of the valence band maximum
    pub fn vbm_index(&self) -> usize {
        self.vbm_index
    }

    /// The mesh index of the conduction band minimum
    pub fn cbm_index(&self) -> usize {
        self.cbm_index
    }

    /// The number of mesh points
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::DensityOfStates;
    use approx::assert_relative_eq;

    #[test]
    fn normalisation_rescales_the_integral() {
        let energies = (0..101).map(|i| i as f64 * 0.01).collect::<Vec<_>>();
        let values = vec![3.; 101];
        let mut dos = DensityOfStates::from_parts(energies, values, 0.2, 0.8).unwrap();
        dos.normalize(0., 1., 4.).unwrap();
        assert_relative_eq!(dos.value_at(0.5), 4., epsilon = 1e-12);
        assert_eq!(dos.vbm_index(), 20);
        assert_eq!(dos.cbm_index(), 80);
    }

    #[test]
    fn unsorted_meshes_are_rejected() {
        assert!(DensityOfStates::from_parts(vec![0., 0.2, 0.1], vec![1.; 3], 0., 0.2).is_err());
        assert!(DensityOfStates::from_parts(vec![0.], vec![1.], 0., 0.).is_err());
    }
}

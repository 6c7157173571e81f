//! # EGrid
//!
//! Energy shells built from the sorted states of a carrier type. Each shell gathers the states
//! whose energies lie within `de_min` of its lowest member, and carries the density of states at
//! its mean energy.

use crate::{carrier::CarrierType, dos::DensityOfStates, error::BuildError, kgrid::CarrierGrid};
use nalgebra::Vector3;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Mapped values above this are replaced by `UNSTABLE_FILL` when mapping the polar optical perturbation
const UNSTABLE_LIMIT: f64 = 1.;
const UNSTABLE_FILL: f64 = 1e-5;

/// How the density of states of each shell is found
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DosMode {
    /// The fraction of all states which fall in the shell
    Simple,
    /// The normalised density of states curve at the shell energy
    Standard,
}

impl Default for DosMode {
    fn default() -> Self {
        Self::Standard
    }
}

/// A shell of states with nearly equal energy
#[derive(Clone, Debug)]
pub struct EnergyBin {
    /// Mean energy of the members in eV
    pub energy: f64,
    /// Density of states at the shell energy
    pub dos: f64,
    /// The `(band, k)` indices of the member states
    pub members: Vec<(usize, usize)>,
}

/// The energy shells of one carrier type, in ascending energy
#[derive(Clone, Debug)]
pub struct EnergyGrid {
    carrier: CarrierType,
    bins: Vec<EnergyBin>,
}

impl EnergyGrid {
    /// Group the states of `grid` into shells no wider than `de_min`
    ///
    /// Fails when fewer than `ne_min` shells are formed.
    #[tracing::instrument(name = "EGrid builder", level = "info", skip(grid, dos), fields(carrier = %grid.carrier()))]
    pub fn build(
        grid: &CarrierGrid,
        dos: &DensityOfStates,
        mode: DosMode,
        de_min: f64,
        ne_min: usize,
    ) -> Result<Self, BuildError> {
        let carrier = grid.carrier();
        let mut sorted = grid.indices().collect::<Vec<_>>();
        sorted.sort_by(|&(b1, k1), &(b2, k2)| grid.energy(b1, k1).total_cmp(&grid.energy(b2, k2)));
        let total = sorted.len();

        let mut bins = Vec::new();
        let mut start = 0;
        while start < total {
            let first_energy = grid.energy(sorted[start].0, sorted[start].1);
            let mut end = start + 1;
            while end < total
                && (grid.energy(sorted[end].0, sorted[end].1) - first_energy).abs() < de_min
            {
                end += 1;
            }
            let members = sorted[start..end].to_vec();
            let energy = members
                .iter()
                .map(|&(band, k)| grid.energy(band, k))
                .sum::<f64>()
                / members.len() as f64;
            let dos = match mode {
                DosMode::Simple => members.len() as f64 / total as f64,
                DosMode::Standard => dos.value_at(energy),
            };
            bins.push(EnergyBin {
                energy,
                dos,
                members,
            });
            start = end;
        }

        if bins.len() < ne_min {
            return Err(BuildError::TooFewEnergyBins {
                carrier,
                found: bins.len(),
                required: ne_min,
            });
        }
        tracing::info!("{} {carrier}-type energy shells from {total} states", bins.len());
        Ok(Self { carrier, bins })
    }

    /// The carrier type of the shells
    pub fn carrier(&self) -> CarrierType {
        self.carrier
    }

    /// The shells, in ascending energy
    pub fn bins(&self) -> &[EnergyBin] {
        &self.bins
    }

    /// The number of shells
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Shell energies in eV
    pub fn energies(&self) -> Vec<f64> {
        self.bins.iter().map(|bin| bin.energy).collect()
    }

    /// The density of states of each shell
    pub fn dos(&self) -> Vec<f64> {
        self.bins.iter().map(|bin| bin.dos).collect()
    }

    /// The average of a scalar over the members of each shell
    pub fn map_scalar(&self, values: ArrayView2<f64>) -> Vec<f64> {
        self.bins
            .iter()
            .map(|bin| {
                bin.members.iter().map(|&(band, k)| values[[band, k]]).sum::<f64>()
                    / bin.members.len() as f64
            })
            .collect()
    }

    /// The average of a vector over the members of each shell
    pub fn map_vector(&self, values: ArrayView2<Vector3<f64>>) -> Vec<Vector3<f64>> {
        self.bins
            .iter()
            .map(|bin| {
                bin.members
                    .iter()
                    .fold(Vector3::zeros(), |sum, &(band, k)| sum + values[[band, k]])
                    / bin.members.len() as f64
            })
            .collect()
    }

    /// The average of `|x| / √3` over the members of each shell, the isotropic reduction of a vector
    pub fn map_norm(&self, values: ArrayView2<Vector3<f64>>) -> Vec<f64> {
        let sqrt_3 = 3_f64.sqrt();
        self.bins
            .iter()
            .map(|bin| {
                bin.members
                    .iter()
                    .map(|&(band, k)| values[[band, k]].norm() / sqrt_3)
                    .sum::<f64>()
                    / bin.members.len() as f64
            })
            .collect()
    }
}

/// Replace mapped perturbations with a magnitude above one, which mark shells without a
/// significant scattering partner
pub fn clamp_unstable(values: &mut [f64]) {
    values
        .iter_mut()
        .filter(|value| value.abs() > UNSTABLE_LIMIT)
        .for_each(|value| *value = UNSTABLE_FILL);
}

#[cfg(test)]
mod test {
    use super::{clamp_unstable, DosMode, EnergyGrid};
    use crate::{
        band::BandExtremum,
        carrier::CarrierType,
        dos::DensityOfStates,
        error::BuildError,
        kgrid::{CarrierGrid, KState},
    };
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};
    use ndarray::Array2;
    use rand::{thread_rng, Rng};

    fn grid(bands: Vec<Vec<f64>>) -> CarrierGrid {
        let states = bands
            .into_iter()
            .map(|mut energies| {
                energies.sort_by(f64::total_cmp);
                energies
                    .into_iter()
                    .map(|energy| KState {
                        fractional: Vector3::zeros(),
                        cartesian: Vector3::zeros(),
                        old_cartesian: Vector3::zeros(),
                        energy,
                        velocity: Vector3::repeat(1e7),
                        effective_mass: Matrix3::identity(),
                        a: 1.,
                        c: 0.,
                        mesh_index: 0,
                    })
                    .collect()
            })
            .collect::<Vec<Vec<_>>>();
        let num_bands = states.len();
        CarrierGrid::from_states(
            CarrierType::N,
            BandExtremum {
                energy: 0.,
                kpoint: Vector3::zeros(),
                effective_mass: Matrix3::identity(),
            },
            1.,
            states,
            Array2::zeros((num_bands, 1)),
        )
        .unwrap()
    }

    fn flat_dos() -> DensityOfStates {
        DensityOfStates::from_parts(vec![-1., 0., 1., 2.], vec![0., 0., 3., 3.], -0.5, 0.).unwrap()
    }

    #[test]
    fn shells_are_ascending_and_narrower_than_the_tolerance() {
        let mut rng = thread_rng();
        let de_min = 0.01;
        let bands = (0..2)
            .map(|_| (0..200).map(|_| rng.gen_range(0.0..0.5)).collect())
            .collect();
        let grid = grid(bands);
        let egrid = EnergyGrid::build(&grid, &flat_dos(), DosMode::Simple, de_min, 2).unwrap();

        let energies = egrid.energies();
        assert!(energies.windows(2).all(|pair| pair[0] <= pair[1]));
        let mut count = 0;
        for bin in egrid.bins() {
            let first = grid.energy(bin.members[0].0, bin.members[0].1);
            for &(band, k) in bin.members.iter() {
                assert!((grid.energy(band, k) - first).abs() < de_min);
            }
            count += bin.members.len();
        }
        assert_eq!(count, 400);
        assert_relative_eq!(egrid.dos().iter().sum::<f64>(), 1., epsilon = 1e-12);
    }

    #[test]
    fn standard_dos_is_read_from_the_curve() {
        let grid = grid(vec![vec![0.0, 0.00001, 1.0]]);
        let egrid = EnergyGrid::build(&grid, &flat_dos(), DosMode::Standard, 1e-4, 2).unwrap();
        assert_eq!(egrid.len(), 2);
        assert_eq!(egrid.bins()[0].members.len(), 2);
        assert_relative_eq!(egrid.bins()[0].dos, 0.);
        assert_relative_eq!(egrid.bins()[1].dos, 3.);
    }

    #[test]
    fn a_single_shell_is_rejected() {
        let grid = grid(vec![vec![0.1, 0.1, 0.1]]);
        let result = EnergyGrid::build(&grid, &flat_dos(), DosMode::Simple, 1e-4, 2);
        assert!(matches!(
            result,
            Err(BuildError::TooFewEnergyBins { found: 1, .. })
        ));
    }

    #[test]
    fn shell_averages_and_clamping() {
        let grid = grid(vec![vec![0.0, 0.00001, 1.0]]);
        let egrid = EnergyGrid::build(&grid, &flat_dos(), DosMode::Simple, 1e-4, 2).unwrap();
        let values = Array2::from_shape_vec((1, 3), vec![1., 3., 5.]).unwrap();
        assert_eq!(egrid.map_scalar(values.view()), vec![2., 5.]);

        let vectors = Array2::from_shape_vec((1, 3), vec![Vector3::repeat(3.); 3]).unwrap();
        assert_relative_eq!(egrid.map_norm(vectors.view())[0], 3., epsilon = 1e-12);
        assert_eq!(egrid.map_vector(vectors.view())[1], Vector3::repeat(3.));

        let mut mapped = vec![0.5, -2., 1e-3];
        clamp_unstable(&mut mapped);
        assert_eq!(mapped, vec![0.5, 1e-5, 1e-3]);
    }
}

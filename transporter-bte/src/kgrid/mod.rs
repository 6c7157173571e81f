//! # KGrid
//!
//! The sampled wavevector grid of each carrier type.
//!
//! Every vertex of the `KMesh` is evaluated on every band of a carrier type. Points which are too
//! slow or too far in energy from the band extremum are discarded, and the survivors of each band
//! are sorted by ascending energy. Bands and points are addressed by `(band, k)` index pairs and
//! all condition-dependent quantities are stored in arrays sharing these axes.

mod builder;

pub use builder::KGridBuilder;

use crate::{band::BandExtremum, carrier::CarrierType, carrier::PerCarrier};
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array1, Array2, ArrayView1};
use num_traits::Zero;
use serde::Deserialize;
use std::ops::{Add, Mul};
use transporter_mesher::{KMesh, ReciprocalLattice};

/// Filtering settings for the k-grid
#[derive(Clone, Debug, Deserialize)]
pub struct GridSettings {
    /// Points with any velocity component below this, in cm/s, are discarded
    pub v_min: f64,
    /// The fewest points each carrier type may retain
    pub min_kpoints: usize,
    /// Overrides the energy window estimated from the conditions, in eV
    pub energy_cutoff: Option<f64>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            v_min: 100.,
            min_kpoints: 5,
            energy_cutoff: None,
        }
    }
}

/// A single sampled Bloch state
#[derive(Clone, Debug, PartialEq)]
pub struct KState {
    /// Fractional coordinate in the first zone
    pub fractional: Vector3<f64>,
    /// Cartesian offset from the nearest copy of the extremum in 1/nm
    pub cartesian: Vector3<f64>,
    /// Cartesian coordinate before recentering in 1/nm
    pub old_cartesian: Vector3<f64>,
    /// Energy in eV
    pub energy: f64,
    /// Group velocity magnitudes in cm/s
    pub velocity: Vector3<f64>,
    /// Effective mass tensor in units of the free electron mass
    pub effective_mass: Matrix3<f64>,
    /// s-like mixing coefficient
    pub a: f64,
    /// p-like mixing coefficient
    pub c: f64,
    /// The flat index of the mesh vertex the state was sampled at
    pub mesh_index: usize,
}

impl KState {
    /// Norm of the recentred wavevector in 1/nm
    pub fn norm_k(&self) -> f64 {
        self.cartesian.norm()
    }

    /// Norm of the group velocity in cm/s
    pub fn norm_v(&self) -> f64 {
        self.velocity.norm()
    }
}

/// The retained states of a single carrier type
#[derive(Clone, Debug)]
pub struct CarrierGrid {
    carrier: CarrierType,
    extremum: BandExtremum,
    energy_cutoff: f64,
    states: Array2<KState>,
    energies: Array2<f64>,
    mesh_energies: Array2<f64>,
}

impl CarrierGrid {
    /// Assemble a grid from per-band lists of states
    ///
    /// Every band must hold the same number of states, already sorted by ascending energy.
    /// `mesh_energies` holds the energy of every band at every mesh vertex.
    pub fn from_states(
        carrier: CarrierType,
        extremum: BandExtremum,
        energy_cutoff: f64,
        states: Vec<Vec<KState>>,
        mesh_energies: Array2<f64>,
    ) -> Result<Self, crate::error::BuildError> {
        let num_bands = states.len();
        let num_kpoints = states.first().map(|band| band.len()).unwrap_or(0);
        if num_bands == 0 || states.iter().any(|band| band.len() != num_kpoints) {
            return Err(crate::error::BuildError::Mesh(format!(
                "every {carrier}-type band must retain the same number of states"
            )));
        }
        let states = Array2::from_shape_vec(
            (num_bands, num_kpoints),
            states.into_iter().flatten().collect(),
        )
        .map_err(|e| crate::error::BuildError::Mesh(e.to_string()))?;
        let energies = states.map(|state| state.energy);
        Ok(Self {
            carrier,
            extremum,
            energy_cutoff,
            states,
            energies,
            mesh_energies,
        })
    }

    /// The carrier type of the grid
    pub fn carrier(&self) -> CarrierType {
        self.carrier
    }

    /// The extremum of the first band
    pub fn extremum(&self) -> &BandExtremum {
        &self.extremum
    }

    /// Maximum distance of a retained state from the extremum in eV
    pub fn energy_cutoff(&self) -> f64 {
        self.energy_cutoff
    }

    /// The number of bands with retained states
    pub fn num_bands(&self) -> usize {
        self.states.nrows()
    }

    /// The number of retained states in each band
    pub fn num_kpoints(&self) -> usize {
        self.states.ncols()
    }

    /// The state `(band, k)`
    pub fn state(&self, band: usize, k: usize) -> &KState {
        &self.states[[band, k]]
    }

    /// All retained states, indexed by `(band, k)`
    pub fn states(&self) -> &Array2<KState> {
        &self.states
    }

    /// Energy of state `(band, k)` in eV
    pub fn energy(&self, band: usize, k: usize) -> f64 {
        self.energies[[band, k]]
    }

    /// The ascending energies of `band`
    pub fn band_energies(&self, band: usize) -> ArrayView1<f64> {
        self.energies.row(band)
    }

    /// Energies of every band at every mesh vertex, before filtering
    pub fn mesh_energies(&self) -> &Array2<f64> {
        &self.mesh_energies
    }

    /// The index of the state of `band` whose energy is closest to `energy`
    pub fn closest_index(&self, band: usize, energy: f64) -> usize {
        let row = self.energies.row(band);
        let len = row.len();
        // The first index whose energy is not below the target
        let (mut low, mut high) = (0, len);
        while low < high {
            let middle = (low + high) / 2;
            if row[middle] < energy {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        if low == 0 {
            0
        } else if low == len {
            len - 1
        } else if (row[low] - energy).abs() < (energy - row[low - 1]).abs() {
            low
        } else {
            low - 1
        }
    }

    /// Iterate over all `(band, k)` pairs, band outermost
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize)> {
        let num_kpoints = self.num_kpoints();
        (0..self.num_bands()).flat_map(move |band| (0..num_kpoints).map(move |k| (band, k)))
    }
}

/// The sampled grids of both carrier types on a common mesh
#[derive(Clone, Debug)]
pub struct KGrid {
    mesh: KMesh<f64>,
    lattice: ReciprocalLattice<f64>,
    /// Integration volume of each mesh vertex in 1/cm^3
    volumes: Array1<f64>,
    carriers: PerCarrier<CarrierGrid>,
}

impl KGrid {
    /// Combine the grids of both carrier types with the mesh they were sampled on
    pub fn new(
        mesh: KMesh<f64>,
        lattice: ReciprocalLattice<f64>,
        volumes: Array1<f64>,
        carriers: PerCarrier<CarrierGrid>,
    ) -> Self {
        Self {
            mesh,
            lattice,
            volumes,
            carriers,
        }
    }

    /// The mesh the states were sampled on
    pub fn mesh(&self) -> &KMesh<f64> {
        &self.mesh
    }

    /// The reciprocal lattice
    pub fn lattice(&self) -> &ReciprocalLattice<f64> {
        &self.lattice
    }

    /// Integration volume of each mesh vertex in 1/cm^3
    pub fn volumes(&self) -> &Array1<f64> {
        &self.volumes
    }

    /// The grid of `carrier`
    pub fn carrier(&self, carrier: CarrierType) -> &CarrierGrid {
        &self.carriers[carrier]
    }

    /// Integrate `f` over the retained states of `carrier`
    pub fn integrate_over_states<V>(
        &self,
        carrier: CarrierType,
        f: impl Fn(usize, usize, &KState) -> V,
    ) -> V
    where
        V: Zero + Add<Output = V> + Mul<f64, Output = V>,
    {
        let grid = &self.carriers[carrier];
        grid.indices().fold(V::zero(), |sum, (band, k)| {
            let state = grid.state(band, k);
            sum + f(band, k, state) * self.volumes[state.mesh_index]
        })
    }

    /// Integrate a function of energy over every band of `carrier` at every mesh vertex
    pub fn integrate_over_mesh(&self, carrier: CarrierType, f: impl Fn(f64) -> f64) -> f64 {
        self.carriers[carrier]
            .mesh_energies
            .rows()
            .into_iter()
            .map(|energies| {
                energies
                    .iter()
                    .zip(self.volumes.iter())
                    .map(|(&energy, &volume)| f(energy) * volume)
                    .sum::<f64>()
            })
            .sum()
    }

    /// The gap between the lowest conduction state and the highest valence state on the mesh
    pub fn band_gap(&self) -> f64 {
        let cbm = self.carriers.n.mesh_energies.row(0).iter().copied().fold(f64::INFINITY, f64::min);
        let vbm = self
            .carriers
            .p
            .mesh_energies
            .row(0)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        cbm - vbm
    }
}

//! # Input
//!
//! The material description passed on the command line: the scattering parameters, the direct
//! lattice, the symmetry operations and the parabolic band model, optionally with an externally
//! computed density of states.
//!
//! ```toml
//! [material]
//! preset = "GaAs"
//!
//! [lattice]
//! vectors = [[0.0, 2.8265, 2.8265], [2.8265, 0.0, 2.8265], [2.8265, 2.8265, 0.0]]
//!
//! [bands]
//! band_gap = 1.42
//!
//! [[bands.conduction]]
//! kpoint = [0.0, 0.0, 0.0]
//! effective_mass = 0.067
//!
//! [[bands.valence]]
//! kpoint = [0.0, 0.0, 0.0]
//! effective_mass = 0.45
//! ```

use crate::{
    band::BandModel,
    dos::TabulatedDos,
    error::BuildError,
    material::{Material, MaterialParameters},
    symmetry::SymmetrySpecification,
};
use config::{Config, File};
use nalgebra::Matrix3;
use serde::Deserialize;
use std::path::Path;
use transporter_mesher::ReciprocalLattice;

/// The scattering parameters, either named or given in full
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum MaterialInput {
    /// One of the built-in materials
    Preset {
        /// The name of the material
        preset: Material,
    },
    /// Every parameter given in the file
    Explicit(MaterialParameters<f64>),
}

impl MaterialInput {
    /// The resolved scattering parameters
    pub fn parameters(&self) -> MaterialParameters<f64> {
        match self {
            MaterialInput::Preset { preset } => preset.get_info(),
            MaterialInput::Explicit(parameters) => parameters.clone(),
        }
    }
}

/// The direct lattice, one vector per row, in Angstrom
#[derive(Clone, Debug, Deserialize)]
pub struct LatticeInput {
    /// Lattice vectors in Angstrom, one per row
    pub vectors: [[f64; 3]; 3],
}

impl LatticeInput {
    /// The direct lattice as a matrix with one vector per row
    pub fn direct(&self) -> Matrix3<f64> {
        Matrix3::from_fn(|row, column| self.vectors[row][column])
    }

    /// Fails when the vectors are linearly dependent
    pub fn reciprocal(&self) -> Result<ReciprocalLattice<f64>, BuildError> {
        ReciprocalLattice::from_direct(&self.direct()).ok_or(BuildError::SingularLattice)
    }

    /// The length of the third lattice vector in Angstrom
    pub fn c(&self) -> f64 {
        self.direct().row(2).norm()
    }
}

/// The contents of the material input file
#[derive(Clone, Debug, Deserialize)]
pub struct Input {
    /// Scattering parameters
    pub material: MaterialInput,
    /// The direct lattice
    pub lattice: LatticeInput,
    /// Operations used to place the band extrema, identity when absent
    #[serde(default)]
    pub symmetry: SymmetrySpecification,
    /// The parabolic bands of both carrier types
    pub bands: BandModel,
    /// Replaces the analytic density of states of the band model
    #[serde(default)]
    pub dos: Option<TabulatedDos>,
}

impl Input {
    /// Read and deserialize the input file at `path`
    pub fn build(path: &Path) -> color_eyre::Result<Self> {
        let s = Config::builder()
            .add_source(File::from(path))
            .build()?;
        s.try_deserialize()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to deserialize the material input: {:?}", e))
    }
}

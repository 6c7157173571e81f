// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Transporter is a Boltzmann transport solver for bulk semiconductors written in Rust
//!
//! # Overview
//! Transporter calculates the mobility, Seebeck coefficient and conductivity of a crystalline
//! semiconductor by solving the linearised Boltzmann transport equation on a wavevector grid
//! refined around the band extrema. Elastic scattering from acoustic phonons, ionised impurities,
//! piezoelectric fields and charged dislocations enters through relaxation rates, while polar
//! optical phonon scattering couples every state to partners one phonon energy away and is
//! resolved by fixed point iteration.
//!
//! Each doping concentration and temperature is solved independently. The Fermi level is first
//! found from the density of states, after which the driving forces, the scattering rates and the
//! perturbation of the distribution function are evaluated for electrons and holes.
//!
//! # Usage
//! Transporter is distributed as a binary crate, and is intended to be run from the command line.
//! The solver settings are read from `.config/default.toml`, and the material from a `.toml` file
//! passed on the command line:
//!
//! ```toml
//! [material]
//! preset = "GaAs"
//!
//! [lattice]
//! vectors = [[0.0, 2.8265, 2.8265], [2.8265, 0.0, 2.8265], [2.8265, 2.8265, 0.0]]
//!
//! [bands]
//! band_gap = 0.9372
//!
//! [[bands.conduction]]
//! kpoint = [0.0, 0.0, 0.0]
//! effective_mass = 0.067
//!
//! [[bands.valence]]
//! kpoint = [0.0, 0.0, 0.0]
//! effective_mass = 0.45
//! ```

#![warn(missing_docs)]
#![allow(clippy::type_complexity)]

/// The command line global application, tracing and display primitives
pub mod app;

/// Band structure evaluation and the parabolic band model
pub mod band;

/// The iterative Boltzmann equation solver
pub mod bte;

/// Electrons and holes, and containers holding a value for each
pub mod carrier;

/// The doping concentrations and temperatures of a run
pub mod conditions;

/// Physical constants
pub mod constants;

/// Density of states curves
pub mod dos;

/// Energy shells built from the k-grid
pub mod egrid;

/// Error handling
pub mod error;

/// The Fermi level search and the integrals depending on it
pub mod fermi;

/// Equilibrium occupations and driving forces
pub mod forces;

/// The material input file
pub mod input;

/// Quadrature over interpolated tables and scattering angles
pub mod integration;

/// The filtered and sorted wavevector grid of each carrier type
pub mod kgrid;

/// Material parameters and presets
pub mod material;

/// Equal-energy and phonon-shifted scattering partners
pub mod neighbors;

/// Elastic and polar optical scattering
pub mod scattering;

/// Stored per-state solutions and their energy profiles
pub mod state;

/// Fermi-Dirac and Bose-Einstein statistics
pub mod statistics;

/// Space group operations
pub mod symmetry;

/// Mobility, Seebeck coefficient and conductivity
pub mod transport;

/// The shared-memory worker pool
pub mod workers;

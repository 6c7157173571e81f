//! # Conditions
//!
//! The doping concentrations and temperatures a calculation is carried out at. Every
//! condition-dependent quantity is stored in arrays whose leading axes are the doping index
//! and the temperature index defined here.

use crate::{carrier::CarrierType, error::BuildError};

/// Temperatures below this are raised to it when estimating the energy window
const MINIMUM_WINDOW_TEMPERATURE: f64 = 300.;

/// The validated doping concentrations and temperatures of a run
#[derive(Clone, Debug)]
pub struct Conditions {
    dopings: Vec<f64>,
    temperatures: Vec<f64>,
}

/// A single (doping, temperature) pair and its position in the condition arrays
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Condition {
    /// Position of the doping in the doping list
    pub doping_index: usize,
    /// Position of the temperature in the temperature list
    pub temperature_index: usize,
    /// Signed concentration in 1/cm^3
    pub doping: f64,
    /// Temperature in K
    pub temperature: f64,
}

impl Condition {
    /// The carrier type set by the sign of the doping
    pub fn majority(&self) -> CarrierType {
        // Dopings are validated as non-zero on construction
        if self.doping < 0. {
            CarrierType::N
        } else {
            CarrierType::P
        }
    }
}

impl Conditions {
    /// Fails when either list is empty, a doping is zero or a temperature is not positive
    pub fn new(dopings: Vec<f64>, temperatures: Vec<f64>) -> Result<Self, BuildError> {
        if dopings.is_empty() || temperatures.is_empty() {
            return Err(BuildError::EmptyConditions);
        }
        for &doping in dopings.iter() {
            CarrierType::from_concentration(doping)?;
        }
        if let Some(&temperature) = temperatures.iter().find(|&&t| t <= 0.) {
            return Err(BuildError::NonPositiveTemperature(temperature));
        }
        Ok(Self {
            dopings,
            temperatures,
        })
    }

    /// Signed concentrations in 1/cm^3
    pub fn dopings(&self) -> &[f64] {
        &self.dopings
    }

    /// Temperatures in K
    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    /// The number of dopings
    pub fn num_dopings(&self) -> usize {
        self.dopings.len()
    }

    /// The number of temperatures
    pub fn num_temperatures(&self) -> usize {
        self.temperatures.len()
    }

    /// The position of an exact doping value
    pub fn doping_index(&self, doping: f64) -> Option<usize> {
        self.dopings.iter().position(|&c| c == doping)
    }

    /// The position of an exact temperature value
    pub fn temperature_index(&self, temperature: f64) -> Option<usize> {
        self.temperatures.iter().position(|&t| t == temperature)
    }

    /// Iterate over all conditions, dopings outermost
    pub fn iter(&self) -> impl Iterator<Item = Condition> + '_ {
        self.dopings
            .iter()
            .enumerate()
            .flat_map(move |(doping_index, &doping)| {
                self.temperatures
                    .iter()
                    .enumerate()
                    .map(move |(temperature_index, &temperature)| Condition {
                        doping_index,
                        temperature_index,
                        doping,
                        temperature,
                    })
            })
    }

    /// Whether any configured doping has `carrier` as its majority carrier
    pub fn is_majority(&self, carrier: CarrierType) -> bool {
        self.dopings
            .iter()
            .any(|&c| CarrierType::from_concentration(c).ok() == Some(carrier))
    }

    /// The energy window around each band extremum inside which k-points are retained
    ///
    /// The window widens with temperature and with the distance of the dopings from 1e19 cm^-3.
    /// Carrier types which are not the majority carrier of any doping get half the window. A
    /// configured `window` replaces the estimate.
    pub fn energy_cutoff(&self, carrier: CarrierType, boltzmann: f64, window: Option<f64>) -> f64 {
        let cutoff = window.unwrap_or_else(|| self.estimated_window(boltzmann));
        if self.is_majority(carrier) {
            cutoff
        } else {
            cutoff / 2.
        }
    }

    fn estimated_window(&self, boltzmann: f64) -> f64 {
        let largest_log = self
            .dopings
            .iter()
            .map(|c| (c.abs() / 1e19).ln())
            .fold(f64::NEG_INFINITY, f64::max);
        let concentration_factor = f64::max(1., 2. * largest_log.abs().powf(0.15));
        let temperature = self
            .temperatures
            .iter()
            .copied()
            .fold(MINIMUM_WINDOW_TEMPERATURE, f64::max);
        concentration_factor * 15. * boltzmann * temperature
    }
}

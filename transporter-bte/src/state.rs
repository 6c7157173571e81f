//! # State
//!
//! The condition-dependent fields of every retained state, kept for inspection once a run is
//! complete. Each field is a contiguous array indexed by `(doping, temperature, band, k)`, the
//! doping and temperature axes following the order of the configured `Conditions`.
//!
//! The energy-shell profiles of the same fields are stored alongside, one set per condition.

use crate::{
    bte::Perturbation,
    carrier::CarrierType,
    conditions::{Condition, Conditions},
    egrid::{clamp_unstable, EnergyGrid},
    forces::DrivingForces,
    kgrid::CarrierGrid,
    scattering::ElasticRates,
};
use nalgebra::Vector3;
use ndarray::{s, Array2, Array4, ArrayView2};
use serde::Serialize;
use std::collections::BTreeMap;

/// A stored per-state quantity
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Equilibrium occupation
    F0,
    /// Perturbed occupation under the electric field
    F,
    /// Perturbed occupation under the temperature gradient
    FTh,
    /// Perturbation under the electric field
    G,
    /// Perturbation under the temperature gradient
    GTh,
    /// Perturbation limited by polar optical scattering alone
    GPop,
    /// Polar optical in-scattering
    SI,
    /// Polar optical in-scattering under the temperature gradient
    SITh,
    /// Polar optical out-scattering
    SO,
    /// Polar optical out-scattering under the temperature gradient
    SOTh,
    /// Summed elastic scattering rate in 1/s
    ElasticRate,
    /// Inverse of the elastic rate in s
    RelaxationTime,
}

impl Field {
    /// Every field, in storage order
    pub const ALL: [Field; 12] = [
        Field::F0,
        Field::F,
        Field::FTh,
        Field::G,
        Field::GTh,
        Field::GPop,
        Field::SI,
        Field::SITh,
        Field::SO,
        Field::SOTh,
        Field::ElasticRate,
        Field::RelaxationTime,
    ];
}

/// Every field of one carrier type at every condition
#[derive(Clone, Debug, Serialize)]
pub struct CarrierFields {
    carrier: CarrierType,
    fields: BTreeMap<Field, Array4<Vector3<f64>>>,
}

impl CarrierFields {
    /// Zeroed arrays for every field at every condition
    pub fn new(grid: &CarrierGrid, conditions: &Conditions) -> Self {
        let shape = (
            conditions.num_dopings(),
            conditions.num_temperatures(),
            grid.num_bands(),
            grid.num_kpoints(),
        );
        let fields = Field::ALL
            .iter()
            .map(|&field| (field, Array4::from_elem(shape, Vector3::zeros())))
            .collect();
        Self {
            carrier: grid.carrier(),
            fields,
        }
    }

    /// The carrier type of the fields
    pub fn carrier(&self) -> CarrierType {
        self.carrier
    }

    /// Copy the solution at `condition` into the condition arrays
    pub fn store(
        &mut self,
        condition: &Condition,
        forces: &DrivingForces,
        elastic: &ElasticRates,
        perturbation: &Perturbation,
    ) {
        let sources: [(Field, &Array2<Vector3<f64>>); 12] = [
            (Field::F0, &forces.f0),
            (Field::F, &perturbation.f),
            (Field::FTh, &perturbation.f_th),
            (Field::G, &perturbation.g),
            (Field::GTh, &perturbation.g_th),
            (Field::GPop, &perturbation.g_pop),
            (Field::SI, &perturbation.s_i),
            (Field::SITh, &perturbation.s_i_th),
            (Field::SO, &perturbation.s_o),
            (Field::SOTh, &perturbation.s_o_th),
            (Field::ElasticRate, &elastic.total),
            (Field::RelaxationTime, &elastic.relaxation_time),
        ];
        for (field, source) in sources {
            if let Some(target) = self.fields.get_mut(&field) {
                target
                    .slice_mut(s![condition.doping_index, condition.temperature_index, .., ..])
                    .assign(source);
            }
        }
    }

    /// The `(band, k)` array of `field` at a condition
    pub fn view(
        &self,
        field: Field,
        doping_index: usize,
        temperature_index: usize,
    ) -> Option<ArrayView2<Vector3<f64>>> {
        self.fields
            .get(&field)
            .map(|values| values.slice(s![doping_index, temperature_index, .., ..]))
    }
}

/// A field averaged over the members of each energy shell
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Profile {
    /// Vectors reduced to `|x| / √3`
    Isotropic(Vec<f64>),
    /// Vectors averaged per direction
    Anisotropic(Vec<Vector3<f64>>),
}

/// The energy-shell profiles of one carrier type at one condition
#[derive(Clone, Debug, Serialize)]
pub struct EnergyProfiles {
    /// The carrier type of the fields
    pub carrier: CarrierType,
    /// Signed concentration in 1/cm^3
    pub doping: f64,
    /// Temperature in K
    pub temperature: f64,
    /// Shell energies in eV
    pub energies: Vec<f64>,
    /// Density of states of each shell
    pub dos: Vec<f64>,
    /// The shell average of every field
    pub profiles: BTreeMap<Field, Profile>,
}

impl EnergyProfiles {
    /// Map the perturbations onto the shells of `egrid`
    ///
    /// Shells whose polar optical perturbation exceeds one in magnitude have no significant
    /// scattering partner and are flattened.
    pub fn map(
        egrid: &EnergyGrid,
        condition: &Condition,
        perturbation: &Perturbation,
        isotropic: bool,
    ) -> Self {
        let mapped: [(Field, &Array2<Vector3<f64>>); 5] = [
            (Field::G, &perturbation.g),
            (Field::GTh, &perturbation.g_th),
            (Field::GPop, &perturbation.g_pop),
            (Field::F, &perturbation.f),
            (Field::FTh, &perturbation.f_th),
        ];
        let profiles = mapped
            .into_iter()
            .map(|(field, values)| {
                let profile = if isotropic {
                    let mut profile = egrid.map_norm(values.view());
                    if field == Field::GPop {
                        clamp_unstable(&mut profile);
                    }
                    Profile::Isotropic(profile)
                } else {
                    let mut profile = egrid.map_vector(values.view());
                    if field == Field::GPop {
                        profile
                            .iter_mut()
                            .for_each(|value| clamp_unstable(value.as_mut_slice()));
                    }
                    Profile::Anisotropic(profile)
                };
                (field, profile)
            })
            .collect();

        Self {
            carrier: egrid.carrier(),
            doping: condition.doping,
            temperature: condition.temperature,
            energies: egrid.energies(),
            dos: egrid.dos(),
            profiles,
        }
    }
}

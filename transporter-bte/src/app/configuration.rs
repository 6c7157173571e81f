use crate::{
    bte::BteSettings,
    conditions::Conditions,
    egrid::DosMode,
    error::BuildError,
    fermi::FermiSettings,
    forces::DrivingSettings,
    kgrid::GridSettings,
    neighbors::NeighborSettings,
    scattering::{ElasticMechanism, InelasticMechanism},
};
use color_eyre::eyre::eyre;
use config::{Config, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
pub(crate) struct Configuration {
    pub(crate) conditions: ConditionsConfiguration,
    pub(crate) model: ModelConfiguration,
    pub(crate) performance: PerformanceConfiguration,
    #[serde(default)]
    pub(crate) driving: DrivingSettings,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionsConfiguration {
    /// Signed carrier concentrations in 1/cm^3, negative for n-type
    pub(crate) dopings: Vec<f64>,
    pub(crate) temperatures: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelConfiguration {
    pub(crate) bs_is_isotropic: bool,
    pub(crate) elastic_scatterings: Vec<ElasticMechanism>,
    #[serde(default)]
    pub(crate) inelastic_scatterings: Vec<InelasticMechanism>,
    #[serde(default)]
    pub(crate) soc: bool,
    #[serde(default)]
    pub(crate) dos_mode: DosMode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PerformanceConfiguration {
    /// Radii of the mesh refinement around each extremum, in fractional units
    pub(crate) grid_steps: Vec<f64>,
    pub(crate) de_min: f64,
    pub(crate) ne_min: usize,
    pub(crate) energy_cutoff: Option<f64>,
    pub(crate) v_min: f64,
    pub(crate) min_kpoints: usize,
    pub(crate) forced_min_neighbors: usize,
    pub(crate) forced_ratio_warning: f64,
    pub(crate) max_average_ediff: f64,
    pub(crate) bte_iterations: usize,
    pub(crate) bte_tolerance: Option<f64>,
    pub(crate) parallel: bool,
    pub(crate) parallel_threshold: usize,
    /// How far the density of states mesh extends beyond each extremum, in eV
    pub(crate) dos_window: f64,
    pub(crate) fermi_tolerance: f64,
    pub(crate) fermi_loose_tolerance: f64,
}

impl Configuration {
    pub(crate) fn build() -> color_eyre::Result<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // The default settings for the simulation which we use in the general case
            .add_source(File::with_name("../.config/default"))
            // The override settings which may be set by the user, optional
            .add_source(File::with_name(&format!("../.config/{}", run_mode)).required(false))
            .build()?;

        s.try_deserialize()
            .map_err(|e| eyre!(format!("Failed to deserialize the config file: {:?}", e)))
    }

    pub(crate) fn conditions(&self) -> Result<Conditions, BuildError> {
        Conditions::new(
            self.conditions.dopings.clone(),
            self.conditions.temperatures.clone(),
        )
    }

    pub(crate) fn polar_optical(&self) -> bool {
        self.model
            .inelastic_scatterings
            .contains(&InelasticMechanism::Pop)
    }

    /// Neighbour sets are only needed for angular integration or inelastic scattering
    pub(crate) fn needs_neighbors(&self) -> bool {
        !self.model.bs_is_isotropic || self.polar_optical()
    }
}

impl PerformanceConfiguration {
    pub(crate) fn grid(&self) -> GridSettings {
        GridSettings {
            v_min: self.v_min,
            min_kpoints: self.min_kpoints,
            energy_cutoff: self.energy_cutoff,
        }
    }

    pub(crate) fn neighbors(&self) -> NeighborSettings {
        NeighborSettings {
            min_count: self.forced_min_neighbors,
            forced_ratio_warning: self.forced_ratio_warning,
            max_average_ediff: self.max_average_ediff,
            tolerance: self.de_min,
        }
    }

    pub(crate) fn bte(&self) -> BteSettings {
        BteSettings {
            iterations: self.bte_iterations,
            tolerance: self.bte_tolerance,
        }
    }

    pub(crate) fn fermi(&self) -> FermiSettings {
        FermiSettings {
            tolerance: self.fermi_tolerance,
            loose_tolerance: self.fermi_loose_tolerance,
        }
    }

    /// The density of states mesh step, never finer than 1e-4 eV
    pub(crate) fn dos_step(&self) -> f64 {
        self.de_min.max(1e-4)
    }
}

//! # Calculations
//!
//! Delegated functions from `App` which build the condition independent grids once and then
//! solve the Boltzmann equation for both carrier types at every doping and temperature.

use super::{error::TransporterError, Configuration};
use crate::{
    band::{BandSampler, ParabolicBands},
    bte::{BteSolverBuilder, Iterate, Perturbation},
    carrier::{CarrierType, PerCarrier},
    conditions::{Condition, Conditions},
    constants::PhysicalConstants,
    dos::DensityOfStates,
    egrid::EnergyGrid,
    error::ScatteringError,
    fermi::{
        find_fermi, impurity_concentration, inverse_screening_length, FermiSolution,
        SeebeckIntegrals,
    },
    forces::DrivingForces,
    input::Input,
    kgrid::{KGrid, KGridBuilder},
    material::MaterialParameters,
    neighbors::NeighborTable,
    scattering::{ElasticRates, PolarOptical, ScatteringContext},
    state::{CarrierFields, EnergyProfiles},
    symmetry::SymmetryOperations,
    transport::{combined_seebeck, seebeck, CarrierTransport, Mobility, TransportInputs},
    workers::WorkerPool,
};
use serde::Serialize;
use transporter_mesher::create_k_mesh;

/// Everything which does not depend on the doping or the temperature
pub(crate) struct Setup {
    pub(crate) conditions: Conditions,
    pub(crate) material: MaterialParameters<f64>,
    pub(crate) kgrid: KGrid,
    pub(crate) dos: DensityOfStates,
    pub(crate) egrids: PerCarrier<EnergyGrid>,
    pub(crate) neighbors: Option<PerCarrier<NeighborTable>>,
    /// Direct cell volume in cubic Angstrom
    pub(crate) cell_volume: f64,
    pub(crate) lattice_c: f64,
}

/// The results at a single doping and temperature
#[derive(Clone, Debug, Serialize)]
pub(crate) struct ConditionReport {
    pub(crate) doping: f64,
    pub(crate) temperature: f64,
    pub(crate) fermi: f64,
    /// Signed carrier concentrations reproduced by the Fermi level in 1/cm^3
    pub(crate) calculated: PerCarrier<f64>,
    pub(crate) relative_error: f64,
    /// 1/nm
    pub(crate) inverse_screening_length: PerCarrier<f64>,
    /// 1/cm^3
    pub(crate) impurity_concentration: f64,
    pub(crate) transport: PerCarrier<CarrierTransport>,
    /// The Seebeck coefficient of both carrier types together in μV/K
    pub(crate) seebeck: f64,
}

/// The per-state solution of every condition, written out on request
#[derive(Debug, Serialize)]
pub(crate) struct RunState {
    pub(crate) dopings: Vec<f64>,
    pub(crate) temperatures: Vec<f64>,
    pub(crate) fields: PerCarrier<CarrierFields>,
    pub(crate) profiles: Vec<EnergyProfiles>,
}

pub(crate) struct Outcome {
    pub(crate) reports: Vec<ConditionReport>,
    pub(crate) state: Option<RunState>,
}

/// The solution of one carrier type at one condition
struct CarrierSolution {
    transport: CarrierTransport,
    inverse_screening_length: f64,
}

impl Setup {
    #[tracing::instrument(name = "Setup", level = "info", skip_all)]
    pub(crate) fn build(
        config: &Configuration,
        input: &Input,
        constants: &PhysicalConstants,
        pool: &WorkerPool,
    ) -> Result<Self, TransporterError> {
        let conditions = config.conditions()?;
        let material = input.material.parameters();
        let lattice = input.lattice.reciprocal()?;
        let symmetry = SymmetryOperations::from_specification(&input.symmetry)?;
        let bands = ParabolicBands::new(
            input.bands.clone(),
            lattice.clone(),
            &symmetry,
            material.scissor,
            constants,
        )?;

        let centers = CarrierType::ALL.map(|carrier| bands.extremum_kpoint(carrier));
        let mesh = create_k_mesh(&centers, &config.performance.grid_steps);
        let grid_settings = config.performance.grid();
        let kgrid = KGridBuilder::new()
            .with_mesh(&mesh)
            .with_sampler(&bands)
            .with_lattice(&lattice)
            .with_symmetry(&symmetry)
            .with_conditions(&conditions)
            .with_settings(&grid_settings)
            .with_constants(constants)
            .with_pool(pool)
            .build()?;

        let vbm = kgrid.carrier(CarrierType::P).extremum().energy;
        let cbm = kgrid.carrier(CarrierType::N).extremum().energy;
        let dos = match &input.dos {
            Some(table) => DensityOfStates::from_table(table.clone(), vbm, cbm)?,
            None => DensityOfStates::parabolic(
                &bands,
                config.performance.dos_window,
                config.performance.dos_step(),
                config.model.soc,
                constants,
            )?,
        };

        let egrids = PerCarrier::try_from_fn(|carrier| {
            EnergyGrid::build(
                kgrid.carrier(carrier),
                &dos,
                config.model.dos_mode,
                config.performance.de_min,
                config.performance.ne_min,
            )
        })?;

        let neighbors = if config.needs_neighbors() {
            let settings = config.performance.neighbors();
            let phonon_energy = config
                .polar_optical()
                .then(|| constants.hbar * material.pop_angular_frequency());
            Some(PerCarrier::from_fn(|carrier| {
                NeighborTable::build(kgrid.carrier(carrier), &settings, phonon_energy)
            }))
        } else {
            None
        };

        Ok(Self {
            conditions,
            material,
            kgrid,
            dos,
            egrids,
            neighbors,
            cell_volume: lattice.direct_volume(),
            lattice_c: input.lattice.c(),
        })
    }

    /// Solve every condition in turn
    pub(crate) fn solve(
        &self,
        config: &Configuration,
        constants: &PhysicalConstants,
        pool: &WorkerPool,
        keep_state: bool,
    ) -> Result<Outcome, TransporterError> {
        let mut state = keep_state.then(|| RunState {
            dopings: self.conditions.dopings().to_vec(),
            temperatures: self.conditions.temperatures().to_vec(),
            fields: PerCarrier::from_fn(|carrier| {
                CarrierFields::new(self.kgrid.carrier(carrier), &self.conditions)
            }),
            profiles: Vec::new(),
        });

        let mut reports = Vec::with_capacity(self.conditions.num_dopings() * self.conditions.num_temperatures());
        for condition in self.conditions.iter() {
            reports.push(self.solve_condition(&condition, config, constants, pool, state.as_mut())?);
        }
        Ok(Outcome { reports, state })
    }

    #[tracing::instrument(name = "Condition", level = "info", skip(self, config, constants, pool, state), fields(doping = condition.doping, temperature = condition.temperature))]
    fn solve_condition(
        &self,
        condition: &Condition,
        config: &Configuration,
        constants: &PhysicalConstants,
        pool: &WorkerPool,
        mut state: Option<&mut RunState>,
    ) -> Result<ConditionReport, TransporterError> {
        let solution = find_fermi(
            &self.dos,
            condition.doping,
            condition.temperature,
            self.cell_volume,
            &config.performance.fermi(),
            constants,
        )?;
        let impurities =
            impurity_concentration(&solution.concentrations, &self.material, self.cell_volume);
        tracing::info!(
            "Fermi level {:.4} eV, ionised impurities {impurities:.4e} 1/cm^3",
            solution.fermi
        );

        let solutions = PerCarrier::try_from_fn(|carrier| {
            self.solve_carrier(
                carrier,
                condition,
                &solution,
                impurities,
                config,
                constants,
                pool,
                state.as_deref_mut(),
            )
        })?;

        let transport = solutions.map(|_, solution| solution.transport.clone());
        let seebeck = combined_seebeck(&transport);
        Ok(ConditionReport {
            doping: condition.doping,
            temperature: condition.temperature,
            fermi: solution.fermi,
            calculated: solution.concentrations.clone(),
            relative_error: solution.relative_error,
            inverse_screening_length: solutions.map(|_, solution| solution.inverse_screening_length),
            impurity_concentration: impurities,
            transport,
            seebeck,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn solve_carrier(
        &self,
        carrier: CarrierType,
        condition: &Condition,
        solution: &FermiSolution,
        impurities: f64,
        config: &Configuration,
        constants: &PhysicalConstants,
        pool: &WorkerPool,
        state: Option<&mut RunState>,
    ) -> Result<CarrierSolution, TransporterError> {
        let isotropic = config.model.bs_is_isotropic;
        let temperature = condition.temperature;
        let fermi = solution.fermi;
        let grid = self.kgrid.carrier(carrier);
        let extremum = grid.extremum();

        let beta = inverse_screening_length(grid, fermi, temperature, self.material.epsilon_s, constants);
        let context = ScatteringContext {
            carrier,
            temperature,
            inverse_screening_length: beta,
            impurity_concentration: impurities,
            lattice_c: self.lattice_c,
            material: &self.material,
            constants,
        };

        let integrals = SeebeckIntegrals::evaluate(
            &self.egrids[carrier],
            extremum.energy,
            fermi,
            temperature,
            constants,
        );
        let forces =
            DrivingForces::evaluate(grid, fermi, temperature, &integrals, &config.driving, constants);

        let table = self.neighbors.as_ref().map(|tables| &tables[carrier]);
        let elastic = ElasticRates::evaluate(
            &context,
            grid,
            table,
            &config.model.elastic_scatterings,
            isotropic,
            pool,
        )?;
        let polar_optical = if config.polar_optical() {
            let table = table.ok_or(ScatteringError::MissingNeighbours("polar optical"))?;
            Some(PolarOptical::new(context.clone(), grid, table, isotropic)?)
        } else {
            None
        };

        let settings = config.performance.bte();
        let mut solver = BteSolverBuilder::new()
            .with_grid(grid)
            .with_forces(&forces)
            .with_elastic(&elastic)
            .with_polar_optical(polar_optical.as_ref())
            .with_settings(&settings)
            .with_pool(pool)
            .build(constants.gs);
        solver.run_loop()?;
        let perturbation: Perturbation = solver.into_perturbation();

        let inputs = TransportInputs {
            carrier,
            fermi,
            temperature,
            electric_field: config.driving.electric_field,
            forces: &forces,
            elastic: &elastic,
            perturbation: &perturbation,
            polar_optical: polar_optical.is_some(),
        };
        let mobility = Mobility::evaluate(&self.kgrid, &inputs, &self.material, constants);
        let seebeck = seebeck(&integrals, fermi, extremum.energy, temperature, constants);
        let transport = CarrierTransport::new(
            mobility,
            seebeck,
            solution.concentrations[carrier],
            extremum.effective_mass[(0, 0)].abs(),
            constants,
        );

        if let Some(state) = state {
            state.fields[carrier].store(condition, &forces, &elastic, &perturbation);
            state.profiles.push(EnergyProfiles::map(
                &self.egrids[carrier],
                condition,
                &perturbation,
                isotropic,
            ));
        }

        Ok(CarrierSolution {
            transport,
            inverse_screening_length: beta,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{ConditionReport, Setup};
    use crate::{
        app::Configuration, carrier::CarrierType, constants::PhysicalConstants, input::Input,
        workers::WorkerPool,
    };
    use config::{Config, File, FileFormat};
    use nalgebra::Vector3;
    use std::path::Path;

    fn finite(vector: &Vector3<f64>) -> bool {
        vector.iter().all(|value| value.is_finite())
    }

    fn assert_finite(report: &ConditionReport) {
        assert!(report.fermi.is_finite());
        assert!(report.relative_error.is_finite());
        assert!(report.impurity_concentration.is_finite());
        assert!(report.seebeck.is_finite(), "combined Seebeck {}", report.seebeck);
        for carrier in CarrierType::ALL {
            assert!(report.calculated[carrier].is_finite());
            assert!(report.inverse_screening_length[carrier].is_finite());
            let transport = &report.transport[carrier];
            assert!(transport.seebeck.is_finite());
            assert!(finite(&transport.conductivity), "{carrier}-type conductivity");
            assert!(finite(&transport.power_factor));
            assert!(finite(&transport.relaxation_time));
            let mobility = &transport.mobility;
            assert!(finite(&mobility.overall), "{carrier}-type mobility {:?}", mobility.overall);
            assert!(finite(&mobility.average));
            assert!(mobility.spb_acd.is_finite());
            assert!(mobility.mechanisms.values().all(finite));
        }
    }

    #[test]
    fn polar_optical_gaas_run_is_finite_for_both_carriers() {
        // The default model and mesh, narrowed to a single condition
        let config: Configuration = Config::builder()
            .add_source(File::from_str(
                include_str!("../../../.config/default.toml"),
                FileFormat::Toml,
            ))
            .add_source(File::from_str(
                "[conditions]\ndopings = [-1e18]\ntemperatures = [300.0]\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(config.polar_optical());
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../inputs/gaas.toml");
        let input = Input::build(&path).unwrap();
        let constants = PhysicalConstants::default();
        let pool = WorkerPool::sequential().unwrap();

        let setup = Setup::build(&config, &input, &constants, &pool).unwrap();
        let outcome = setup.solve(&config, &constants, &pool, true).unwrap();

        assert_eq!(outcome.reports.len(), 1);
        let report = &outcome.reports[0];
        assert_finite(report);
        assert!(report.calculated.n < 0.);
        assert!(report.calculated.p > 0.);
        for carrier in CarrierType::ALL {
            let mechanisms = &report.transport[carrier].mobility.mechanisms;
            assert_eq!(mechanisms.len(), 4);
            assert!(mechanisms.contains_key("POP"));
        }
        assert!(report.transport.n.mobility.overall.x > 0.);
        assert!(report.transport.n.mean_conductivity() > report.transport.p.mean_conductivity());

        // serde_json writes non-finite numbers as null
        let json = serde_json::to_string(&outcome.reports).unwrap();
        assert!(!json.contains("null"));
        let state = outcome.state.unwrap();
        assert_eq!(state.profiles.len(), 2);
    }
}

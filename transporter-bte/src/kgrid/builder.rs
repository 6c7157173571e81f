use super::{CarrierGrid, GridSettings, KGrid, KState};
use crate::{
    band::BandSampler,
    carrier::{CarrierType, PerCarrier},
    conditions::Conditions,
    constants::PhysicalConstants,
    error::BuildError,
    symmetry::SymmetryOperations,
    workers::WorkerPool,
};
use ndarray::{Array1, Array2};
use transporter_mesher::{KMesh, ReciprocalLattice};

/// Builder for the `KGrid`
///
/// Every reference must be attached before the grid can be built.
pub struct KGridBuilder<
    RefMesh,
    RefSampler,
    RefLattice,
    RefSymmetry,
    RefConditions,
    RefSettings,
    RefConstants,
    RefPool,
> {
    mesh: RefMesh,
    sampler: RefSampler,
    lattice: RefLattice,
    symmetry: RefSymmetry,
    conditions: RefConditions,
    settings: RefSettings,
    constants: RefConstants,
    pool: RefPool,
}

impl KGridBuilder<(), (), (), (), (), (), (), ()> {
    /// Initialise an empty KGridBuilder
    pub fn new() -> Self {
        Self {
            mesh: (),
            sampler: (),
            lattice: (),
            symmetry: (),
            conditions: (),
            settings: (),
            constants: (),
            pool: (),
        }
    }
}

impl Default for KGridBuilder<(), (), (), (), (), (), (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<RefMesh, RefSampler, RefLattice, RefSymmetry, RefConditions, RefSettings, RefConstants, RefPool>
    KGridBuilder<
        RefMesh,
        RefSampler,
        RefLattice,
        RefSymmetry,
        RefConditions,
        RefSettings,
        RefConstants,
        RefPool,
    >
{
    /// Attach the rectilinear mesh to sample
    pub fn with_mesh<Mesh>(
        self,
        mesh: &Mesh,
    ) -> KGridBuilder<
        &Mesh,
        RefSampler,
        RefLattice,
        RefSymmetry,
        RefConditions,
        RefSettings,
        RefConstants,
        RefPool,
    > {
        KGridBuilder {
            mesh,
            sampler: self.sampler,
            lattice: self.lattice,
            symmetry: self.symmetry,
            conditions: self.conditions,
            settings: self.settings,
            constants: self.constants,
            pool: self.pool,
        }
    }

    /// Attach the band structure
    pub fn with_sampler<Sampler>(
        self,
        sampler: &Sampler,
    ) -> KGridBuilder<
        RefMesh,
        &Sampler,
        RefLattice,
        RefSymmetry,
        RefConditions,
        RefSettings,
        RefConstants,
        RefPool,
    > {
        KGridBuilder {
            mesh: self.mesh,
            sampler,
            lattice: self.lattice,
            symmetry: self.symmetry,
            conditions: self.conditions,
            settings: self.settings,
            constants: self.constants,
            pool: self.pool,
        }
    }

    /// Attach the reciprocal lattice
    pub fn with_lattice<Lattice>(
        self,
        lattice: &Lattice,
    ) -> KGridBuilder<
        RefMesh,
        RefSampler,
        &Lattice,
        RefSymmetry,
        RefConditions,
        RefSettings,
        RefConstants,
        RefPool,
    > {
        KGridBuilder {
            mesh: self.mesh,
            sampler: self.sampler,
            lattice,
            symmetry: self.symmetry,
            conditions: self.conditions,
            settings: self.settings,
            constants: self.constants,
            pool: self.pool,
        }
    }

    /// Attach the symmetry operations used to recentre wavevectors
    pub fn with_symmetry<Symmetry>(
        self,
        symmetry: &Symmetry,
    ) -> KGridBuilder<
        RefMesh,
        RefSampler,
        RefLattice,
        &Symmetry,
        RefConditions,
        RefSettings,
        RefConstants,
        RefPool,
    > {
        KGridBuilder {
            mesh: self.mesh,
            sampler: self.sampler,
            lattice: self.lattice,
            symmetry,
            conditions: self.conditions,
            settings: self.settings,
            constants: self.constants,
            pool: self.pool,
        }
    }

    /// Attach the dopings and temperatures, which fix the default energy window
    pub fn with_conditions<Conditions>(
        self,
        conditions: &Conditions,
    ) -> KGridBuilder<
        RefMesh,
        RefSampler,
        RefLattice,
        RefSymmetry,
        &Conditions,
        RefSettings,
        RefConstants,
        RefPool,
    > {
        KGridBuilder {
            mesh: self.mesh,
            sampler: self.sampler,
            lattice: self.lattice,
            symmetry: self.symmetry,
            conditions,
            settings: self.settings,
            constants: self.constants,
            pool: self.pool,
        }
    }

    /// Attach the filtering settings
    pub fn with_settings<Settings>(
        self,
        settings: &Settings,
    ) -> KGridBuilder<
        RefMesh,
        RefSampler,
        RefLattice,
        RefSymmetry,
        RefConditions,
        &Settings,
        RefConstants,
        RefPool,
    > {
        KGridBuilder {
            mesh: self.mesh,
            sampler: self.sampler,
            lattice: self.lattice,
            symmetry: self.symmetry,
            conditions: self.conditions,
            settings,
            constants: self.constants,
            pool: self.pool,
        }
    }

    /// Attach the physical constants
    pub fn with_constants<Constants>(
        self,
        constants: &Constants,
    ) -> KGridBuilder<
        RefMesh,
        RefSampler,
        RefLattice,
        RefSymmetry,
        RefConditions,
        RefSettings,
        &Constants,
        RefPool,
    > {
        KGridBuilder {
            mesh: self.mesh,
            sampler: self.sampler,
            lattice: self.lattice,
            symmetry: self.symmetry,
            conditions: self.conditions,
            settings: self.settings,
            constants,
            pool: self.pool,
        }
    }

    /// Attach the worker pool the band structure is sampled in
    pub fn with_pool<Pool>(
        self,
        pool: &Pool,
    ) -> KGridBuilder<
        RefMesh,
        RefSampler,
        RefLattice,
        RefSymmetry,
        RefConditions,
        RefSettings,
        RefConstants,
        &Pool,
    > {
        KGridBuilder {
            mesh: self.mesh,
            sampler: self.sampler,
            lattice: self.lattice,
            symmetry: self.symmetry,
            conditions: self.conditions,
            settings: self.settings,
            constants: self.constants,
            pool,
        }
    }
}

impl<Sampler: BandSampler>
    KGridBuilder<
        &KMesh<f64>,
        &Sampler,
        &ReciprocalLattice<f64>,
        &SymmetryOperations,
        &Conditions,
        &GridSettings,
        &PhysicalConstants,
        &WorkerPool,
    >
{
    /// Sample, filter and sort the states of both carrier types
    #[tracing::instrument(name = "KGrid builder", level = "info", skip(self))]
    pub fn build(self) -> Result<KGrid, BuildError> {
        let volumes = Array1::from(self.mesh.cell_volumes())
            * (self.lattice.volume() / self.constants.cubic_angstrom_to_cubic_centimetre());
        let carriers = PerCarrier::try_from_fn(|carrier| self.build_carrier(carrier))?;
        let grid = KGrid::new(self.mesh.clone(), self.lattice.clone(), volumes, carriers);

        let nominal_gap =
            grid.carrier(CarrierType::N).extremum().energy - grid.carrier(CarrierType::P).extremum().energy;
        let sampled_gap = grid.band_gap();
        if (nominal_gap - sampled_gap).abs() > self.constants.thermal_energy(300.) {
            tracing::warn!(
                "The band gap on the k-mesh, {sampled_gap:.4} eV, differs from the gap between the extrema, {nominal_gap:.4} eV"
            );
        }
        Ok(grid)
    }

    fn build_carrier(&self, carrier: CarrierType) -> Result<CarrierGrid, BuildError> {
        let extremum = self.sampler.extremum(carrier);
        let images = self.symmetry.equivalent_points(&extremum.kpoint);
        let energy_cutoff = self.conditions.energy_cutoff(
            carrier,
            self.constants.k_b,
            self.settings.energy_cutoff,
        );
        let num_bands = self.sampler.num_bands(carrier);
        let num_nodes = self.mesh.num_nodes();
        tracing::info!(
            "Sampling {num_bands} {carrier}-type bands on {num_nodes} k-points, energy window {energy_cutoff:.4} eV"
        );

        let samples = self
            .pool
            .map_indices(num_bands * num_nodes, |index| {
                let (band, node) = (index / num_nodes, index % num_nodes);
                Ok::<_, BuildError>(self.sample_state(carrier, band, node, &images))
            })?;

        let mesh_energies = Array2::from_shape_vec(
            (num_bands, num_nodes),
            samples.iter().map(|state| state.energy).collect(),
        )
        .map_err(|e| BuildError::Mesh(e.to_string()))?;

        // Points are retained or discarded on all bands together, based on the first band
        let retained = samples[..num_nodes]
            .iter()
            .filter(|state| {
                state.velocity.iter().all(|&v| v >= self.settings.v_min)
                    && (state.energy - extremum.energy).abs() <= energy_cutoff
            })
            .map(|state| state.mesh_index)
            .collect::<Vec<_>>();
        tracing::debug!(
            "{} of {num_nodes} {carrier}-type k-points retained",
            retained.len()
        );
        if retained.len() < self.settings.min_kpoints {
            return Err(BuildError::TooFewKPoints {
                carrier,
                remaining: retained.len(),
                required: self.settings.min_kpoints,
            });
        }

        let states = (0..num_bands)
            .map(|band| {
                let mut states = retained
                    .iter()
                    .map(|&node| samples[band * num_nodes + node].clone())
                    .collect::<Vec<_>>();
                states.sort_by(|a, b| a.energy.total_cmp(&b.energy));
                states
            })
            .collect();

        CarrierGrid::from_states(carrier, extremum, energy_cutoff, states, mesh_energies)
    }

    fn sample_state(
        &self,
        carrier: CarrierType,
        band: usize,
        node: usize,
        images: &[nalgebra::Vector3<f64>],
    ) -> KState {
        let fractional = self.mesh.vertex(node);
        let sample = self.sampler.sample(&fractional, band, carrier);
        let (a, c) = sample.orbital.mixing();
        let to_nanometre = 1. / self.constants.angstrom_to_nanometre;
        KState {
            cartesian: SymmetryOperations::offset_from_nearest(&fractional, images, self.lattice)
                * to_nanometre,
            old_cartesian: self.lattice.to_cartesian(&fractional) * to_nanometre,
            fractional,
            energy: sample.energy,
            velocity: sample.velocity,
            effective_mass: sample.effective_mass,
            a,
            c,
            mesh_index: node,
        }
    }
}

#[cfg(test)]
mod test {
    use super::KGridBuilder;
    use crate::{
        band::{BandModel, ParabolicBand, ParabolicBands},
        carrier::CarrierType,
        conditions::Conditions,
        constants::PhysicalConstants,
        error::BuildError,
        kgrid::GridSettings,
        symmetry::SymmetryOperations,
        workers::WorkerPool,
    };
    use nalgebra::{Matrix3, Vector3};
    use transporter_mesher::{create_k_mesh, ReciprocalLattice};

    fn gamma_band(mass: f64) -> ParabolicBand {
        ParabolicBand {
            kpoint: [0., 0., 0.],
            effective_mass: mass,
            offset: 0.,
            s_character: 1.,
            p_character: 0.,
        }
    }

    fn bands(lattice: &ReciprocalLattice<f64>) -> ParabolicBands {
        let model = BandModel {
            valence_band_maximum: 0.,
            band_gap: 1.5,
            conduction: vec![gamma_band(0.067)],
            valence: vec![gamma_band(0.5)],
        };
        ParabolicBands::new(
            model,
            lattice.clone(),
            &SymmetryOperations::identity(),
            0.,
            &PhysicalConstants::default(),
        )
        .unwrap()
    }

    #[test]
    fn retained_states_are_sorted_and_inside_the_window() {
        let lattice = ReciprocalLattice::from_direct(&(Matrix3::identity() * 5.65)).unwrap();
        let bands = bands(&lattice);
        let mesh = create_k_mesh(&[Vector3::zeros()], &[0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2]);
        let conditions = Conditions::new(vec![-1e18], vec![300.]).unwrap();
        let settings = GridSettings::default();
        let constants = PhysicalConstants::default();
        let pool = WorkerPool::sequential().unwrap();
        let grid = KGridBuilder::new()
            .with_mesh(&mesh)
            .with_sampler(&bands)
            .with_lattice(&lattice)
            .with_symmetry(&SymmetryOperations::identity())
            .with_conditions(&conditions)
            .with_settings(&settings)
            .with_constants(&constants)
            .with_pool(&pool)
            .build()
            .unwrap();

        for carrier in CarrierType::ALL {
            let carrier_grid = grid.carrier(carrier);
            let energies = carrier_grid.band_energies(0);
            assert!(energies.windows(2).into_iter().all(|pair| pair[0] <= pair[1]));
            assert!(energies
                .iter()
                .all(|e| (e - carrier_grid.extremum().energy).abs() <= carrier_grid.energy_cutoff()));
            // Points on the axes through the extremum have a vanishing velocity component
            assert!(carrier_grid
                .states()
                .iter()
                .all(|state| state.velocity.iter().all(|&v| v >= settings.v_min)));
        }
        assert!(grid.band_gap() >= 1.5);
        assert_eq!(grid.volumes().len(), mesh.num_nodes());
    }

    #[test]
    fn too_tight_a_window_is_fatal() {
        let lattice = ReciprocalLattice::from_direct(&(Matrix3::identity() * 5.65)).unwrap();
        let bands = bands(&lattice);
        let mesh = create_k_mesh(&[Vector3::zeros()], &[0.25]);
        let conditions = Conditions::new(vec![-1e18], vec![300.]).unwrap();
        let settings = GridSettings {
            energy_cutoff: Some(1e-6),
            ..GridSettings::default()
        };
        let pool = WorkerPool::sequential().unwrap();
        let result = KGridBuilder::new()
            .with_mesh(&mesh)
            .with_sampler(&bands)
            .with_lattice(&lattice)
            .with_symmetry(&SymmetryOperations::identity())
            .with_conditions(&conditions)
            .with_settings(&settings)
            .with_constants(&PhysicalConstants::default())
            .with_pool(&pool)
            .build();
        assert!(matches!(
            result,
            Err(BuildError::TooFewKPoints {
                carrier: CarrierType::N,
                ..
            })
        ));
    }
}

use transporter_bte::{
    bte::{BteSettings, BteSolverBuilder, Iterate},
    carrier::CarrierType,
    dos::DensityOfStates,
    egrid::{DosMode, EnergyGrid},
    fermi::{find_fermi, impurity_concentration, inverse_screening_length, FermiSettings, SeebeckIntegrals},
    forces::{DrivingForces, DrivingSettings},
    scattering::{ElasticMechanism, ElasticRates, ScatteringContext},
    transport::{seebeck, Mobility, TransportInputs},
    workers::WorkerPool,
};
use utilities::structures::construct_gaas;

#[test]
fn n_type_gaas_in_the_relaxation_time_approximation() {
    let structure = construct_gaas(
        vec![-1e18],
        vec![300.],
        &[0.005, 0.01, 0.02, 0.04, 0.08],
    );
    let constants = &structure.constants;
    let material = &structure.material;
    let (temperature, doping) = (300., -1e18);
    let cell_volume = structure.bands.lattice().direct_volume();
    let pool = WorkerPool::sequential().unwrap();

    let dos = DensityOfStates::parabolic(&structure.bands, 2., 1e-4, false, constants).unwrap();
    let solution = find_fermi(
        &dos,
        doping,
        temperature,
        cell_volume,
        &FermiSettings::default(),
        constants,
    )
    .unwrap();
    assert!(solution.relative_error < 1e-3);
    // Degenerate enough that the level sits close to the conduction band
    let grid = structure.kgrid.carrier(CarrierType::N);
    assert!(grid.extremum().energy - solution.fermi < 0.2);

    let egrid = EnergyGrid::build(grid, &dos, DosMode::Standard, 1e-4, 2).unwrap();
    let context = ScatteringContext {
        carrier: CarrierType::N,
        temperature,
        inverse_screening_length: inverse_screening_length(
            grid,
            solution.fermi,
            temperature,
            material.epsilon_s,
            constants,
        ),
        impurity_concentration: impurity_concentration(
            &solution.concentrations,
            material,
            cell_volume,
        ),
        lattice_c: 5.653 / 2_f64.sqrt(),
        material,
        constants,
    };
    let integrals = SeebeckIntegrals::evaluate(
        &egrid,
        grid.extremum().energy,
        solution.fermi,
        temperature,
        constants,
    );
    let forces = DrivingForces::evaluate(
        grid,
        solution.fermi,
        temperature,
        &integrals,
        &DrivingSettings::default(),
        constants,
    );
    let elastic = ElasticRates::evaluate(
        &context,
        grid,
        None,
        &[ElasticMechanism::Acd, ElasticMechanism::Imp],
        true,
        &pool,
    )
    .unwrap();

    let settings = BteSettings::default();
    let mut solver = BteSolverBuilder::new()
        .with_grid(grid)
        .with_forces(&forces)
        .with_elastic(&elastic)
        .with_polar_optical(None)
        .with_settings(&settings)
        .with_pool(&pool)
        .build(constants.gs);
    solver.run_loop().unwrap();
    let perturbation = solver.into_perturbation();

    let inputs = TransportInputs {
        carrier: CarrierType::N,
        fermi: solution.fermi,
        temperature,
        electric_field: DrivingSettings::default().electric_field,
        forces: &forces,
        elastic: &elastic,
        perturbation: &perturbation,
        polar_optical: false,
    };
    let mobility = Mobility::evaluate(&structure.kgrid, &inputs, material, constants);
    assert_eq!(mobility.mechanisms.len(), 2);
    for value in mobility.mechanisms.values() {
        assert!(value.iter().all(|mu| mu.is_finite() && *mu > 0.));
    }
    assert!(mobility.overall.norm() <= mobility.average.norm() * (1. + 1e-9));
    assert!(mobility.spb_acd > 0.);

    let coefficient = seebeck(
        &integrals,
        solution.fermi,
        grid.extremum().energy,
        temperature,
        constants,
    );
    assert!(coefficient.is_finite());
}

use transporter_bte::{
    band::{BandModel, ParabolicBand, ParabolicBands},
    carrier::CarrierType,
    conditions::Conditions,
    constants::PhysicalConstants,
    kgrid::{GridSettings, KGrid, KGridBuilder},
    material::{Material, MaterialParameters},
    symmetry::SymmetryOperations,
    workers::WorkerPool,
};
use transporter_mesher::{create_k_mesh, ReciprocalLattice};

/// Face centred cubic GaAs, lattice constant 5.653 Angstrom
pub fn gaas_lattice() -> ReciprocalLattice<f64> {
    let half = 5.653 / 2.;
    let direct = nalgebra::Matrix3::new(0., half, half, half, 0., half, half, half, 0.);
    ReciprocalLattice::from_direct(&direct).expect("the fcc lattice is not singular")
}

/// Single parabolic conduction and valence bands at Gamma
pub fn gaas_bands() -> BandModel {
    let band = |effective_mass, s_character, p_character| ParabolicBand {
        kpoint: [0.; 3],
        effective_mass,
        offset: 0.,
        s_character,
        p_character,
    };
    BandModel {
        valence_band_maximum: 0.,
        band_gap: 0.9372,
        conduction: vec![band(0.067, 1., 0.)],
        valence: vec![band(0.45, 0., 1.)],
    }
}

pub struct GaAsStructure {
    pub material: MaterialParameters<f64>,
    pub bands: ParabolicBands,
    pub kgrid: KGrid,
    pub conditions: Conditions,
    pub constants: PhysicalConstants,
}

/// Sample the GaAs bands on a coarse mesh refined around Gamma
pub fn construct_gaas(dopings: Vec<f64>, temperatures: Vec<f64>, steps: &[f64]) -> GaAsStructure {
    let material = Material::GaAs.get_info::<f64>();
    let constants = PhysicalConstants::default();
    let lattice = gaas_lattice();
    let symmetry = SymmetryOperations::with_inversion();
    let bands = ParabolicBands::new(
        gaas_bands(),
        lattice.clone(),
        &symmetry,
        material.scissor,
        &constants,
    )
    .unwrap();
    let conditions = Conditions::new(dopings, temperatures).unwrap();
    let centers = CarrierType::ALL.map(|carrier| {
        transporter_bte::band::BandSampler::extremum_kpoint(&bands, carrier)
    });
    let mesh = create_k_mesh(&centers, steps);
    let pool = WorkerPool::sequential().unwrap();
    let kgrid = KGridBuilder::new()
        .with_mesh(&mesh)
        .with_sampler(&bands)
        .with_lattice(&lattice)
        .with_symmetry(&symmetry)
        .with_conditions(&conditions)
        .with_settings(&GridSettings::default())
        .with_constants(&constants)
        .with_pool(&pool)
        .build()
        .unwrap();
    GaAsStructure {
        material,
        bands,
        kgrid,
        conditions,
        constants,
    }
}

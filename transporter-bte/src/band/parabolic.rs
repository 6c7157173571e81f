use super::{BandSample, BandSampler, OrbitalCharacter};
use crate::{
    carrier::{CarrierType, PerCarrier},
    constants::PhysicalConstants,
    error::BuildError,
    symmetry::SymmetryOperations,
};
use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use transporter_mesher::ReciprocalLattice;

/// A single isotropic parabolic band
#[derive(Clone, Debug, Deserialize)]
pub struct ParabolicBand {
    /// Fractional coordinate of the band extremum
    pub kpoint: [f64; 3],
    /// Effective mass in units of the free electron mass
    pub effective_mass: f64,
    /// Distance of the band edge from the gap edge in eV
    #[serde(default)]
    pub offset: f64,
    /// Projection of the band onto s orbitals
    #[serde(default = "unit_s_character")]
    pub s_character: f64,
    /// Projection of the band onto p orbitals
    #[serde(default)]
    pub p_character: f64,
}

fn unit_s_character() -> f64 {
    1.
}

/// The parabolic band model read from the input file
#[derive(Clone, Debug, Deserialize)]
pub struct BandModel {
    /// Valence band maximum in eV before the scissor is applied
    #[serde(default)]
    pub valence_band_maximum: f64,
    /// Band gap in eV before the scissor is applied
    pub band_gap: f64,
    /// Conduction bands, lowest first
    pub conduction: Vec<ParabolicBand>,
    /// Valence bands, highest first
    pub valence: Vec<ParabolicBand>,
}

/// Analytic parabolic bands centred on symmetry-equivalent copies of their extrema
#[derive(Clone, Debug)]
pub struct ParabolicBands {
    model: BandModel,
    lattice: ReciprocalLattice<f64>,
    images: PerCarrier<Vec<Vec<Vector3<f64>>>>,
    scissor: f64,
    constants: PhysicalConstants,
}

impl ParabolicBands {
    /// Place every band on the symmetry images of its extremum
    ///
    /// Fails when either carrier type has no bands.
    pub fn new(
        model: BandModel,
        lattice: ReciprocalLattice<f64>,
        symmetry: &SymmetryOperations,
        scissor: f64,
        constants: &PhysicalConstants,
    ) -> Result<Self, BuildError> {
        if model.conduction.is_empty() {
            return Err(BuildError::MissingBands(CarrierType::N));
        }
        if model.valence.is_empty() {
            return Err(BuildError::MissingBands(CarrierType::P));
        }
        let images = PerCarrier::new(&model.conduction, &model.valence).map(|_, bands| {
            bands
                .iter()
                .map(|band| symmetry.equivalent_points(&Vector3::from(band.kpoint)))
                .collect::<Vec<_>>()
        });
        Ok(Self {
            model,
            lattice,
            images,
            scissor,
            constants: constants.clone(),
        })
    }

    fn bands(&self, carrier: CarrierType) -> &[ParabolicBand] {
        match carrier {
            CarrierType::N => &self.model.conduction,
            CarrierType::P => &self.model.valence,
        }
    }

    /// The reciprocal lattice the bands are defined on
    pub fn lattice(&self) -> &ReciprocalLattice<f64> {
        &self.lattice
    }

    /// The energy of the edge of `band`, including the scissor
    pub fn band_edge(&self, carrier: CarrierType, band: usize) -> f64 {
        let offset = self.bands(carrier)[band].offset;
        match carrier {
            CarrierType::N => {
                self.model.valence_band_maximum + self.model.band_gap + offset + self.scissor / 2.
            }
            CarrierType::P => self.model.valence_band_maximum - offset - self.scissor / 2.,
        }
    }

    /// The scalar effective mass of `band` in units of the free electron mass
    pub fn effective_mass(&self, carrier: CarrierType, band: usize) -> f64 {
        self.bands(carrier)[band].effective_mass
    }

    /// The number of symmetry-equivalent extrema of `band`
    pub fn valley_degeneracy(&self, carrier: CarrierType, band: usize) -> usize {
        self.images[carrier][band].len()
    }
}

impl BandSampler for ParabolicBands {
    fn num_bands(&self, carrier: CarrierType) -> usize {
        self.bands(carrier).len()
    }

    fn extremum_kpoint(&self, carrier: CarrierType) -> Vector3<f64> {
        Vector3::from(self.bands(carrier)[0].kpoint)
    }

    fn sample(&self, k: &Vector3<f64>, band: usize, carrier: CarrierType) -> BandSample {
        let parameters = &self.bands(carrier)[band];
        let mass = parameters.effective_mass * self.constants.m_e;

        // Cartesian offset from the nearest valley in 1/m
        let dk = SymmetryOperations::offset_from_nearest(k, &self.images[carrier][band], &self.lattice)
            / self.constants.angstrom_to_metre;

        let kinetic = self.constants.hbar_si.powi(2) * dk.norm_squared() / (2. * mass) / self.constants.e;
        let energy = self.band_edge(carrier, band) - carrier.sign() * kinetic;
        let velocity = (dk * self.constants.hbar_si / mass * self.constants.metre_to_centimetre).abs();

        BandSample {
            energy,
            velocity,
            effective_mass: Matrix3::from_diagonal_element(parameters.effective_mass),
            orbital: OrbitalCharacter {
                s: parameters.s_character,
                p: parameters.p_character,
            },
        }
    }
}

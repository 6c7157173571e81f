//! # Fermi
//!
//! Equilibrium quantities which depend on a doping condition: the Fermi level reproducing a
//! target carrier concentration, the ionised impurity density, the inverse screening length
//! and the two energy integrals entering the Seebeck coefficient.
//!
//! Concentrations are signed, electrons carry a negative sign and holes a positive one. The
//! Fermi level is bracketed by the density of states mesh and found by bisection, as the net
//! concentration decreases monotonically as the Fermi level rises.

use crate::{
    carrier::{CarrierType, PerCarrier},
    constants::PhysicalConstants,
    dos::DensityOfStates,
    egrid::EnergyGrid,
    error::FermiError,
    integration::{integrate_dos_weighted, integrate_interpolated_product, interpolation_steps},
    kgrid::CarrierGrid,
    material::MaterialParameters,
    statistics::{f0, hole_occupation},
};
use serde::Deserialize;

/// Bisection stops once the bracket is narrower than this, in eV
const BRACKET_TOLERANCE: f64 = 1e-13;
const MAXIMUM_BISECTIONS: usize = 500;
/// Converts the screening integral to 1/nm^2
const SCREENING_UNIT_CONVERSION: f64 = 6.241509324e27;

/// Acceptance thresholds of the Fermi level search
#[derive(Clone, Debug, Deserialize)]
pub struct FermiSettings {
    /// Relative concentration error below which the Fermi level is accepted silently
    pub tolerance: f64,
    /// Relative concentration error above which the search fails
    pub loose_tolerance: f64,
}

impl Default for FermiSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            loose_tolerance: 0.03,
        }
    }
}

/// The result of a Fermi level search
#[derive(Clone, Debug, PartialEq)]
pub struct FermiSolution {
    /// The Fermi level in eV
    pub fermi: f64,
    /// Signed concentrations of each carrier type at the Fermi level in 1/cm^3
    pub concentrations: PerCarrier<f64>,
    /// Relative error of the net concentration against the target
    pub relative_error: f64,
}

impl FermiSolution {
    /// The net signed concentration
    pub fn net_concentration(&self) -> f64 {
        self.concentrations.n + self.concentrations.p
    }
}

/// Integrate the occupied states of the density of states into signed carrier concentrations
///
/// Electrons are counted from the conduction band minimum to the top of the mesh, holes from the
/// bottom of the mesh up to the valence band maximum. `cell_volume` is the direct cell volume in
/// cubic Angstrom.
pub fn carrier_concentrations(
    dos: &DensityOfStates,
    fermi: f64,
    thermal_energy: f64,
    cell_volume: f64,
    constants: &PhysicalConstants,
) -> PerCarrier<f64> {
    let (energies, values) = (dos.energies(), dos.values());
    let trapezoid = |ie: usize, occupation: f64| {
        (values[ie + 1] + values[ie]) / 2. * occupation * (energies[ie + 1] - energies[ie])
    };
    let volume = cell_volume * constants.cubic_angstrom_to_cubic_centimetre();

    let electrons = (dos.cbm_index()..dos.len().saturating_sub(1))
        .map(|ie| trapezoid(ie, f0(energies[ie], fermi, thermal_energy)))
        .sum::<f64>();
    let holes = (0..dos.vbm_index().saturating_sub(1))
        .map(|ie| trapezoid(ie, hole_occupation(energies[ie], fermi, thermal_energy)))
        .sum::<f64>();

    PerCarrier::new(
        CarrierType::N.sign() * (electrons / volume).abs(),
        CarrierType::P.sign() * (holes / volume).abs(),
    )
}

/// Find the Fermi level at which the density of states holds the net concentration `target`
///
/// A relative error above the settings' tolerance is reported as a warning, one above the loose
/// tolerance is fatal.
#[tracing::instrument(name = "Fermi level", level = "info", skip(dos, settings, constants))]
pub fn find_fermi(
    dos: &DensityOfStates,
    target: f64,
    temperature: f64,
    cell_volume: f64,
    settings: &FermiSettings,
    constants: &PhysicalConstants,
) -> Result<FermiSolution, FermiError> {
    CarrierType::from_concentration(target)?;
    let thermal_energy = constants.thermal_energy(temperature);
    let net = |fermi: f64| {
        let concentrations =
            carrier_concentrations(dos, fermi, thermal_energy, cell_volume, constants);
        (concentrations.n + concentrations.p, concentrations)
    };

    let energies = dos.energies();
    let (mut lower, mut upper) = (energies[0], energies[dos.len() - 1]);
    for _ in 0..MAXIMUM_BISECTIONS {
        if upper - lower < BRACKET_TOLERANCE {
            break;
        }
        let middle = (lower + upper) / 2.;
        let (calculated, _) = net(middle);
        if calculated == target {
            lower = middle;
            upper = middle;
        } else if calculated > target {
            // Too few electrons or too many holes, the level must rise
            lower = middle;
        } else {
            upper = middle;
        }
    }

    let fermi = (lower + upper) / 2.;
    let (calculated, concentrations) = net(fermi);
    let relative_error = (calculated - target).abs() / target.abs();
    if relative_error > settings.loose_tolerance {
        return Err(FermiError::ToleranceExceeded {
            target,
            calculated,
            relative_error,
            temperature,
        });
    }
    if relative_error > settings.tolerance {
        tracing::warn!(
            "The calculated concentration {calculated:e} cm^-3 is not accurate compared to {target:e} cm^-3, results may be unreliable"
        );
    }
    tracing::info!("Fermi level at {target:e} cm^-3 and {temperature} K: {fermi:.6} eV");
    Ok(FermiSolution {
        fermi,
        concentrations,
        relative_error,
    })
}

/// The density of ionised impurities in 1/cm^3
///
/// Every free carrier is taken to be compensated by an ionised donor or acceptor, and charged
/// dislocations contribute their areal density spread over one lattice spacing.
pub fn impurity_concentration(
    concentrations: &PerCarrier<f64>,
    material: &MaterialParameters<f64>,
    cell_volume: f64,
) -> f64 {
    let charges = &material.charges;
    concentrations.n.abs() * charges.donor.powi(2)
        + concentrations.p.abs() * charges.acceptor.powi(2)
        + material.n_dis / cell_volume.cbrt() * 1e8 * charges.dislocation.powi(2)
}

/// The inverse screening length of a carrier type in 1/nm
///
/// The screening integral `∫ f0 (1 - f0) (k/π)² dk` runs over the first band, ordered by the
/// norm of the wavevector.
pub fn inverse_screening_length(
    grid: &CarrierGrid,
    fermi: f64,
    temperature: f64,
    epsilon_s: f64,
    constants: &PhysicalConstants,
) -> f64 {
    let thermal_energy = constants.thermal_energy(temperature);
    let mut states = grid.states().row(0).into_iter().collect::<Vec<_>>();
    states.sort_by(|a, b| a.norm_k().total_cmp(&b.norm_k()));

    let norm_k = states.iter().map(|state| state.norm_k()).collect::<Vec<_>>();
    let occupations = states
        .iter()
        .map(|state| f0(state.energy, fermi, thermal_energy))
        .collect::<Vec<_>>();
    let vacancies = states
        .iter()
        .map(|state| hole_occupation(state.energy, fermi, thermal_energy))
        .collect::<Vec<_>>();
    let density = norm_k
        .iter()
        .map(|k| (k / std::f64::consts::PI).powi(2))
        .collect::<Vec<_>>();

    let integral = integrate_interpolated_product(
        &norm_k,
        &[&occupations, &vacancies, &density],
        interpolation_steps(norm_k.len()),
        constants.gs,
    );
    (constants.e.powi(2) / (epsilon_s * constants.epsilon_0 * constants.k_b * temperature)
        * integral
        * SCREENING_UNIT_CONVERSION)
        .sqrt()
}

/// The Fermi window integrals entering the Seebeck coefficient
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SeebeckIntegrals {
    /// `∫ DOS f0 (1 - f0) E / kT dE`, energies measured from the band extremum
    pub numerator: f64,
    /// `∫ DOS f0 (1 - f0) dE`
    pub denominator: f64,
}

impl SeebeckIntegrals {
    /// Integrate the Fermi window over the energy shells of one carrier type
    pub fn evaluate(
        egrid: &EnergyGrid,
        extremum_energy: f64,
        fermi: f64,
        temperature: f64,
        constants: &PhysicalConstants,
    ) -> Self {
        let thermal_energy = constants.thermal_energy(temperature);
        let energies = egrid.energies();
        let dos = egrid.dos();
        let nsteps = interpolation_steps(energies.len());
        let window = |energy: f64, fermi: f64| {
            f0(energy, fermi, thermal_energy) * hole_occupation(energy, fermi, thermal_energy)
        };

        let relative = energies
            .iter()
            .map(|energy| energy - extremum_energy)
            .collect::<Vec<_>>();
        let relative_fermi = fermi - extremum_energy;
        let numerator = integrate_dos_weighted(&relative, &dos, nsteps, |energy| {
            window(energy, relative_fermi) * energy / thermal_energy
        });
        let denominator =
            constants.gs + integrate_dos_weighted(&energies, &dos, nsteps, |energy| window(energy, fermi));
        Self {
            numerator,
            denominator,
        }
    }

    /// The ratio of the numerator to the denominator
    pub fn ratio(&self) -> f64 {
        self.numerator / self.denominator
    }
}

#[cfg(test)]
mod test {
    use super::{carrier_concentrations, find_fermi, impurity_concentration, FermiSettings};
    use crate::{
        band::{BandModel, ParabolicBand, ParabolicBands},
        carrier::PerCarrier,
        constants::PhysicalConstants,
        dos::DensityOfStates,
        error::FermiError,
        material::Material,
        symmetry::SymmetryOperations,
    };
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;
    use transporter_mesher::ReciprocalLattice;

    fn gamma_band(mass: f64) -> ParabolicBand {
        ParabolicBand {
            kpoint: [0., 0., 0.],
            effective_mass: mass,
            offset: 0.,
            s_character: 1.,
            p_character: 0.,
        }
    }

    fn gaas_like_dos() -> (DensityOfStates, f64) {
        let constants = PhysicalConstants::default();
        let lattice = ReciprocalLattice::from_direct(&(Matrix3::identity() * 5.65)).unwrap();
        let model = BandModel {
            valence_band_maximum: 0.,
            band_gap: 1.42,
            conduction: vec![gamma_band(0.067)],
            valence: vec![gamma_band(0.5)],
        };
        let bands = ParabolicBands::new(
            model,
            lattice.clone(),
            &SymmetryOperations::identity(),
            0.,
            &constants,
        )
        .unwrap();
        let dos = DensityOfStates::parabolic(&bands, 1., 1e-3, false, &constants).unwrap();
        (dos, lattice.direct_volume())
    }

    #[test]
    fn fermi_level_reproduces_the_doping() {
        let (dos, volume) = gaas_like_dos();
        let constants = PhysicalConstants::default();
        let settings = FermiSettings::default();
        for (target, temperature) in [(-1e18, 300.), (1e17, 300.), (-1e16, 600.)] {
            let solution = find_fermi(&dos, target, temperature, volume, &settings, &constants).unwrap();
            let recalculated = carrier_concentrations(
                &dos,
                solution.fermi,
                constants.thermal_energy(temperature),
                volume,
                &constants,
            );
            let relative_error = ((recalculated.n + recalculated.p) - target).abs() / target.abs();
            assert!(relative_error < 1e-3);
            assert_relative_eq!(solution.net_concentration(), recalculated.n + recalculated.p);
        }
    }

    #[test]
    fn n_type_fermi_level_lies_near_the_conduction_band() {
        let (dos, volume) = gaas_like_dos();
        let constants = PhysicalConstants::default();
        let solution =
            find_fermi(&dos, -1e18, 300., volume, &FermiSettings::default(), &constants).unwrap();
        assert!(solution.fermi > 1.2);
        assert!(solution.concentrations.n < 0.);
        assert!(solution.concentrations.p > 0.);
        assert!(solution.concentrations.p < 1.);
    }

    #[test]
    fn unreachable_concentrations_are_fatal() {
        let (dos, volume) = gaas_like_dos();
        let constants = PhysicalConstants::default();
        // Far more electrons than a one electronvolt wide conduction band can hold
        let result = find_fermi(&dos, -1e26, 300., volume, &FermiSettings::default(), &constants);
        assert!(matches!(result, Err(FermiError::ToleranceExceeded { .. })));
        assert!(find_fermi(&dos, 0., 300., volume, &FermiSettings::default(), &constants).is_err());
    }

    #[test]
    fn impurities_include_charged_dislocations() {
        let material = Material::GaAs.get_info::<f64>();
        let concentrations = PerCarrier::new(-1e18, 1e3);
        let volume = 125.;
        let expected = 1e18 + 1e3 + material.n_dis / 5. * 1e8;
        assert_relative_eq!(
            impurity_concentration(&concentrations, &material, volume),
            expected,
            max_relative = 1e-12
        );
    }
}

//! Equilibrium occupation functions and the complete Fermi-Dirac integrals

use nalgebra::Vector3;

/// Occupations are clipped to 0 or 1 beyond this distance from the Fermi level, in eV
const CLIP_ENERGY: f64 = 5.;

/// The Fermi-Dirac distribution
pub fn f0(energy: f64, fermi: f64, thermal_energy: f64) -> f64 {
    let distance = energy - fermi;
    if distance > CLIP_ENERGY {
        0.
    } else if distance < -CLIP_ENERGY {
        1.
    } else {
        1. / (1. + (distance / thermal_energy).exp())
    }
}

/// The probability `1 - f0` that a state is empty
///
/// Evaluated directly so that deep valence states keep a finite hole occupation rather than
/// cancelling to zero.
pub fn hole_occupation(energy: f64, fermi: f64, thermal_energy: f64) -> f64 {
    let distance = energy - fermi;
    if distance > CLIP_ENERGY {
        1.
    } else if distance < -CLIP_ENERGY {
        0.
    } else {
        1. / (1. + (-distance / thermal_energy).exp())
    }
}

/// The energy derivative of the Fermi-Dirac distribution, in 1/eV
pub fn df0_de(energy: f64, fermi: f64, thermal_energy: f64) -> f64 {
    let distance = energy - fermi;
    if distance.abs() > CLIP_ENERGY {
        0.
    } else {
        let exponential = (distance / thermal_energy).exp();
        -exponential / (thermal_energy * (1. + exponential).powi(2))
    }
}

/// The Bose-Einstein occupation of a phonon of energy `phonon_energy`
pub fn bose_einstein(phonon_energy: f64, thermal_energy: f64) -> f64 {
    1. / ((phonon_energy / thermal_energy).exp() - 1.)
}

/// The complete Fermi-Dirac integral of order `order`
///
/// Evaluated by a rectangle rule over 0 to 30 kT measured from `band_edge`, the result carries
/// units of energy.
pub fn fermi_integral(order: f64, fermi: f64, thermal_energy: f64, band_edge: f64) -> f64 {
    const STEPS: usize = 100_000;
    let reduced_fermi = fermi - band_edge;
    let upper = 30. * thermal_energy;
    let step = upper / (STEPS - 1) as f64;
    (0..STEPS)
        .map(|i| {
            let energy = i as f64 * step;
            step * (energy / thermal_energy).powf(order)
                / (1. + ((energy - reduced_fermi) / thermal_energy).exp())
        })
        .sum()
}

/// The cosine of the angle between two wavevectors, taken as 1 if either vanishes
pub fn cos_angle(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let (norm_a, norm_b) = (a.norm(), b.norm());
    if norm_a == 0. || norm_b == 0. {
        1.
    } else {
        a.dot(b) / (norm_a * norm_b)
    }
}

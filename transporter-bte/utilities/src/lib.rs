pub mod structures;

use nalgebra::{Matrix3, Vector3};
use ndarray::Array2;
use rand::{thread_rng, Rng};
use transporter_bte::{
    band::BandExtremum,
    carrier::CarrierType,
    kgrid::{CarrierGrid, KState},
};

/// A single conduction band sampled on `num_shells` shells of three randomly oriented points
///
/// Energies grow quadratically with the norm of the wavevector and the states are sorted by
/// energy, as the k-grid builder leaves them.
pub fn random_shell_grid(num_shells: usize, effective_mass: f64) -> CarrierGrid {
    let mut rng = thread_rng();
    let mut states = (0..num_shells * 3)
        .map(|index| {
            let norm = 0.05 + 0.01 * (index / 3) as f64;
            let direction = Vector3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(0.1..1.0),
            )
            .normalize();
            let cartesian = direction * norm;
            KState {
                fractional: cartesian / 10.,
                cartesian,
                old_cartesian: cartesian,
                energy: 0.1 * norm.powi(2),
                velocity: cartesian.abs() * 1e7 + Vector3::repeat(1e3),
                effective_mass: Matrix3::identity() * effective_mass,
                a: 1.,
                c: 0.,
                mesh_index: index,
            }
        })
        .collect::<Vec<_>>();
    states.sort_by(|a, b| a.energy.total_cmp(&b.energy));
    CarrierGrid::from_states(
        CarrierType::N,
        BandExtremum {
            energy: 0.,
            kpoint: Vector3::zeros(),
            effective_mass: Matrix3::identity() * effective_mass,
        },
        1.,
        vec![states],
        Array2::zeros((1, 1)),
    )
    .expect("the shell grid is never empty")
}

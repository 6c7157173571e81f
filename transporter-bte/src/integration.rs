//! # Integration
//!
//! Quadrature rules shared by the scattering engine and the transport integrator.
//!
//! Tabulated quantities are integrated by linear interpolation between neighbouring samples,
//! each interval being split into a fixed number of rectangles. Integrals over the scattering
//! angle use the trapezoidal rule on the sorted neighbour set.

use crate::neighbors::Neighbor;
use nalgebra::Vector3;

/// The minimum number of rectangles each interval is split into
const MINIMUM_INTERPOLATION_STEPS: usize = 200;

/// The number of rectangles per interval for a table of `len` samples
pub fn interpolation_steps(len: usize) -> usize {
    MINIMUM_INTERPOLATION_STEPS.max(500 / len.max(1))
}

/// Integrate the product of the linearly interpolated `series` over the ascending abscissa `x`
///
/// Intervals of zero width are skipped and the sum is seeded with `seed`.
pub fn integrate_interpolated_product(x: &[f64], series: &[&[f64]], nsteps: usize, seed: f64) -> f64 {
    let mut integral = seed;
    for i in 0..x.len().saturating_sub(1) {
        let dx = (x[i + 1] - x[i]) / nsteps as f64;
        if dx == 0. {
            continue;
        }
        let slopes = series
            .iter()
            .map(|values| (values[i + 1] - values[i]) / nsteps as f64)
            .collect::<Vec<_>>();
        for step in 0..nsteps {
            let step = step as f64;
            integral += series
                .iter()
                .zip(slopes.iter())
                .fold(dx, |product, (values, slope)| product * (values[i] + slope * step));
        }
    }
    integral
}

/// Integrate `f(E) · DOS(E)` over a tabulated density of states
///
/// The density of states is interpolated linearly between the tabulated energies and `f` is
/// evaluated at the interpolated energy.
pub fn integrate_dos_weighted(
    energies: &[f64],
    dos: &[f64],
    nsteps: usize,
    f: impl Fn(f64) -> f64,
) -> f64 {
    let mut integral = 0.;
    for i in 0..energies.len().saturating_sub(1) {
        let de = (energies[i + 1] - energies[i]) / nsteps as f64;
        let ds = (dos[i + 1] - dos[i]) / nsteps as f64;
        for step in 0..nsteps {
            let step = step as f64;
            integral += de * (dos[i] + ds * step) * f(energies[i] + de * step);
        }
    }
    integral
}

/// Trapezoidal integration over the cosine of the scattering angle
///
/// `neighbors` must be sorted by ascending cosine. A vanishing integrand marks a self-scattering
/// point, the interval is then closed with the value at its other end.
pub fn integrate_over_x(
    neighbors: &[Neighbor],
    mut integrand: impl FnMut(&Neighbor) -> Vector3<f64>,
) -> Option<Vector3<f64>> {
    let first = neighbors.first()?;
    let mut summation = Vector3::zeros();
    let mut current = integrand(first);
    for pair in neighbors.windows(2) {
        let dx = pair[1].cosine - pair[0].cosine;
        if dx == 0. {
            continue;
        }
        let mut interval = current / 2.;
        current = integrand(&pair[1]);
        if current.sum() == 0. {
            interval *= 2.;
        } else if interval.sum() == 0. {
            interval = current;
        } else {
            interval += current / 2.;
        }
        summation += interval * dx;
    }
    Some(summation)
}

#[cfg(test)]
mod test {
    use super::{
        integrate_dos_weighted, integrate_interpolated_product, integrate_over_x,
        interpolation_steps,
    };
    use crate::neighbors::Neighbor;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn coarse_tables_get_more_steps() {
        assert_eq!(interpolation_steps(2), 250);
        assert_eq!(interpolation_steps(100), 200);
        assert_eq!(interpolation_steps(0), 500);
    }

    #[test]
    fn linear_products_integrate_to_their_quadrature() {
        // x * x over [0, 1] with fine rectangles tends to 1 / 3 from below
        let x = [0., 0.5, 1.];
        let result = integrate_interpolated_product(&x, &[&x, &x], 2000, 0.);
        assert_relative_eq!(result, 1. / 3., max_relative = 1e-3);
        assert!(result < 1. / 3.);
    }

    #[test]
    fn zero_width_intervals_are_skipped() {
        let x = [0., 0., 1.];
        let y = [100., 1., 1.];
        let result = integrate_interpolated_product(&x, &[&y], 200, 0.);
        assert_relative_eq!(result, 1., epsilon = 1e-12);
    }

    #[test]
    fn constant_density_of_states_integrates_the_weight() {
        let energies = [0., 1., 2.];
        let dos = [2., 2., 2.];
        let result = integrate_dos_weighted(&energies, &dos, 1000, |_| 1.5);
        assert_relative_eq!(result, 6., epsilon = 1e-9);
    }

    fn neighbor(cosine: f64, k: usize) -> Neighbor {
        Neighbor {
            cosine,
            band: 0,
            k,
            forced: false,
        }
    }

    #[test]
    fn angular_integral_of_a_constant() {
        let neighbors = [neighbor(-1., 0), neighbor(0., 1), neighbor(1., 2)];
        let result = integrate_over_x(&neighbors, |_| Vector3::repeat(3.)).unwrap();
        assert_relative_eq!(result, Vector3::repeat(6.), epsilon = 1e-12);
    }

    #[test]
    fn self_scattering_points_do_not_halve_the_interval() {
        let neighbors = [neighbor(0., 0), neighbor(1., 1)];
        // The second point is the state itself
        let result = integrate_over_x(&neighbors, |n| {
            if n.k == 1 {
                Vector3::zeros()
            } else {
                Vector3::repeat(2.)
            }
        })
        .unwrap();
        assert_relative_eq!(result, Vector3::repeat(2.), epsilon = 1e-12);
        assert!(integrate_over_x(&[], |_| Vector3::zeros()).is_none());
    }
}

use nalgebra::{RealField, Vector3};
use std::cmp::Ordering;

/// Coordinates are compared after rounding to this many decimal places
const DEDUPLICATION_DECIMALS: i32 = 14;

/// Fold a single fractional coordinate into the first Brillouin zone, (-0.5, 0.5]
pub fn fold_to_first_bz<T: Copy + RealField>(x: T) -> T {
    let half = crate::zone_upper_edge::<T>();
    x - (x - half).ceil()
}

/// Fold every component of a fractional wavevector into the first Brillouin zone
pub fn fold_point_to_first_bz<T: Copy + RealField>(k: &Vector3<T>) -> Vector3<T> {
    k.map(fold_to_first_bz)
}

/// Emit the points `center ± step` for every centre and step, folded into the first zone,
/// deduplicated and sorted in ascending order. The centres themselves are always included.
pub fn build_axis_points<T>(centers: &[T], steps: &[T]) -> Vec<T>
where
    T: Copy + RealField,
{
    let scale: T = nalgebra::convert(10_f64.powi(DEDUPLICATION_DECIMALS));

    let mut points = centers
        .iter()
        .flat_map(|&center| {
            std::iter::once(center).chain(
                steps
                    .iter()
                    .flat_map(move |&step| [center - step, center + step]),
            )
        })
        .map(|x| (fold_to_first_bz(x) * scale).round() / scale)
        .collect::<Vec<_>>();

    points.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    points.dedup();
    points
}

mod axis;

pub use axis::*;

use crate::mesh::KMesh;
use nalgebra::{RealField, Vector3};

/// Builds a rectilinear mesh whose axes are refined around each of the `centers`
///
/// Each axis collects the matching component of every centre, so a mesh built around
/// two extrema is refined around the projections of both onto each axis.
pub fn create_k_mesh<T>(centers: &[Vector3<T>], steps: &[T]) -> KMesh<T>
where
    T: Copy + RealField,
{
    let axes = [0, 1, 2].map(|direction| {
        let projected = centers
            .iter()
            .map(|center| center[direction])
            .collect::<Vec<_>>();
        build_axis_points(&projected, steps)
    });
    KMesh::from_axes(axes)
}

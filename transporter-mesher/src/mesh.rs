use crate::{AxisConnectivity, Connectivity};
use nalgebra::{RealField, Vector3};

/// A rectilinear mesh in fractional reciprocal coordinates
///
/// Vertices are the Cartesian product of three sorted axes and are addressed by a flat
/// row-major index `i * ny * nz + j * nz + k`.
#[derive(Debug, Clone)]
pub struct KMesh<T: RealField> {
    axes: [Vec<T>; 3],
    connectivity: [Vec<AxisConnectivity>; 3],
}

impl<T> KMesh<T>
where
    T: Copy + RealField,
{
    /// Build a mesh from three sorted axes
    pub fn from_axes(axes: [Vec<T>; 3]) -> Self {
        let connectivity = [0, 1, 2].map(|direction| {
            let length = axes[direction].len();
            (0..length)
                .map(|index| AxisConnectivity::for_point(index, length))
                .collect()
        });
        Self { axes, connectivity }
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.axes[0].len(), self.axes[1].len(), self.axes[2].len()]
    }

    pub fn num_nodes(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn axis(&self, direction: usize) -> &[T] {
        &self.axes[direction]
    }

    pub fn connectivity(&self, direction: usize) -> Vec<&[usize]> {
        self.connectivity[direction]
            .iter()
            .map(|x| x.as_inner())
            .collect()
    }

    pub fn flat_index(&self, index: [usize; 3]) -> usize {
        let [_, ny, nz] = self.shape();
        index[0] * ny * nz + index[1] * nz + index[2]
    }

    pub fn grid_index(&self, flat_index: usize) -> [usize; 3] {
        let [_, ny, nz] = self.shape();
        [flat_index / (ny * nz), (flat_index / nz) % ny, flat_index % nz]
    }

    /// The fractional coordinate of the vertex at `flat_index`
    pub fn vertex(&self, flat_index: usize) -> Vector3<T> {
        let [i, j, k] = self.grid_index(flat_index);
        Vector3::new(self.axes[0][i], self.axes[1][j], self.axes[2][k])
    }

    /// All vertices in flat index order
    pub fn vertices(&self) -> impl Iterator<Item = Vector3<T>> + '_ {
        (0..self.num_nodes()).map(move |index| self.vertex(index))
    }

    /// The width of the cell around each point of an axis
    ///
    /// Cells are bounded by the midpoints to the neighbouring points, cells at the end of an
    /// axis extend to the zone boundary.
    pub fn cell_widths(&self, direction: usize) -> Vec<T> {
        let axis = &self.axes[direction];
        let two = T::one() + T::one();
        let lower_edge = crate::zone_lower_edge::<T>();
        let upper_edge = crate::zone_upper_edge::<T>();
        self.connectivity[direction]
            .iter()
            .enumerate()
            .map(|(index, connectivity)| {
                let x = axis[index];
                match connectivity {
                    AxisConnectivity::Core([lower, upper]) => {
                        (x - axis[*lower]) / two + (axis[*upper] - x) / two
                    }
                    AxisConnectivity::LowerBoundary([upper]) => {
                        (x - lower_edge) + (axis[*upper] - x) / two
                    }
                    AxisConnectivity::UpperBoundary([lower]) => {
                        (x - axis[*lower]) / two + (upper_edge - x)
                    }
                    AxisConnectivity::Isolated => upper_edge - lower_edge,
                }
            })
            .collect()
    }

    /// The fractional volume associated with each vertex, in flat index order
    pub fn cell_volumes(&self) -> Vec<T> {
        let widths = [0, 1, 2].map(|direction| self.cell_widths(direction));
        (0..self.num_nodes())
            .map(|index| {
                let [i, j, k] = self.grid_index(index);
                widths[0][i] * widths[1][j] * widths[2][k]
            })
            .collect()
    }
}

use nalgebra::{Matrix3, RealField, Vector3};

/// The reciprocal lattice of a crystal
///
/// Rows of `matrix` are the reciprocal basis vectors, including the factor of 2π, in the
/// inverse length unit of the direct lattice it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReciprocalLattice<T: RealField> {
    matrix: Matrix3<T>,
}

impl<T> ReciprocalLattice<T>
where
    T: Copy + RealField,
{
    pub fn from_matrix(matrix: Matrix3<T>) -> Self {
        Self { matrix }
    }

    /// Build the reciprocal lattice of a direct lattice whose rows are the lattice vectors
    ///
    /// Returns `None` when the direct lattice vectors are linearly dependent.
    pub fn from_direct(direct: &Matrix3<T>) -> Option<Self> {
        let inverse = direct.clone_owned().try_inverse()?;
        Some(Self {
            matrix: inverse.transpose() * T::two_pi(),
        })
    }

    pub fn matrix(&self) -> &Matrix3<T> {
        &self.matrix
    }

    /// Convert a fractional wavevector to Cartesian coordinates
    pub fn to_cartesian(&self, fractional: &Vector3<T>) -> Vector3<T> {
        self.matrix.transpose() * fractional
    }

    /// The volume of the reciprocal cell
    pub fn volume(&self) -> T {
        self.matrix.determinant().abs()
    }

    /// The volume of the direct cell the lattice was built from
    pub fn direct_volume(&self) -> T {
        T::two_pi().powi(3) / self.volume()
    }
}

//! # Symmetry
//!
//! Space group operations acting on fractional reciprocal coordinates. They are used to locate
//! every copy of a band extremum so that wavevectors can be measured from the nearest one.

use crate::error::BuildError;
use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use transporter_mesher::{fold_point_to_first_bz, ReciprocalLattice};

/// Images closer than this in fractional coordinates are considered identical
const IMAGE_TOLERANCE: f64 = 1e-8;

/// Space group operations acting on fractional coordinates
#[derive(Clone, Debug)]
pub struct SymmetryOperations {
    rotations: Vec<Matrix3<f64>>,
    translations: Vec<Vector3<f64>>,
}

/// Symmetry as written in the input file
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymmetrySpecification {
    /// No operations beyond the identity
    Identity,
    /// The identity and spatial inversion
    Inversion,
    /// Rotations and translations in fractional coordinates
    Explicit {
        /// Rotation matrices, one row per output component
        rotations: Vec<[[f64; 3]; 3]>,
        /// The fractional translation of each rotation
        translations: Vec<[f64; 3]>,
    },
}

impl Default for SymmetrySpecification {
    fn default() -> Self {
        Self::Identity
    }
}

impl SymmetryOperations {
    /// The identity alone
    pub fn identity() -> Self {
        Self {
            rotations: vec![Matrix3::identity()],
            translations: vec![Vector3::zeros()],
        }
    }

    /// The identity and spatial inversion
    pub fn with_inversion() -> Self {
        Self {
            rotations: vec![Matrix3::identity(), -Matrix3::identity()],
            translations: vec![Vector3::zeros(), Vector3::zeros()],
        }
    }

    /// Fails when the rotations and translations differ in number
    pub fn from_parts(
        rotations: Vec<Matrix3<f64>>,
        translations: Vec<Vector3<f64>>,
    ) -> Result<Self, BuildError> {
        if rotations.is_empty() || rotations.len() != translations.len() {
            return Err(BuildError::Mesh(format!(
                "symmetry operations need one translation per rotation, found {} rotations and {} translations",
                rotations.len(),
                translations.len()
            )));
        }
        Ok(Self {
            rotations,
            translations,
        })
    }

    /// Expand the form read from the input file
    pub fn from_specification(specification: &SymmetrySpecification) -> Result<Self, BuildError> {
        match specification {
            SymmetrySpecification::Identity => Ok(Self::identity()),
            SymmetrySpecification::Inversion => Ok(Self::with_inversion()),
            SymmetrySpecification::Explicit {
                rotations,
                translations,
            } => Self::from_parts(
                rotations
                    .iter()
                    .map(|rows| {
                        Matrix3::from_row_slice(&rows.iter().flatten().copied().collect::<Vec<_>>())
                    })
                    .collect(),
                translations.iter().map(|t| Vector3::from(*t)).collect(),
            ),
        }
    }

    /// The number of operations
    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    /// All distinct images of `k` under the operations, folded into the first zone
    pub fn equivalent_points(&self, k: &Vector3<f64>) -> Vec<Vector3<f64>> {
        let mut images: Vec<Vector3<f64>> = Vec::with_capacity(self.len());
        for (rotation, translation) in self.rotations.iter().zip(self.translations.iter()) {
            // k is treated as a row vector acting on the rotation
            let image = fold_point_to_first_bz(&(rotation.transpose() * k + translation));
            if !images
                .iter()
                .any(|existing| (existing - image).norm() < IMAGE_TOLERANCE)
            {
                images.push(image);
            }
        }
        images
    }

    /// The Cartesian offset of `k` from the closest periodic image of any of the `images`
    pub fn offset_from_nearest(
        k: &Vector3<f64>,
        images: &[Vector3<f64>],
        lattice: &ReciprocalLattice<f64>,
    ) -> Vector3<f64> {
        images
            .iter()
            .map(|image| lattice.to_cartesian(&fold_point_to_first_bz(&(k - image))))
            .min_by(|a, b| a.norm().total_cmp(&b.norm()))
            .unwrap_or_else(|| lattice.to_cartesian(k))
    }
}

#[cfg(test)]
mod test {
    use super::SymmetryOperations;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};
    use transporter_mesher::ReciprocalLattice;

    #[test]
    fn inversion_maps_the_zone_boundary_onto_itself() {
        let operations = SymmetryOperations::with_inversion();
        assert_eq!(operations.equivalent_points(&Vector3::new(0.5, 0., 0.)).len(), 1);
        assert_eq!(operations.equivalent_points(&Vector3::new(0.25, 0., 0.)).len(), 2);
        assert_eq!(operations.equivalent_points(&Vector3::zeros()).len(), 1);
    }

    #[test]
    fn offsets_are_measured_across_the_zone_boundary() {
        let lattice = ReciprocalLattice::from_direct(&Matrix3::identity()).unwrap();
        let offset = SymmetryOperations::offset_from_nearest(
            &Vector3::new(-0.45, 0., 0.),
            &[Vector3::new(0.5, 0., 0.)],
            &lattice,
        );
        assert_relative_eq!(offset.x, 0.05 * 2. * std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_operations_are_rejected() {
        assert!(SymmetryOperations::from_parts(vec![Matrix3::identity()], vec![]).is_err());
    }
}

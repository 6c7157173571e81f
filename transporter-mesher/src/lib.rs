//! Rectilinear meshes over the first Brillouin zone
//!
//! The mesher builds axis-aligned, non-uniformly spaced grids in fractional reciprocal coordinates.
//! Grid points cluster around band extrema, every coordinate is folded into the first Brillouin zone
//! and each vertex carries a finite-difference integration volume bounded by the midpoints to its
//! neighbours along each axis.

mod connectivity;
mod generate;
mod mesh;
mod primitives;

pub use connectivity::*;
pub use generate::*;
pub use mesh::*;
pub use primitives::*;

use nalgebra::RealField;

/// The lower edge of the first Brillouin zone in fractional coordinates
pub fn zone_lower_edge<T: RealField>() -> T {
    -zone_upper_edge::<T>()
}

/// The upper edge of the first Brillouin zone in fractional coordinates
pub fn zone_upper_edge<T: RealField>() -> T {
    T::one() / (T::one() + T::one())
}

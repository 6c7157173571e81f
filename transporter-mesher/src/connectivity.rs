/// Neighbours of a point along a single mesh axis
///
/// Points at the ends of an axis only have one neighbour, the other side of their cell
/// is closed by the Brillouin zone boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisConnectivity {
    Core([usize; 2]),
    LowerBoundary([usize; 1]),
    UpperBoundary([usize; 1]),
    Isolated,
}

pub trait Connectivity {
    fn as_inner(&self) -> &[usize];
}

impl Connectivity for AxisConnectivity {
    fn as_inner(&self) -> &[usize] {
        match self {
            AxisConnectivity::Core(x) => x,
            AxisConnectivity::LowerBoundary(x) => x,
            AxisConnectivity::UpperBoundary(x) => x,
            AxisConnectivity::Isolated => &[],
        }
    }
}

impl AxisConnectivity {
    /// Connectivity for the `index`th of `length` sorted points on an axis
    pub fn for_point(index: usize, length: usize) -> Self {
        match (index, length) {
            (_, 0) | (_, 1) => AxisConnectivity::Isolated,
            (0, _) => AxisConnectivity::LowerBoundary([1]),
            (i, n) if i == n - 1 => AxisConnectivity::UpperBoundary([n - 2]),
            (i, _) => AxisConnectivity::Core([i - 1, i + 1]),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{AxisConnectivity, Connectivity};

    #[test]
    fn boundary_points_have_a_single_neighbour() {
        let connectivity = (0..4)
            .map(|i| AxisConnectivity::for_point(i, 4))
            .collect::<Vec<_>>();
        assert_eq!(connectivity[0], AxisConnectivity::LowerBoundary([1]));
        assert_eq!(connectivity[1].as_inner(), &[0, 2]);
        assert_eq!(connectivity[3], AxisConnectivity::UpperBoundary([2]));
        assert!(AxisConnectivity::for_point(0, 1).as_inner().is_empty());
    }
}

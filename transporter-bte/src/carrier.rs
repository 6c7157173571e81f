use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// The two carrier populations, electrons in the conduction band and holes in the valence band
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CarrierType {
    /// Electrons
    #[serde(rename = "n")]
    N,
    /// Holes
    #[serde(rename = "p")]
    P,
}

impl std::fmt::Display for CarrierType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CarrierType::N => write!(f, "n"),
            CarrierType::P => write!(f, "p"),
        }
    }
}

impl CarrierType {
    /// Both carrier types, electrons first
    pub const ALL: [CarrierType; 2] = [CarrierType::N, CarrierType::P];

    /// The majority carrier of a signed doping concentration, negative values are n-type
    pub fn from_concentration(concentration: f64) -> Result<Self, BuildError> {
        if concentration < 0. {
            Ok(CarrierType::N)
        } else if concentration > 0. {
            Ok(CarrierType::P)
        } else {
            Err(BuildError::ZeroConcentration)
        }
    }

    /// The sign carried by concentrations of this type, -1 for electrons and +1 for holes
    pub fn sign(&self) -> f64 {
        match self {
            CarrierType::N => -1.,
            CarrierType::P => 1.,
        }
    }

    /// The opposite carrier type
    pub fn other(&self) -> Self {
        match self {
            CarrierType::N => CarrierType::P,
            CarrierType::P => CarrierType::N,
        }
    }
}

/// A value held separately for each carrier type
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerCarrier<V> {
    /// The electron value
    pub n: V,
    /// The hole value
    pub p: V,
}

impl<V> PerCarrier<V> {
    /// A container from the electron and hole values
    pub fn new(n: V, p: V) -> Self {
        Self { n, p }
    }

    /// Evaluate `f` for both carrier types
    pub fn from_fn(mut f: impl FnMut(CarrierType) -> V) -> Self {
        let n = f(CarrierType::N);
        let p = f(CarrierType::P);
        Self { n, p }
    }

    /// Evaluate the fallible `f` for both carrier types, electrons first
    pub fn try_from_fn<E>(
        mut f: impl FnMut(CarrierType) -> Result<V, E>,
    ) -> Result<Self, E> {
        let n = f(CarrierType::N)?;
        let p = f(CarrierType::P)?;
        Ok(Self { n, p })
    }

    /// Iterate over both values, electrons first
    pub fn iter(&self) -> impl Iterator<Item = (CarrierType, &V)> {
        [(CarrierType::N, &self.n), (CarrierType::P, &self.p)].into_iter()
    }

    /// Apply `f` to both values
    pub fn map<W>(&self, mut f: impl FnMut(CarrierType, &V) -> W) -> PerCarrier<W> {
        PerCarrier {
            n: f(CarrierType::N, &self.n),
            p: f(CarrierType::P, &self.p),
        }
    }
}

impl<V> Index<CarrierType> for PerCarrier<V> {
    type Output = V;

    fn index(&self, carrier: CarrierType) -> &V {
        match carrier {
            CarrierType::N => &self.n,
            CarrierType::P => &self.p,
        }
    }
}

impl<V> IndexMut<CarrierType> for PerCarrier<V> {
    fn index_mut(&mut self, carrier: CarrierType) -> &mut V {
        match carrier {
            CarrierType::N => &mut self.n,
            CarrierType::P => &mut self.p,
        }
    }
}

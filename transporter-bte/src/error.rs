use crate::carrier::CarrierType;
use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Fatal errors raised while assembling the k-grid, e-grid and solver inputs
pub enum BuildError {
    /// A doping of exactly zero selects no carrier type
    #[error("carrier concentration cannot be zero")]
    #[diagnostic(code(transporter::build::zero_concentration))]
    ZeroConcentration,
    /// A temperature at or below zero
    #[error("temperatures must be positive, found {0} K")]
    #[diagnostic(code(transporter::build::temperature))]
    NonPositiveTemperature(f64),
    /// No dopings or no temperatures were configured
    #[error("at least one doping and one temperature are required")]
    #[diagnostic(code(transporter::build::conditions))]
    EmptyConditions,
    /// Filtering left too few states to integrate over
    #[error("only {remaining} {carrier}-type k-points survive filtering but {required} are required: the k-mesh is too coarse or the energy cutoff too tight")]
    #[diagnostic(code(transporter::build::kpoints))]
    #[allow(missing_docs)]
    TooFewKPoints {
        carrier: CarrierType,
        remaining: usize,
        required: usize,
    },
    /// The states formed too few energy shells
    #[error("only {found} {carrier}-type energy bins were formed but {required} are required: the k-mesh is too coarse")]
    #[diagnostic(code(transporter::build::energy_bins))]
    #[allow(missing_docs)]
    TooFewEnergyBins {
        carrier: CarrierType,
        found: usize,
        required: usize,
    },
    /// The lattice vectors span no volume
    #[error("the direct lattice vectors are linearly dependent")]
    #[diagnostic(code(transporter::build::lattice))]
    SingularLattice,
    /// The band model has no bands of one carrier type
    #[error("no {0}-type bands were supplied")]
    #[diagnostic(code(transporter::build::bands))]
    MissingBands(CarrierType),
    /// The k-mesh could not be generated
    #[error("{0}")]
    Mesh(String),
    /// The density of states does not cover the band edges
    #[error("{0}")]
    DensityOfStates(String),
    /// The worker pool could not be started
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failure of the Fermi level root search
pub enum FermiError {
    /// The closest Fermi level misses the target concentration by more than the loose tolerance
    #[error("the Fermi level found for c = {target:e} cm^-3 at {temperature} K reproduces {calculated:e} cm^-3, a relative error of {relative_error:.3e}: the band gap may be too small, the temperature too high or the density of states mesh too coarse")]
    #[diagnostic(code(transporter::fermi::tolerance))]
    #[allow(missing_docs)]
    ToleranceExceeded {
        target: f64,
        calculated: f64,
        relative_error: f64,
        temperature: f64,
    },
    /// The density of states could not be evaluated
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Errors raised while evaluating scattering rates
pub enum ScatteringError {
    /// A state has no partners to scatter into
    #[error("the neighbour set of {carrier}-type band {band} point {k} is empty")]
    #[diagnostic(code(transporter::scattering::neighbours))]
    #[allow(missing_docs)]
    EmptyNeighbourSet {
        carrier: CarrierType,
        band: usize,
        k: usize,
    },
    /// An anisotropic or inelastic mechanism was requested without neighbour sets
    #[error("{0} scattering needs neighbour sets which were not indexed")]
    #[diagnostic(code(transporter::scattering::missing_neighbours))]
    MissingNeighbours(&'static str),
    /// A worker could not be started
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Errors raised while iterating the Boltzmann equation
pub enum BteError {
    /// The perturbation overflowed
    #[error("the perturbation of {carrier}-type carriers became non-finite in iteration {iteration}")]
    #[diagnostic(code(transporter::bte::diverged))]
    #[allow(missing_docs)]
    Diverged { carrier: CarrierType, iteration: usize },
    /// A scattering rate failed during the iteration
    #[error(transparent)]
    Scattering(#[from] ScatteringError),
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Error for IO events
pub enum IOError {
    /// Reading or writing a file failed
    #[error("IO failure: {0}")]
    IO(#[from] std::io::Error),
    /// The results could not be serialized
    #[error("Serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}

//! # Neighbours
//!
//! For every state the set of states it scatters into: those at the same energy for elastic
//! processes, and those one polar optical phonon above or below for absorption and emission.
//! Each set is sorted by the cosine of the scattering angle so it can be integrated over the
//! angle directly.
//!
//! A state always appears in its own set, as the boundary entry at cosine one. When too few
//! partners lie inside the energy tolerance the search is widened along the band, and the extra
//! partners are flagged as forced.

use crate::{kgrid::CarrierGrid, statistics::cos_angle};
use ndarray::Array2;
use serde::Deserialize;
use std::collections::HashSet;

/// A scattering partner of a state
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor {
    /// Cosine of the angle between the two wavevectors
    pub cosine: f64,
    /// Band index of the partner
    pub band: usize,
    /// k index of the partner
    pub k: usize,
    /// Whether the partner was added by widening the search
    pub forced: bool,
}

/// Controls of the neighbour search
#[derive(Clone, Debug, Deserialize)]
pub struct NeighborSettings {
    /// The fewest partners, other than the state itself, each set must hold
    pub min_count: usize,
    /// Partners must lie within this of the target energy, in eV
    pub tolerance: f64,
    /// Warn when more than this fraction of all partners was forced
    pub forced_ratio_warning: f64,
    /// Warn when forced partners are on average further than this from the target energy, in eV
    pub max_average_ediff: f64,
}

impl Default for NeighborSettings {
    fn default() -> Self {
        Self {
            min_count: 2,
            tolerance: 1e-4,
            forced_ratio_warning: 0.9,
            max_average_ediff: 0.02,
        }
    }
}

/// The result of a single neighbour search
#[derive(Clone, Debug, Default)]
pub struct NeighborQuery {
    /// The partners, sorted by ascending cosine
    pub set: Vec<Neighbor>,
    /// The number of partners found by widening the search
    pub forced: usize,
    /// Energy distances from the state to the points visited while widening
    pub ediffs: Vec<f64>,
}

/// Find the partners of state `(band, k)` at the energy `E(band, k) + energy_shift`
///
/// `known` holds previously computed equal-energy sets, whose members are borrowed when the
/// search has to be widened. Sets which have not been computed yet are empty.
pub fn neighbors(
    grid: &CarrierGrid,
    band: usize,
    k: usize,
    energy_shift: f64,
    min_count: usize,
    tolerance: f64,
    known: &Array2<Vec<Neighbor>>,
) -> NeighborQuery {
    let energy = grid.energy(band, k);
    let target = energy + energy_shift;
    let wavevector = &grid.state(band, k).cartesian;
    let num_kpoints = grid.num_kpoints();

    let mut seen = HashSet::new();
    seen.insert((band, k));
    let mut query = NeighborQuery {
        set: vec![Neighbor {
            cosine: 1.,
            band,
            k,
            forced: false,
        }],
        ..NeighborQuery::default()
    };
    let mut push = |query: &mut NeighborQuery, other_band: usize, other_k: usize, forced: bool| {
        if seen.insert((other_band, other_k)) {
            query.set.push(Neighbor {
                cosine: cos_angle(wavevector, &grid.state(other_band, other_k).cartesian),
                band: other_band,
                k: other_k,
                forced,
            });
            if forced {
                query.forced += 1;
            }
        }
    };

    for other_band in 0..grid.num_bands() {
        let closest = grid.closest_index(other_band, target);
        let energies = grid.band_energies(other_band);
        // Upwards from the closest point, then downwards from the one below it
        for other_k in (closest..num_kpoints)
            .take_while(|&other_k| (energies[other_k] - target).abs() < tolerance)
        {
            push(&mut query, other_band, other_k, false);
        }
        for other_k in (0..closest)
            .rev()
            .take_while(|&other_k| (energies[other_k] - target).abs() < tolerance)
        {
            push(&mut query, other_band, other_k, false);
        }
    }

    if query.set.len() - 1 < min_count {
        let closest = grid.closest_index(band, target);
        let upwards = closest..num_kpoints;
        let downwards = (0..closest).rev();
        for other_k in upwards.chain(downwards) {
            if query.set.len() - 1 >= min_count {
                break;
            }
            push(&mut query, band, other_k, true);
            for partner in known[[band, other_k]].iter() {
                push(&mut query, partner.band, partner.k, true);
            }
            query.ediffs.push((energy - grid.energy(band, other_k)).abs());
        }
    }

    query.set.sort_by(|a, b| a.cosine.total_cmp(&b.cosine));
    query
}

/// The neighbour sets of every state of a carrier type
#[derive(Clone, Debug)]
pub struct NeighborTable {
    /// Sets at equal energy
    pub elastic: Array2<Vec<Neighbor>>,
    /// Sets one phonon quantum above, present when polar optical scattering is enabled
    pub plus: Option<Array2<Vec<Neighbor>>>,
    /// Sets one phonon quantum below
    pub minus: Option<Array2<Vec<Neighbor>>>,
}

impl NeighborTable {
    /// Index the partners of every state of `grid`
    ///
    /// `phonon_energy` is the polar optical phonon energy in eV, if inelastic scattering is enabled.
    #[tracing::instrument(name = "Neighbour indexer", level = "info", skip_all, fields(carrier = %grid.carrier()))]
    pub fn build(grid: &CarrierGrid, settings: &NeighborSettings, phonon_energy: Option<f64>) -> Self {
        let shape = (grid.num_bands(), grid.num_kpoints());
        let mut elastic = Array2::from_elem(shape, Vec::new());
        for band in 0..grid.num_bands() {
            let mut forced = 0;
            let mut ediffs = Vec::new();
            for k in 0..grid.num_kpoints() {
                let query = neighbors(grid, band, k, 0., settings.min_count, settings.tolerance, &elastic);
                forced += query.forced;
                ediffs.extend(query.ediffs);
                elastic[[band, k]] = query.set;
            }
            let total = elastic.row(band).iter().map(|set| set.len()).sum::<usize>();
            report("elastic", grid, band, settings, forced, total, &ediffs);
        }

        let (plus, minus) = match phonon_energy {
            Some(phonon_energy) => {
                let mut plus = Array2::from_elem(shape, Vec::new());
                let mut minus = Array2::from_elem(shape, Vec::new());
                for band in 0..grid.num_bands() {
                    let mut forced = 0;
                    let mut ediffs = Vec::new();
                    for k in 0..grid.num_kpoints() {
                        for (sets, shift) in [(&mut plus, phonon_energy), (&mut minus, -phonon_energy)] {
                            let query = neighbors(
                                grid,
                                band,
                                k,
                                shift,
                                settings.min_count,
                                settings.tolerance,
                                &elastic,
                            );
                            forced += query.forced;
                            ediffs.extend(query.ediffs);
                            sets[[band, k]] = query.set;
                        }
                    }
                    let total = plus.row(band).iter().map(|set| set.len()).sum::<usize>()
                        + minus.row(band).iter().map(|set| set.len()).sum::<usize>();
                    report("polar optical", grid, band, settings, forced, total, &ediffs);
                }
                (Some(plus), Some(minus))
            }
            None => (None, None),
        };

        Self {
            elastic,
            plus,
            minus,
        }
    }
}

fn report(
    process: &str,
    grid: &CarrierGrid,
    band: usize,
    settings: &NeighborSettings,
    forced: usize,
    total: usize,
    ediffs: &[f64],
) {
    let carrier = grid.carrier();
    let ratio = forced as f64 / total.max(1) as f64;
    tracing::info!("Forced {process} scattering ratio for {carrier}-type band {band}: {ratio:.3}");
    if ratio > settings.forced_ratio_warning {
        tracing::warn!(
            "The k-mesh is too coarse for {process} scattering of {carrier}-type carriers, {:.0}% of partners were forced",
            ratio * 100.
        );
    }
    let average_ediff = ediffs.iter().sum::<f64>() / ediffs.len().max(1) as f64;
    if average_ediff > settings.max_average_ediff {
        tracing::warn!(
            "Forced {carrier}-type {process} partners are on average {average_ediff:.4} eV from their target energy, try a denser k-mesh"
        );
    }
}

#[cfg(test)]
mod test {
    use super::{neighbors, NeighborSettings, NeighborTable};
    use crate::{
        band::BandExtremum,
        carrier::CarrierType,
        kgrid::{CarrierGrid, KState},
    };
    use nalgebra::{Matrix3, Vector3};
    use ndarray::Array2;
    use rand::{thread_rng, Rng};
    use std::collections::HashSet;

    fn random_grid(num_bands: usize, num_kpoints: usize) -> CarrierGrid {
        let mut rng = thread_rng();
        let states = (0..num_bands)
            .map(|_| {
                let mut states = (0..num_kpoints)
                    .map(|index| {
                        let cartesian = Vector3::new(
                            rng.gen_range(-1.0..1.0),
                            rng.gen_range(-1.0..1.0),
                            rng.gen_range(-1.0..1.0),
                        );
                        KState {
                            fractional: cartesian / 10.,
                            cartesian,
                            old_cartesian: cartesian,
                            // Coarse energies so that many states share a shell
                            energy: (cartesian.norm_squared() * 20.).round() / 100.,
                            velocity: cartesian.abs() * 1e7,
                            effective_mass: Matrix3::identity(),
                            a: 1.,
                            c: 0.,
                            mesh_index: index,
                        }
                    })
                    .collect::<Vec<_>>();
                states.sort_by(|a, b| a.energy.total_cmp(&b.energy));
                states
            })
            .collect();
        CarrierGrid::from_states(
            CarrierType::N,
            BandExtremum {
                energy: 0.,
                kpoint: Vector3::zeros(),
                effective_mass: Matrix3::identity(),
            },
            1.,
            states,
            Array2::zeros((num_bands, 1)),
        )
        .unwrap()
    }

    #[test]
    fn sets_are_sorted_unique_and_hold_the_state_once() {
        let grid = random_grid(2, 120);
        let settings = NeighborSettings::default();
        let table = NeighborTable::build(&grid, &settings, Some(0.03));
        for sets in [&table.elastic, table.plus.as_ref().unwrap(), table.minus.as_ref().unwrap()] {
            for ((band, k), set) in sets.indexed_iter() {
                assert!(set.windows(2).all(|pair| pair[0].cosine <= pair[1].cosine));
                let unique = set.iter().map(|n| (n.band, n.k)).collect::<HashSet<_>>();
                assert_eq!(unique.len(), set.len());
                assert_eq!(set.iter().filter(|n| (n.band, n.k) == (band, k)).count(), 1);
                assert!(set.len() > settings.min_count);
            }
        }
    }

    #[test]
    fn equal_energy_partners_are_not_forced() {
        let grid = random_grid(1, 200);
        let known = Array2::from_elem((1, 200), Vec::new());
        let query = neighbors(&grid, 0, 100, 0., 1, 0.005, &known);
        let energy = grid.energy(0, 100);
        for partner in query.set.iter().filter(|n| !n.forced) {
            assert!((grid.energy(partner.band, partner.k) - energy).abs() < 0.005);
        }
    }

    #[test]
    fn isolated_states_are_widened_along_the_band() {
        let grid = random_grid(1, 50);
        let known = Array2::from_elem((1, 50), Vec::new());
        // No state lies one electronvolt above any other
        let query = neighbors(&grid, 0, 0, 10., 3, 1e-6, &known);
        assert_eq!(query.set.len(), 4);
        assert_eq!(query.forced, 3);
        assert_eq!(query.ediffs.len(), 3);
    }
}

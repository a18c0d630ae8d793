//! Key encoding and Morton ordering of a body set
//!
//! The sorter itself sits behind [`KeySorter`] so an alternate backend (for
//! example one that offloads to a GPU) can replace the CPU sort. Whatever the
//! backend, [`sort_bodies`] checks the result before the tree sees it.

use log::debug;
use rayon::prelude::*;

use super::bounds::Bounds;
use super::engine::Execution;
use super::error::SimError;
use super::morton::{self, MortonKey};
use super::states::{Body3, NVec3};

/// Everything the tree needs from one body, tagged with its Morton key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyedBody {
    pub key: MortonKey,
    pub index: usize, // position in the caller's body slice
    pub x: NVec3,
    pub m: f64,
}

/// Orders keyed bodies by ascending key
///
/// Implementations may break ties however they like, but bodies with equal
/// keys must end up next to each other.
pub trait KeySorter {
    fn sort_keyed(&self, keyed: &mut [KeyedBody]);
}

/// Single-threaded unstable sort, ties broken by input index
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialSorter;

impl KeySorter for SerialSorter {
    fn sort_keyed(&self, keyed: &mut [KeyedBody]) {
        keyed.sort_unstable_by_key(|b| (b.key, b.index));
    }
}

/// Rayon parallel unstable sort, ties broken by input index
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelSorter;

impl KeySorter for ParallelSorter {
    fn sort_keyed(&self, keyed: &mut [KeyedBody]) {
        keyed.par_sort_unstable_by_key(|b| (b.key, b.index));
    }
}

/// The built-in sorter matching an execution mode
pub fn sorter_for(execution: Execution) -> Box<dyn KeySorter + Send + Sync> {
    match execution {
        Execution::Serial => Box::new(SerialSorter),
        Execution::Parallel => Box::new(ParallelSorter),
    }
}

/// Bodies in Morton order; the only input the octree builder accepts
#[derive(Debug, Clone)]
pub struct SortedBodies {
    bodies: Vec<KeyedBody>,
    bounds: Bounds,
}

impl SortedBodies {
    pub fn as_slice(&self) -> &[KeyedBody] {
        &self.bodies
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Compute every body's key against `bounds`
pub fn encode_bodies(bodies: &[Body3], bounds: &Bounds, execution: Execution) -> Result<Vec<KeyedBody>, SimError> {
    let keyed_one = |(index, b): (usize, &Body3)| {
        morton::encode(&b.x, bounds)
            .map(|key| KeyedBody { key, index, x: b.x, m: b.m })
            .map_err(|e| SimError::NonFiniteCoordinate { body: index, axis: e.axis, value: e.value })
    };

    match execution {
        Execution::Serial => bodies.iter().enumerate().map(keyed_one).collect(),
        Execution::Parallel => bodies.par_iter().enumerate().map(keyed_one).collect(),
    }
}

/// Order keyed bodies with `sorter` and verify the result
pub fn sort_bodies(
    mut keyed: Vec<KeyedBody>,
    bounds: Bounds,
    sorter: &dyn KeySorter,
) -> Result<SortedBodies, SimError> {
    let n = keyed.len();
    sorter.sort_keyed(&mut keyed);

    if let Some(position) = first_unordered(&keyed) {
        return Err(SimError::UnsortedKeys { position });
    }
    if let Some((position, index)) = first_foreign(&keyed) {
        return Err(SimError::NotAPermutation { position, index });
    }

    debug!("sorted {n} bodies by Morton key");
    Ok(SortedBodies { bodies: keyed, bounds })
}

/// Bounds, keys and Morton order for a body slice in one call
pub fn morton_order(
    bodies: &[Body3],
    sorter: &dyn KeySorter,
    execution: Execution,
) -> Result<SortedBodies, SimError> {
    let bounds = Bounds::from_bodies(bodies)?;
    let keyed = encode_bodies(bodies, &bounds, execution)?;
    sort_bodies(keyed, bounds, sorter)
}

fn first_unordered(keyed: &[KeyedBody]) -> Option<usize> {
    keyed
        .windows(2)
        .position(|w| w[1].key < w[0].key)
        .map(|i| i + 1)
}

/// First `(position, index)` whose body index is out of range or repeated
fn first_foreign(keyed: &[KeyedBody]) -> Option<(usize, usize)> {
    let mut seen = vec![false; keyed.len()];
    keyed.iter().enumerate().find_map(|(position, b)| match seen.get_mut(b.index) {
        Some(slot) if !*slot => {
            *slot = true;
            None
        }
        _ => Some((position, b.index)),
    })
}

//! # Octree topology from Morton order
//!
//! Because bodies arrive sorted by Morton key, every octree node covers a
//! contiguous range `[first, last)` of the sorted array. Splitting a node is
//! therefore not a spatial test per body but a binary search: inside a range
//! whose keys share their first `d` triplets, the triplet at depth `d` is
//! non-decreasing, so each of the 8 children is a (possibly empty) sub-range
//! found with `partition_point`.
//!
//! Nodes live in a flat arena (`Vec`) and refer to each other only by index.
//! They are allocated parent-before-children, so every child index is larger
//! than its parent's. The mass pass relies on this.

use log::{debug, warn};

use super::bounds::Bounds;
use super::morton::MAX_DEPTH;
use super::params::TreeParameters;
use super::sort::{KeyedBody, SortedBodies};
use super::states::NVec3;

/// Index of a node in the arena
pub type NodeId = usize;

/// The root is always the first node allocated
pub const ROOT: NodeId = 0;

/// One octree node
///
/// `mass` and `com` stay zero until [`Octree::update_mass_distribution`] runs.
#[derive(Debug, Clone, PartialEq)]
pub struct BarnesHutNode3 {
    pub children: [Option<NodeId>; 8], // None = octant holds no bodies
    pub first: usize, // first sorted body index (inclusive)
    pub last: usize, // last sorted body index (exclusive)
    pub depth: usize,
    pub bbox: Bounds,
    pub mass: f64,
    pub com: NVec3,
}

impl BarnesHutNode3 {
    fn new(first: usize, last: usize, depth: usize, bbox: Bounds) -> Self {
        Self {
            children: [None; 8],
            first,
            last,
            depth,
            bbox,
            mass: 0.0,
            com: NVec3::zeros(),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.last - self.first
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }

    /// Whether sorted body `pos` lies in this node's range
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        (self.first..self.last).contains(&pos)
    }
}

/// Node arena plus the Morton-sorted bodies it indexes
#[derive(Debug, Clone)]
pub struct Octree {
    pub(crate) nodes: Vec<BarnesHutNode3>,
    pub(crate) bodies: SortedBodies,
    pub(crate) params: TreeParameters,
}

impl Octree {
    /// Partition sorted bodies into an octree rooted at [`ROOT`]
    ///
    /// A range becomes a leaf once it holds at most `leaf_capacity` bodies or
    /// reaches depth 21. Only the second case can produce leaves above
    /// capacity: bodies whose keys agree on every triplet cannot be separated.
    pub fn insert_bodies(bodies: SortedBodies, params: TreeParameters) -> Self {
        let n = bodies.len();
        let mut tree = Self {
            nodes: Vec::with_capacity(estimate_nodes(n, params.leaf_capacity)),
            bodies,
            params,
        };

        let root_box = *tree.bodies.bounds();
        tree.build_range(0, n, 0, root_box);

        debug!(
            "octree over {n} bodies: {} nodes, {} leaves, depth {}",
            tree.nodes.len(),
            tree.leaves().count(),
            tree.depth()
        );
        tree
    }

    /// Allocate the node for `[first, last)` and, unless it is a leaf, its
    /// subtree. Returns the new node's id.
    fn build_range(&mut self, first: usize, last: usize, depth: usize, bbox: Bounds) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(BarnesHutNode3::new(first, last, depth, bbox));

        let len = last - first;
        if len <= self.params.leaf_capacity {
            return id;
        }
        if depth == MAX_DEPTH {
            warn!(
                "leaf at max depth holds {len} bodies (capacity {}); keys are indistinguishable",
                self.params.leaf_capacity
            );
            return id;
        }

        let mut start = first;
        for octant in 0..8 {
            let end = start + octant_run(&self.bodies.as_slice()[start..last], depth, octant);
            if end > start {
                let cell = self.bodies.as_slice()[start].key.cell(depth + 1);
                let child_box = self.bodies.bounds().cell(cell, depth + 1);
                let child = self.build_range(start, end, depth + 1, child_box);
                self.nodes[id].children[octant] = Some(child);
            }
            start = end;
        }
        debug_assert_eq!(start, last, "octant runs must cover the parent range");

        id
    }

    /// Node by id
    ///
    /// # Panics
    /// On an id outside the arena. Ids only come from the builder, so this
    /// means the tree itself is corrupt.
    #[inline]
    pub fn node(&self, id: NodeId) -> &BarnesHutNode3 {
        match self.nodes.get(id) {
            Some(node) => node,
            None => panic!(
                "internal invariant violated: node {id} outside arena of {}",
                self.nodes.len()
            ),
        }
    }

    pub fn root(&self) -> &BarnesHutNode3 {
        self.node(ROOT)
    }

    pub fn nodes(&self) -> &[BarnesHutNode3] {
        &self.nodes
    }

    pub fn bodies(&self) -> &[KeyedBody] {
        self.bodies.as_slice()
    }

    pub fn params(&self) -> &TreeParameters {
        &self.params
    }

    /// Leaves in arena (= Morton) order
    pub fn leaves(&self) -> impl Iterator<Item = &BarnesHutNode3> + '_ {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Deepest node depth (root = 0)
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

/// Length of the leading run of `range` whose triplet at `depth` is `<= octant`
///
/// Called with a `range` that starts at the first body of `octant` (all
/// lower octants already consumed), so the result is exactly that octant's run.
fn octant_run(range: &[KeyedBody], depth: usize, octant: usize) -> usize {
    range.partition_point(|b| b.key.octant(depth) <= octant)
}

fn estimate_nodes(n: usize, leaf_capacity: usize) -> usize {
    // roughly n / capacity leaves plus internal nodes
    (2 * n / leaf_capacity.max(1)).max(1)
}

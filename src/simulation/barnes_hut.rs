//! # Barnes–Hut evaluation over a Morton octree (3D)
//!
//! This module turns an [`Octree`] (topology only) into a
//! [`BarnesHutTree3`] by aggregating mass bottom-up, then evaluates the
//! approximate gravitational acceleration of every body with a tree walk.
//!
//! ## Core Concepts
//!
//! - Every node carries the total mass of its bodies and their center of
//!   mass (COM), an order-0 (monopole) summary of the subtree.
//! - For a body at distance `d` from a node's COM, where `s` is the longest
//!   side of the node's box, the node is treated as one point mass when
//!   `s / d < theta`. Otherwise the walk descends into its children.
//! - Leaves are always evaluated exactly, body by body.
//! - Gravity is softened with `epsilon`:
//!   `a += G m r / (|r|² + ε²)^{3/2}`.
//!
//! The phases run strictly in order and the types enforce it: only
//! [`Octree::update_mass_distribution`] produces a [`BarnesHutTree3`], and
//! only a [`BarnesHutTree3`] can evaluate forces.

use log::debug;
use rayon::prelude::*;

use crate::simulation::engine::Execution;
use crate::simulation::error::SimError;
use crate::simulation::octree::{BarnesHutNode3, NodeId, Octree, ROOT};
use crate::simulation::params::TreeParameters;
use crate::simulation::sort::{morton_order, KeySorter, KeyedBody};
use crate::simulation::states::{Body3, NVec3};

/// An octree whose every node has its mass and COM settled
#[derive(Debug, Clone)]
pub struct BarnesHutTree3 {
    tree: Octree,
}

impl Octree {
    /// Compute total mass and center of mass for every node, leaves first
    ///
    /// Children always sit after their parent in the arena, so walking it
    /// backwards visits every child before its parent.
    ///
    /// - Leaf: sum of its bodies' masses, mass-weighted mean of their positions.
    /// - Internal: sum over present children, mass-weighted mean of their COMs.
    /// - A node whose total mass is zero reports the center of its box as COM.
    pub fn update_mass_distribution(mut self) -> BarnesHutTree3 {
        for id in (0..self.nodes.len()).rev() {
            let node = &self.nodes[id];

            let mut mass = 0.0;
            let mut weighted = NVec3::zeros();

            if node.is_leaf() {
                for b in &self.bodies.as_slice()[node.first..node.last] {
                    mass += b.m;
                    weighted += b.x * b.m;
                }
            } else {
                for &child in node.children.iter().flatten() {
                    debug_assert!(child > id, "child {child} allocated before parent {id}");
                    let c = self.node(child);
                    mass += c.mass;
                    weighted += c.com * c.mass;
                }
            }

            let com = if mass != 0.0 { weighted / mass } else { node.bbox.center() };

            let node = &mut self.nodes[id];
            node.mass = mass;
            node.com = com;
        }

        debug!("aggregated {} nodes, total mass {}", self.nodes.len(), self.root().mass);
        BarnesHutTree3 { tree: self }
    }
}

impl BarnesHutTree3 {
    /// Run every phase for `bodies`: bounds, keys, sort, build, aggregate
    ///
    /// `params` is validated before anything else happens.
    pub fn build(
        bodies: &[Body3],
        params: TreeParameters,
        sorter: &dyn KeySorter,
        execution: Execution,
    ) -> Result<Self, SimError> {
        params.validate()?;
        let sorted = morton_order(bodies, sorter, execution)?;
        Ok(Octree::insert_bodies(sorted, params).update_mass_distribution())
    }

    pub fn octree(&self) -> &Octree {
        &self.tree
    }

    pub fn root(&self) -> &BarnesHutNode3 {
        self.tree.root()
    }

    pub fn node(&self, id: NodeId) -> &BarnesHutNode3 {
        self.tree.node(id)
    }

    pub fn nodes(&self) -> &[BarnesHutNode3] {
        self.tree.nodes()
    }

    pub fn bodies(&self) -> &[KeyedBody] {
        self.tree.bodies()
    }

    pub fn params(&self) -> &TreeParameters {
        self.tree.params()
    }

    /// Approximate acceleration of the body at sorted position `pos`
    pub fn acceleration_on(&self, pos: usize) -> NVec3 {
        let target = &self.bodies()[pos];
        let mut acc = NVec3::zeros();
        self.traverse_node(ROOT, pos, target.x, &mut acc);
        acc
    }

    /// Accelerations for all bodies, in the caller's original body order
    pub fn accelerations(&self, execution: Execution) -> Vec<NVec3> {
        let n = self.bodies().len();
        let mut out = vec![NVec3::zeros(); n];

        match execution {
            Execution::Serial => {
                for (pos, b) in self.bodies().iter().enumerate() {
                    out[b.index] = self.acceleration_on(pos);
                }
            }
            Execution::Parallel => {
                // evaluate in Morton order for locality, then scatter
                let sorted: Vec<NVec3> = (0..n).into_par_iter().map(|pos| self.acceleration_on(pos)).collect();
                for (b, a) in self.bodies().iter().zip(sorted) {
                    out[b.index] = a;
                }
            }
        }
        out
    }

    /// Overwrite each body's acceleration, keeping the old one in `a_prev`
    ///
    /// `bodies` must be the slice the tree was built from: same length, and
    /// every body at the position and mass the tree recorded. Nothing is
    /// written when that check fails.
    pub fn update_grav_acceleration(&self, bodies: &mut [Body3], execution: Execution) -> Result<(), SimError> {
        if bodies.len() != self.bodies().len() {
            return Err(SimError::BodyCountMismatch {
                expected: self.bodies().len(),
                found: bodies.len(),
            });
        }
        if let Some(kb) = self.bodies().iter().find(|kb| {
            let b = &bodies[kb.index];
            b.x != kb.x || b.m != kb.m
        }) {
            return Err(SimError::ForeignBody { body: kb.index });
        }

        let accels = self.accelerations(execution);
        for (b, a) in bodies.iter_mut().zip(accels) {
            b.push_acceleration(a);
        }
        Ok(())
    }

    /// Recursively accumulate the acceleration at `pos_i` from one subtree
    ///
    /// - **Leaf**: exact pairwise sum, skipping the evaluated body itself.
    ///   This holds even when the leaf's masses cancel to zero.
    /// - **Node containing the evaluated body**: always opened, so a body
    ///   never feels its own mass through an aggregate.
    /// - **Other internal node**: point mass at its COM when `s / d < theta`,
    ///   otherwise descend. `d == 0` gives `s / d` of infinity or NaN, both
    ///   of which fail the test and open the node.
    fn traverse_node(&self, node_idx: NodeId, body_pos: usize, pos_i: NVec3, acc: &mut NVec3) {
        let node = self.node(node_idx);
        let params = self.params();

        if node.is_leaf() {
            for (j, b) in self.bodies()[node.first..node.last].iter().enumerate() {
                if node.first + j == body_pos {
                    continue;
                }
                *acc += softened_accel(b.x - pos_i, b.m, params);
            }
            return;
        }

        if !node.contains(body_pos) {
            let r = node.com - pos_i;
            let s_over_d = node.bbox.longest_side() / r.norm();
            if s_over_d < params.theta {
                *acc += softened_accel(r, node.mass, params);
                return;
            }
        }

        for &child in node.children.iter().flatten() {
            self.traverse_node(child, body_pos, pos_i, acc);
        }
    }
}

/// `G m r / (|r|² + ε²)^{3/2}`
#[inline]
pub(crate) fn softened_accel(r: NVec3, m: f64, params: &TreeParameters) -> NVec3 {
    let dist2 = r.dot(&r) + params.eps2();
    let inv_r = dist2.sqrt().recip();
    let inv_r3 = inv_r * inv_r * inv_r;
    params.G * m * inv_r3 * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::sort::SerialSorter;

    fn params(leaf_capacity: usize, theta: f64) -> TreeParameters {
        TreeParameters::new(leaf_capacity, theta, 0.01, 1.0).unwrap()
    }

    fn tree(bodies: &[Body3], leaf_capacity: usize, theta: f64) -> BarnesHutTree3 {
        BarnesHutTree3::build(bodies, params(leaf_capacity, theta), &SerialSorter, Execution::Serial).unwrap()
    }

    fn body(x: f64, y: f64, z: f64, m: f64) -> Body3 {
        Body3::at_rest(NVec3::new(x, y, z), m)
    }

    #[test]
    fn internal_nodes_sum_their_children() {
        let bodies: Vec<Body3> = (0..50)
            .map(|i| {
                let f = i as f64;
                body((f * 0.37).sin(), (f * 0.13).cos(), (f * 0.07).sin(), 1.0 + (i % 3) as f64)
            })
            .collect();
        let t = tree(&bodies, 2, 0.5);

        for node in t.nodes().iter().filter(|n| !n.is_leaf()) {
            let kids: Vec<_> = node.children.iter().flatten().map(|&c| t.node(c)).collect();
            let m: f64 = kids.iter().map(|c| c.mass).sum();
            let com = kids.iter().fold(NVec3::zeros(), |acc, c| acc + c.com * c.mass) / m;
            assert!((node.mass - m).abs() < 1e-9);
            assert!((node.com - com).norm() < 1e-9);
        }
    }

    #[test]
    fn leaf_com_is_mass_weighted() {
        let bodies = [body(0.0, 0.0, 0.0, 1.0), body(4.0, 0.0, 0.0, 3.0)];
        let t = tree(&bodies, 4, 0.5);
        assert!(t.root().is_leaf());
        assert_eq!(t.root().mass, 4.0);
        assert!((t.root().com - NVec3::new(3.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn massless_leaf_reports_box_center() {
        let bodies = [body(0.0, 0.0, 0.0, 0.0), body(2.0, 2.0, 2.0, 0.0)];
        let t = tree(&bodies, 4, 0.5);
        assert_eq!(t.root().mass, 0.0);
        assert_eq!(t.root().com, NVec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn single_body_feels_nothing() {
        let t = tree(&[body(1.0, 2.0, 3.0, 5.0)], 1, 0.5);
        assert_eq!(t.acceleration_on(0), NVec3::zeros());
    }

    #[test]
    fn cancelling_leaf_is_still_summed_exactly() {
        let bodies = [
            body(-1.0, -1.0, -1.0, 1.0),
            body(-0.9, -0.9, -0.9, -1.0),
            body(1.0, 1.0, 1.0, 1.0),
        ];
        let t = tree(&bodies, 2, 1.0e-9);
        let leaf = t.nodes().iter().find(|n| n.is_leaf() && n.len() == 2).unwrap();
        assert_eq!(leaf.mass, 0.0);

        let a = t.accelerations(Execution::Serial);
        let p = params(2, 1.0e-9);
        let exact = softened_accel(bodies[0].x - bodies[2].x, 1.0, &p)
            + softened_accel(bodies[1].x - bodies[2].x, -1.0, &p);
        assert!(exact.norm() > 0.0);
        assert!((a[2] - exact).norm() < 1e-12 * exact.norm());
    }

    #[test]
    fn foreign_body_slice_is_rejected() {
        let bodies = [body(0.0, 0.0, 0.0, 1.0), body(1.0, 0.0, 0.0, 2.0)];
        let t = tree(&bodies, 1, 0.5);

        let mut short = vec![bodies[0].clone()];
        assert_eq!(
            t.update_grav_acceleration(&mut short, Execution::Serial),
            Err(SimError::BodyCountMismatch { expected: 2, found: 1 })
        );

        let mut moved = bodies.to_vec();
        moved[1].x.y = 5.0;
        assert_eq!(
            t.update_grav_acceleration(&mut moved, Execution::Serial),
            Err(SimError::ForeignBody { body: 1 })
        );
        assert_eq!(moved[1].a, NVec3::zeros());

        let mut same = bodies.to_vec();
        assert_eq!(t.update_grav_acceleration(&mut same, Execution::Serial), Ok(()));
        assert!(same[0].a.x > 0.0);
    }

    #[test]
    fn large_theta_never_counts_self() {
        // with theta huge every closed node would qualify; the body's own
        // ancestors must still be opened
        let bodies = [body(-1.0, 0.0, 0.0, 1.0), body(1.0, 0.0, 0.0, 1.0)];
        let t = tree(&bodies, 1, 1.0e6);
        let a = t.accelerations(Execution::Serial);
        assert!(a[0].x > 0.0);
        assert!(a[1].x < 0.0);
        assert!((a[0] + a[1]).norm() < 1e-12);
    }
}

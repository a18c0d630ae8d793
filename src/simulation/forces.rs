//! Force / acceleration contributors for the n-body pipeline
//!
//! Defines the 3D acceleration trait, a direct softened Newtonian gravity
//! term (the O(N²) reference) and the Morton Barnes–Hut variant

use crate::simulation::barnes_hut::{softened_accel, BarnesHutTree3};
use crate::simulation::engine::Execution;
use crate::simulation::error::SimError;
use crate::simulation::params::TreeParameters;
use crate::simulation::sort::{sorter_for, KeySorter};
use crate::simulation::states::{System3, NVec3};

/// Collection of 3D acceleration terms
/// Each term implements [`Acceleration3`] and their contributions are summed
/// into a single acceleration vector per body
#[derive(Default)]
pub struct AccelSet3 {
    terms: Vec<Box<dyn Acceleration3 + Send + Sync>>,
}

impl AccelSet3 {
    /// Constructor
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add an acceleration term
    pub fn with(mut self, term: impl Acceleration3 + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Compute total accelerations at time `t` for all bodies in `sys`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, sys: &System3, out: &mut [NVec3]) -> Result<(), SimError> {
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }
        // Iterate over all acceleration contributors
        for term in &self.terms {
            term.acceleration(t, sys, out)?;
        }
        Ok(())
    }
}

/// Trait for 3D acceleration sources operating on [`System3`]
/// Implementations add their contribution into `out[i]` for each body
pub trait Acceleration3 {
    fn acceleration(&self, t: f64, sys: &System3, out: &mut [NVec3]) -> Result<(), SimError>;
}

/// 3D Newtonian gravity with softening (direct n^2 sum)
pub struct NewtonianGravity3 {
    pub params: TreeParameters,
}

impl Acceleration3 for NewtonianGravity3 {
    fn acceleration(&self, _t: f64, sys: &System3, out: &mut [NVec3]) -> Result<(), SimError> {
        self.params.validate()?;
        let n = sys.bodies.len();

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            let bi = &sys.bodies[i];
            for j in (i + 1)..n {
                let bj = &sys.bodies[j];

                // r points from i to j: i is pulled along +r, j along -r
                let r = bj.x - bi.x;

                // unit-mass kernel, scaled per side
                let k = softened_accel(r, 1.0, &self.params);
                out[i] += bj.m * k;
                out[j] -= bi.m * k;
            }
        }
        Ok(())
    }
}

/// 3D Newtonian gravity evaluated via a Morton Barnes–Hut octree
/// Rebuilds the tree from `sys` on every call
pub struct NewtonianGravityBarnesHut3 {
    pub params: TreeParameters,
    pub execution: Execution,
    pub sorter: Box<dyn KeySorter + Send + Sync>,
}

impl NewtonianGravityBarnesHut3 {
    /// Barnes–Hut term using the built-in sorter for `execution`
    pub fn new(params: TreeParameters, execution: Execution) -> Self {
        Self {
            params,
            execution,
            sorter: sorter_for(execution),
        }
    }

    /// Replace the sorting backend
    pub fn with_sorter(mut self, sorter: impl KeySorter + Send + Sync + 'static) -> Self {
        self.sorter = Box::new(sorter);
        self
    }
}

impl Acceleration3 for NewtonianGravityBarnesHut3 {
    /// Compute 3D accelerations using a Barnes–Hut tree built from `sys`
    fn acceleration(&self, _t: f64, sys: &System3, out: &mut [NVec3]) -> Result<(), SimError> {
        let tree = BarnesHutTree3::build(&sys.bodies, self.params, self.sorter.as_ref(), self.execution)?;
        for (o, a) in out.iter_mut().zip(tree.accelerations(self.execution)) {
            *o += a;
        }
        Ok(())
    }
}

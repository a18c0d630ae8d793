//! Core state types for the N-body pipeline.
//!
//! Defines the 3D body/system structs using `NVec3`.
//!
//! The system holds the list of bodies and the current simulation time `t`.
//! Bodies keep both the latest acceleration and the one before it so an
//! external leapfrog / Verlet integrator can consume both.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Body3 {
    pub x: NVec3, // 3d position
    pub v: NVec3, // 3d velocity
    pub a: NVec3, // acceleration from the latest force evaluation
    pub a_prev: NVec3, // acceleration from the evaluation before that
    pub m: f64, // mass
}

impl Body3 {
    /// Body at rest with zero acceleration history
    pub fn at_rest(x: NVec3, m: f64) -> Self {
        Self {
            x,
            v: NVec3::zeros(),
            a: NVec3::zeros(),
            a_prev: NVec3::zeros(),
            m,
        }
    }

    /// Shift the acceleration history: `a_prev <- a`, `a <- new_a`
    pub fn push_acceleration(&mut self, new_a: NVec3) {
        self.a_prev = self.a;
        self.a = new_a;
    }
}

#[derive(Debug, Clone)]
pub struct System3 {
    pub bodies: Vec<Body3>, // 3d collection of bodies
    pub t: f64, // time
}

impl System3 {
    /// Store one freshly evaluated acceleration per body, keeping the previous
    /// value in `a_prev`
    ///
    /// `accels` must be in the same order as `self.bodies`
    pub fn commit_accelerations(&mut self, accels: &[NVec3]) {
        assert_eq!(
            accels.len(),
            self.bodies.len(),
            "acceleration buffer does not match body count"
        );
        for (b, a) in self.bodies.iter_mut().zip(accels) {
            b.push_acceleration(*a);
        }
    }

    /// Sum of all body masses
    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.m).sum()
    }
}

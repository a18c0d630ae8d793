//! Numerical and physical parameters for the tree
//!
//! `TreeParameters` holds the runtime settings every pipeline stage reads:
//! - leaf capacity for the octree builder,
//! - opening threshold `theta` for the force evaluator,
//! - softening length `epsilon` and gravitational constant `G`
//!
//! No defaults are provided; callers must choose every value.

use super::error::SimError;

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParameters {
    pub leaf_capacity: usize, // max bodies per leaf (except at max depth)
    pub theta: f64, // opening threshold, smaller = more exact
    pub epsilon: f64, // softening length
    pub G: f64, // gravitational constant
}

impl TreeParameters {
    /// Build and validate a parameter set
    #[allow(non_snake_case)]
    pub fn new(leaf_capacity: usize, theta: f64, epsilon: f64, G: f64) -> Result<Self, SimError> {
        let params = Self { leaf_capacity, theta, epsilon, G };
        params.validate()?;
        Ok(params)
    }

    /// Check every value before any pipeline phase runs
    pub fn validate(&self) -> Result<(), SimError> {
        if self.leaf_capacity == 0 {
            return Err(SimError::ZeroLeafCapacity);
        }
        positive("theta", self.theta)?;
        positive("epsilon", self.epsilon)?;
        if !self.G.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "G",
                value: self.G,
                reason: "must be finite",
            });
        }
        Ok(())
    }

    /// Squared softening length, the form used in the force kernel
    pub fn eps2(&self) -> f64 {
        self.epsilon * self.epsilon
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), SimError> {
    // NaN fails the comparison too
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name,
            value,
            reason: "must be finite and strictly positive",
        })
    }
}

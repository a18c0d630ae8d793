//! Configuration types for loading scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – gravity model and execution mode
//! - [`ParametersConfig`] – tree parameters and physical constants
//! - [`BodyConfig`]       – state of each body
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   barnes_hut: true        # false -> direct O(N^2) sum
//!   execution: "serial"     # or "parallel"
//!
//! parameters:
//!   leaf_capacity: 1        # max bodies per leaf
//!   theta: 0.5              # opening threshold
//!   epsilon: 0.01           # softening length
//!   G: 1.0                  # gravitational constant
//!
//! bodies:
//!   - x: [ -0.5, 0.0, 0.0 ]
//!     v: [  0.0, 1.0, 0.0 ]
//!     m: 1.0
//!   - x: [  0.5, 0.0, 0.0 ]
//!     v: [  0.0, -1.0, 0.0 ]
//!     a: [  0.0, 0.0, 0.0 ] # optional, last known acceleration
//!     m: 1.0
//! ```
//!
//! Every parameter is required; there are no built-in defaults. The engine
//! maps this configuration into its runtime types in
//! [`Scenario3D`](crate::simulation::scenario::Scenario3D), which validates it.

use std::io::Read;

use serde::Deserialize;

use crate::simulation::engine::Execution;

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub barnes_hut: bool, // `true` - approximate with the octree, `false` - direct N^2 summation
    #[serde(default)]
    pub execution: Execution, // serial unless stated
}

/// Tree and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub leaf_capacity: usize, // max bodies per leaf
    pub theta: f64, // opening threshold
    pub epsilon: f64, // softening length, strictly positive
    pub G: f64, // gravitational constant
}

/// Configuration for a single body
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // position
    #[serde(default)]
    pub v: Vec<f64>, // velocity, zero if omitted
    #[serde(default)]
    pub a: Vec<f64>, // last acceleration, zero if omitted
    pub m: f64, // mass
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub bodies: Vec<BodyConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }
}

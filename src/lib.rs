pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{Body3, System3, NVec3};
pub use simulation::error::SimError;
pub use simulation::params::TreeParameters;
pub use simulation::engine::{Engine, Execution};
pub use simulation::bounds::Bounds;
pub use simulation::morton::{MortonKey, MORTON_BITS, MORTON_SCALE, MAX_DEPTH};
pub use simulation::sort::{KeySorter, KeyedBody, SerialSorter, ParallelSorter, SortedBodies, morton_order};
pub use simulation::octree::{BarnesHutNode3, NodeId, Octree, ROOT};
pub use simulation::barnes_hut::BarnesHutTree3;
pub use simulation::forces::{Acceleration3, AccelSet3, NewtonianGravity3, NewtonianGravityBarnesHut3};
pub use simulation::scenario::Scenario3D;

pub use configuration::config::{EngineConfig, ParametersConfig, BodyConfig, ScenarioConfig};

pub use benchmark::benchmark::bench_gravity;

pub mod states;
pub mod error;
pub mod params;
pub mod engine;
pub mod bounds;
pub mod morton;
pub mod sort;
pub mod octree;
pub mod barnes_hut;
pub mod forces;
pub mod scenario;

//! Build fully-initialized scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario3D` containing:
//! - engine settings (`Engine`)
//! - validated tree parameters (`TreeParameters`)
//! - system state (`System3` with bodies at t = 0)
//! - active force set (`AccelSet3`)

use log::debug;

use crate::configuration::config::{BodyConfig, ScenarioConfig};
use crate::simulation::engine::Engine;
use crate::simulation::error::SimError;
use crate::simulation::forces::{AccelSet3, NewtonianGravity3, NewtonianGravityBarnesHut3};
use crate::simulation::params::TreeParameters;
use crate::simulation::states::{Body3, System3, NVec3};

/// Runtime bundle constructed from a [`ScenarioConfig`]
///
/// One call to [`Scenario3D::update_accelerations`] is one force-evaluation
/// round: the tree is rebuilt from the current positions, every body's
/// acceleration is replaced and the previous one kept in `a_prev`.
pub struct Scenario3D {
    pub engine: Engine,
    pub parameters: TreeParameters,
    pub system: System3,
    pub forces: AccelSet3,
}

impl Scenario3D {
    pub fn build_scenario_3d(cfg: ScenarioConfig) -> Result<Self, SimError> {
        // Parameters are validated before anything else is built
        let p = &cfg.parameters;
        let parameters = TreeParameters::new(p.leaf_capacity, p.theta, p.epsilon, p.G)?;

        // Bodies: map `BodyConfig` -> runtime `Body3`
        let bodies = cfg
            .bodies
            .iter()
            .enumerate()
            .map(|(i, bc)| body_from_config(i, bc))
            .collect::<Result<Vec<_>, _>>()?;

        let system = System3 { bodies, t: 0.0 };

        let engine = Engine {
            barnes_hut: cfg.engine.barnes_hut,
            execution: cfg.engine.execution,
        };

        let forces = if engine.barnes_hut {
            AccelSet3::new().with(NewtonianGravityBarnesHut3::new(parameters, engine.execution))
        } else {
            AccelSet3::new().with(NewtonianGravity3 { params: parameters })
        };

        debug!(
            "scenario: {} bodies, barnes_hut = {}, {:?}",
            system.bodies.len(),
            engine.barnes_hut,
            engine.execution
        );

        Ok(Self {
            engine,
            parameters,
            system,
            forces,
        })
    }

    /// Run one force-evaluation round over the current system state
    pub fn update_accelerations(&mut self) -> Result<(), SimError> {
        let mut out = vec![NVec3::zeros(); self.system.bodies.len()];
        self.forces.accumulate_accels(self.system.t, &self.system, &mut out)?;
        self.system.commit_accelerations(&out);
        Ok(())
    }
}

fn body_from_config(i: usize, bc: &BodyConfig) -> Result<Body3, SimError> {
    Ok(Body3 {
        x: vec3(i, "x", &bc.x, false)?,
        v: vec3(i, "v", &bc.v, true)?,
        a: vec3(i, "a", &bc.a, true)?,
        a_prev: NVec3::zeros(),
        m: bc.m,
    })
}

/// Three components, or zero when `optional` and absent
fn vec3(body: usize, field: &'static str, c: &[f64], optional: bool) -> Result<NVec3, SimError> {
    match c {
        [] if optional => Ok(NVec3::zeros()),
        [x, y, z] => Ok(NVec3::new(*x, *y, *z)),
        _ => Err(SimError::MalformedBody { body, field, len: c.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::config::{EngineConfig, ParametersConfig};
    use crate::simulation::engine::Execution;

    fn config(barnes_hut: bool, bodies: Vec<BodyConfig>) -> ScenarioConfig {
        ScenarioConfig {
            engine: EngineConfig { barnes_hut, execution: Execution::Serial },
            parameters: ParametersConfig { leaf_capacity: 1, theta: 0.5, epsilon: 0.01, G: 1.0 },
            bodies,
        }
    }

    fn at(x: f64, a: Vec<f64>) -> BodyConfig {
        BodyConfig { x: vec![x, 0.0, 0.0], v: vec![], a, m: 1.0 }
    }

    #[test]
    fn round_shifts_acceleration_history() {
        let mut s = Scenario3D::build_scenario_3d(config(true, vec![at(-1.0, vec![7.0, 8.0, 9.0]), at(1.0, vec![])])).unwrap();
        s.update_accelerations().unwrap();
        let b0 = &s.system.bodies[0];
        assert_eq!(b0.a_prev, NVec3::new(7.0, 8.0, 9.0));
        assert!(b0.a.x > 0.0);
        assert_eq!(s.system.bodies[1].a_prev, NVec3::zeros());
    }

    #[test]
    fn direct_and_barnes_hut_scenarios_agree_for_two_bodies() {
        let bodies = || vec![at(-1.0, vec![]), at(1.0, vec![])];
        let mut direct = Scenario3D::build_scenario_3d(config(false, bodies())).unwrap();
        let mut bh = Scenario3D::build_scenario_3d(config(true, bodies())).unwrap();
        direct.update_accelerations().unwrap();
        bh.update_accelerations().unwrap();
        for (d, b) in direct.system.bodies.iter().zip(&bh.system.bodies) {
            assert!((d.a - b.a).norm() < 1e-12);
        }
    }

    #[test]
    fn malformed_vector_is_rejected() {
        let bad = BodyConfig { x: vec![0.0, 1.0], v: vec![], a: vec![], m: 1.0 };
        assert_eq!(
            Scenario3D::build_scenario_3d(config(true, vec![bad])).err(),
            Some(SimError::MalformedBody { body: 0, field: "x", len: 2 })
        );
    }

    #[test]
    fn invalid_parameters_fail_before_bodies_are_read() {
        let mut cfg = config(true, vec![BodyConfig { x: vec![], v: vec![], a: vec![], m: 1.0 }]);
        cfg.parameters.epsilon = 0.0;
        assert!(matches!(
            Scenario3D::build_scenario_3d(cfg),
            Err(SimError::InvalidParameter { name: "epsilon", .. })
        ));
    }

    #[test]
    fn empty_system_is_reported_on_evaluation() {
        let mut s = Scenario3D::build_scenario_3d(config(true, vec![])).unwrap();
        assert_eq!(s.update_accelerations(), Err(SimError::EmptySystem));
    }
}

//! Timing and accuracy of direct summation vs the Morton Barnes–Hut pipeline
//!
//! Fixtures are deterministic (trigonometric positions, no RNG) so runs are
//! comparable across machines and commits.

use std::time::Instant;

use crate::simulation::engine::Execution;
use crate::simulation::error::SimError;
use crate::simulation::forces::{Acceleration3, NewtonianGravity3, NewtonianGravityBarnesHut3};
use crate::simulation::params::TreeParameters;
use crate::simulation::states::{Body3, System3, NVec3};

/// Deterministic system of `n` unit masses inside a 10 x 10 x 10 box
pub fn make_system3(n: usize) -> System3 {
    let bodies = (0..n)
        .map(|i| {
            let i_f = i as f64;
            let x = NVec3::new(
                (i_f * 0.37).sin() * 5.0,
                (i_f * 0.13).cos() * 5.0,
                (i_f * 0.07).sin() * 5.0,
            );
            Body3::at_rest(x, 1.0)
        })
        .collect();

    System3 { bodies, t: 0.0 }
}

/// Tree parameters used by every benchmark run
pub fn make_params() -> Result<TreeParameters, SimError> {
    TreeParameters::new(8, 0.7, 1.0e-2, 0.1)
}

/// Largest `|approx - exact| / |exact|` over all bodies
///
/// Bodies whose exact acceleration is zero are skipped.
pub fn max_relative_error(exact: &[NVec3], approx: &[NVec3]) -> f64 {
    exact
        .iter()
        .zip(approx)
        .filter(|(e, _)| e.norm() > 0.0)
        .map(|(e, a)| (a - e).norm() / e.norm())
        .fold(0.0, f64::max)
}

fn time_term(term: &dyn Acceleration3, sys: &System3, out: &mut [NVec3]) -> Result<f64, SimError> {
    out.fill(NVec3::zeros());
    let t0 = Instant::now();
    term.acceleration(sys.t, sys, out)?;
    Ok(t0.elapsed().as_secs_f64())
}

/// Print one line per system size with timings and Barnes–Hut error
pub fn bench_gravity() -> Result<(), SimError> {
    // Different system sizes to test
    let ns = [200, 400, 800, 1600, 3200, 6400];
    let params = make_params()?;

    let direct = NewtonianGravity3 { params };
    let bh_serial = NewtonianGravityBarnesHut3::new(params, Execution::Serial);
    let bh_parallel = NewtonianGravityBarnesHut3::new(params, Execution::Parallel);

    for n in ns {
        let sys = make_system3(n);
        let mut exact = vec![NVec3::zeros(); n];
        let mut approx = vec![NVec3::zeros(); n];

        // Warm up
        time_term(&direct, &sys, &mut exact)?;
        time_term(&bh_parallel, &sys, &mut approx)?;

        let dt_direct = time_term(&direct, &sys, &mut exact)?;
        let dt_serial = time_term(&bh_serial, &sys, &mut approx)?;
        let dt_parallel = time_term(&bh_parallel, &sys, &mut approx)?;
        let err = max_relative_error(&exact, &approx);

        println!(
            "N = {n:5}, direct = {dt_direct:8.6} s, BH = {dt_serial:8.6} s, BH par = {dt_parallel:8.6} s, max rel err = {err:.2e}"
        );
    }
    Ok(())
}

/// Same comparison over a fine range of `n`, as CSV
/// Paste output directly into a spreadsheet to graph
pub fn bench_gravity_curve() -> Result<(), SimError> {
    println!("N,direct_ms,bh_ms,bh_par_ms");

    let params = make_params()?;
    let direct = NewtonianGravity3 { params };
    let bh_serial = NewtonianGravityBarnesHut3::new(params, Execution::Serial);
    let bh_parallel = NewtonianGravityBarnesHut3::new(params, Execution::Parallel);

    // Steps of 200 to give smoother graph
    for n in (200..=12800).step_by(200) {
        let sys = make_system3(n);
        let mut out = vec![NVec3::zeros(); n];

        let ms_direct = time_term(&direct, &sys, &mut out)? * 1000.0;
        let ms_bh = time_term(&bh_serial, &sys, &mut out)? * 1000.0;
        let ms_par = time_term(&bh_parallel, &sys, &mut out)? * 1000.0;

        println!("{n},{ms_direct:.6},{ms_bh:.6},{ms_par:.6}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_is_deterministic() {
        let a = make_system3(32);
        let b = make_system3(32);
        assert_eq!(a.bodies, b.bodies);
        assert_eq!(a.total_mass(), 32.0);
    }

    #[test]
    fn relative_error_skips_zero_reference() {
        let exact = [NVec3::zeros(), NVec3::new(2.0, 0.0, 0.0)];
        let approx = [NVec3::new(9.0, 9.0, 9.0), NVec3::new(2.0, 1.0, 0.0)];
        assert!((max_relative_error(&exact, &approx) - 0.5).abs() < 1e-12);
    }
}

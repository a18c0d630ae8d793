use bhmorton::benchmark::benchmark::{bench_gravity, bench_gravity_curve};
use bhmorton::{Scenario3D, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Evaluate Barnes-Hut gravity for one scenario")]
struct Args {
    /// Scenario file; bare names are looked up in `scenarios/`
    #[arg(short, long, default_value = "two_body.yaml")]
    file_name: String,

    /// Run the direct vs Barnes-Hut benchmark instead
    #[arg(long)]
    bench: bool,

    /// With --bench, print a CSV curve over many sizes
    #[arg(long, requires = "bench")]
    curve: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let given = PathBuf::from(file_name);
    let config_path = if given.exists() {
        given
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };

    let file = File::open(&config_path).with_context(|| format!("opening {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg = ScenarioConfig::from_reader(reader)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.bench {
        if args.curve {
            bench_gravity_curve()?;
        } else {
            bench_gravity()?;
        }
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario3D::build_scenario_3d(scenario_cfg).context("invalid scenario")?;
    scenario.update_accelerations().context("force evaluation failed")?;

    for (i, b) in scenario.system.bodies.iter().enumerate() {
        info!(
            "body {i}: a = ({:.6e}, {:.6e}, {:.6e}), a_prev = ({:.6e}, {:.6e}, {:.6e})",
            b.a.x, b.a.y, b.a.z, b.a_prev.x, b.a_prev.y, b.a_prev.z
        );
    }

    Ok(())
}

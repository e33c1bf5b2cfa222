//! Flockcast Simulator CLI
//!
//! Run swarm scenarios deterministically, optionally paced in real time and
//! exported frame by frame.

use clap::Parser;
use flockcast_core::SwarmConfig;
use flockcast_env::{SwarmError, TokioContext};
use flockcast_sim::scenarios::ScenarioId;
use flockcast_sim::{ScenarioResult, ScenarioRunner, SimContext};
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Flockcast swarm simulation CLI
#[derive(Parser, Debug)]
#[command(name = "flockcast-sim")]
#[command(about = "Run deterministic swarm scenarios for Flockcast", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of agents for the open-ended scenarios
    #[arg(short, long)]
    agents: Option<usize>,

    /// Scenario to run (quorum, flood, separation, determinism, swarm, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Ticks for the open-ended scenarios
    #[arg(short, long, default_value = "600")]
    ticks: u64,

    /// JSON file with engine configuration overrides
    #[arg(short, long)]
    config: Option<String>,

    /// Export frames of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Record every Nth tick when exporting
    #[arg(long, default_value = "1")]
    export_every: u64,

    /// Pace ticks in wall-clock time at the configured tick rate
    #[arg(long)]
    realtime: bool,

    /// Compute threads (0 = one per core)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("Flockcast Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let code = match run(&args).await {
        Ok(failed) if failed == 0 => 0,
        Ok(_) => 1,
        Err(e) => {
            error!("{}", e);
            1
        }
    };
    std::process::exit(code);
}

/// Runs every requested scenario. Returns the number of failed runs.
async fn run(args: &Args) -> Result<usize, SwarmError> {
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse()?]
    };

    if args.export.is_some() && scenarios.len() > 1 {
        return Err(SwarmError::Export(
            "--export only supports a single scenario, not 'all'".to_string(),
        ));
    }

    let mut config = match &args.config {
        Some(path) => SwarmConfig::from_json_file(path)?,
        None => SwarmConfig::default(),
    };
    if let Some(agents) = args.agents {
        config.num_agents = agents;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate()?;

    // Determine base seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let mut runner = ScenarioRunner::new(seed)
        .with_config(config)
        .with_ticks(args.ticks);
    if args.export.is_some() {
        runner = runner.with_recording(args.export_every);
    }

    let mut results: Vec<ScenarioResult> = Vec::new();
    for scenario in &scenarios {
        let result = if args.realtime {
            runner.run(*scenario, TokioContext::shared()).await
        } else {
            runner.run(*scenario, SimContext::shared(seed)).await
        };
        report(&result, args.json);
        results.push(result);
    }

    if let Some(path) = &args.export {
        if let Some(export) = results.first().and_then(|r| r.export.as_ref()) {
            export.write_to_file(path)?;
            info!("Exported {} frames to {}", export.frames.len(), path);
        }
    }

    let failed = results.iter().filter(|r| !r.passed).count();
    summarize(&results, failed, args.json)?;
    Ok(failed)
}

fn report(result: &ScenarioResult, json: bool) {
    if json {
        return;
    }
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED in {} ticks | POIs {}/{} retired",
            result.scenario.name(),
            result.seed,
            result.total_ticks,
            result.metrics.pois_retired,
            result.metrics.pois_spawned
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

fn summarize(results: &[ScenarioResult], failed: usize, json: bool) -> Result<(), SwarmError> {
    let total = results.len();

    if json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed,
            "failed": failed,
            "results": results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "pois_spawned": r.metrics.pois_spawned,
                    "pois_retired": r.metrics.pois_retired,
                    "quorum_evictions": r.metrics.quorum_evictions,
                    "flood_evictions": r.metrics.flood_evictions,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        let text = serde_json::to_string_pretty(&summary).map_err(SwarmError::export)?;
        println!("{}", text);
        return Ok(());
    }

    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if failed == 0 {
        info!("✅ All {} scenario runs passed!", total);
    } else {
        error!("❌ {}/{} scenario runs failed!", failed, total);
        for result in results.iter().filter(|r| !r.passed) {
            error!(
                "  - {} seed={}: {}",
                result.scenario.name(),
                result.seed,
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
    }
    Ok(())
}

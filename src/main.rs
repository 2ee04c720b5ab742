//! panel-sim entry point: CLI wiring and config-driven session construction.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use panel_sim::advisor::{Advisor, AdvisoryLine, AdvisoryRequest};
use panel_sim::config::DashboardConfig;
use panel_sim::io::export::{PowerReport, export_history_csv, export_report};
use panel_sim::logging;
use panel_sim::sim::engine::Simulator;
use panel_sim::sim::metrics::PanelMetrics;

/// Log directory used when the terminal owns stdout/stderr.
#[cfg(feature = "tui")]
const TUI_LOG_DIR: &str = "logs";

/// Simulated three-phase panel dashboard for campus buildings.
#[derive(Debug, Parser)]
#[command(name = "panel-sim", version, about, long_about = None)]
struct Cli {
    /// Load configuration from a TOML file
    #[arg(long, value_name = "FILE", conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Use a built-in preset (campus, single)
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to run in headless mode
    #[arg(long, default_value_t = 5)]
    ticks: u64,

    /// Write every building's JSON report into this directory after the run
    #[arg(long, value_name = "DIR")]
    report_out: Option<PathBuf>,

    /// Write every building's power history as CSV
    #[arg(long, value_name = "FILE")]
    history_out: Option<PathBuf>,

    /// Request an AI advisory for one building after the run
    #[arg(long, value_name = "BUILDING")]
    advise: Option<String>,

    /// Run the live session and serve the REST API
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Open the interactive terminal dashboard
    #[cfg(feature = "tui")]
    #[arg(long)]
    tui: bool,
}

impl Cli {
    fn interactive(&self) -> bool {
        #[cfg(feature = "tui")]
        if self.tui {
            return true;
        }
        false
    }
}

/// Loads config: `--config` takes priority, then `--preset`, then the campus default.
fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = if let Some(path) = &cli.config {
        DashboardConfig::from_toml_file(path)?
    } else if let Some(name) = &cli.preset {
        DashboardConfig::from_preset(name)?
    } else {
        DashboardConfig::campus()
    };

    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("configuration has {} error(s)", errors.len());
    }
    Ok(config)
}

fn print_advisory(lines: &[AdvisoryLine]) {
    for line in lines {
        match line {
            AdvisoryLine::Heading { text } => println!("\n## {text}"),
            AdvisoryLine::Numbered {
                number,
                label,
                body: Some(body),
                ..
            } => println!("{number}. {label}: {body}"),
            AdvisoryLine::Numbered { number, label, .. } => println!("{number}. {label}"),
            AdvisoryLine::Bullet { text } => println!("  - {text}"),
            AdvisoryLine::Text { text } => println!("{text}"),
        }
    }
}

/// Runs a fixed number of ticks, then performs the requested exports.
fn run_headless(
    cli: &Cli,
    mut sim: Simulator,
    advisor: &Advisor,
    runtime: &tokio::runtime::Runtime,
) -> Result<()> {
    for t in 1..=cli.ticks {
        sim.tick();
        for b in sim.buildings() {
            println!("[{t:>3}] {b} || {}", PanelMetrics::from_phases(&b.phases));
        }
    }

    if let Some(dir) = &cli.report_out {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create report directory {}", dir.display()))?;
        let now = chrono::Utc::now();
        for b in sim.buildings() {
            let path = export_report(&PowerReport::from_building(b, now), dir)
                .with_context(|| format!("failed to write report for {}", b.name))?;
            eprintln!("Report written to {}", path.display());
        }
    }

    if let Some(path) = &cli.history_out {
        export_history_csv(sim.buildings(), Path::new(path))
            .with_context(|| format!("failed to write history CSV {}", path.display()))?;
        eprintln!("History written to {}", path.display());
    }

    if let Some(name) = &cli.advise {
        let Some(building) = sim.building(name) else {
            warn!(building = %name, "unknown building for advisory");
            eprintln!("Unknown building \"{name}\"");
            return Ok(());
        };
        let request = AdvisoryRequest::from_building(building);
        match runtime.block_on(advisor.analyze(&request)) {
            Ok(advisory) => print_advisory(&advisory.lines),
            Err(err) => eprintln!("{}", err.user_message()),
        }
    }

    Ok(())
}

#[cfg(feature = "api")]
async fn serve(sim: Simulator, advisor: Advisor, port: u16) -> Result<()> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use panel_sim::api::{self, AppState};
    use panel_sim::session::{Session, shared};

    let period = sim.config().tick_interval;
    let session = Session::start(shared(sim), period);
    let state = Arc::new(AppState {
        simulator: Arc::clone(session.state()),
        advisor,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("API server listening on http://{addr}");
    api::serve(state, addr)
        .await
        .with_context(|| format!("API server on {addr} failed"))?;
    session.end();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    #[cfg(feature = "tui")]
    let fallback_log_dir = cli.tui.then(|| Path::new(TUI_LOG_DIR));
    #[cfg(not(feature = "tui"))]
    let fallback_log_dir: Option<&Path> = None;
    let _log_guard = logging::init(&config.logging, fallback_log_dir)?;

    let sim = Simulator::with_buildings(config.sim_config(), config.building_specs())?;
    info!(
        buildings = sim.len(),
        interactive = cli.interactive(),
        "simulator ready"
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    let advisor = Advisor::from_config(&config.advisor)?;

    #[cfg(feature = "tui")]
    if cli.tui {
        use std::sync::Arc;

        let export_dir = cli
            .report_out
            .clone()
            .unwrap_or_else(|| PathBuf::from("reports"));
        let app = panel_sim::tui::App::new(
            sim,
            Arc::new(advisor),
            runtime.handle().clone(),
            export_dir,
        );
        panel_sim::tui::run(app).context("terminal dashboard failed")?;
        return Ok(());
    }

    #[cfg(feature = "api")]
    if cli.serve {
        return runtime.block_on(serve(sim, advisor, cli.port));
    }

    run_headless(&cli, sim, &advisor, &runtime)
}

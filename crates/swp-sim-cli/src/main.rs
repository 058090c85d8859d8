use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use swp_abstract::{LinkConfig, NodeId, ProtocolConfig, Seq};
use swp_simulator::{SimulationReport, Simulator, scenario_runner};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sliding-window link simulator")]
struct Args {
    /// Run a scenario file instead of the built-in transfer.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Write a JSON trace of the finished simulation.
    #[arg(long)]
    trace_out: Option<PathBuf>,

    #[arg(long, default_value_t = 0.1)]
    loss_rate: f64,

    #[arg(long, default_value_t = 0.05)]
    corrupt_rate: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Largest sequence number; must make the sequence space even, at most 131071.
    #[arg(long, default_value_t = 7)]
    max_seq: Seq,

    #[arg(long, default_value_t = 200)]
    frame_timeout_ms: u64,

    #[arg(long, default_value_t = 50)]
    ack_timeout_ms: u64,

    /// Payloads each station submits in the built-in transfer.
    #[arg(long, default_value_t = 20)]
    messages: usize,

    /// Give up on the built-in transfer after this much virtual time.
    #[arg(long, default_value_t = 600_000)]
    max_time_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    info!("swp-sim starting");

    let report = match &args.scenario {
        Some(path) => scenario_runner::run_scenario(path)
            .with_context(|| format!("Scenario {} failed", path.display()))?,
        None => run_default_sim(&args)?,
    };

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
        info!("trace written to {}", trace_path.display());
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

fn run_default_sim(args: &Args) -> Result<SimulationReport> {
    let protocol = ProtocolConfig {
        max_seq: args.max_seq,
        frame_timeout_ms: args.frame_timeout_ms,
        ack_timeout_ms: args.ack_timeout_ms,
    };
    let link = LinkConfig {
        loss_rate: args.loss_rate,
        corrupt_rate: args.corrupt_rate,
        seed: args.seed,
        ..LinkConfig::default()
    };
    let mut sim = Simulator::new(protocol, link).context("Invalid simulator configuration")?;

    for i in 0..args.messages {
        let time = i as u64 * 10;
        sim.schedule_submit(time, NodeId::A, format!("A->B #{i}").into_bytes());
        sim.schedule_submit(time, NodeId::B, format!("B->A #{i}").into_bytes());
    }

    info!(messages = args.messages, "starting duplex transfer");
    if sim.run_until(args.max_time_ms) {
        info!("simulation complete after {} ms", sim.current_time());
    } else {
        warn!(
            "link still busy after {} ms, {} events pending",
            args.max_time_ms,
            sim.remaining_events()
        );
    }

    for node in [NodeId::A, NodeId::B] {
        let stats = sim.engine(node).stats();
        info!(
            ?node,
            delivered = sim.delivered(node).len(),
            data_sent = stats.data_sent,
            retransmissions = stats.retransmissions,
            naks = stats.naks_sent,
            "station summary"
        );
    }
    Ok(sim.export_report())
}

fn write_trace(path: &Path, report: &SimulationReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize simulation trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    Ok(())
}

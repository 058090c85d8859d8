use anyhow::{Context, anyhow, bail};
use std::fs;
use std::path::Path;
use swp_abstract::{LinkConfig, ProtocolConfig, TestAction, TestAssertion, TestScenario};
use tracing::info;

use crate::simulator::{Fault, FaultAction, Simulator};
use crate::trace::SimulationReport;

const DEFAULT_MAX_DURATION_MS: u64 = 10_000;

pub fn load_scenario(path: &Path) -> anyhow::Result<TestScenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    let scenario: TestScenario =
        toml::from_str(&content).context("Failed to parse scenario file")?;
    Ok(scenario)
}

/// Build a simulator with the scenario's configuration and actions applied.
pub fn build_simulator(scenario: &TestScenario) -> anyhow::Result<Simulator> {
    let mut protocol = ProtocolConfig::default();
    scenario.protocol.apply_to(&mut protocol);
    let mut link = LinkConfig::default();
    scenario.link.apply_to(&mut link);

    let mut sim = Simulator::new(protocol, link)
        .with_context(|| format!("Invalid configuration in scenario {}", scenario.name))?;

    for action in &scenario.actions {
        match action {
            TestAction::Submit { time, node, data } => {
                sim.schedule_submit(*time, *node, data.as_bytes().to_vec());
            }
            TestAction::DropNext { from, kind, seq } => sim.add_fault(Fault {
                from: *from,
                kind: *kind,
                seq: *seq,
                action: FaultAction::Drop,
            }),
            TestAction::CorruptNext { from, kind, seq } => sim.add_fault(Fault {
                from: *from,
                kind: *kind,
                seq: *seq,
                action: FaultAction::Corrupt,
            }),
        }
    }
    Ok(sim)
}

pub fn run_scenario(path: &Path) -> anyhow::Result<SimulationReport> {
    let scenario = load_scenario(path)?;
    run(&scenario)
}

/// Run a scenario to quiescence and check its assertions.
pub fn run(scenario: &TestScenario) -> anyhow::Result<SimulationReport> {
    info!("Running scenario: {}", scenario.name);
    if !scenario.description.is_empty() {
        info!("Description: {}", scenario.description);
    }

    let mut sim = build_simulator(scenario)?;

    let max_duration = scenario
        .assertions
        .iter()
        .find_map(|a| match a {
            TestAssertion::MaxDuration { ms } => Some(*ms),
            _ => None,
        })
        .unwrap_or(DEFAULT_MAX_DURATION_MS);

    while sim.step() {
        if sim.current_time() > max_duration {
            bail!("Scenario timed out after {} ms", max_duration);
        }
    }

    for assertion in &scenario.assertions {
        match assertion {
            TestAssertion::Delivered { node, data } => {
                let delivered: Vec<String> = sim
                    .delivered(*node)
                    .iter()
                    .map(|p| String::from_utf8_lossy(p.as_bytes()).into_owned())
                    .collect();
                if &delivered != data {
                    return Err(anyhow!(
                        "Assertion failed: {:?} delivered {:?}, expected {:?}",
                        node,
                        delivered,
                        data
                    ));
                }
            }
            TestAssertion::FrameCount {
                from,
                kind,
                min,
                max,
            } => {
                let count = sim.frames_sent(*from).get(*kind);
                if count < *min {
                    bail!(
                        "Assertion failed: {:?} sent {} {} frames, expected at least {}",
                        from,
                        count,
                        kind,
                        min
                    );
                }
                if let Some(max) = max
                    && count > *max
                {
                    bail!(
                        "Assertion failed: {:?} sent {} {} frames, expected at most {}",
                        from,
                        count,
                        kind,
                        max
                    );
                }
            }
            TestAssertion::MaxDuration { .. } => {} // enforced while running
        }
    }

    info!(
        "Scenario {} passed in {} ms",
        scenario.name,
        sim.current_time()
    );
    Ok(sim.export_report())
}

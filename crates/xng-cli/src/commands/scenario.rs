//! Reference scenarios.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use std::fmt;
use tracing::info;
use xng::prelude::*;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioName {
    /// One prior fires one posterior after a single delay
    Threshold,
    /// Three priors wired so that only all three fire the posterior
    Conjunction,
    /// An inhibitor cancels an excitatory edge
    Inhibit,
    /// A posterior firing before its prior depresses the edge
    Stdp,
    /// Associate two clusters, then break the association
    Associate,
}

impl fmt::Display for ScenarioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioName::Threshold => "threshold",
            ScenarioName::Conjunction => "conjunction",
            ScenarioName::Inhibit => "inhibit",
            ScenarioName::Stdp => "stdp",
            ScenarioName::Associate => "associate",
        };
        f.write_str(name)
    }
}

type Findings = Vec<(&'static str, String)>;
type Outcome<T> = std::result::Result<T, XngError>;

pub fn run(name: ScenarioName, json: bool, config: &Config) -> Result<()> {
    let mut net =
        Network::from_config(config.network.clone()).context("Invalid [network] config")?;
    info!(scenario = %name, "running scenario");

    let findings = match name {
        ScenarioName::Threshold => threshold(&mut net),
        ScenarioName::Conjunction => conjunction(&mut net),
        ScenarioName::Inhibit => inhibit(&mut net),
        ScenarioName::Stdp => stdp(&mut net),
        ScenarioName::Associate => associate(&mut net),
    }
    .with_context(|| format!("Scenario {name} failed"))?;

    if json {
        println!("{}", net.snapshot().to_json()?);
        return Ok(());
    }

    println!("{} Scenario {}", "→".blue(), name.to_string().cyan());
    for (label, value) in findings {
        println!("  {} {}: {}", "✓".green(), label, value.cyan());
    }
    println!(
        "  {} nodes, {} edges, clock at {}",
        net.node_count(),
        net.edge_count(),
        net.now()
    );
    Ok(())
}

fn fired_at(net: &Network, node: NodeId) -> Outcome<String> {
    Ok(match net.node(node)?.last_activation() {
        Some(t) => format!("t={t}"),
        None => "never".to_string(),
    })
}

fn two_clusters(net: &mut Network) -> (ClusterId, ClusterId) {
    (
        net.add_cluster(ClusterKind::Input, "priors"),
        net.add_cluster(ClusterKind::Bi, "posteriors"),
    )
}

fn threshold(net: &mut Network) -> Outcome<Findings> {
    let (priors, posteriors) = two_clusters(net);
    let a = net.add_node(priors)?;
    let b = net.add_node(posteriors)?;
    net.then(a, b)?;

    net.activate(a)?;
    net.fast_forward_until_idle()?;
    Ok(vec![
        ("b fired", fired_at(net, b)?),
        ("b integrator at t=20", format!("{:.3}", net.integrator_value(b, 20)?)),
    ])
}

fn conjunction(net: &mut Network) -> Outcome<Findings> {
    let (priors, posteriors) = two_clusters(net);
    let a: Vec<_> = (0..3).map(|_| net.add_node(priors)).collect::<Result<_, _>>()?;
    let b = net.add_node(posteriors)?;
    net.conjunction(b, &a)?;

    net.activate(a[0])?;
    net.activate(a[1])?;
    net.fast_forward_until_idle()?;
    let partial = fired_at(net, b)?;
    let peak = net.integrator_value(b, net.now())?;

    net.run_for(IntegrationProfile::TWOGRAM.support())?;
    for &p in &a {
        net.activate(p)?;
    }
    net.fast_forward_until_idle()?;
    Ok(vec![
        ("two of three, b fired", partial),
        ("two of three, b integrator", format!("{peak:.3}")),
        ("all three, b fired", fired_at(net, b)?),
    ])
}

fn inhibit(net: &mut Network) -> Outcome<Findings> {
    let (priors, posteriors) = two_clusters(net);
    let a = net.add_node(priors)?;
    let p = net.add_node(priors)?;
    let b = net.add_node(posteriors)?;
    net.then(a, b)?;
    net.inhibitor(b, p)?;

    net.activate(a)?;
    net.activate(p)?;
    net.fast_forward_until_idle()?;
    Ok(vec![
        ("b integrator at t=10", format!("{:.3}", net.integrator_value(b, 10)?)),
        ("b fired", fired_at(net, b)?),
    ])
}

fn stdp(net: &mut Network) -> Outcome<Findings> {
    let c = net.add_cluster(ClusterKind::Bi, "bi");
    let a = net.add_node(c)?;
    let b = net.add_node(c)?;
    net.then(a, b)?;
    let before = net.weight(a, b).unwrap_or_default();

    net.activate(b)?;
    net.run_for(5)?;
    net.activate(a)?;
    net.fast_forward_until_idle()?;
    Ok(vec![
        ("weight before", format!("{before:.3}")),
        ("weight after b at t=0, a at t=5", format!("{:.3}", net.weight(a, b).unwrap_or_default())),
    ])
}

fn associate(net: &mut Network) -> Outcome<Findings> {
    let a_cluster = net.add_cluster(ClusterKind::Bi, "A");
    let b_cluster = net.add_cluster(ClusterKind::Bi, "B");
    let a = net.add_node(a_cluster)?;
    let b = net.add_node(b_cluster)?;

    net.activate(a)?;
    net.run_for(10)?;
    net.activate(b)?;
    net.run_for(10)?;

    net.associate(&[PriorClusterProfile::transient(a_cluster)], b_cluster)?;
    let associated = net.weight(a, b).unwrap_or_default();
    net.disassociate(a_cluster, b_cluster)?;
    let disassociated = net.weight(a, b).unwrap_or_default();
    let reclaimed = net.clean();

    Ok(vec![
        ("weight after associate", format!("{associated:.3}")),
        ("weight after disassociate", format!("{disassociated:.3}")),
        ("nodes reclaimed by clean", reclaimed.to_string()),
    ])
}

//! Run the Bernoulli bandit probe.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;
use xng::prelude::*;

pub fn run(config: BanditConfig, json: bool) -> Result<()> {
    let wiring = if config.hebbian { "hebbian" } else { "explicit" };
    info!(seed = config.seed, wiring, "starting bandit probe");

    let mut harness = BanditHarness::new(config).context("Invalid [bandit] config")?;

    let outcome = if json {
        harness.run_suite()?
    } else {
        println!(
            "{} Running {} bandit with arms {}",
            "→".blue(),
            wiring.cyan(),
            format_probabilities(&harness.probabilities()).cyan()
        );
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .context("Invalid progress template")?,
        );
        pb.set_message("pulling arms...");
        pb.enable_steady_tick(Duration::from_millis(100));
        let outcome = harness.run_suite();
        pb.finish_and_clear();
        outcome?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if !outcome.passed() {
        bail!(
            "Bandit did not converge after {} pulls ({:.2} efficacy)",
            outcome.pulls,
            outcome.efficacy
        );
    }
    Ok(())
}

fn format_probabilities(p: &[f64]) -> String {
    let items: Vec<String> = p.iter().map(|p| format!("{p:.2}")).collect();
    format!("[{}]", items.join(", "))
}

fn print_outcome(outcome: &BanditOutcome) {
    let status = if outcome.converged {
        "converged".green()
    } else if outcome.passed() {
        "efficient".yellow()
    } else {
        "failed".red()
    };
    println!("  {} {}", "✓".green(), status.bold());
    println!(
        "  Best arm:  {} (p = {:.2})",
        outcome.best_arm.to_string().cyan(),
        outcome.probabilities[outcome.best_arm]
    );
    println!("  Trials:    {}", outcome.trials.to_string().cyan());
    println!("  Pulls:     {}", outcome.pulls.to_string().cyan());
    println!("  Reward:    {}", outcome.reward.to_string().cyan());
    println!("  Efficacy:  {}", format!("{:.3}", outcome.efficacy).cyan());
}

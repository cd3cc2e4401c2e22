//! Series command implementation.

use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use super::{load_scenario, seed_or_random, CliError};
use botwar::runner;
use botwar::CostModel;

/// Execute the series command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or any battle fails
/// to set up.
pub(crate) fn execute(scenario: &Path, games: u32, seed: Option<u64>) -> Result<(), CliError> {
    let scenario = load_scenario(scenario)?;
    let costs = CostModel::default();
    let base_seed = seed_or_random(seed);

    let pb = ProgressBar::new(u64::from(games));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} battles ({per_sec})")
            .expect("valid template")
            .progress_chars("=>-"),
    );

    let start = Instant::now();
    let report = runner::run_series(
        base_seed,
        games,
        &scenario.robots,
        &scenario.config,
        &costs,
        |_| pb.inc(1),
    )?;
    pb.finish_and_clear();
    let duration = start.elapsed();

    println!("Series: {games} battles from seed {base_seed}");
    for (side, wins) in &report.wins {
        let pct = f64::from(*wins) * 100.0 / f64::from(games);
        println!("  side {side}: {wins} wins ({pct:.1}%)");
    }
    let draw_pct = f64::from(report.draws) * 100.0 / f64::from(games);
    println!("  draws : {} ({draw_pct:.1}%)", report.draws);
    println!("Duration: {:.2}s", duration.as_secs_f64());

    Ok(())
}

//! Check command implementation.

use std::path::Path;

use super::{load_scenario, CliError};
use botwar::runner::{MAX_ROBOTS, MIN_ROBOTS};
use botwar::Instruction;

/// Execute the check command: validate every program in a scenario without
/// running it.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or any program line
/// fails to parse.
pub(crate) fn execute(scenario: &Path) -> Result<(), CliError> {
    let scenario = load_scenario(scenario)?;

    let mut problems = Vec::new();

    if scenario.robots.len() < MIN_ROBOTS {
        problems.push(format!(
            "roster has {} robots (minimum {MIN_ROBOTS})",
            scenario.robots.len()
        ));
    }
    if scenario.robots.len() > MAX_ROBOTS {
        problems.push(format!(
            "roster has {} robots (maximum {MAX_ROBOTS})",
            scenario.robots.len()
        ));
    }

    for robot in &scenario.robots {
        for (i, line) in robot.program.iter().enumerate() {
            if let Err(e) = Instruction::parse(line) {
                problems.push(format!(
                    "{}: program line {}: {e} ({line:?})",
                    robot.name,
                    i + 1
                ));
            }
        }
        if let Some(emergency) = &robot.emergency {
            if let Err(e) = Instruction::parse(emergency) {
                problems.push(format!(
                    "{}: emergency action: {e} ({emergency:?})",
                    robot.name
                ));
            }
        }
    }

    if problems.is_empty() {
        let lines: usize = scenario.robots.iter().map(|r| r.program.len()).sum();
        println!(
            "OK: {} robots, {lines} program lines, all valid",
            scenario.robots.len()
        );
        Ok(())
    } else {
        for problem in &problems {
            println!("INVALID: {problem}");
        }
        Err(CliError::new(format!(
            "{} problem(s) found",
            problems.len()
        )))
    }
}

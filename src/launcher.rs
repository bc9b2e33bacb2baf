//! Hands a finished sweep to the external simulator and plotting script.
//!
//! Exit statuses are only logged: the simulator is a separate system and
//! its failures never abort the generator.

use crate::util::read_env_path;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Command;

pub const DEFAULT_SIMULATOR: &str = "./CulturalEvo";
pub const DEFAULT_PLOT_SCRIPT: &str = "Analysis/Code/plot_nets_HD.py";
pub const DEFAULT_PYTHON: &str = "python";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchConfig {
    pub simulator: PathBuf,
    pub python: String,
    pub plot_script: PathBuf,
    pub working_dir: PathBuf,
}

impl LaunchConfig {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            simulator: PathBuf::from(DEFAULT_SIMULATOR),
            python: DEFAULT_PYTHON.to_string(),
            plot_script: PathBuf::from(DEFAULT_PLOT_SCRIPT),
            working_dir,
        }
    }

    /// Applies `NETGAME_SIMULATOR` and `NETGAME_PLOT_SCRIPT` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(simulator) = read_env_path("NETGAME_SIMULATOR") {
            self.simulator = simulator;
        }
        if let Some(script) = read_env_path("NETGAME_PLOT_SCRIPT") {
            self.plot_script = script;
        }
        self
    }
}

/// `<description> 0 4 <num_seeds> 0 0 <ruggedness_k>`
pub fn simulator_args(description: &str, num_seeds: u32, ruggedness_k: u32) -> Vec<String> {
    vec![
        description.to_string(),
        "0".to_string(),
        "4".to_string(),
        num_seeds.to_string(),
        "0".to_string(),
        "0".to_string(),
        ruggedness_k.to_string(),
    ]
}

/// `<script> <description> 0 0 4 4 ALL`
pub fn plot_args(plot_script: &str, description: &str) -> Vec<String> {
    vec![
        plot_script.to_string(),
        description.to_string(),
        "0".to_string(),
        "0".to_string(),
        "4".to_string(),
        "4".to_string(),
        "ALL".to_string(),
    ]
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LaunchOutcome {
    /// `None` when the process could not be spawned or was killed by a signal.
    pub simulator_exit: Option<i32>,
    pub plot_exit: Option<i32>,
}

/// Runs the simulator, then the plot script, each blocking until exit.
pub fn launch(
    cfg: &LaunchConfig,
    description: &str,
    num_seeds: u32,
    ruggedness_k: u32,
) -> LaunchOutcome {
    let mut simulator = Command::new(&cfg.simulator);
    simulator
        .args(simulator_args(description, num_seeds, ruggedness_k))
        .current_dir(&cfg.working_dir);
    let simulator_exit = run_blocking("simulator", &mut simulator);

    let mut plot = Command::new(&cfg.python);
    plot.args(plot_args(&cfg.plot_script.to_string_lossy(), description))
        .current_dir(&cfg.working_dir);
    let plot_exit = run_blocking("plot", &mut plot);

    LaunchOutcome {
        simulator_exit,
        plot_exit,
    }
}

fn run_blocking(label: &str, cmd: &mut Command) -> Option<i32> {
    tracing::info!(command = ?cmd, "launching {label}");
    match cmd.status() {
        Ok(status) if status.success() => {
            tracing::info!("{label} finished: {status}");
            status.code()
        }
        Ok(status) => {
            tracing::warn!("{label} exited unsuccessfully: {status}");
            status.code()
        }
        Err(e) => {
            tracing::warn!("failed to start {label}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulator_arguments_are_positional() {
        assert_eq!(
            simulator_args("Pop-20_x", 4, 7),
            vec!["Pop-20_x", "0", "4", "4", "0", "0", "7"]
        );
    }

    #[test]
    fn plot_arguments_are_positional() {
        assert_eq!(
            plot_args("plot.py", "Pop-20_x"),
            vec!["plot.py", "Pop-20_x", "0", "0", "4", "4", "ALL"]
        );
    }

    #[test]
    fn missing_binaries_are_logged_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = LaunchConfig {
            simulator: tmp.path().join("no-such-simulator"),
            python: tmp.path().join("no-such-python").display().to_string(),
            plot_script: PathBuf::from("plot.py"),
            working_dir: tmp.path().to_path_buf(),
        };
        let outcome = launch(&cfg, "Pop-20_x", 1, 7);
        assert_eq!(outcome, LaunchOutcome::default());
    }
}

//! isodemo CLI -- run the isolation demonstrations against a database.

use clap::{Args, Parser, Subcommand, ValueEnum};
use isodemo_core::config::{DEFAULT_DATABASE, DEFAULT_URL};
use isodemo_core::{Config, Scenario};

#[derive(Debug, Parser)]
#[command(
    name = "isodemo",
    about = "Demonstrate SQL transaction isolation anomalies"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recreate the scratch database and run the demonstrations
    Run(RunArgs),
    /// Only drop and recreate the scratch database and its table
    Bootstrap(ConnectionArgs),
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Server URL; the scheme selects the engine (mysql, mariadb, postgres)
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_URL)]
    pub url: String,
    /// Scratch database to drop and recreate
    #[arg(long, default_value = DEFAULT_DATABASE)]
    pub database: String,
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Scenario to run; repeat to run several (default: all)
    #[arg(long = "scenario", value_enum)]
    pub scenarios: Vec<ScenarioName>,
    /// Output results as JSON (one object per scenario)
    #[arg(long)]
    pub json: bool,
    /// Exit 1 if any observation differs from the engine's documented behaviour
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ScenarioName {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
}

impl From<ScenarioName> for Scenario {
    fn from(name: ScenarioName) -> Self {
        match name {
            ScenarioName::ReadUncommitted => Self::ReadUncommitted,
            ScenarioName::ReadCommitted => Self::ReadCommitted,
            ScenarioName::RepeatableRead => Self::RepeatableRead,
        }
    }
}

impl ConnectionArgs {
    #[must_use]
    pub fn config(&self) -> Config {
        Config::new(self.url.clone(), self.database.clone())
    }
}

impl RunArgs {
    /// The selected scenarios, or all of them if none were named.
    #[must_use]
    pub fn scenarios(&self) -> Vec<Scenario> {
        if self.scenarios.is_empty() {
            Scenario::ALL.to_vec()
        } else {
            self.scenarios.iter().copied().map(Scenario::from).collect()
        }
    }
}

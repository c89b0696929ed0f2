use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use codeflow_core::{
    providers::{GeminiConfig, API_KEY_VAR},
    ProviderError, WorkflowConfig,
};

/// Describe a task, review the plan, then generate, run, and explain Python
/// code from the terminal.
///
/// Requests are stored per user in a local SQLite database, so earlier runs
/// can be listed with `history` and reopened with `show`.
#[derive(Parser)]
#[command(version, about, name = "cf")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/codeflow/codeflow.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a request through plan, code, and follow-up
    #[command(alias = "r")]
    Run(RunArgs),
    /// List a user's requests, newest first
    #[command(aliases = ["h", "ls"])]
    History(HistoryArgs),
    /// Show one stored request
    #[command(alias = "s")]
    Show(ShowArgs),
}

/// Generation backend
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum ProviderArg {
    /// Canned templates chosen by keywords in the description
    #[default]
    Mock,
    /// Google Gemini (needs an API key)
    Gemini,
}

#[derive(ClapArgs)]
pub struct RunArgs {
    /// What the code should do
    pub description: String,

    /// User who owns the request
    #[arg(short, long, env = "CODEFLOW_USER")]
    pub user: String,

    /// Text generation backend
    #[arg(short, long, value_enum, default_value_t = ProviderArg::Mock)]
    pub provider: ProviderArg,

    /// Approve, execute, debug, and complete without prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Use this file's contents as the plan instead of the generated one
    #[arg(long)]
    pub plan_file: Option<PathBuf>,

    /// Skip the simulated provider latency
    #[arg(long)]
    pub no_latency: bool,

    /// Seed for the simulated executor
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability that a simulated run has its dependencies (0.0 to 1.0)
    #[arg(long)]
    pub success_rate: Option<f64>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,
}

impl RunArgs {
    pub fn workflow_config(&self) -> WorkflowConfig {
        let mut config = if self.no_latency {
            WorkflowConfig::instant()
        } else {
            WorkflowConfig::default()
        };
        if let Some(rate) = self.success_rate {
            config = config.with_success_rate(rate);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }

    pub fn gemini_config(&self) -> Result<GeminiConfig, ProviderError> {
        let api_key = self
            .gemini_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderError::Configuration(format!("{API_KEY_VAR} is not set")))?;
        let mut config = GeminiConfig::new(api_key);
        if let Some(model) = &self.gemini_model {
            config = config.with_model(model.clone());
        }
        Ok(config)
    }
}

#[derive(ClapArgs)]
pub struct HistoryArgs {
    /// User whose requests to list
    #[arg(short, long, env = "CODEFLOW_USER")]
    pub user: String,
}

#[derive(ClapArgs)]
pub struct ShowArgs {
    /// Request identifier as printed by `run` or `history`
    pub id: String,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_run_flags_shape_config() {
        let args = Args::parse_from([
            "cf",
            "run",
            "generic task",
            "--user",
            "alice",
            "--no-latency",
            "--seed",
            "9",
            "--success-rate",
            "1.5",
        ]);
        let Commands::Run(run) = args.command else {
            panic!("expected run");
        };
        let config = run.workflow_config();
        assert_eq!(config.plan_latency, Duration::ZERO);
        assert_eq!(config.seed, Some(9));
        assert!((config.success_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(run.provider, ProviderArg::Mock);
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "shakedown",
    version,
    about = "QA harness: environment detection, lint aggregation, forensic reruns"
)]
pub struct Cli {
    /// Project root holding `shakedown.toml`. Defaults to the current directory.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,
    #[arg(long, global = true, help = "Disable ANSI colors in console output")]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command repeatedly and collect forensic evidence.
    Run(RunArgs),
    /// Parse saved tool output into violation records.
    Parse(ParseArgs),
    /// Show which tools resolve, and whether from the isolated environment.
    Tools {
        /// Tool names. Defaults to `forensics.tools` from the config.
        names: Vec<String>,
    },
    /// Show the isolated-environment verdict.
    Env,
    /// Print the resolved configuration as TOML.
    Config,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long, short = 'n')]
    pub iterations: Option<u32>,
    /// Base timeout in seconds. Defaults to the baseline plus safety margin.
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Append the path prefixes of this test scope to the command.
    #[arg(long)]
    pub scope: Option<String>,
    #[arg(long)]
    pub delay_ms: Option<u64>,
    #[arg(long)]
    pub log_dir: Option<String>,
    /// Per-test timeout exported to the command, in milliseconds.
    #[arg(long)]
    pub test_timeout_ms: Option<u64>,
    #[arg(long)]
    pub coverage: Option<bool>,
    /// Target command and its arguments.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// File with captured tool output; `-` or absent reads stdin.
    pub input: Option<PathBuf>,
    /// Tool that produced the output.
    #[arg(long, default_value = "unknown")]
    pub tool: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Console,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Json => "json",
        }
    }
}

//! CLI argument parsing for the simulation harness.
//!
//! The CLI is thin: it locates the run configuration and forwards to the
//! library, so the same setup path serves every command.
use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "simh",
    version,
    about = "Assemble HDL source libraries and run testbenches through a simulation backend",
    after_help = "Examples:\n  simh init\n  simh files\n  simh encode --json\n  simh run 'lib.tb_top.*'\n  simh run --list\n  simh run -- --gui",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Files(FilesArgs),
    Encode(EncodeArgs),
    Run(RunArgs),
}

/// Location of the run configuration and its source root.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Run configuration JSON
    #[arg(long, short, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory relative source locations resolve against
    /// (defaults to the config file's directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl ConfigArgs {
    /// Resolve the source root for this configuration.
    pub fn source_root(&self) -> PathBuf {
        if let Some(root) = &self.root {
            return root.clone();
        }
        match self.config.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        }
    }
}

/// Init command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write a starter run configuration")]
pub struct InitArgs {
    /// Output path for the configuration
    #[arg(long, short, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

/// Files command inputs.
#[derive(Parser, Debug)]
#[command(about = "Resolve libraries and list their sources in compile order")]
pub struct FilesArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Encode command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the encoded generic string of every test")]
pub struct EncodeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Run command inputs.
#[derive(Parser, Debug)]
#[command(about = "Run selected tests through the backend")]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Backend command line, overriding the configuration
    #[arg(long, value_name = "CMD")]
    pub backend: Option<String>,

    /// List selected tests without running them
    #[arg(long)]
    pub list: bool,

    /// Emit the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Test id patterns such as `lib.tb_top.*` (all tests when omitted)
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Arguments passed through to every backend invocation
    #[arg(last = true, value_name = "BACKEND_ARGS")]
    pub backend_args: Vec<String>,
}

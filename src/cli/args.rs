//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// NVIDIA GPU hotspot and VRAM temperature reader
///
/// Reads junction and memory temperatures from undocumented GPU registers
/// alongside the NVML core temperature. Requires root.
#[derive(Parser, Debug)]
#[command(name = "nvhot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NVHOT_CONFIG")]
    pub config: Option<String>,

    /// Target GPU by index (0-based)
    #[arg(long, global = true)]
    pub gpu: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the number of detected GPUs
    Count,

    /// Read temperatures once
    Read,

    /// Poll temperatures at a fixed interval
    Watch(WatchArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Polling interval in seconds (overrides the config file)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Stop after this many polls
    #[arg(short = 'n', long)]
    pub iterations: Option<u64>,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_count() {
        let args = Cli::try_parse_from(["nvhot", "count"]).unwrap();
        assert!(matches!(args.command, Commands::Count));
    }

    #[test]
    fn test_cli_parse_verbose() {
        let args = Cli::try_parse_from(["nvhot", "-v", "read"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_parse_gpu_selection() {
        let args = Cli::try_parse_from(["nvhot", "--gpu", "1", "read"]).unwrap();
        assert_eq!(args.gpu, Some(1));
        assert!(matches!(args.command, Commands::Read));
    }

    #[test]
    fn test_cli_parse_format_after_subcommand() {
        let args = Cli::try_parse_from(["nvhot", "read", "--format", "json"]).unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn test_cli_parse_watch_args() {
        let args =
            Cli::try_parse_from(["nvhot", "watch", "--interval", "2", "-n", "10"]).unwrap();

        if let Commands::Watch(watch) = args.command {
            assert_eq!(watch.interval, Some(2));
            assert_eq!(watch.iterations, Some(10));
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn test_cli_watch_defaults() {
        let args = Cli::try_parse_from(["nvhot", "watch"]).unwrap();
        if let Commands::Watch(watch) = args.command {
            assert!(watch.interval.is_none());
            assert!(watch.iterations.is_none());
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn test_cli_watch_interval_validation() {
        // Should fail for 0
        let result = Cli::try_parse_from(["nvhot", "watch", "--interval", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["nvhot"]).is_err());
    }
}

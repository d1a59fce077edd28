use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lognorm")]
#[command(author, version, about = "Normalizes multi-line application logs into canonical structured records")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Configuration file with user adapters and settings (YAML or JSON)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Number of parallel threads (0 = auto-detect)
    #[arg(long, short = 'j', global = true, default_value = "0")]
    pub parallel: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize log files into structured records
    Normalize(NormalizeArgs),

    /// List registered adapters
    Adapters(AdaptersArgs),

    /// Validate a configuration file
    Check(CheckArgs),
}

#[derive(Args)]
pub struct NormalizeArgs {
    /// Log files to normalize (supports glob patterns, `-` for stdin).
    /// Defaults to the adapter's include paths.
    pub files: Vec<PathBuf>,

    /// Adapter to normalize with
    #[arg(long, short)]
    pub adapter: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Each line is a JSON record whose `message` field holds the log text
    #[arg(long)]
    pub structured: bool,

    /// Print a statistics summary to stderr when done
    #[arg(long)]
    pub stats: bool,

    /// Maximum number of records to print
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output file (default: stdout)
    #[arg(long, short = 'f')]
    pub output_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct AdaptersArgs {
    /// Dump one adapter's definition as YAML
    #[arg(long)]
    pub show: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Also build the built-in adapters
    #[arg(long)]
    pub all: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON array of records
    Json,
    /// Newline-delimited JSON
    Ndjson,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalize() {
        let cli = Cli::try_parse_from([
            "lognorm", "normalize", "a.log", "b*.log", "--adapter", "zookeeper_general", "-o", "ndjson", "-j", "4",
        ])
        .unwrap();

        assert_eq!(cli.global.parallel, 4);
        match cli.command {
            Commands::Normalize(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.adapter.as_deref(), Some("zookeeper_general"));
                assert_eq!(args.output, OutputFormat::Ndjson);
                assert!(!args.structured);
            }
            _ => panic!("expected normalize"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["lognorm", "check", "--config", "lognorm.yaml"]).unwrap();
        assert_eq!(cli.global.config, Some(PathBuf::from("lognorm.yaml")));
        assert!(matches!(cli.command, Commands::Check(_)));
    }
}

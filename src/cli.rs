use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile a commerce catalog with a set of resource drafts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "CATSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the update actions a sync would send, without writing
    Plan(PlanArgs),

    /// Create and update catalog resources to match the drafts
    Sync(SyncArgs),

    /// Inspect or create the config file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resource kind to reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Products,
    Categories,
    CartDiscounts,
    Inventory,
}

/// Where drafts come from and which catalog they go to
#[derive(Args)]
pub struct SourceArgs {
    /// Resource kind of the drafts
    #[arg(value_enum)]
    pub kind: Kind,

    /// JSON file holding an array of drafts
    #[arg(short, long)]
    pub drafts: PathBuf,

    /// Catalog snapshot file (default: [catalog] path from the config)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Create channels that drafts reference but the catalog lacks
    #[arg(long)]
    pub ensure_channels: bool,

    /// Keep locales, entries and fields the drafts do not mention
    #[arg(long)]
    pub keep_unmentioned: bool,

    /// Drafts per batch
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show a diff of each resource before and after its actions
    #[arg(long)]
    pub diff: bool,
}

#[derive(Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel workers
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Write a JSON run report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the config file location and effective settings
    Show,

    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync() {
        let cli = Cli::try_parse_from([
            "catsync",
            "-vv",
            "sync",
            "cart-discounts",
            "--drafts",
            "discounts.json",
            "--jobs",
            "8",
            "--yes",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Sync(args) => {
                assert_eq!(args.source.kind, Kind::CartDiscounts);
                assert_eq!(args.jobs, Some(8));
                assert!(args.yes);
                assert!(args.source.catalog.is_none());
            }
            _ => panic!("expected sync"),
        }
    }
}

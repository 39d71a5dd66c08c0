//! CLI command and subcommand definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::client::Params;
use crate::format::OutputFormat;

/// Ahrefs API CLI
#[derive(Parser, Debug)]
#[command(name = "ahrefs")]
#[command(
    version,
    about = "Ahrefs API CLI - agent-friendly interface to the Ahrefs API v3",
    long_about = "Command-line interface for the Ahrefs API v3.

Every command prints a structured envelope ({status, data|error, meta}) so the
output can be consumed by scripts and coding agents. Run with --list-commands
to get the whole command tree as JSON.

Authentication:
  Pass --api-key, set AHREFS_API_KEY, or store a key with
  'ahrefs config set-key <key>'.",
    after_help = "Examples:
  # Get domain rating
  ahrefs site-explorer domain-rating --target example.com

  # List all available commands
  ahrefs --list-commands"
)]
pub struct Cli {
    /// Ahrefs API key (or set AHREFS_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print data and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Validate the request and print the URL without calling the API
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Config file path (default: ~/.ahrefsrc)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true, hide = true)]
    pub base_url: Option<String>,

    /// List all commands and flags as JSON
    #[arg(long)]
    pub list_commands: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Site Explorer API endpoints
    #[command(
        visible_alias = "se",
        long_about = "Access Site Explorer data: domain rating, backlinks, referring domains,
anchors, organic keywords, top pages and traffic metrics."
    )]
    SiteExplorer {
        #[command(subcommand)]
        command: SiteExplorerCommands,
    },

    /// Manage the stored API key
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Match strategy for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// The exact URL
    Exact,
    /// The domain and its www variant
    #[default]
    Domain,
    /// Every URL starting with the target
    Prefix,
    /// The domain and all of its subdomains
    Subdomains,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Exact => "exact",
            Mode::Domain => "domain",
            Mode::Prefix => "prefix",
            Mode::Subdomains => "subdomains",
        }
    }
}

/// Target selection shared by every Site Explorer command
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Target domain or URL
    #[arg(long)]
    pub target: String,

    /// Target mode
    #[arg(long, value_enum, default_value_t = Mode::Domain)]
    pub mode: Mode,
}

impl TargetArgs {
    pub fn params(&self) -> Params {
        Params::new()
            .set("target", &self.target)
            .set("mode", self.mode.as_str())
    }
}

/// Paging, projection and filtering for list endpoints
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Maximum number of results
    #[arg(long, default_value_t = 100)]
    pub limit: u32,

    /// Offset for pagination
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Comma-separated list of fields to return
    #[arg(long)]
    pub select: Option<String>,

    /// Filter expression (Ahrefs filter syntax)
    #[arg(long = "where")]
    pub filter: Option<String>,

    /// Sort order (e.g. traffic:desc)
    #[arg(long)]
    pub order_by: Option<String>,
}

impl ListArgs {
    /// Add the list parameters; limit is always sent, the rest only when set
    pub fn apply(&self, params: Params) -> Params {
        let params = params
            .set("limit", self.limit)
            .set_opt("select", self.select.as_deref())
            .set_opt("where", self.filter.as_deref())
            .set_opt("order_by", self.order_by.as_deref());
        if self.offset > 0 {
            params.set("offset", self.offset)
        } else {
            params
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SiteExplorerCommands {
    /// Get domain rating for a target
    #[command(
        long_about = "Get the Domain Rating (DR) of a domain or URL.

Domain Rating shows the strength of a website's backlink profile on a
logarithmic scale from 0 to 100.",
        after_help = "Examples:
  # Domain rating of a domain
  ahrefs site-explorer domain-rating --target example.com

  # Domain rating of a single URL
  ahrefs site-explorer domain-rating --target example.com/page --mode exact

  # Historical domain rating
  ahrefs site-explorer domain-rating --target example.com --date 2024-01-01"
    )]
    DomainRating {
        #[command(flatten)]
        target: TargetArgs,

        /// Date for historical data (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Get backlinks statistics
    #[command(
        long_about = "Get aggregated backlink statistics for a target.",
        after_help = "Examples:
  ahrefs site-explorer backlinks-stats --target example.com
  ahrefs site-explorer backlinks-stats --target example.com/page --mode exact"
    )]
    BacklinksStats {
        #[command(flatten)]
        target: TargetArgs,

        /// Date for historical data (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Get backlinks for a target
    #[command(
        long_about = "List backlinks pointing to a target domain or URL.",
        after_help = "Examples:
  # First 100 backlinks
  ahrefs site-explorer backlinks --target example.com --limit 100

  # Selected fields only
  ahrefs site-explorer backlinks --target example.com --select url_from,domain_rating,anchor

  # Strong referring pages only
  ahrefs site-explorer backlinks --target example.com --where 'domain_rating>50'"
    )]
    Backlinks {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Get referring domains
    #[command(
        long_about = "List domains that link to a target.",
        after_help = "Examples:
  ahrefs site-explorer refdomains --target example.com --order-by domain_rating:desc"
    )]
    Refdomains {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Get anchor text distribution
    #[command(
        long_about = "List the anchor texts used in backlinks to a target.",
        after_help = "Examples:
  ahrefs site-explorer anchors --target example.com --limit 50
  ahrefs site-explorer anchors --target example.com --order-by backlinks:desc"
    )]
    Anchors {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Get organic keywords
    #[command(
        long_about = "List the keywords a target ranks for in organic search.",
        after_help = "Examples:
  ahrefs site-explorer organic-keywords --target example.com --country us
  ahrefs site-explorer organic-keywords --target example.com --order-by traffic:desc --limit 20"
    )]
    OrganicKeywords {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,

        /// Country code (e.g. us, gb, de)
        #[arg(long)]
        country: Option<String>,
    },

    /// Get top pages by organic traffic
    #[command(
        long_about = "List the pages of a target that bring the most organic traffic.",
        after_help = "Examples:
  ahrefs site-explorer top-pages --target example.com --limit 10
  ahrefs site-explorer top-pages --target example.com --country gb --format table"
    )]
    TopPages {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,

        /// Country code (e.g. us, gb, de)
        #[arg(long)]
        country: Option<String>,
    },

    /// Get broken backlinks
    #[command(
        long_about = "List backlinks that point to pages of the target returning errors.",
        after_help = "Examples:
  ahrefs site-explorer broken-backlinks --target example.com --format csv -o broken.csv"
    )]
    BrokenBacklinks {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Get linked domains
    #[command(
        long_about = "List the domains a target links out to.",
        after_help = "Examples:
  ahrefs site-explorer linked-domains --target example.com --order-by domain_rating:desc"
    )]
    LinkedDomains {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Get site metrics overview
    #[command(
        long_about = "Get organic and paid search metrics for a target.",
        after_help = "Examples:
  ahrefs site-explorer metrics --target example.com
  ahrefs site-explorer metrics --target example.com --country us --select org_traffic,org_keywords"
    )]
    Metrics {
        #[command(flatten)]
        target: TargetArgs,

        /// Comma-separated list of fields to return
        #[arg(long)]
        select: Option<String>,

        /// Country code (e.g. us, gb, de)
        #[arg(long)]
        country: Option<String>,
    },

    /// Get historical metrics
    #[command(
        long_about = "Get metrics of a target over a date range.",
        after_help = "Examples:
  ahrefs site-explorer metrics-history --target example.com --date-from 2024-01-01 --date-to 2024-06-30"
    )]
    MetricsHistory {
        #[command(flatten)]
        target: TargetArgs,

        /// Comma-separated list of fields to return
        #[arg(long)]
        select: Option<String>,

        /// Country code (e.g. us, gb, de)
        #[arg(long)]
        country: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        date_from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        date_to: Option<String>,
    },

    /// Get pages sorted by traffic
    #[command(
        long_about = "List pages of a target sorted by organic search traffic.",
        after_help = "Examples:
  ahrefs site-explorer pages-by-traffic --target example.com --limit 100
  ahrefs site-explorer pages-by-traffic --target example.com --country us --limit 50"
    )]
    PagesByTraffic {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,

        /// Country code (e.g. us, gb, de)
        #[arg(long)]
        country: Option<String>,
    },

    /// Get best pages by backlinks
    #[command(
        long_about = "List pages of a target with the most backlinks.",
        after_help = "Examples:
  ahrefs site-explorer best-by-links --target example.com --order-by refdomains:desc"
    )]
    BestByLinks {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Save the API key to the config file
    #[command(after_help = "Examples:
  ahrefs config set-key YOUR_API_KEY")]
    SetKey {
        /// Ahrefs API key
        api_key: String,
    },

    /// Show the stored configuration
    Show,

    /// Check that the API key is accepted by the API
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_command_with_globals() {
        let cli = Cli::try_parse_from([
            "ahrefs",
            "se",
            "backlinks",
            "--target",
            "example.com",
            "--where",
            "domain_rating>50",
            "--format",
            "csv",
            "-o",
            "out.csv",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Csv);
        assert_eq!(cli.output, Some(PathBuf::from("out.csv")));
        assert!(cli.dry_run);
        match cli.command {
            Some(Commands::SiteExplorer {
                command: SiteExplorerCommands::Backlinks { target, list },
            }) => {
                assert_eq!(target.target, "example.com");
                assert_eq!(target.mode, Mode::Domain);
                assert_eq!(list.limit, 100);
                assert_eq!(list.filter.as_deref(), Some("domain_rating>50"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_target_is_required() {
        let err = Cli::try_parse_from(["ahrefs", "site-explorer", "domain-rating"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let result = Cli::try_parse_from([
            "ahrefs",
            "site-explorer",
            "metrics",
            "--target",
            "x.com",
            "--mode",
            "everything",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_args_params() {
        let list = ListArgs {
            limit: 50,
            offset: 0,
            select: Some("url_from,anchor".to_string()),
            filter: None,
            order_by: Some(String::new()),
        };
        let params = list.apply(Params::new());
        assert_eq!(params.get("limit"), Some("50"));
        assert_eq!(params.get("offset"), None);
        assert_eq!(params.get("select"), Some("url_from,anchor"));
        assert_eq!(params.get("where"), None);
        assert_eq!(params.get("order_by"), None);

        let list = ListArgs { offset: 200, ..list };
        assert_eq!(list.apply(Params::new()).get("offset"), Some("200"));
    }

    #[test]
    fn test_target_args_params() {
        let target = TargetArgs {
            target: "ahrefs.com".to_string(),
            mode: Mode::Subdomains,
        };
        let params = target.params();
        assert_eq!(params.get("target"), Some("ahrefs.com"));
        assert_eq!(params.get("mode"), Some("subdomains"));
    }

    #[test]
    fn test_no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["ahrefs", "--list-commands"]).unwrap();
        assert!(cli.list_commands);
        assert!(cli.command.is_none());
    }
}

//! Clap derive structures for the `vitrine` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vitrine -- admin console for CRUD resources
#[derive(Debug, Parser)]
#[command(
    name = "vitrine",
    version,
    about = "Administer CRUD resources from the command line",
    long_about = "Browse, filter and edit the records behind an admin API.\n\n\
        Each resource is described by a view (columns, filters, form fields,\n\
        status workflow). Built-in views cover products, services and\n\
        applications; add your own in views.toml.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// API profile to use
    #[arg(long, short = 'p', env = "VITRINE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Admin API base URL (overrides profile)
    #[arg(long, short = 'u', env = "VITRINE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// API key (overrides profile credentials)
    #[arg(long, env = "VITRINE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// View definitions file (merged over the built-in views)
    #[arg(long = "views", env = "VITRINE_VIEWS", global = true)]
    pub views_file: Option<PathBuf>,

    /// Serve the views' seed records from memory instead of an API
    #[arg(long, env = "VITRINE_DEMO", global = true)]
    pub demo: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VITRINE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VITRINE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "VITRINE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List a view's records (search, filter, sort, paginate)
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a single record
    Get {
        /// View name (e.g. products)
        view: String,
        /// Record id
        id: String,
    },

    /// Create a record from --set pairs or a JSON file
    Create(CreateArgs),

    /// Update fields of an existing record
    #[command(alias = "edit")]
    Update(UpdateArgs),

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        view: String,
        id: String,
    },

    /// Move a record to another workflow status
    Status {
        view: String,
        id: String,
        /// Target status value (see `views show <view>`)
        status: String,
    },

    /// Delete several records at once
    BulkDelete {
        view: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Set the workflow status of several records at once
    BulkStatus {
        view: String,
        status: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Inspect the configured views
    Views(ViewsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Record Arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// View name (e.g. products)
    pub view: String,

    /// Case-insensitive search over the view's search fields
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter as key=value (repeatable; "all" clears)
    #[arg(long, short = 'f', value_parser = parse_key_val)]
    pub filter: Vec<(String, String)>,

    /// Sort by column key
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Records per page (overrides the view)
    #[arg(long)]
    pub page_size: Option<usize>,
}

/// Field values for create/update.
#[derive(Debug, Args)]
pub struct FieldArgs {
    /// Field value as key=value (repeatable)
    #[arg(long = "set", value_parser = parse_key_val)]
    pub set: Vec<(String, String)>,

    /// JSON object with field values (applied before --set)
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub view: String,

    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub view: String,

    pub id: String,

    #[command(flatten)]
    pub fields: FieldArgs,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.trim().to_owned(), value.to_owned()))
}

// ── Views ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ViewsArgs {
    #[command(subcommand)]
    pub command: ViewsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ViewsCommand {
    /// List available views
    #[command(alias = "ls")]
    List,

    /// Show a view's columns, filters, form fields and statuses
    Show { view: String },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (api_url, api_key, api_key_env, ca_cert, insecure, timeout, views)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("sku=ABC=1").unwrap(),
            ("sku".to_owned(), "ABC=1".to_owned())
        );
        assert_eq!(
            parse_key_val("name=").unwrap(),
            ("name".to_owned(), String::new())
        );
        assert!(parse_key_val("name").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn list_args_parse() {
        let cli = Cli::try_parse_from([
            "vitrine", "list", "products", "-f", "status=published", "--sort", "price", "--desc",
        ])
        .unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.view, "products");
        assert_eq!(args.filter, vec![("status".into(), "published".into())]);
        assert!(args.desc);
        assert_eq!(args.page, 1);
    }
}

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use jd_core::config::Config;
use jd_core::facets::BoardFilter;
use jd_core::forms::NewTicketForm;
use jd_core::history::TimeWindow;

use commands::lookup::Lookup;
use commands::update::FieldOverrides;

/// jiradeck -- browse, triage and chart tracker tickets from the terminal.
#[derive(Parser)]
#[command(name = "jd", version, about)]
struct Cli {
    /// Backend base URL, including the `/api` prefix.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file (default: ~/.jiradeck/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List tickets grouped by status (default when no subcommand is given).
    Board(FilterArgs),

    /// Show the statuses, assignees, types and priorities on the board.
    Facets,

    /// Show one ticket's details.
    Show {
        /// Ticket key, e.g. PROJ-42.
        key: String,
    },

    /// Create a ticket.
    Create {
        #[arg(long)]
        summary: String,
        #[arg(long = "type")]
        issue_type: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        priority: String,
        /// Assignee account id.
        #[arg(long, default_value = "")]
        assignee: String,
    },

    /// Change fields of a ticket. Only fields that differ are sent.
    Update {
        key: String,
        #[command(flatten)]
        fields: UpdateArgs,
    },

    /// Delete a ticket.
    Delete {
        key: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// List the transitions available for a ticket.
    Transitions { key: String },

    /// Move a ticket through a transition.
    Transition {
        key: String,
        /// Transition name as listed by `jd transitions`.
        name: String,
        /// Comment to attach; required for closing transitions.
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Ticket analytics with trend and insights.
    Analytics {
        /// all, week or month.
        #[arg(long, default_value = "all")]
        time: TimeWindow,
    },

    /// Check the backend's connection to the tracker.
    Health,

    /// Ticket counts per status and assignee.
    Stats,

    /// Reference data for ticket forms.
    Lookup {
        #[command(subcommand)]
        what: LookupCommand,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Free-text search on summaries.
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, default_value = "")]
    assignee: String,
    #[arg(long = "type", default_value = "")]
    issue_type: String,
    #[arg(long, default_value = "")]
    status: String,
    #[arg(long, default_value = "")]
    priority: String,
}

impl From<FilterArgs> for BoardFilter {
    fn from(args: FilterArgs) -> Self {
        BoardFilter {
            search: args.search,
            assignee: args.assignee,
            issue_type: args.issue_type,
            status: args.status,
            priority: args.priority,
        }
    }
}

#[derive(Args)]
struct UpdateArgs {
    #[arg(long)]
    summary: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    #[arg(long = "type")]
    issue_type: Option<String>,
    #[arg(long)]
    assignee: Option<String>,
}

#[derive(Subcommand)]
enum LookupCommand {
    /// Priorities the tracker accepts.
    Priorities,
    /// Issue types the project accepts.
    Types,
    /// Users matching a name or e-mail.
    Users { query: String },
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::load()?,
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
        config.validate()?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.json_logs {
        jd_telemetry::logging::init_logging_json("jd", &config.general.log_level);
    } else {
        jd_telemetry::logging::init_logging("jd", &config.general.log_level);
    }

    let client = commands::api_client(&config.api)?;
    tracing::debug!(base_url = client.base_url(), "backend client ready");

    match cli.command {
        None => commands::board::run(&client, &BoardFilter::default()).await?,
        Some(Commands::Board(filter)) => commands::board::run(&client, &filter.into()).await?,
        Some(Commands::Facets) => {
            commands::facets::run(&client, &config.board.default_types).await?
        }
        Some(Commands::Show { key }) => commands::show::run(&client, &key).await?,
        Some(Commands::Create {
            summary,
            issue_type,
            description,
            priority,
            assignee,
        }) => {
            let form = NewTicketForm {
                summary,
                description,
                issue_type,
                priority,
                assignee,
            };
            commands::create::run(&client, form).await?
        }
        Some(Commands::Update { key, fields }) => {
            let overrides = FieldOverrides {
                summary: fields.summary,
                description: fields.description,
                priority: fields.priority,
                issue_type: fields.issue_type,
                assignee: fields.assignee,
            };
            commands::update::run(&client, &key, &overrides).await?
        }
        Some(Commands::Delete { key, yes }) => commands::delete::run(&client, &key, yes).await?,
        Some(Commands::Transitions { key }) => commands::transitions::run(&client, &key).await?,
        Some(Commands::Transition { key, name, comment }) => {
            commands::transition::run(&client, &key, &name, comment.as_deref()).await?
        }
        Some(Commands::Analytics { time }) => {
            commands::analytics::run(&client, time, config.analytics.trend_settings()).await?
        }
        Some(Commands::Health) => commands::health::run(&client).await?,
        Some(Commands::Stats) => commands::stats::run(&client).await?,
        Some(Commands::Lookup { what }) => {
            let lookup = match what {
                LookupCommand::Priorities => Lookup::Priorities,
                LookupCommand::Types => Lookup::Types,
                LookupCommand::Users { query } => Lookup::Users(query),
            };
            commands::lookup::run(&client, &lookup).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_defaults_to_board() {
        let cli = Cli::parse_from(["jd"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["jd", "health", "--api-url", "http://h:1/api", "--json-logs"]);
        assert_eq!(cli.api_url.as_deref(), Some("http://h:1/api"));
        assert!(cli.json_logs);
    }

    #[test]
    fn board_filters_map_to_query() {
        let cli = Cli::parse_from(["jd", "board", "--type", "Bug", "--assignee", "Alice"]);
        let Some(Commands::Board(args)) = cli.command else {
            panic!("expected board");
        };
        let filter: BoardFilter = args.into();
        assert_eq!(filter.issue_type, "Bug");
        assert_eq!(filter.assignee, "Alice");
        assert!(filter.status.is_empty());
    }

    #[test]
    fn analytics_window_parses() {
        let cli = Cli::parse_from(["jd", "analytics", "--time", "Week"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Analytics { time: TimeWindow::Week })
        ));
        assert!(Cli::try_parse_from(["jd", "analytics", "--time", "year"]).is_err());
    }

    #[test]
    fn bad_api_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let cli = Cli::parse_from([
            "jd",
            "--config",
            path.to_str().unwrap(),
            "--api-url",
            "ftp://nope",
            "health",
        ]);
        assert!(load_config(&cli).is_err());

        let cli = Cli::parse_from(["jd", "--config", path.to_str().unwrap(), "health"]);
        assert_eq!(load_config(&cli).unwrap(), Config::default());
    }
}
